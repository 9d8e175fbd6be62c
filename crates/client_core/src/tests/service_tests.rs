use super::*;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response as AxumResponse},
    routing::{get, post},
    Json, Router,
};
use rust_decimal_macros::dec;
use shared::domain::Way;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct StubState {
    orders: Arc<Mutex<Vec<Order>>>,
    create_requests: Arc<AtomicUsize>,
}

async fn stub_list(State(state): State<StubState>) -> Json<Vec<Order>> {
    Json(state.orders.lock().await.clone())
}

async fn stub_create(
    State(state): State<StubState>,
    Json(body): Json<NewOrder>,
) -> AxumResponse {
    state.create_requests.fetch_add(1, Ordering::SeqCst);
    match body.instrument.as_str() {
        "HALTED" => (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("Instrument is halted.")),
        )
            .into_response(),
        "CRASH" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        _ => {
            let mut orders = state.orders.lock().await;
            let order = Order {
                id: OrderId(orders.len() as i64 + 100),
                instrument: body.instrument,
                way: body.way,
                price: body.price,
                qty: body.qty,
                is_executed: false,
            };
            orders.push(order.clone());
            (StatusCode::CREATED, Json(order)).into_response()
        }
    }
}

async fn stub_get(State(state): State<StubState>, Path(order_id): Path<i64>) -> AxumResponse {
    let orders = state.orders.lock().await;
    match orders.iter().find(|order| order.id == OrderId(order_id)) {
        Some(order) => Json(order.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(ApiError::new("Order not found."))).into_response(),
    }
}

async fn stub_execute(
    State(state): State<StubState>,
    Path(order_id): Path<i64>,
) -> AxumResponse {
    let mut orders = state.orders.lock().await;
    let Some(order) = orders.iter_mut().find(|order| order.id == OrderId(order_id)) else {
        return (StatusCode::NOT_FOUND, Json(ApiError::new("Order not found."))).into_response();
    };
    if order.execute().is_err() {
        return (
            StatusCode::CONFLICT,
            Json(ApiError::new("Order already executed.")),
        )
            .into_response();
    }
    Json(order.clone()).into_response()
}

async fn spawn_router(app: Router) -> anyhow::Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

async fn spawn_order_server() -> anyhow::Result<(HttpOrderService, StubState)> {
    let state = StubState::default();
    let app = Router::new()
        .route(orders_route(), get(stub_list).post(stub_create))
        .route("/orders/:order_id", get(stub_get))
        .route("/orders/:order_id/execute", post(stub_execute))
        .with_state(state.clone());
    let url = spawn_router(app).await?;
    let service = HttpOrderService::new(ClientConfig::new(&url)?)?;
    Ok((service, state))
}

fn aapl() -> NewOrder {
    NewOrder {
        instrument: "AAPL".into(),
        way: Way::Buy,
        price: dec!(150.5),
        qty: 10,
    }
}

#[tokio::test]
async fn create_then_list_round_trips_with_fresh_id() {
    let (service, _state) = spawn_order_server().await.expect("spawn server");
    let first = service.create_order(&aapl()).await.expect("create");
    let second = service.create_order(&aapl()).await.expect("create");
    assert_ne!(first.id, second.id);

    let listed = service.list_orders().await.expect("list");
    assert_eq!(listed.len(), 2);
    let found = listed
        .iter()
        .find(|order| order.id == first.id)
        .expect("created order listed");
    assert_eq!(found.instrument, "AAPL");
    assert_eq!(found.way, Way::Buy);
    assert_eq!(found.price, dec!(150.5));
    assert_eq!(found.qty, 10);
    assert!(!found.is_executed);
}

#[tokio::test]
async fn invalid_order_is_refused_without_a_request() {
    let (service, state) = spawn_order_server().await.expect("spawn server");
    let mut order = aapl();
    order.price = dec!(0);

    let err = service.create_order(&order).await.expect_err("invalid");
    assert!(matches!(err, OrderClientError::Input(_)));
    assert_eq!(state.create_requests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn server_rejection_carries_detail() {
    let (service, _state) = spawn_order_server().await.expect("spawn server");
    let mut order = aapl();
    order.instrument = "HALTED".into();

    match service.create_order(&order).await {
        Err(OrderClientError::Validation(detail)) => assert_eq!(detail, "Instrument is halted."),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn unstructured_failure_maps_to_server_error() {
    let (service, _state) = spawn_order_server().await.expect("spawn server");
    let mut order = aapl();
    order.instrument = "CRASH".into();

    let err = service.create_order(&order).await.expect_err("crash");
    assert!(matches!(err, OrderClientError::Server { status: 500 }));
}

#[tokio::test]
async fn execute_maps_not_found_and_already_executed() {
    let (service, _state) = spawn_order_server().await.expect("spawn server");
    let created = service.create_order(&aapl()).await.expect("create");

    let executed = service.execute_order(created.id).await.expect("execute");
    assert!(executed.is_executed);
    assert_eq!(executed.price, created.price);

    let err = service
        .execute_order(created.id)
        .await
        .expect_err("second execute");
    assert!(matches!(err, OrderClientError::AlreadyExecuted(id) if id == created.id));

    let err = service
        .execute_order(OrderId(9999))
        .await
        .expect_err("unknown id");
    assert!(matches!(err, OrderClientError::NotFound(OrderId(9999))));

    let listed = service.list_orders().await.expect("list");
    assert_eq!(listed.len(), 1);
    assert!(listed[0].is_executed);
}

#[tokio::test]
async fn get_order_resolves_by_id() {
    let (service, _state) = spawn_order_server().await.expect("spawn server");
    let created = service.create_order(&aapl()).await.expect("create");

    assert_eq!(service.get_order(created.id).await.expect("get"), created);
    assert!(matches!(
        service.get_order(OrderId(5)).await,
        Err(OrderClientError::NotFound(OrderId(5)))
    ));
}

#[tokio::test]
async fn list_failure_without_detail_is_server_error() {
    let app = Router::new().route(
        orders_route(),
        get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
    );
    let url = spawn_router(app).await.expect("spawn server");
    let service = HttpOrderService::new(ClientConfig::new(&url).expect("config")).expect("client");

    let err = service.list_orders().await.expect_err("unavailable");
    assert!(matches!(err, OrderClientError::Server { status: 503 }));
}

#[tokio::test]
async fn undecodable_success_body_is_invalid_response() {
    let app = Router::new().route(orders_route(), get(|| async { "Successful sent order!" }));
    let url = spawn_router(app).await.expect("spawn server");
    let service = HttpOrderService::new(ClientConfig::new(&url).expect("config")).expect("client");

    let err = service.list_orders().await.expect_err("not json");
    assert!(matches!(err, OrderClientError::InvalidResponse(_)));
}

#[tokio::test]
async fn unreachable_service_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let config = ClientConfig::new(&format!("http://{addr}"))
        .expect("config")
        .with_request_timeout(std::time::Duration::from_secs(2));
    let service = HttpOrderService::new(config).expect("client");

    let err = service.list_orders().await.expect_err("nothing listening");
    assert!(matches!(err, OrderClientError::Network(_)));
}

#[tokio::test]
async fn detail_text_classifies_bad_request_failures() {
    async fn execute_with_detail(Path(order_id): Path<i64>) -> AxumResponse {
        let detail = if order_id == 1 {
            "Order already executed."
        } else {
            "Order not found."
        };
        (StatusCode::BAD_REQUEST, Json(ApiError::new(detail))).into_response()
    }
    async fn get_with_detail() -> AxumResponse {
        (StatusCode::BAD_REQUEST, Json(ApiError::new("Order not found."))).into_response()
    }

    let app = Router::new()
        .route("/orders/:order_id", get(get_with_detail))
        .route("/orders/:order_id/execute", post(execute_with_detail));
    let url = spawn_router(app).await.expect("spawn server");
    let service = HttpOrderService::new(ClientConfig::new(&url).expect("config")).expect("client");

    assert!(matches!(
        service.execute_order(OrderId(1)).await,
        Err(OrderClientError::AlreadyExecuted(OrderId(1)))
    ));
    assert!(matches!(
        service.execute_order(OrderId(2)).await,
        Err(OrderClientError::NotFound(OrderId(2)))
    ));
    assert!(matches!(
        service.get_order(OrderId(2)).await,
        Err(OrderClientError::NotFound(OrderId(2)))
    ));
}
