use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    domain::{Order, OrderId, Way},
    error::{ApiError, OrderRejection},
    protocol::{execute_order_route, order_route, orders_route, NewOrder, BANNER_KEY, BANNER_TEXT},
};
use tracing::{info, warn};

mod app_state;
mod config;
mod store;

use app_state::AppState;
use config::load_settings;
use store::StoreError;

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

/// Create body as sent on the wire. `way` and `qty` are kept loose so that
/// bad values get the rule's message instead of a decode error.
#[derive(Debug, Deserialize)]
struct CreateOrderBody {
    instrument: String,
    way: String,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
    qty: i64,
}

impl TryFrom<CreateOrderBody> for NewOrder {
    type Error = OrderRejection;

    fn try_from(body: CreateOrderBody) -> Result<Self, Self::Error> {
        let way = Way::from_wire(&body.way).ok_or(OrderRejection::InvalidWay)?;
        if body.price <= Decimal::ZERO {
            return Err(OrderRejection::NonPositivePrice);
        }
        let qty = u64::try_from(body.qty)
            .ok()
            .filter(|qty| *qty > 0)
            .ok_or(OrderRejection::NonPositiveQty)?;
        let order = NewOrder {
            instrument: body.instrument,
            way,
            price: body.price,
            qty,
        };
        order.check()?;
        Ok(order)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let addr = settings.bind_addr()?;
    let app = build_router(Arc::new(AppState::default()));

    info!(%addr, "order service listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/healthz", get(healthz))
        .route(orders_route(), get(list_orders).post(create_order))
        .route(order_route(), get(get_order))
        .route(execute_order_route(), post(execute_order))
        .with_state(state)
}

async fn banner() -> Json<serde_json::Value> {
    Json(serde_json::json!({ BANNER_KEY: BANNER_TEXT }))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn list_orders(State(state): State<Arc<AppState>>) -> Json<Vec<Order>> {
    Json(state.store.list().await)
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    order_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Order>> {
    let order_id = parse_order_id(order_id)?;
    state.store.get(order_id).await.map(Json).map_err(store_error)
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateOrderBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let Json(body) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "malformed order body");
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(rejection.body_text())),
        )
    })?;
    let new_order = NewOrder::try_from(body).map_err(|reason| {
        warn!(%reason, "order rejected");
        (StatusCode::BAD_REQUEST, Json(ApiError::from(reason)))
    })?;

    let order = state.store.create(new_order).await;
    info!(
        order_id = %order.id,
        instrument = %order.instrument,
        way = %order.way,
        price = %order.price,
        qty = order.qty,
        "order created"
    );
    Ok((StatusCode::CREATED, Json(order)))
}

async fn execute_order(
    State(state): State<Arc<AppState>>,
    order_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Order>> {
    let order_id = parse_order_id(order_id)?;
    let order = state
        .store
        .execute(order_id)
        .await
        .map_err(store_error)?;
    info!(%order_id, "order executed");
    Ok(Json(order))
}

fn parse_order_id(order_id: Result<Path<i64>, PathRejection>) -> ApiResult<OrderId> {
    order_id
        .map(|Path(order_id)| OrderId(order_id))
        .map_err(|_| {
            (
                StatusCode::NOT_FOUND,
                Json(ApiError::new("Order not found.")),
            )
        })
}

fn store_error(error: StoreError) -> (StatusCode, Json<ApiError>) {
    let status = match error {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::AlreadyExecuted(_) => StatusCode::CONFLICT,
    };
    (status, Json(ApiError::new(error.to_string())))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
