//! Remote order service: the trait seam used by the desk and its HTTP implementation.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Order, OrderId},
    error::ApiError,
    protocol::{execute_order_path, order_path, orders_route, NewOrder},
};
use tracing::{debug, warn};

use crate::{
    config::ClientConfig,
    error::{OrderClientError, OrderResult},
};

#[async_trait]
pub trait OrderService: Send + Sync {
    /// All orders in service order (creation order).
    async fn list_orders(&self) -> OrderResult<Vec<Order>>;
    async fn get_order(&self, order_id: OrderId) -> OrderResult<Order>;
    async fn create_order(&self, order: &NewOrder) -> OrderResult<Order>;
    async fn execute_order(&self, order_id: OrderId) -> OrderResult<Order>;
}

pub struct HttpOrderService {
    http: Client,
    config: ClientConfig,
}

impl HttpOrderService {
    pub fn new(config: ClientConfig) -> OrderResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl OrderService for HttpOrderService {
    async fn list_orders(&self) -> OrderResult<Vec<Order>> {
        let response = self
            .http
            .get(self.config.endpoint(orders_route()))
            .send()
            .await?;
        if !response.status().is_success() {
            let (status, _) = read_failure(response).await;
            return Err(OrderClientError::Server {
                status: status.as_u16(),
            });
        }
        let orders: Vec<Order> = decode(response).await?;
        debug!(count = orders.len(), "listed orders");
        Ok(orders)
    }

    async fn get_order(&self, order_id: OrderId) -> OrderResult<Order> {
        let response = self
            .http
            .get(self.config.endpoint(&order_path(order_id)))
            .send()
            .await?;
        if response.status().is_success() {
            return decode(response).await;
        }
        let (status, detail) = read_failure(response).await;
        if status == StatusCode::NOT_FOUND || detail.as_ref().is_some_and(ApiError::is_not_found) {
            return Err(OrderClientError::NotFound(order_id));
        }
        Err(OrderClientError::Server {
            status: status.as_u16(),
        })
    }

    async fn create_order(&self, order: &NewOrder) -> OrderResult<Order> {
        order
            .check()
            .map_err(|reason| OrderClientError::Input(reason.to_string()))?;

        let response = self
            .http
            .post(self.config.endpoint(orders_route()))
            .json(order)
            .send()
            .await?;
        if response.status().is_success() {
            let created: Order = decode(response).await?;
            debug!(order_id = %created.id, instrument = %created.instrument, "order created");
            return Ok(created);
        }

        let (status, detail) = read_failure(response).await;
        match detail {
            Some(detail) if status.is_client_error() => {
                warn!(status = status.as_u16(), detail = %detail.detail, "order rejected");
                Err(OrderClientError::Validation(detail.detail))
            }
            _ => Err(OrderClientError::Server {
                status: status.as_u16(),
            }),
        }
    }

    async fn execute_order(&self, order_id: OrderId) -> OrderResult<Order> {
        let response = self
            .http
            .post(self.config.endpoint(&execute_order_path(order_id)))
            .send()
            .await?;
        if response.status().is_success() {
            let order: Order = decode(response).await?;
            if !order.is_executed {
                return Err(OrderClientError::InvalidResponse(format!(
                    "order {order_id} still reported as not executed"
                )));
            }
            debug!(%order_id, "order executed");
            return Ok(order);
        }

        let (status, detail) = read_failure(response).await;
        if status == StatusCode::NOT_FOUND || detail.as_ref().is_some_and(ApiError::is_not_found) {
            return Err(OrderClientError::NotFound(order_id));
        }
        if status == StatusCode::CONFLICT
            || detail.as_ref().is_some_and(ApiError::is_already_executed)
        {
            return Err(OrderClientError::AlreadyExecuted(order_id));
        }
        match detail {
            Some(detail) if status.is_client_error() => {
                Err(OrderClientError::Validation(detail.detail))
            }
            _ => Err(OrderClientError::Server {
                status: status.as_u16(),
            }),
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> OrderResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| OrderClientError::InvalidResponse(e.to_string()))
}

/// Status plus the structured `{detail}` body when the service sent one.
async fn read_failure(response: Response) -> (StatusCode, Option<ApiError>) {
    let status = response.status();
    let detail = match response.bytes().await {
        Ok(body) => serde_json::from_slice::<ApiError>(&body).ok(),
        Err(error) => {
            warn!(status = status.as_u16(), %error, "failed to read error body");
            None
        }
    };
    (status, detail)
}

#[cfg(test)]
#[path = "tests/service_tests.rs"]
mod tests;
