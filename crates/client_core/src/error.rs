//! Error taxonomy for order service calls and desk actions.

use shared::domain::OrderId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrderClientError {
    /// Rejected before any request was sent.
    #[error("invalid order input: {0}")]
    Input(String),
    /// The HTTP client or request could not be built; nothing was sent.
    #[error("failed to set up the HTTP request: {0}")]
    Client(#[source] reqwest::Error),
    #[error("order service unreachable: {0}")]
    Network(#[source] reqwest::Error),
    #[error("order service failed with HTTP {status}")]
    Server { status: u16 },
    #[error("{0}")]
    Validation(String),
    #[error("order {0} not found")]
    NotFound(OrderId),
    #[error("order {0} already executed")]
    AlreadyExecuted(OrderId),
    #[error("invalid response from order service: {0}")]
    InvalidResponse(String),
    #[error("another order action is still in progress; wait for it to finish")]
    Busy,
}

impl From<reqwest::Error> for OrderClientError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_builder() {
            Self::Client(value)
        } else if value.is_decode() {
            Self::InvalidResponse(value.to_string())
        } else {
            Self::Network(value)
        }
    }
}

pub type OrderResult<T> = Result<T, OrderClientError>;
