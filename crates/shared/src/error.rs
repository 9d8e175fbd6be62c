use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the order service on non-success responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub detail: String,
}

impl ApiError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.detail.to_ascii_lowercase().contains("not found")
    }

    pub fn is_already_executed(&self) -> bool {
        self.detail.to_ascii_lowercase().contains("already executed")
    }
}

impl From<OrderRejection> for ApiError {
    fn from(value: OrderRejection) -> Self {
        Self::new(value.to_string())
    }
}

/// Reasons a create request is refused by the order rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OrderRejection {
    #[error("Invalid trade way. Use 'buy' or 'sell'.")]
    InvalidWay,
    #[error("Price must be greater than zero.")]
    NonPositivePrice,
    #[error("Price has more significant digits than the order service keeps.")]
    ImprecisePrice,
    #[error("Quantity must be greater than zero.")]
    NonPositiveQty,
    #[error("Instrument cannot be empty.")]
    EmptyInstrument,
}
