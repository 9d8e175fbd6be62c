use std::str::FromStr;

use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{OrderId, Way},
    error::OrderRejection,
};

pub const BANNER_KEY: &str = "Trade API";
pub const BANNER_TEXT: &str = "Become a millionaire in your magical fantasy.";

pub fn orders_route() -> &'static str {
    "/orders"
}

pub fn order_route() -> &'static str {
    "/orders/:order_id"
}

pub fn execute_order_route() -> &'static str {
    "/orders/:order_id/execute"
}

pub fn order_path(order_id: OrderId) -> String {
    format!("/orders/{order_id}")
}

pub fn execute_order_path(order_id: OrderId) -> String {
    format!("/orders/{order_id}/execute")
}

/// The value `price` reads back as after the JSON float encoding.
pub fn wire_price(price: Decimal) -> Option<Decimal> {
    let float = price.to_f64()?;
    Decimal::from_str(&float.to_string()).ok()
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub instrument: String,
    pub way: Way,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub qty: u64,
}

impl NewOrder {
    /// Rules shared by the client precheck and the service.
    pub fn check(&self) -> Result<(), OrderRejection> {
        if self.price <= Decimal::ZERO {
            return Err(OrderRejection::NonPositivePrice);
        }
        if wire_price(self.price) != Some(self.price) {
            return Err(OrderRejection::ImprecisePrice);
        }
        if self.qty == 0 {
            return Err(OrderRejection::NonPositiveQty);
        }
        if self.instrument.trim().is_empty() {
            return Err(OrderRejection::EmptyInstrument);
        }
        Ok(())
    }
}
