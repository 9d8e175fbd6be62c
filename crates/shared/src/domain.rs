use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

id_newtype!(OrderId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Way {
    #[default]
    Buy,
    Sell,
}

impl Way {
    pub fn as_str(&self) -> &'static str {
        match self {
            Way::Buy => "buy",
            Way::Sell => "sell",
        }
    }

    /// Exact wire spelling only; `FromStr` is the lenient form for typed input.
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "buy" => Some(Way::Buy),
            "sell" => Some(Way::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for Way {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid trade way '{0}', use 'buy' or 'sell'")]
pub struct ParseWayError(pub String);

impl FromStr for Way {
    type Err = ParseWayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Way::Buy),
            "sell" => Ok(Way::Sell),
            _ => Err(ParseWayError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    Created,
    /// Terminal.
    Executed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("order {0} already executed")]
pub struct AlreadyExecuted(pub OrderId);

/// A buy/sell instruction as owned by the order service.
///
/// `id` is assigned by the service on create and never changes. Once
/// `is_executed` flips to true the economic fields are frozen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub instrument: String,
    pub way: Way,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub qty: u64,
    #[serde(default)]
    pub is_executed: bool,
}

impl Order {
    pub fn state(&self) -> OrderState {
        if self.is_executed {
            OrderState::Executed
        } else {
            OrderState::Created
        }
    }

    /// Applies the one-shot `Created -> Executed` transition.
    pub fn execute(&mut self) -> Result<(), AlreadyExecuted> {
        match self.state() {
            OrderState::Created => {
                self.is_executed = true;
                Ok(())
            }
            OrderState::Executed => Err(AlreadyExecuted(self.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn sample_order() -> Order {
        Order {
            id: OrderId(4),
            instrument: "AAPL".into(),
            way: Way::Buy,
            price: dec!(150.5),
            qty: 10,
            is_executed: false,
        }
    }

    #[test]
    fn parses_way_case_insensitively() {
        assert_eq!(" Sell ".parse::<Way>(), Ok(Way::Sell));
        assert_eq!("BUY".parse::<Way>(), Ok(Way::Buy));
        assert!("hold".parse::<Way>().is_err());
    }

    #[test]
    fn wire_way_is_exact() {
        assert_eq!(Way::from_wire("sell"), Some(Way::Sell));
        assert_eq!(Way::from_wire("BUY"), None);
        assert_eq!(Way::from_wire(" sell "), None);
    }

    #[test]
    fn execute_is_one_shot() {
        let mut order = sample_order();
        assert_eq!(order.state(), OrderState::Created);

        order.execute().expect("first execute");
        assert_eq!(order.state(), OrderState::Executed);

        let err = order.execute().expect_err("second execute must fail");
        assert_eq!(err, AlreadyExecuted(OrderId(4)));
        assert!(order.is_executed);
        assert_eq!(order.price, dec!(150.5));
    }

    #[test]
    fn order_wire_shape_uses_plain_numbers() {
        let value = serde_json::to_value(sample_order()).expect("json");
        assert_eq!(
            value,
            serde_json::json!({
                "id": 4,
                "instrument": "AAPL",
                "way": "buy",
                "price": 150.5,
                "qty": 10,
                "is_executed": false,
            })
        );
    }

    #[test]
    fn missing_is_executed_defaults_to_false() {
        let order: Order = serde_json::from_str(
            r#"{"id":1,"instrument":"MSFT","way":"sell","price":3,"qty":2}"#,
        )
        .expect("order");
        assert!(!order.is_executed);
        assert_eq!(order.price, dec!(3));
        assert_eq!(order.way, Way::Sell);
    }
}
