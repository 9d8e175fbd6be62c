//! Draft of a not-yet-submitted order.

use std::str::FromStr;

use rust_decimal::Decimal;
use shared::{
    domain::Way,
    protocol::{wire_price, NewOrder},
};

use crate::error::{OrderClientError, OrderResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Instrument,
    Way,
    Price,
    Qty,
}

impl FromStr for FormField {
    type Err = OrderClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instrument" => Ok(Self::Instrument),
            "way" => Ok(Self::Way),
            "price" => Ok(Self::Price),
            "qty" | "quantity" => Ok(Self::Qty),
            other => Err(OrderClientError::Input(format!("unknown form field '{other}'"))),
        }
    }
}

/// Raw text as typed by the user. Nothing is parsed until validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub instrument: String,
    pub way: String,
    pub price: String,
    pub qty: String,
}

impl Default for OrderDraft {
    fn default() -> Self {
        Self {
            instrument: String::new(),
            way: Way::Buy.as_str().to_string(),
            price: String::new(),
            qty: String::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct OrderFormState {
    draft: OrderDraft,
}

impl OrderFormState {
    pub fn draft(&self) -> &OrderDraft {
        &self.draft
    }

    pub fn update(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::Instrument => self.draft.instrument = value,
            FormField::Way => self.draft.way = value,
            FormField::Price => self.draft.price = value,
            FormField::Qty => self.draft.qty = value,
        }
    }

    pub fn reset(&mut self) {
        self.draft = OrderDraft::default();
    }

    pub fn validate(&self) -> OrderResult<NewOrder> {
        validate_draft(&self.draft)
    }
}

pub fn validate_draft(draft: &OrderDraft) -> OrderResult<NewOrder> {
    let instrument = draft.instrument.trim();
    if instrument.is_empty() {
        return Err(input("instrument cannot be empty"));
    }

    let way = draft
        .way
        .parse::<Way>()
        .map_err(|e| OrderClientError::Input(e.to_string()))?;

    let price = draft
        .price
        .trim()
        .parse::<Decimal>()
        .map_err(|_| input(format!("price '{}' is not a number", draft.price.trim())))?;
    if price <= Decimal::ZERO {
        return Err(input("price must be greater than zero"));
    }
    if wire_price(price) != Some(price) {
        return Err(input(format!(
            "price '{}' has more significant digits than the order service keeps",
            draft.price.trim()
        )));
    }

    let qty_raw = draft.qty.trim();
    let qty = match qty_raw.parse::<u64>() {
        Ok(qty) if qty > 0 => qty,
        Ok(_) => return Err(input("quantity must be greater than zero")),
        Err(_) if qty_raw.starts_with('-') && qty_raw[1..].parse::<u64>().is_ok() => {
            return Err(input("quantity must be greater than zero"))
        }
        Err(_) => return Err(input(format!("quantity '{qty_raw}' is not a whole number"))),
    };

    let order = NewOrder {
        instrument: instrument.to_string(),
        way,
        price,
        qty,
    };
    order
        .check()
        .map_err(|reason| OrderClientError::Input(reason.to_string()))?;
    Ok(order)
}

fn input(message: impl Into<String>) -> OrderClientError {
    OrderClientError::Input(message.into())
}
