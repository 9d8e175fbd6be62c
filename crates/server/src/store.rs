use std::sync::Arc;

use shared::{
    domain::{Order, OrderId},
    protocol::NewOrder,
};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Order not found.")]
    NotFound(OrderId),
    #[error("Order already executed.")]
    AlreadyExecuted(OrderId),
}

#[derive(Debug)]
struct Book {
    orders: Vec<Order>,
    next_id: i64,
}

/// In-memory order book. Orders keep creation order and are never removed.
#[derive(Debug, Clone)]
pub struct OrderStore {
    book: Arc<RwLock<Book>>,
}

impl Default for OrderStore {
    fn default() -> Self {
        Self {
            book: Arc::new(RwLock::new(Book {
                orders: Vec::new(),
                next_id: 1,
            })),
        }
    }
}

impl OrderStore {
    pub async fn list(&self) -> Vec<Order> {
        self.book.read().await.orders.clone()
    }

    pub async fn get(&self, order_id: OrderId) -> Result<Order, StoreError> {
        self.book
            .read()
            .await
            .orders
            .iter()
            .find(|order| order.id == order_id)
            .cloned()
            .ok_or(StoreError::NotFound(order_id))
    }

    pub async fn create(&self, new_order: NewOrder) -> Order {
        let mut book = self.book.write().await;
        let order = Order {
            id: OrderId(book.next_id),
            instrument: new_order.instrument,
            way: new_order.way,
            price: new_order.price,
            qty: new_order.qty,
            is_executed: false,
        };
        book.next_id += 1;
        book.orders.push(order.clone());
        order
    }

    pub async fn execute(&self, order_id: OrderId) -> Result<Order, StoreError> {
        let mut book = self.book.write().await;
        let order = book
            .orders
            .iter_mut()
            .find(|order| order.id == order_id)
            .ok_or(StoreError::NotFound(order_id))?;
        order
            .execute()
            .map_err(|_| StoreError::AlreadyExecuted(order_id))?;
        Ok(order.clone())
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
