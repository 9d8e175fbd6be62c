//! Client-side snapshot of the service's order set.
//!
//! The snapshot is only ever replaced wholesale by a list call. Orders are
//! looked up by their service-assigned id; the position of an order in the
//! snapshot is for display only and may change between refreshes.

use shared::domain::{Order, OrderId};
use tracing::{debug, warn};

use crate::{error::OrderResult, service::OrderService};

/// Issued when a refresh starts. Results are applied only if no later
/// refresh has landed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
enum SnapshotState {
    NotLoaded,
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotView<'a> {
    NotLoaded,
    /// The service has no orders.
    Empty,
    Orders(&'a [Order]),
    /// Empty because the last refresh failed.
    Unavailable(&'a str),
}

#[derive(Debug)]
pub struct OrderListSync {
    orders: Vec<Order>,
    state: SnapshotState,
    issued: u64,
    applied: u64,
}

impl Default for OrderListSync {
    fn default() -> Self {
        Self {
            orders: Vec::new(),
            state: SnapshotState::NotLoaded,
            issued: 0,
            applied: 0,
        }
    }
}

impl OrderListSync {
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn find(&self, order_id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|order| order.id == order_id)
    }

    pub fn view(&self) -> SnapshotView<'_> {
        match &self.state {
            SnapshotState::NotLoaded => SnapshotView::NotLoaded,
            SnapshotState::Failed(reason) => SnapshotView::Unavailable(reason),
            SnapshotState::Loaded if self.orders.is_empty() => SnapshotView::Empty,
            SnapshotState::Loaded => SnapshotView::Orders(&self.orders),
        }
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.issued += 1;
        RefreshTicket(self.issued)
    }

    /// Applies a list result. `Ok(false)` means a newer refresh already
    /// replaced the snapshot and this result, success or failure, was dropped.
    /// A failure that is not superseded clears the snapshot.
    pub fn apply(
        &mut self,
        ticket: RefreshTicket,
        result: OrderResult<Vec<Order>>,
    ) -> OrderResult<bool> {
        if ticket.0 <= self.applied {
            let error = result.err().map(|error| error.to_string());
            debug!(
                ticket = ticket.0,
                applied = self.applied,
                ?error,
                "dropping superseded refresh"
            );
            return Ok(false);
        }
        self.applied = ticket.0;

        match result {
            Ok(orders) => {
                debug!(count = orders.len(), "order snapshot replaced");
                self.orders = orders;
                self.state = SnapshotState::Loaded;
                Ok(true)
            }
            Err(error) => {
                warn!(%error, "order refresh failed; snapshot cleared");
                self.orders.clear();
                self.state = SnapshotState::Failed(error.to_string());
                Err(error)
            }
        }
    }

    /// Lists orders and replaces the snapshot, for callers that own the sync
    /// exclusively across the await.
    pub async fn refresh(&mut self, service: &dyn OrderService) -> OrderResult<&[Order]> {
        let ticket = self.begin_refresh();
        let result = service.list_orders().await;
        self.apply(ticket, result)?;
        Ok(&self.orders)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use shared::domain::Way;

    use super::*;
    use crate::error::OrderClientError;

    fn order(id: i64) -> Order {
        Order {
            id: OrderId(id),
            instrument: format!("SYM{id}"),
            way: Way::Sell,
            price: dec!(2.5),
            qty: 1,
            is_executed: false,
        }
    }

    #[test]
    fn starts_not_loaded() {
        let sync = OrderListSync::default();
        assert_eq!(sync.view(), SnapshotView::NotLoaded);
    }

    #[test]
    fn empty_list_and_failed_refresh_are_distinct() {
        let mut sync = OrderListSync::default();
        let ticket = sync.begin_refresh();
        assert!(sync.apply(ticket, Ok(Vec::new())).expect("apply"));
        assert_eq!(sync.view(), SnapshotView::Empty);

        let ticket = sync.begin_refresh();
        sync.apply(ticket, Err(OrderClientError::Server { status: 500 }))
            .expect_err("failure surfaces");
        assert!(sync.orders().is_empty());
        match sync.view() {
            SnapshotView::Unavailable(reason) => assert!(reason.contains("500")),
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn failure_clears_previous_orders() {
        let mut sync = OrderListSync::default();
        let ticket = sync.begin_refresh();
        sync.apply(ticket, Ok(vec![order(1), order(2)]))
            .expect("apply");
        assert_eq!(sync.orders().len(), 2);

        let ticket = sync.begin_refresh();
        let _ = sync.apply(ticket, Err(OrderClientError::Server { status: 502 }));
        assert!(sync.orders().is_empty());
        assert!(sync.find(OrderId(1)).is_none());
    }

    #[test]
    fn superseded_refresh_is_dropped() {
        let mut sync = OrderListSync::default();
        let older = sync.begin_refresh();
        let newer = sync.begin_refresh();

        assert!(sync.apply(newer, Ok(vec![order(1), order(2)])).expect("apply"));
        assert!(!sync.apply(older, Ok(vec![order(1)])).expect("stale"));
        assert_eq!(sync.orders().len(), 2);

        let stale_failure = sync.apply(older, Err(OrderClientError::Server { status: 500 }));
        assert!(matches!(stale_failure, Ok(false)));
        assert_eq!(sync.orders().len(), 2);
        assert!(matches!(sync.view(), SnapshotView::Orders(_)));
    }

    #[test]
    fn finds_orders_by_id_not_position() {
        let mut sync = OrderListSync::default();
        let ticket = sync.begin_refresh();
        sync.apply(ticket, Ok(vec![order(7), order(3)]))
            .expect("apply");
        assert_eq!(sync.find(OrderId(3)).map(|o| o.instrument.as_str()), Some("SYM3"));
        assert!(sync.find(OrderId(1)).is_none());
    }
}
