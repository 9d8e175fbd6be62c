use std::sync::Arc;

use shared::domain::{Order, OrderId};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub mod config;
pub mod error;
pub mod form;
pub mod service;
pub mod status;
pub mod sync;

pub use config::{load_client_config, ClientConfig};
pub use error::{OrderClientError, OrderResult};
pub use form::{FormField, OrderDraft, OrderFormState};
pub use service::{HttpOrderService, OrderService};
pub use status::{Status, StatusChannel};
pub use sync::{OrderListSync, SnapshotView};

const CREATED_MESSAGE: &str = "Order created successfully!";
const EXECUTED_MESSAGE: &str = "Order executed successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    CreateOrder,
    ExecuteOrder(OrderId),
}

impl Mutation {
    fn success_message(&self) -> &'static str {
        match self {
            Mutation::CreateOrder => CREATED_MESSAGE,
            Mutation::ExecuteOrder(_) => EXECUTED_MESSAGE,
        }
    }
}

/// Lifecycle of the most recent mutating action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    InFlight(Mutation),
    Succeeded(Mutation),
    Failed(Mutation),
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeskEvent {
    StatusChanged(Status),
    DraftChanged(OrderDraft),
    RequestStateChanged(RequestState),
    SnapshotReplaced { count: usize },
    SnapshotCleared { reason: String },
}

#[derive(Default)]
struct DeskState {
    form: OrderFormState,
    sync: OrderListSync,
    status: StatusChannel,
    request: RequestState,
}

/// Owns the draft, the order snapshot and the status line, and runs user
/// actions against the order service.
///
/// At most one mutating action (create or execute) runs at a time; a second
/// one is rejected with [`OrderClientError::Busy`]. Refreshes may run at any
/// time. Every action leaves its outcome in the status line; the returned
/// `Result` carries the same outcome for programmatic callers.
pub struct OrderDesk {
    service: Arc<dyn OrderService>,
    inner: Mutex<DeskState>,
    mutation_gate: Mutex<()>,
    events: broadcast::Sender<DeskEvent>,
}

impl OrderDesk {
    pub fn new(service: Arc<dyn OrderService>) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            service,
            inner: Mutex::new(DeskState::default()),
            mutation_gate: Mutex::new(()),
            events,
        })
    }

    pub fn connect(config: ClientConfig) -> OrderResult<Arc<Self>> {
        info!(service_url = %config.service_url, "using order service");
        Ok(Self::new(Arc::new(HttpOrderService::new(config)?)))
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<DeskEvent> {
        self.events.subscribe()
    }

    pub async fn status(&self) -> Status {
        self.inner.lock().await.status.current().clone()
    }

    pub async fn draft(&self) -> OrderDraft {
        self.inner.lock().await.form.draft().clone()
    }

    pub async fn request_state(&self) -> RequestState {
        self.inner.lock().await.request
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.inner.lock().await.sync.orders().to_vec()
    }

    pub async fn find_order(&self, order_id: OrderId) -> Option<Order> {
        self.inner.lock().await.sync.find(order_id).cloned()
    }

    /// Runs `f` against the current snapshot view.
    pub async fn with_snapshot<R>(&self, f: impl FnOnce(SnapshotView<'_>) -> R) -> R {
        let inner = self.inner.lock().await;
        f(inner.sync.view())
    }

    pub async fn update_field(&self, field: FormField, value: impl Into<String>) {
        let mut inner = self.inner.lock().await;
        inner.form.update(field, value);
        self.emit(DeskEvent::DraftChanged(inner.form.draft().clone()));
    }

    pub async fn reset_form(&self) {
        let mut inner = self.inner.lock().await;
        inner.form.reset();
        self.emit(DeskEvent::DraftChanged(inner.form.draft().clone()));
    }

    /// Replaces the snapshot with the service's current order list.
    pub async fn refresh(&self) -> OrderResult<usize> {
        match self.sync_snapshot().await {
            Ok(count) => Ok(count),
            Err(error) => {
                let mut inner = self.inner.lock().await;
                self.set_error(&mut inner, error.to_string());
                Err(error)
            }
        }
    }

    /// Single-order lookup straight from the service; the snapshot is untouched.
    pub async fn fetch_order(&self, order_id: OrderId) -> OrderResult<Order> {
        self.service.get_order(order_id).await
    }

    /// Validates the draft and creates the order. The draft is reset only
    /// once the service confirms the order.
    pub async fn submit_order(&self) -> OrderResult<Order> {
        let Ok(_gate) = self.mutation_gate.try_lock() else {
            return Err(self.reject_busy().await);
        };

        let new_order = {
            let mut inner = self.inner.lock().await;
            self.clear_status(&mut inner);
            match inner.form.validate() {
                Ok(order) => {
                    self.set_request(&mut inner, RequestState::InFlight(Mutation::CreateOrder));
                    order
                }
                Err(error) => {
                    self.set_request(&mut inner, RequestState::Failed(Mutation::CreateOrder));
                    self.set_error(&mut inner, error.to_string());
                    return Err(error);
                }
            }
        };

        info!(
            instrument = %new_order.instrument,
            way = %new_order.way,
            price = %new_order.price,
            qty = new_order.qty,
            "submitting order"
        );
        match self.service.create_order(&new_order).await {
            Ok(order) => {
                {
                    let mut inner = self.inner.lock().await;
                    inner.form.reset();
                    self.emit(DeskEvent::DraftChanged(inner.form.draft().clone()));
                }
                self.complete_mutation(Mutation::CreateOrder).await;
                Ok(order)
            }
            Err(error) => {
                warn!(%error, "order submission failed");
                self.fail_mutation(Mutation::CreateOrder, &error).await;
                Err(error)
            }
        }
    }

    /// Executes the order with the given service-assigned id.
    pub async fn execute_order(&self, order_id: OrderId) -> OrderResult<Order> {
        let Ok(_gate) = self.mutation_gate.try_lock() else {
            return Err(self.reject_busy().await);
        };

        let mutation = Mutation::ExecuteOrder(order_id);
        {
            let mut inner = self.inner.lock().await;
            self.clear_status(&mut inner);
            self.set_request(&mut inner, RequestState::InFlight(mutation));
        }

        info!(%order_id, "executing order");
        match self.service.execute_order(order_id).await {
            Ok(order) => {
                self.complete_mutation(mutation).await;
                Ok(order)
            }
            Err(error) => {
                warn!(%order_id, %error, "order execution failed");
                self.fail_mutation(mutation, &error).await;
                Err(error)
            }
        }
    }

    /// Records success and resynchronises. A failed follow-up refresh leaves
    /// the mutation applied and is reported in the status line.
    async fn complete_mutation(&self, mutation: Mutation) {
        {
            let mut inner = self.inner.lock().await;
            inner.status.set_message(mutation.success_message());
            self.emit(DeskEvent::StatusChanged(inner.status.current().clone()));
        }

        let refreshed = self.sync_snapshot().await;

        let mut inner = self.inner.lock().await;
        if let Err(error) = refreshed {
            warn!(?mutation, %error, "refresh after mutation failed");
            self.set_error(
                &mut inner,
                format!(
                    "{} But refreshing the order list failed: {error}",
                    mutation.success_message()
                ),
            );
        }
        self.set_request(&mut inner, RequestState::Succeeded(mutation));
    }

    async fn fail_mutation(&self, mutation: Mutation, error: &OrderClientError) {
        let mut inner = self.inner.lock().await;
        self.set_request(&mut inner, RequestState::Failed(mutation));
        self.set_error(&mut inner, error.to_string());
    }

    async fn reject_busy(&self) -> OrderClientError {
        let error = OrderClientError::Busy;
        let mut inner = self.inner.lock().await;
        warn!(request = ?inner.request, "rejected overlapping order action");
        self.set_error(&mut inner, error.to_string());
        error
    }

    async fn sync_snapshot(&self) -> OrderResult<usize> {
        let ticket = self.inner.lock().await.sync.begin_refresh();
        let result = self.service.list_orders().await;

        let mut inner = self.inner.lock().await;
        match inner.sync.apply(ticket, result) {
            Ok(applied) => {
                let count = inner.sync.orders().len();
                if applied {
                    self.emit(DeskEvent::SnapshotReplaced { count });
                }
                Ok(count)
            }
            Err(error) => {
                if matches!(inner.sync.view(), SnapshotView::Unavailable(_)) {
                    self.emit(DeskEvent::SnapshotCleared {
                        reason: error.to_string(),
                    });
                }
                Err(error)
            }
        }
    }

    fn clear_status(&self, inner: &mut DeskState) {
        inner.status.clear();
        self.emit(DeskEvent::StatusChanged(Status::None));
    }

    fn set_error(&self, inner: &mut DeskState, message: String) {
        inner.status.set_error(message);
        self.emit(DeskEvent::StatusChanged(inner.status.current().clone()));
    }

    fn set_request(&self, inner: &mut DeskState, request: RequestState) {
        inner.request = request;
        self.emit(DeskEvent::RequestStateChanged(request));
    }

    fn emit(&self, event: DeskEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
