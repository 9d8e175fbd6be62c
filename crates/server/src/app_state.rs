use crate::store::OrderStore;

#[derive(Clone, Default)]
pub(crate) struct AppState {
    pub(crate) store: OrderStore,
}
