use std::{sync::Arc, time::Duration};

use crate::store::EventStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EventStore>,
    pub store_timeout: Duration,
}

impl AppState {
    pub fn new(store: Arc<dyn EventStore>, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
        }
    }
}
