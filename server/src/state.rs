use std::sync::Arc;

use crate::services::ReservationEngine;
use crate::store::CapacityStore;

pub struct AppState<S: CapacityStore> {
    pub engine: Arc<ReservationEngine<S>>,
}

impl<S: CapacityStore> AppState<S> {
    pub fn new(engine: Arc<ReservationEngine<S>>) -> Self {
        Self { engine }
    }
}

// Derived Clone would require `S: Clone`.
impl<S: CapacityStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}
