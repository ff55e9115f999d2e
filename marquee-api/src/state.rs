use std::sync::Arc;

use marquee_core::ReservationManager;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<ReservationManager>,
}

impl AppState {
    pub fn new(manager: Arc<ReservationManager>) -> Self {
        Self { manager }
    }
}
