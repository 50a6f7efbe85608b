use std::sync::Arc;

use tus_core::TusServer;

#[derive(Clone)]
pub struct TusState {
    pub server: Arc<TusServer>,
}

impl TusState {
    pub fn new(server: TusServer) -> Self {
        Self {
            server: Arc::new(server),
        }
    }
}
