use crate::auth::AuthGate;
use crate::insights::InsightService;
use crate::storage::JsonFileStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JsonFileStore>,
    pub auth: Arc<AuthGate>,
    pub insights: Arc<InsightService>,
}

impl AppState {
    pub fn new(store: JsonFileStore, auth: AuthGate, insights: InsightService) -> Self {
        Self {
            store: Arc::new(store),
            auth: Arc::new(auth),
            insights: Arc::new(insights),
        }
    }
}
