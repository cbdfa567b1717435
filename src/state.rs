use std::sync::Arc;

use axum::extract::FromRef;

use crate::{config::Config, store::DataStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DataStore>,
    pub config: Config,
}

impl FromRef<AppState> for Arc<dyn DataStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
