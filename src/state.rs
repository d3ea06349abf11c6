use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::export::ExportGate;
use crate::store::JsonFileStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub coordinator: Arc<Coordinator<JsonFileStore>>,
    pub exports: Arc<ExportGate>,
}

impl AppState {
    pub fn new(config: Config, store: JsonFileStore) -> Self {
        Self {
            config: Arc::new(config),
            coordinator: Arc::new(Coordinator::new(Arc::new(store))),
            exports: Arc::new(ExportGate::default()),
        }
    }
}
