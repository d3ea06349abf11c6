pub mod app;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod export;
pub mod filter;
pub mod handlers;
pub mod import;
pub mod models;
pub mod sort;
pub mod stats;
pub mod store;
pub mod ui;
pub mod state;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use store::{JsonFileStore, RecordStore};
