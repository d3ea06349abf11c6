use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/records", get(handlers::get_records))
        .route("/api/categories", get(handlers::get_categories))
        .route("/api/refetch", post(handlers::refetch))
        .route("/api/upload", post(handlers::upload))
        .route("/api/export/csv", get(handlers::export_csv))
        .route("/api/export/report", get(handlers::export_report))
        .with_state(state)
}
