use crate::errors::{AppError, DashboardError};
use crate::export::{penalty_label, render_report, write_csv};
use crate::filter::TableQuery;
use crate::import::parse_csv;
use crate::models::{
    DashboardData, DashboardResponse, RecordsResponse, TableRow, UploadResponse, Violation,
};
use crate::sort::SortSpec;
use crate::state::AppState;
use crate::stats::{
    category_list, compute_breakdown, compute_pareto, compute_summary, compute_top_plates,
};
use crate::store::RecordStore;
use crate::ui::render_index;
use axum::{
    extract::{Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Local;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    /// `replace` swaps the whole table; anything else appends.
    pub mode: Option<String>,
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let view = state.coordinator.view().await;
    Html(render_index(&view))
}

pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    Json(state.coordinator.status().await)
}

pub async fn refetch(State(state): State<AppState>) -> Json<DashboardResponse> {
    state.coordinator.refetch().await;
    Json(state.coordinator.status().await)
}

pub async fn get_records(
    State(state): State<AppState>,
    Query(query): Query<TableQuery>,
) -> Result<Json<RecordsResponse>, AppError> {
    let sort = query.sort_spec();
    let (data, records) = table_view(&state, &query, sort).await?;

    Ok(Json(RecordsResponse {
        total_count: data.records.len(),
        filtered_count: records.len(),
        summary: compute_summary(&records),
        breakdown: compute_breakdown(&records),
        pareto: compute_pareto(&records),
        top_plates: compute_top_plates(&records),
        sort,
        records: records.into_iter().map(table_row).collect(),
    }))
}

pub async fn get_categories(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    let data = current_data(&state).await?;
    Ok(Json(category_list(&data.records)))
}

pub async fn upload(
    State(state): State<AppState>,
    Query(params): Query<UploadQuery>,
    body: String,
) -> Result<Json<UploadResponse>, AppError> {
    let (records, report) = parse_csv(body.as_bytes())?;
    let store = state.coordinator.store();
    let replace = params.mode.as_deref() == Some("replace");
    let written = if replace {
        store.replace_all(records).await?
    } else {
        store.append(records).await?
    };
    info!(
        written,
        skipped = report.skipped,
        replace,
        "upload stored"
    );

    // Completion signal: refresh now so the caller reads its own write.
    state.coordinator.refetch().await;

    Ok(Json(UploadResponse {
        total_rows: report.total_rows,
        imported: written,
        skipped: report.skipped,
    }))
}

pub async fn export_csv(
    State(state): State<AppState>,
    Query(query): Query<TableQuery>,
) -> Result<Response, AppError> {
    let Some(_guard) = state.exports.try_begin() else {
        return Err(AppError::conflict("bir dışa aktarma zaten sürüyor"));
    };
    let (_, records) = table_view(&state, &query, query.sort_spec()).await?;

    let bytes = tokio::task::spawn_blocking(move || write_csv(&records))
        .await
        .map_err(|err| DashboardError::Export(err.to_string()))
        .and_then(|result| result)
        .inspect_err(|err| warn!("csv export failed: {err}"))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"varakalar.csv\""),
        ],
        bytes,
    )
        .into_response())
}

pub async fn export_report(
    State(state): State<AppState>,
    Query(query): Query<TableQuery>,
) -> Result<Response, AppError> {
    let Some(_guard) = state.exports.try_begin() else {
        return Err(AppError::conflict("bir dışa aktarma zaten sürüyor"));
    };
    let (_, records) = table_view(&state, &query, query.sort_spec()).await?;
    let page_size = state.config.export_page_size;
    let generated = Local::now().date_naive();

    let report = tokio::task::spawn_blocking(move || {
        let summary = compute_summary(&records);
        render_report(&records, &summary, page_size, generated)
    })
    .await
    .map_err(|err| DashboardError::Export(err.to_string()))
    .inspect_err(|err| warn!("report export failed: {err}"))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"varakalar-rapor.txt\""),
        ],
        report,
    )
        .into_response())
}

async fn current_data(state: &AppState) -> Result<Arc<DashboardData>, AppError> {
    state.coordinator.data().await.map_err(AppError::unavailable)
}

/// Snapshot plus its filtered and sorted table rows.
async fn table_view(
    state: &AppState,
    query: &TableQuery,
    sort: Option<SortSpec>,
) -> Result<(Arc<DashboardData>, Vec<Violation>), AppError> {
    let data = current_data(state).await?;
    let mut records = query.to_spec().apply(&data.records);
    if let Some(sort) = sort {
        sort.sort(&mut records);
    }
    Ok((data, records))
}

fn table_row(record: Violation) -> TableRow {
    TableRow {
        suspension: record.is_suspension(),
        penalty: penalty_label(&record),
        record,
    }
}
