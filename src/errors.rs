use axum::http::StatusCode;
use thiserror::Error;

pub const NO_DATA_MESSAGE: &str =
    "Henüz veri yüklenmemiş. CSV dosyası yükleyerek başlayın.";

/// Failures of the record pipeline: fetching, importing and exporting.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The store answered with zero rows.
    #[error("{}", NO_DATA_MESSAGE)]
    DataUnavailable,
    #[error("{0}")]
    Transport(String),
    #[error("export failed: {0}")]
    Export(String),
    #[error("import failed: {0}")]
    Import(String),
}

impl From<std::io::Error> for DashboardError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<DashboardError> for AppError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::DataUnavailable => Self::unavailable(err.to_string()),
            DashboardError::Import(_) => Self::bad_request(err.to_string()),
            DashboardError::Transport(_) | DashboardError::Export(_) => Self::internal(err),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashboard_errors_map_to_statuses() {
        let unavailable = AppError::from(DashboardError::DataUnavailable);
        assert_eq!(unavailable.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(unavailable.message, NO_DATA_MESSAGE);

        let import = AppError::from(DashboardError::Import("no rows".to_string()));
        assert_eq!(import.status, StatusCode::BAD_REQUEST);
        assert_eq!(import.message, "import failed: no rows");

        let transport = AppError::from(DashboardError::Transport("connection reset".to_string()));
        assert_eq!(transport.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(transport.message, "connection reset");
    }
}
