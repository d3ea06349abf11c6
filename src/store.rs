use crate::errors::DashboardError;
use crate::models::Violation;
use serde::Serialize;
use std::{future::Future, path::Path, path::PathBuf};
use tokio::{
    fs,
    sync::{Mutex, broadcast},
};
use tracing::{debug, error, info};

pub const TABLE_NAME: &str = "varakalar";
const CHANGE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Row-level change notification. Only its arrival matters to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub table: &'static str,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind) -> Self {
        Self {
            kind,
            table: TABLE_NAME,
        }
    }
}

/// Backing table of violation records.
pub trait RecordStore: Send + Sync + 'static {
    /// Every row, ordered by date ascending.
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<Violation>, DashboardError>> + Send;

    /// Appends rows and returns how many were written.
    fn append(
        &self,
        records: Vec<Violation>,
    ) -> impl Future<Output = Result<usize, DashboardError>> + Send;

    /// Drops every existing row, then writes `records`.
    fn replace_all(
        &self,
        records: Vec<Violation>,
    ) -> impl Future<Output = Result<usize, DashboardError>> + Send;

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}

/// Orders by parsed date; rows without a usable date go last, keeping their relative order.
pub fn sort_by_date(records: &mut [Violation]) {
    records.sort_by_key(|record| match record.parsed_date() {
        Some(date) => (false, Some(date)),
        None => (true, None),
    });
}

/// Record table persisted as a JSON array on disk.
pub struct JsonFileStore {
    path: PathBuf,
    records: Mutex<Vec<Violation>>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl JsonFileStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, DashboardError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let records = load_records(&path).await;
        info!(path = %path.display(), rows = records.len(), "opened record store");
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);

        Ok(Self {
            path,
            records: Mutex::new(records),
            changes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn notify(&self, kind: ChangeKind) {
        // No receivers is fine; nobody is watching yet.
        let receivers = self.changes.send(ChangeEvent::new(kind)).unwrap_or(0);
        debug!(?kind, receivers, "change notification sent");
    }
}

impl RecordStore for JsonFileStore {
    async fn fetch_all(&self) -> Result<Vec<Violation>, DashboardError> {
        let mut records = self.records.lock().await.clone();
        sort_by_date(&mut records);
        Ok(records)
    }

    async fn append(&self, records: Vec<Violation>) -> Result<usize, DashboardError> {
        let written = records.len();
        {
            let mut rows = self.records.lock().await;
            let mut next = rows.clone();
            next.extend(records);
            persist_records(&self.path, &next).await?;
            *rows = next;
        }
        self.notify(ChangeKind::Insert);
        Ok(written)
    }

    async fn replace_all(&self, records: Vec<Violation>) -> Result<usize, DashboardError> {
        let written = records.len();
        {
            let mut rows = self.records.lock().await;
            persist_records(&self.path, &records).await?;
            *rows = records;
        }
        self.notify(ChangeKind::Delete);
        self.notify(ChangeKind::Insert);
        Ok(written)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}

async fn load_records(path: &Path) -> Vec<Violation> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(records) => records,
            Err(err) => {
                error!("failed to parse record file: {err}");
                Vec::new()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(err) => {
            error!("failed to read record file: {err}");
            Vec::new()
        }
    }
}

/// Writes to a sibling temp file first so a failed write never leaves a torn table.
async fn persist_records(path: &Path, records: &[Violation]) -> Result<(), DashboardError> {
    let payload = serde_json::to_vec_pretty(records)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, payload).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
