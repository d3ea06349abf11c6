use crate::sort::SortSpec;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How a violation was penalised. Stored as `"para"` / `"men"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PenaltyKind {
    #[default]
    #[serde(rename = "para")]
    Monetary,
    #[serde(rename = "men")]
    Suspension,
}

impl PenaltyKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "para" | "monetary" => Some(Self::Monetary),
            "men" | "suspension" => Some(Self::Suspension),
            _ => None,
        }
    }
}

/// A single traffic-violation record (varaka).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub sequence: i64,
    /// Raw date text as stored; may be empty or malformed.
    #[serde(default)]
    pub date: String,
    pub plate: String,
    #[serde(default)]
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub kind: PenaltyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default)]
    pub weekday: String,
    #[serde(default)]
    pub season: String,
}

impl Violation {
    /// Non-monetary ("men") penalty: flagged as a suspension or carrying no amount.
    ///
    /// This is the single definition used by the kind filter, the table
    /// breakdown and the monetary/suspension split.
    pub fn is_suspension(&self) -> bool {
        self.kind == PenaltyKind::Suspension || self.amount == 0.0
    }

    pub fn is_monetary(&self) -> bool {
        self.amount > 0.0
    }

    pub fn has_detail(&self) -> bool {
        self.detail
            .as_deref()
            .is_some_and(|detail| !detail.trim().is_empty())
    }

    /// Broader suspension view: a suspension, or any record carrying penalty detail text.
    pub fn is_suspension_related(&self) -> bool {
        self.is_suspension() || self.has_detail()
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_record_date(&self.date)
    }
}

/// Lenient date parsing for record dates.
///
/// Accepts `YYYY-MM-DD`, a timestamp starting with one, and the Turkish
/// `DD.MM.YYYY` / `DD/MM/YYYY` forms. Anything else is `None`.
pub fn parse_record_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if value.len() > 10 && value.is_char_boundary(10) {
        let (head, tail) = value.split_at(10);
        if tail.starts_with('T') || tail.starts_with(' ') {
            if let Ok(date) = NaiveDate::parse_from_str(head, "%Y-%m-%d") {
                return Some(date);
            }
        }
    }
    ["%d.%m.%Y", "%d/%m/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Summary {
    pub count: usize,
    pub total: f64,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParetoEntry {
    pub category: String,
    pub count: usize,
    pub percentage: f64,
    pub cumulative_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlateEntry {
    pub plate: String,
    pub total: f64,
    pub count: usize,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct PenaltyBreakdown {
    pub records: usize,
    pub monetary: usize,
    pub suspensions: usize,
    pub monetary_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct CategoryOverview {
    pub distinct: usize,
    pub most_common: Option<CategoryCount>,
    pub average_per_category: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyCount {
    pub month: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Everything derived from one fetched snapshot of the record table.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    pub records: Vec<Violation>,
    pub summary: Summary,
    pub pareto: Vec<ParetoEntry>,
    pub top_plates: Vec<PlateEntry>,
    pub suspensions: Vec<Violation>,
    pub breakdown: PenaltyBreakdown,
    pub categories: CategoryOverview,
    pub distribution: Vec<CategoryCount>,
    pub monthly: Vec<MonthlyCount>,
    pub date_span: Option<DateSpan>,
    pub vital_few: usize,
}

/// Tri-state coordinator view as served to the page.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DashboardView {
    Loading,
    Error { message: String },
    Ready(DashboardPayload),
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardPayload {
    pub record_count: usize,
    pub suspension_count: usize,
    pub summary: Summary,
    pub pareto: Vec<ParetoEntry>,
    pub top_plates: Vec<PlateEntry>,
    pub breakdown: PenaltyBreakdown,
    pub categories: CategoryOverview,
    pub distribution: Vec<CategoryCount>,
    pub monthly: Vec<MonthlyCount>,
    pub date_span: Option<DateSpan>,
    pub vital_few: usize,
}

impl From<&DashboardData> for DashboardPayload {
    fn from(data: &DashboardData) -> Self {
        Self {
            record_count: data.records.len(),
            suspension_count: data.suspensions.len(),
            summary: data.summary.clone(),
            pareto: data.pareto.clone(),
            top_plates: data.top_plates.clone(),
            breakdown: data.breakdown.clone(),
            categories: data.categories.clone(),
            distribution: data.distribution.clone(),
            monthly: data.monthly.clone(),
            date_span: data.date_span,
            vital_few: data.vital_few,
        }
    }
}

/// `/api/dashboard` body: the view plus whether a fetch is still running.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub loading: bool,
    #[serde(flatten)]
    pub view: DashboardView,
}

/// A table row as the page renders it, with the penalty already classified.
#[derive(Debug, Clone, Serialize)]
pub struct TableRow {
    #[serde(flatten)]
    pub record: Violation,
    pub suspension: bool,
    pub penalty: String,
}

#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    pub total_count: usize,
    pub filtered_count: usize,
    pub summary: Summary,
    pub breakdown: PenaltyBreakdown,
    pub pareto: Vec<ParetoEntry>,
    pub top_plates: Vec<PlateEntry>,
    /// Sort actually applied, so the page can send it back with the next toggle.
    pub sort: Option<SortSpec>,
    pub records: Vec<TableRow>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub total_rows: usize,
    pub imported: usize,
    pub skipped: usize,
}
