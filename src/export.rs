use crate::errors::DashboardError;
use crate::models::{Summary, Violation};
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tabled::{Table, Tabled, settings::Style};

const CATEGORY_WIDTH: usize = 40;

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ExportRow {
    #[serde(rename = "Sıra No")]
    #[tabled(rename = "Sıra No")]
    pub sequence: i64,
    #[serde(rename = "Tarih")]
    #[tabled(rename = "Tarih")]
    pub date: String,
    #[serde(rename = "Plaka No")]
    #[tabled(rename = "Plaka No")]
    pub plate: String,
    #[serde(rename = "İsim")]
    #[tabled(rename = "İsim")]
    pub name: String,
    #[serde(rename = "Kabahat Türü")]
    #[tabled(rename = "Kabahat Türü")]
    pub category: String,
    #[serde(rename = "Ceza")]
    #[tabled(rename = "Ceza")]
    pub penalty: String,
}

impl ExportRow {
    fn from_record(record: &Violation, truncate_category: bool) -> Self {
        let category = if truncate_category {
            truncate(&record.category, CATEGORY_WIDTH)
        } else {
            record.category.clone()
        };
        let date = record
            .parsed_date()
            .map_or_else(|| record.date.clone(), |date| date.format("%d.%m.%Y").to_string());

        Self {
            sequence: record.sequence,
            date,
            plate: record.plate.clone(),
            name: record.name.clone(),
            category,
            penalty: penalty_label(record),
        }
    }
}

/// Suspensions show their detail text (or a generic label); fines show the amount.
pub fn penalty_label(record: &Violation) -> String {
    if record.is_suspension() {
        record
            .detail
            .as_deref()
            .map(str::trim)
            .filter(|detail| !detail.is_empty())
            .unwrap_or("Men Cezası")
            .to_string()
    } else {
        format_currency(record.amount)
    }
}

/// Whole-lira amount with Turkish grouping, e.g. `1.250 ₺`.
pub fn format_currency(amount: f64) -> String {
    let whole = amount.round() as i64;
    format!("{} ₺", whole.to_formatted_string(&Locale::tr))
}

pub fn write_csv(records: &[Violation]) -> Result<Vec<u8>, DashboardError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer
            .serialize(ExportRow::from_record(record, false))
            .map_err(|err| DashboardError::Export(err.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|err| DashboardError::Export(err.to_string()))
}

/// Paginated plain-text table of the given records.
///
/// Each page carries the title and summary line on top and `Sayfa i / n`
/// underneath. The whole document is built in memory before it is returned.
pub fn render_report(
    records: &[Violation],
    summary: &Summary,
    page_size: usize,
    generated: NaiveDate,
) -> String {
    let page_size = page_size.max(1);
    let rows: Vec<ExportRow> = records
        .iter()
        .map(|record| ExportRow::from_record(record, true))
        .collect();
    let pages: Vec<&[ExportRow]> = if rows.is_empty() {
        vec![&rows[..]]
    } else {
        rows.chunks(page_size).collect()
    };
    let page_count = pages.len();

    let mut out = String::new();
    for (index, page) in pages.into_iter().enumerate() {
        if index > 0 {
            out.push('\u{c}');
        }
        out.push_str("Varaka Detay Listesi\n");
        out.push_str(&format!(
            "Oluşturulma: {} | Kayıt: {} | Toplam Ceza: {} | Ortalama: {}\n\n",
            generated.format("%d.%m.%Y"),
            summary.count.to_formatted_string(&Locale::tr),
            format_currency(summary.total),
            format_currency(summary.average),
        ));
        let table = Table::new(page.to_vec()).with(Style::markdown()).to_string();
        out.push_str(&table);
        out.push_str(&format!("\n\nSayfa {} / {}\n", index + 1, page_count));
    }
    out
}

/// Allows one export at a time.
#[derive(Debug, Default)]
pub struct ExportGate {
    busy: AtomicBool,
}

impl ExportGate {
    pub fn try_begin(&self) -> Option<ExportGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ExportGuard { gate: self })
    }
}

pub struct ExportGuard<'a> {
    gate: &'a ExportGate,
}

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let head: String = value.chars().take(width).collect();
    format!("{head}...")
}
