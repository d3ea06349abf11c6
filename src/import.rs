use crate::errors::DashboardError;
use crate::models::{PenaltyKind, Violation, parse_record_date};
use chrono::{Datelike, NaiveDate, Weekday};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use tracing::debug;

/// One uploaded row before validation. Headers may be the Turkish column names.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(alias = "sira_no", alias = "Sıra No", alias = "Sira No")]
    sequence: Option<String>,
    #[serde(alias = "tarih", alias = "Tarih")]
    date: Option<String>,
    #[serde(alias = "plaka_no", alias = "Plaka No", alias = "Plaka")]
    plate: Option<String>,
    #[serde(alias = "isim", alias = "İsim", alias = "Isim")]
    name: Option<String>,
    #[serde(alias = "kabahat", alias = "Kabahat", alias = "Kabahat Türü")]
    category: Option<String>,
    #[serde(alias = "ceza_miktari", alias = "Ceza Miktarı", alias = "Ceza Miktari")]
    amount: Option<String>,
    #[serde(alias = "ceza_turu", alias = "Ceza Türü", alias = "Ceza Turu")]
    kind: Option<String>,
    #[serde(alias = "ceza_detay", alias = "Ceza Detay", alias = "Ceza Detayı")]
    detail: Option<String>,
    #[serde(alias = "gun", alias = "Gün", alias = "Gun")]
    weekday: Option<String>,
    #[serde(alias = "mevsim", alias = "Mevsim")]
    season: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub total_rows: usize,
    pub imported: usize,
    pub skipped: usize,
}

/// Parses an uploaded CSV table into records.
///
/// Rows without a plate or category, or with an unreadable amount, are
/// skipped and counted. An upload with no usable row is an error.
pub fn parse_csv(input: &[u8]) -> Result<(Vec<Violation>, ImportReport), DashboardError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(detect_delimiter(input))
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input);

    let mut total_rows = 0usize;
    let mut skipped = 0usize;
    let mut records = Vec::new();

    for result in reader.deserialize::<RawRow>() {
        total_rows += 1;
        let row = match result {
            Ok(row) => row,
            Err(err) => {
                debug!(row = total_rows, "unreadable row: {err}");
                skipped += 1;
                continue;
            }
        };
        match clean_row(row, total_rows) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    if records.is_empty() {
        return Err(DashboardError::Import(format!(
            "no usable rows ({total_rows} read, {skipped} skipped)"
        )));
    }

    let report = ImportReport {
        total_rows,
        imported: records.len(),
        skipped,
    };
    Ok((records, report))
}

/// Turkish-locale spreadsheets separate columns with `;` since `,` is the decimal mark.
fn detect_delimiter(input: &[u8]) -> u8 {
    let header = input.split(|byte| *byte == b'\n').next().unwrap_or_default();
    let count = |needle: u8| header.iter().filter(|byte| **byte == needle).count();
    if count(b';') > count(b',') { b';' } else { b',' }
}

fn clean_row(row: RawRow, row_number: usize) -> Option<Violation> {
    let plate = non_empty(row.plate)?;
    let category = non_empty(row.category)?;
    let amount = match non_empty(row.amount) {
        Some(raw) => parse_amount(&raw)?,
        None => 0.0,
    };
    let kind = row
        .kind
        .as_deref()
        .and_then(PenaltyKind::parse)
        .unwrap_or(if amount == 0.0 {
            PenaltyKind::Suspension
        } else {
            PenaltyKind::Monetary
        });
    let sequence = row
        .sequence
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .unwrap_or(row_number as i64);

    let raw_date = row.date.unwrap_or_default();
    let parsed = parse_record_date(&raw_date);
    let date = parsed.map_or(raw_date, |date| date.format("%Y-%m-%d").to_string());

    let weekday = non_empty(row.weekday)
        .or_else(|| parsed.map(|d| weekday_name(d).to_string()))
        .unwrap_or_default();
    let season = non_empty(row.season)
        .or_else(|| parsed.map(|d| season_name(d).to_string()))
        .unwrap_or_default();

    Some(Violation {
        sequence,
        date,
        plate,
        name: row.name.unwrap_or_default(),
        category,
        amount,
        kind,
        detail: non_empty(row.detail),
        weekday,
        season,
    })
}

/// Currency text such as `1.250,50 TL`, `₺500` or `750.5`. Negative amounts are rejected.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_end_matches("TL")
        .trim_end_matches("TRY")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '₺')
        .collect();
    if cleaned.is_empty() {
        return Some(0.0);
    }

    let normalized = match (cleaned.contains('.'), cleaned.contains(',')) {
        (true, true) => cleaned.replace('.', "").replace(',', "."),
        (false, true) => cleaned.replace(',', "."),
        _ => cleaned,
    };
    let value: f64 = normalized.parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

pub fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Pazartesi",
        Weekday::Tue => "Salı",
        Weekday::Wed => "Çarşamba",
        Weekday::Thu => "Perşembe",
        Weekday::Fri => "Cuma",
        Weekday::Sat => "Cumartesi",
        Weekday::Sun => "Pazar",
    }
}

pub fn season_name(date: NaiveDate) -> &'static str {
    match date.month() {
        3..=5 => "İlkbahar",
        6..=8 => "Yaz",
        9..=11 => "Sonbahar",
        _ => "Kış",
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
