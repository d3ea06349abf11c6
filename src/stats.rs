use crate::models::{
    CategoryCount, CategoryOverview, DashboardData, DateSpan, MonthlyCount, ParetoEntry,
    PenaltyBreakdown, PlateEntry, Summary, Violation,
};
use chrono::Datelike;
use std::collections::{BTreeMap, HashMap};

pub const PARETO_LIMIT: usize = 10;
pub const TOP_PLATE_LIMIT: usize = 3;
const VITAL_FEW_THRESHOLD: f64 = 80.0;

/// Recomputes every derived structure from one snapshot of records.
pub fn build_dashboard(records: Vec<Violation>) -> DashboardData {
    let summary = compute_summary(&records);
    let pareto = compute_pareto(&records);
    let top_plates = compute_top_plates(&records);
    let suspensions = suspension_records(&records);
    let vital_few = vital_few(&pareto);

    DashboardData {
        summary,
        top_plates,
        suspensions,
        vital_few,
        breakdown: compute_breakdown(&records),
        categories: category_overview(&records),
        distribution: category_distribution(&records),
        monthly: monthly_trend(&records),
        date_span: date_span(&records),
        pareto,
        records,
    }
}

/// Count, sum of amounts (zeros included) and mean; all zero for no records.
pub fn compute_summary(records: &[Violation]) -> Summary {
    let total: f64 = records.iter().map(|record| record.amount).sum();
    let count = records.len();
    let average = if count == 0 { 0.0 } else { total / count as f64 };

    Summary {
        count,
        total,
        average,
    }
}

/// Categories ranked by frequency, at most [`PARETO_LIMIT`] entries.
///
/// Percentages are relative to `records.len()`; ties keep first-seen order.
/// The cumulative column is accumulated before truncation so it reflects
/// the position of the entry in the full ranking.
pub fn compute_pareto(records: &[Violation]) -> Vec<ParetoEntry> {
    let total = records.len();
    let mut ranked = category_distribution(records);
    // `sort_by` is stable, so equal counts stay in first-seen order.
    ranked.sort_by(|a, b| b.count.cmp(&a.count));

    let mut cumulative = 0.0;
    ranked
        .into_iter()
        .take(PARETO_LIMIT)
        .map(|entry| {
            let percentage = percentage(entry.count, total);
            cumulative += percentage;
            ParetoEntry {
                category: entry.category,
                count: entry.count,
                percentage,
                cumulative_percentage: cumulative,
            }
        })
        .collect()
}

/// Plates ranked by total penalty, at most [`TOP_PLATE_LIMIT`] entries.
///
/// `average` is `total / count` rounded half away from zero, so a total of 5
/// over 2 records averages to 3.
pub fn compute_top_plates(records: &[Violation]) -> Vec<PlateEntry> {
    let mut order: Vec<PlateEntry> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let slot = *index.entry(record.plate.as_str()).or_insert_with(|| {
            order.push(PlateEntry {
                plate: record.plate.clone(),
                total: 0.0,
                count: 0,
                average: 0.0,
            });
            order.len() - 1
        });
        let entry = &mut order[slot];
        entry.total += record.amount;
        entry.count += 1;
    }

    for entry in &mut order {
        entry.average = (entry.total / entry.count as f64).round();
    }

    order.sort_by(|a, b| b.total.total_cmp(&a.total));
    order.truncate(TOP_PLATE_LIMIT);
    order
}

/// Records shown under the suspension toggle: suspensions plus anything with detail text.
pub fn suspension_records(records: &[Violation]) -> Vec<Violation> {
    records
        .iter()
        .filter(|record| record.is_suspension_related())
        .cloned()
        .collect()
}

pub fn compute_breakdown(records: &[Violation]) -> PenaltyBreakdown {
    records
        .iter()
        .fold(PenaltyBreakdown::default(), |mut acc, record| {
            acc.records += 1;
            if record.is_monetary() {
                acc.monetary += 1;
                acc.monetary_total += record.amount;
            }
            if record.is_suspension() {
                acc.suspensions += 1;
            }
            acc
        })
}

/// Every category with its count, in first-seen order.
pub fn category_distribution(records: &[Violation]) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        match index.get(record.category.as_str()) {
            Some(&slot) => counts[slot].count += 1,
            None => {
                index.insert(record.category.as_str(), counts.len());
                counts.push(CategoryCount {
                    category: record.category.clone(),
                    count: 1,
                });
            }
        }
    }

    counts
}

pub fn category_overview(records: &[Violation]) -> CategoryOverview {
    let distribution = category_distribution(records);
    if distribution.is_empty() {
        return CategoryOverview::default();
    }

    let mut most_common: Option<&CategoryCount> = None;
    for entry in &distribution {
        if most_common.is_none_or(|best| entry.count > best.count) {
            most_common = Some(entry);
        }
    }

    let average = (records.len() as f64 / distribution.len() as f64).round() as u64;

    CategoryOverview {
        distinct: distribution.len(),
        most_common: most_common.cloned(),
        average_per_category: average,
    }
}

/// Distinct categories in lexical order, for the filter picker.
pub fn category_list(records: &[Violation]) -> Vec<String> {
    let mut categories: Vec<String> = category_distribution(records)
        .into_iter()
        .map(|entry| entry.category)
        .collect();
    categories.sort();
    categories
}

/// Record counts per `YYYY-MM`, ascending. Unparseable dates are skipped.
pub fn monthly_trend(records: &[Violation]) -> Vec<MonthlyCount> {
    let mut buckets: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for date in records.iter().filter_map(Violation::parsed_date) {
        *buckets.entry((date.year(), date.month())).or_default() += 1;
    }

    buckets
        .into_iter()
        .map(|((year, month), count)| MonthlyCount {
            month: format!("{year}-{month:02}"),
            count,
        })
        .collect()
}

pub fn date_span(records: &[Violation]) -> Option<DateSpan> {
    let mut dates = records.iter().filter_map(Violation::parsed_date);
    let first = dates.next()?;
    let (start, end) = dates.fold((first, first), |(start, end), date| {
        (start.min(date), end.max(date))
    });
    Some(DateSpan { start, end })
}

/// Number of leading Pareto entries needed to reach 80% cumulative share.
pub fn vital_few(pareto: &[ParetoEntry]) -> usize {
    pareto
        .iter()
        .position(|entry| entry.cumulative_percentage >= VITAL_FEW_THRESHOLD - 1e-9)
        .map_or(pareto.len(), |position| position + 1)
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}
