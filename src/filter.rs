use crate::models::{PenaltyKind, Violation, parse_record_date};
use crate::sort::{SortField, SortSpec};
use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindFilter {
    Monetary,
    Suspension,
}

impl KindFilter {
    pub fn parse(value: &str) -> Option<Self> {
        PenaltyKind::parse(value).map(|kind| match kind {
            PenaltyKind::Monetary => Self::Monetary,
            PenaltyKind::Suspension => Self::Suspension,
        })
    }

    fn matches(self, record: &Violation) -> bool {
        match self {
            Self::Monetary => record.is_monetary(),
            Self::Suspension => record.is_suspension(),
        }
    }
}

/// Inclusive date bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Both bounds must be present and parse, otherwise there is no range.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Option<Self> {
        let start = parse_record_date(start?)?;
        let end = parse_record_date(end?)?;
        Some(Self { start, end })
    }

    /// Records whose date does not parse never fall inside a range.
    fn contains(&self, record: &Violation) -> bool {
        record
            .parsed_date()
            .is_some_and(|date| date >= self.start && date <= self.end)
    }
}

/// Active filter dimensions. The default value filters nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub search: Option<String>,
    pub category: Option<String>,
    pub kind: Option<KindFilter>,
    pub date_range: Option<DateRange>,
    pub suspension_only: bool,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn matches(&self, record: &Violation) -> bool {
        if let Some(needle) = &self.search {
            let needle = needle.to_lowercase();
            let hit = [&record.plate, &record.name, &record.category]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &record.category != category {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if !kind.matches(record) {
                return false;
            }
        }
        if let Some(range) = &self.date_range {
            if !range.contains(record) {
                return false;
            }
        }
        if self.suspension_only && !record.is_suspension_related() {
            return false;
        }
        true
    }

    /// Surviving records in their original order.
    pub fn apply(&self, records: &[Violation]) -> Vec<Violation> {
        records
            .iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect()
    }
}

/// Table parameters (filters and sort column) as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub kind: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    #[serde(default)]
    pub suspension: bool,
    pub sort: Option<String>,
    pub dir: Option<String>,
    /// Column header the user just clicked, applied on top of `sort`/`dir`.
    pub toggle: Option<String>,
}

impl TableQuery {
    /// Blank values are treated as unset; an unknown kind filters nothing.
    pub fn to_spec(&self) -> FilterSpec {
        FilterSpec {
            search: non_blank(self.search.as_deref()).map(str::to_string),
            category: non_blank(self.category.as_deref()).map(str::to_string),
            kind: non_blank(self.kind.as_deref()).and_then(KindFilter::parse),
            date_range: DateRange::parse(
                non_blank(self.start.as_deref()),
                non_blank(self.end.as_deref()),
            ),
            suspension_only: self.suspension,
        }
    }

    pub fn sort_spec(&self) -> Option<SortSpec> {
        let current =
            SortSpec::from_params(non_blank(self.sort.as_deref()), self.dir.as_deref());
        match non_blank(self.toggle.as_deref()).and_then(SortField::parse) {
            Some(field) => Some(SortSpec::toggle(current, field)),
            None => current,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::SortDirection;

    fn violation(
        seq: i64,
        plate: &str,
        name: &str,
        category: &str,
        amount: f64,
        date: &str,
    ) -> Violation {
        Violation {
            sequence: seq,
            date: date.to_string(),
            plate: plate.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            amount,
            kind: PenaltyKind::Monetary,
            detail: None,
            weekday: String::new(),
            season: String::new(),
        }
    }

    fn sample() -> Vec<Violation> {
        let mut records = vec![
            violation(1, "34AB123", "Ayşe Yılmaz", "Hız İhlali", 500.0, "2024-01-05"),
            violation(2, "06CD456", "Mehmet Kaya", "Park İhlali", 0.0, "2024-02-10"),
            violation(3, "35EF789", "Zeynep Demir", "Hız İhlali", 750.0, "not-a-date"),
            violation(4, "34XY999", "Ali Veli", "Kırmızı Işık", 1200.0, "2024-03-20"),
            violation(5, "16GH012", "Can Öz", "Park İhlali", 300.0, "2024-02-28"),
        ];
        records[3].kind = PenaltyKind::Suspension;
        records[4].detail = Some("7 gün trafikten men".to_string());
        records
    }

    fn sequences(records: &[Violation]) -> Vec<i64> {
        records.iter().map(|record| record.sequence).collect()
    }

    #[test]
    fn empty_spec_is_identity() {
        let records = sample();
        let spec = FilterSpec::default();
        assert!(spec.is_empty());
        assert_eq!(spec.apply(&records), records);
    }

    #[test]
    fn search_matches_plate_name_or_category_case_insensitively() {
        let records = sample();
        let by_plate = FilterSpec {
            search: Some("34".to_string()),
            ..Default::default()
        };
        assert_eq!(sequences(&by_plate.apply(&records)), vec![1, 4]);

        let by_name = FilterSpec {
            search: Some("KAYA".to_string()),
            ..Default::default()
        };
        assert_eq!(sequences(&by_name.apply(&records)), vec![2]);

        let by_category = FilterSpec {
            search: Some("park".to_string()),
            ..Default::default()
        };
        assert_eq!(sequences(&by_category.apply(&records)), vec![2, 5]);
    }

    #[test]
    fn category_filter_is_exact() {
        let records = sample();
        let spec = FilterSpec {
            category: Some("Hız İhlali".to_string()),
            ..Default::default()
        };
        assert_eq!(sequences(&spec.apply(&records)), vec![1, 3]);

        let partial = FilterSpec {
            category: Some("Hız".to_string()),
            ..Default::default()
        };
        assert!(partial.apply(&records).is_empty());
    }

    #[test]
    fn kind_filter_uses_suspension_predicate() {
        let records = sample();
        let monetary = FilterSpec {
            kind: Some(KindFilter::Monetary),
            ..Default::default()
        };
        assert_eq!(sequences(&monetary.apply(&records)), vec![1, 3, 4, 5]);

        let suspension = FilterSpec {
            kind: Some(KindFilter::Suspension),
            ..Default::default()
        };
        assert_eq!(sequences(&suspension.apply(&records)), vec![2, 4]);
    }

    #[test]
    fn date_range_is_inclusive_and_excludes_unparseable_dates() {
        let records = sample();
        let spec = FilterSpec {
            date_range: DateRange::parse(Some("2024-01-05"), Some("2024-02-28")),
            ..Default::default()
        };
        assert_eq!(sequences(&spec.apply(&records)), vec![1, 2, 5]);

        let wide = FilterSpec {
            date_range: DateRange::parse(Some("2000-01-01"), Some("2100-01-01")),
            ..Default::default()
        };
        assert!(!sequences(&wide.apply(&records)).contains(&3));
    }

    #[test]
    fn date_range_requires_both_valid_bounds() {
        assert!(DateRange::parse(Some("2024-01-01"), None).is_none());
        assert!(DateRange::parse(None, Some("2024-01-01")).is_none());
        assert!(DateRange::parse(Some("2024-01-01"), Some("later")).is_none());

        let query = TableQuery {
            start: Some("2024-01-01".to_string()),
            end: Some(String::new()),
            ..Default::default()
        };
        assert!(query.to_spec().is_empty());
    }

    #[test]
    fn suspension_toggle_includes_detail_records() {
        let records = sample();
        let spec = FilterSpec {
            suspension_only: true,
            ..Default::default()
        };
        assert_eq!(sequences(&spec.apply(&records)), vec![2, 4, 5]);
    }

    #[test]
    fn combined_filters_equal_intersection() {
        let records = sample();
        let search = FilterSpec {
            search: Some("park".to_string()),
            ..Default::default()
        };
        let kind = FilterSpec {
            kind: Some(KindFilter::Monetary),
            ..Default::default()
        };
        let both = FilterSpec {
            search: search.search.clone(),
            kind: kind.kind,
            ..Default::default()
        };

        let left = search.apply(&records);
        let right = kind.apply(&records);
        let intersection: Vec<Violation> = left
            .into_iter()
            .filter(|record| right.contains(record))
            .collect();
        assert_eq!(both.apply(&records), intersection);
        assert_eq!(sequences(&intersection), vec![5]);
    }

    #[test]
    fn query_blank_values_are_inactive() {
        let query = TableQuery {
            search: Some("  ".to_string()),
            category: Some(String::new()),
            kind: Some("men".to_string()),
            ..Default::default()
        };
        let spec = query.to_spec();
        assert_eq!(spec.search, None);
        assert_eq!(spec.category, None);
        assert_eq!(spec.kind, Some(KindFilter::Suspension));
        assert_eq!(query.sort_spec(), None);
    }

    #[test]
    fn query_toggle_flips_current_column_or_starts_a_new_one() {
        let query = TableQuery {
            sort: Some("plate".to_string()),
            dir: Some("asc".to_string()),
            toggle: Some("plate".to_string()),
            ..Default::default()
        };
        let spec = query.sort_spec().unwrap();
        assert_eq!(spec.field, SortField::Plate);
        assert_eq!(spec.direction, SortDirection::Desc);

        let query = TableQuery {
            toggle: Some("amount".to_string()),
            ..query
        };
        assert_eq!(query.sort_spec(), Some(SortSpec::new(SortField::Amount)));

        let query = TableQuery {
            toggle: Some("colour".to_string()),
            ..query
        };
        assert_eq!(query.sort_spec().unwrap().direction, SortDirection::Asc);
    }
}
