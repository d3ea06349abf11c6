use crate::models::Violation;
use serde::Serialize;
use std::cmp::Ordering;

/// Columns the record table can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Sequence,
    Date,
    Plate,
    Name,
    Category,
    Amount,
}

impl SortField {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "sequence" => Some(Self::Sequence),
            "date" => Some(Self::Date),
            "plate" => Some(Self::Plate),
            "name" => Some(Self::Name),
            "category" => Some(Self::Category),
            "amount" => Some(Self::Amount),
            _ => None,
        }
    }

    /// Unparseable dates stay after every parsed date whichever way the table runs.
    fn compare(self, a: &Violation, b: &Violation, direction: SortDirection) -> Ordering {
        let ordering = match self {
            Self::Sequence => a.sequence.cmp(&b.sequence),
            Self::Date => match (a.parsed_date(), b.parsed_date()) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                (None, None) => a.date.cmp(&b.date),
            },
            Self::Plate => a.plate.cmp(&b.plate),
            Self::Name => a.name.cmp(&b.name),
            Self::Category => a.category.cmp(&b.category),
            Self::Amount => a.amount.total_cmp(&b.amount),
        };
        direction.apply(ordering)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// Serialized as `{"field": "plate", "dir": "asc"}`, the same names the query string uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub field: SortField,
    #[serde(rename = "dir")]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    /// Clicking a column header: same field flips direction, a new field starts ascending.
    pub fn toggle(current: Option<Self>, field: SortField) -> Self {
        match current {
            Some(spec) if spec.field == field => Self {
                field,
                direction: match spec.direction {
                    SortDirection::Asc => SortDirection::Desc,
                    SortDirection::Desc => SortDirection::Asc,
                },
            },
            _ => Self::new(field),
        }
    }

    pub fn from_params(field: Option<&str>, direction: Option<&str>) -> Option<Self> {
        let field = SortField::parse(field?)?;
        let direction = direction
            .and_then(SortDirection::parse)
            .unwrap_or_default();
        Some(Self { field, direction })
    }

    /// Stable sort; equal keys keep their incoming order in both directions.
    pub fn sort(&self, records: &mut [Violation]) {
        records.sort_by(|a, b| self.field.compare(a, b, self.direction));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PenaltyKind;

    fn violation(seq: i64, plate: &str, amount: f64, date: &str) -> Violation {
        Violation {
            sequence: seq,
            date: date.to_string(),
            plate: plate.to_string(),
            name: format!("Kişi {seq}"),
            category: "Hız İhlali".to_string(),
            amount,
            kind: PenaltyKind::Monetary,
            detail: None,
            weekday: String::new(),
            season: String::new(),
        }
    }

    fn sequences(records: &[Violation]) -> Vec<i64> {
        records.iter().map(|record| record.sequence).collect()
    }

    #[test]
    fn sorts_by_amount_both_directions() {
        let mut records = vec![
            violation(1, "A", 300.0, ""),
            violation(2, "B", 100.0, ""),
            violation(3, "C", 200.0, ""),
        ];
        SortSpec::new(SortField::Amount).sort(&mut records);
        assert_eq!(sequences(&records), vec![2, 3, 1]);

        let desc = SortSpec {
            field: SortField::Amount,
            direction: SortDirection::Desc,
        };
        desc.sort(&mut records);
        assert_eq!(sequences(&records), vec![1, 3, 2]);
    }

    #[test]
    fn equal_keys_keep_incoming_order() {
        let mut records = vec![
            violation(1, "B", 0.0, ""),
            violation(2, "A", 0.0, ""),
            violation(3, "B", 0.0, ""),
            violation(4, "A", 0.0, ""),
        ];
        SortSpec::new(SortField::Plate).sort(&mut records);
        assert_eq!(sequences(&records), vec![2, 4, 1, 3]);

        let mut records = vec![
            violation(1, "B", 0.0, ""),
            violation(2, "A", 0.0, ""),
            violation(3, "B", 0.0, ""),
        ];
        SortSpec {
            field: SortField::Plate,
            direction: SortDirection::Desc,
        }
        .sort(&mut records);
        assert_eq!(sequences(&records), vec![1, 3, 2]);
    }

    #[test]
    fn date_sort_uses_calendar_order() {
        let mut records = vec![
            violation(1, "A", 0.0, "10.02.2024"),
            violation(2, "A", 0.0, ""),
            violation(3, "A", 0.0, "2024-01-31"),
        ];
        SortSpec::new(SortField::Date).sort(&mut records);
        assert_eq!(sequences(&records), vec![3, 1, 2]);

        let mut records = vec![
            violation(1, "A", 0.0, "2024-01-01"),
            violation(2, "A", 0.0, "bogus"),
            violation(3, "A", 0.0, "2024-02-01"),
        ];
        SortSpec {
            field: SortField::Date,
            direction: SortDirection::Desc,
        }
        .sort(&mut records);
        assert_eq!(sequences(&records), vec![3, 1, 2]);
    }

    #[test]
    fn toggle_flips_same_field_and_resets_new_field() {
        let first = SortSpec::toggle(None, SortField::Name);
        assert_eq!(first.direction, SortDirection::Asc);
        let second = SortSpec::toggle(Some(first), SortField::Name);
        assert_eq!(second.direction, SortDirection::Desc);
        let other = SortSpec::toggle(Some(second), SortField::Plate);
        assert_eq!(other, SortSpec::new(SortField::Plate));
    }

    #[test]
    fn serializes_with_query_names() {
        let spec = SortSpec {
            field: SortField::Amount,
            direction: SortDirection::Desc,
        };
        assert_eq!(
            serde_json::to_value(spec).unwrap(),
            serde_json::json!({ "field": "amount", "dir": "desc" })
        );
    }

    #[test]
    fn from_params_rejects_unknown_fields() {
        assert_eq!(SortSpec::from_params(Some("colour"), Some("asc")), None);
        assert_eq!(
            SortSpec::from_params(Some("amount"), Some("DESC")),
            Some(SortSpec {
                field: SortField::Amount,
                direction: SortDirection::Desc
            })
        );
        assert_eq!(
            SortSpec::from_params(Some("plate"), None),
            Some(SortSpec::new(SortField::Plate))
        );
    }
}
