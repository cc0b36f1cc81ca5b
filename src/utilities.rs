//! Small helpers shared by the domain pages

use chrono::{Local, NaiveDate};
use std::cmp::Ordering;

use crate::models::TransactionStatus;

/// Generate and return a random RFC 4122 identifier
pub fn generate_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current local date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Case-insensitive prefix match. An empty prefix matches everything.
pub fn begins_with_ci(value: &str, prefix: &str) -> bool {
    let mut value_chars = value.chars().flat_map(char::to_lowercase);
    prefix
        .chars()
        .flat_map(char::to_lowercase)
        .all(|p| value_chars.next() == Some(p))
}

/// Human readable transaction status
pub fn format_status(status: TransactionStatus) -> &'static str {
    match status {
        TransactionStatus::New => "New",
        TransactionStatus::Confirmed => "Confirmed",
        TransactionStatus::Finalised => "Finalised",
    }
}

/// Value a column sorts by
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl SortValue {
    /// Numeric when the text parses as a number, text otherwise
    pub fn number_or_text(value: &str) -> Self {
        value
            .trim()
            .parse::<f64>()
            .map(SortValue::Number)
            .unwrap_or_else(|_| SortValue::Text(value.to_string()))
    }

    fn rank(&self) -> u8 {
        match self {
            SortValue::Number(_) => 0,
            SortValue::Text(_) => 1,
            SortValue::Date(_) => 2,
        }
    }

    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Date(a), SortValue::Date(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Stable sort of `data` by the value `sort_value` extracts from each record
pub fn sort_data_by<R, F>(mut data: Vec<R>, sort_value: F, is_ascending: bool) -> Vec<R>
where
    F: Fn(&R) -> SortValue,
{
    data.sort_by(|a, b| {
        let ordering = sort_value(a).compare(&sort_value(b));
        if is_ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
    data
}
