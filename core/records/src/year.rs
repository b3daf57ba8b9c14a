//! FILENAME: core/records/src/year.rs
//! PURPOSE: Collection year of a survey record.
//! CONTEXT: Survey files mix several date layouts in the same column, and
//! some cells are blank or garbage. Every value is coerced: anything that
//! cannot be read as a date becomes `Year::Unknown` instead of an error.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar year of a record, or the unknown-year bucket.
///
/// The derived ordering places every known year (ascending) before `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Year {
    Known(i32),
    Unknown,
}

/// Date-time layouts accepted for `datecollected`, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Date-only layouts accepted for `datecollected`, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

impl Year {
    /// Returns the numeric year, if known.
    pub fn value(&self) -> Option<i32> {
        match self {
            Year::Known(y) => Some(*y),
            Year::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Year::Known(_))
    }

    /// Extracts the year from a raw collection date string.
    pub fn from_collection_date(raw: &str) -> Year {
        let text = raw.trim();
        if text.is_empty() {
            return Year::Unknown;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Year::Known(dt.year());
        }

        for format in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
                return Year::Known(dt.year());
            }
        }

        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(text, format) {
                return Year::Known(date.year());
            }
        }

        // Year-month ("2019-07") and bare years ("2019").
        if let Some((year, month)) = text.split_once('-') {
            if is_year_digits(year) {
                if let Ok(m) = month.parse::<u32>() {
                    if (1..=12).contains(&m) {
                        return year.parse().map(Year::Known).unwrap_or(Year::Unknown);
                    }
                }
            }
        }
        if is_year_digits(text) {
            return text.parse().map(Year::Known).unwrap_or(Year::Unknown);
        }

        Year::Unknown
    }
}

fn is_year_digits(text: &str) -> bool {
    text.len() == 4 && text.bytes().all(|b| b.is_ascii_digit())
}

/// Known years render as plain decimals; the unknown bucket renders empty.
impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Year::Known(y) => write!(f, "{}", y),
            Year::Unknown => Ok(()),
        }
    }
}

impl From<i32> for Year {
    fn from(value: i32) -> Self {
        Year::Known(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_dates() {
        assert_eq!(Year::from_collection_date("2020-03-14"), Year::Known(2020));
        assert_eq!(Year::from_collection_date("2020-03-14T08:30:00"), Year::Known(2020));
        assert_eq!(Year::from_collection_date("2020-03-14 08:30:00"), Year::Known(2020));
        assert_eq!(Year::from_collection_date("2021-12-31T23:59:59Z"), Year::Known(2021));
        assert_eq!(Year::from_collection_date("2021-12-31T23:59:59+10:00"), Year::Known(2021));
    }

    #[test]
    fn test_mixed_layouts() {
        assert_eq!(Year::from_collection_date("03/14/1999"), Year::Known(1999));
        assert_eq!(Year::from_collection_date("1999/03/14"), Year::Known(1999));
        assert_eq!(Year::from_collection_date("14-Mar-2005"), Year::Known(2005));
        assert_eq!(Year::from_collection_date("March 14, 2005"), Year::Known(2005));
        assert_eq!(Year::from_collection_date("2010-07"), Year::Known(2010));
        assert_eq!(Year::from_collection_date("1989"), Year::Known(1989));
    }

    #[test]
    fn test_unparseable_is_unknown() {
        assert_eq!(Year::from_collection_date(""), Year::Unknown);
        assert_eq!(Year::from_collection_date("   "), Year::Unknown);
        assert_eq!(Year::from_collection_date("not a date"), Year::Unknown);
        assert_eq!(Year::from_collection_date("2020-13-45"), Year::Unknown);
        assert_eq!(Year::from_collection_date("99"), Year::Unknown);
    }

    #[test]
    fn test_unknown_sorts_last() {
        let mut years = vec![Year::Unknown, Year::Known(2021), Year::Known(1990)];
        years.sort();
        assert_eq!(years, vec![Year::Known(1990), Year::Known(2021), Year::Unknown]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Year::Known(2020).to_string(), "2020");
        assert_eq!(Year::Unknown.to_string(), "");
    }
}
