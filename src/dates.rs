use lazy_static::lazy_static;
use regex::Regex;
use time::{format_description::FormatItem, macros::format_description, Date, Duration};

use crate::error::AppError;

pub const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn parse_date(raw: &str) -> Result<Date, AppError> {
    lazy_static! {
        static ref DATE_RE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
    }
    if !DATE_RE.is_match(raw) {
        return Err(AppError::validation(format!("invalid date format: {raw}")));
    }
    Date::parse(raw, DATE_FORMAT).map_err(|_| AppError::validation(format!("invalid date: {raw}")))
}

pub fn format_date(date: Date) -> String {
    // DATE_FORMAT only contains components every Date has.
    date.format(DATE_FORMAT).unwrap_or_default()
}

pub fn add_days(date: Date, days: i64) -> Result<Date, AppError> {
    date.checked_add(Duration::days(days))
        .ok_or_else(|| AppError::validation("date out of range"))
}

/// `#[serde(with = "crate::dates::iso")]` for `YYYY-MM-DD` fields.
pub mod iso {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_date(&raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_well_formed_dates() {
        assert_eq!(parse_date("2024-01-31").unwrap(), date!(2024 - 01 - 31));
        assert_eq!(format_date(date!(2024 - 03 - 05)), "2024-03-05");
    }

    #[test]
    fn rejects_malformed_dates() {
        for raw in ["2024-1-01", "20240101", "2024-02-30", "", "2024-01-01T00:00"] {
            assert!(matches!(parse_date(raw), Err(AppError::Validation(_))), "{raw}");
        }
    }

    #[test]
    fn add_days_crosses_month_boundary() {
        assert_eq!(add_days(date!(2024 - 02 - 28), 2).unwrap(), date!(2024 - 03 - 01));
    }
}
