//! Day selection for queries and pipeline runs.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use crate::error::{FireSmokeError, FireSmokeResult};
use crate::layout::DataLayout;

/// Either an explicit calendar day or "whatever is newest on disk".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DaySelector {
    #[default]
    Latest,
    Date(NaiveDate),
}

impl DaySelector {
    /// Resolve to a concrete day against the snapshots present in `layout`.
    pub fn resolve(self, layout: &DataLayout) -> FireSmokeResult<NaiveDate> {
        match self {
            DaySelector::Date(day) => Ok(day),
            DaySelector::Latest => layout
                .latest_day()?
                .ok_or_else(|| FireSmokeError::NotFound("no ingested days".to_string())),
        }
    }
}

impl FromStr for DaySelector {
    type Err = FireSmokeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("latest") {
            return Ok(DaySelector::Latest);
        }
        parse_day(s).map(DaySelector::Date)
    }
}

impl fmt::Display for DaySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaySelector::Latest => write!(f, "latest"),
            DaySelector::Date(day) => write!(f, "{}", day),
        }
    }
}

/// Parse a `YYYY-MM-DD` day.
pub fn parse_day(s: &str) -> FireSmokeResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| FireSmokeError::invalid_parameter("day", format!("'{}' is not YYYY-MM-DD", s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_selector() {
        assert_eq!("latest".parse::<DaySelector>().unwrap(), DaySelector::Latest);
        assert_eq!("".parse::<DaySelector>().unwrap(), DaySelector::Latest);
        assert_eq!(
            "2025-05-11".parse::<DaySelector>().unwrap(),
            DaySelector::Date(NaiveDate::from_ymd_opt(2025, 5, 11).unwrap())
        );

        let err = "11/05/2025".parse::<DaySelector>().unwrap_err();
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_resolve_latest() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::with_root(dir.path());
        layout.ensure_dirs().unwrap();

        let err = DaySelector::Latest.resolve(&layout).unwrap_err();
        assert_eq!(err.http_status_code(), 404);

        let day = NaiveDate::from_ymd_opt(2025, 5, 11).unwrap();
        fs::write(layout.snapshot_path(day), "{}").unwrap();
        assert_eq!(DaySelector::Latest.resolve(&layout).unwrap(), day);
    }
}
