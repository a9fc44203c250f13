//! Download selectors: raw command-line arguments turned into item ids.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::types::CatalogEntry;

// pattern is a literal, compiling it cannot fail
#[allow(clippy::unwrap_used)]
static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap());

/// A classified download selector
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    /// A single item id
    Id(u64),
    /// Every item recorded after this day
    Date(NaiveDate),
    /// Every item in the series with this name (case-insensitive)
    Text(String),
    /// Date-shaped argument that is not a calendar day; matches nothing
    InvalidDate(String),
}

impl Selector {
    /// Classify a raw argument
    ///
    /// Date-shaped strings (`YYYY-MM-DD`) win over digit-only strings, which
    /// win over free text. A date-shaped string that is not a real calendar
    /// day is kept as [`Selector::InvalidDate`]; a number too large for an
    /// id falls through to text.
    ///
    /// ```
    /// use fetchtv::selector::Selector;
    ///
    /// assert!(matches!(Selector::classify("2020-05-01"), Selector::Date(_)));
    /// assert_eq!(Selector::classify("42"), Selector::Id(42));
    /// assert_eq!(Selector::classify("2020-5-1"), Selector::Text("2020-5-1".into()));
    /// ```
    pub fn classify(raw: &str) -> Self {
        if DATE_PATTERN.is_match(raw) {
            return match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => Selector::Date(date),
                Err(e) => {
                    tracing::warn!(selector = raw, error = %e, "Ignoring selector with an impossible date");
                    Selector::InvalidDate(raw.to_string())
                }
            };
        }

        if !raw.is_empty()
            && raw.bytes().all(|b| b.is_ascii_digit())
            && let Ok(id) = raw.parse()
        {
            return Selector::Id(id);
        }

        Selector::Text(raw.to_string())
    }

    /// Expand into item ids against a built catalog
    ///
    /// `Id` resolves to itself without touching the catalog. `Date` matches
    /// entries dated strictly after midnight of that day; undated entries
    /// never match. `Text` matches the whole series name, ignoring case.
    pub fn resolve(&self, catalog: &[CatalogEntry]) -> Vec<String> {
        match self {
            Selector::Id(id) => vec![id.to_string()],
            Selector::Date(day) => {
                let cutoff = start_of_day(*day);
                catalog
                    .iter()
                    .filter(|e| e.date.is_some_and(|d| d > cutoff))
                    .map(|e| e.id.clone())
                    .collect()
            }
            Selector::Text(name) => {
                let wanted = name.to_lowercase();
                catalog
                    .iter()
                    .filter(|e| e.series.to_lowercase() == wanted)
                    .map(|e| e.id.clone())
                    .collect()
            }
            Selector::InvalidDate(_) => Vec::new(),
        }
    }

    /// True if resolving needs the catalog
    pub fn needs_catalog(&self) -> bool {
        !matches!(self, Selector::Id(_) | Selector::InvalidDate(_))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Id(id) => write!(f, "id {}", id),
            Selector::Date(day) => write!(f, "recorded after {}", day),
            Selector::Text(name) => write!(f, "series \"{}\"", name),
            Selector::InvalidDate(raw) => write!(f, "invalid date \"{}\"", raw),
        }
    }
}

fn start_of_day(day: NaiveDate) -> NaiveDateTime {
    day.and_time(chrono::NaiveTime::MIN)
}

/// Resolve several selectors, concatenating their expansions in order
pub fn resolve_all(selectors: &[Selector], catalog: &[CatalogEntry]) -> Vec<String> {
    selectors
        .iter()
        .flat_map(|selector| {
            let ids = selector.resolve(catalog);
            tracing::debug!(selector = %selector, matched = ids.len(), "Resolved selector");
            ids
        })
        .collect()
}
