//! Shareable query parameters.
//!
//! - `filter_{Category}=v1,v2` for each active category
//! - `sort={key}:{direction}` when not the default sort
//! - `timeCapsule=true` when in Time Capsule mode
//!
//! [`encode`](UrlState::encode) and [`decode`](UrlState::decode) work on
//! already-decoded pairs. A comma inside a filter value is written `%2C` (and
//! a literal `%` as `%25`) so it cannot be mistaken for the separator.
//! [`to_query`](UrlState::to_query) and [`from_query`](UrlState::from_query)
//! add the `application/x-www-form-urlencoded` layer on top.

use capsule_types::{FilterCategory, FilterSelection, SortSpec, ViewMode};

const FILTER_PREFIX: &str = "filter_";
const SORT_PARAM: &str = "sort";
const TIME_CAPSULE_PARAM: &str = "timeCapsule";
const VALUE_SEPARATOR: char = ',';

/// View state carried by a link.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UrlState {
    pub filters: FilterSelection,
    /// `None` when the link carries no (valid) sort.
    pub sort: Option<SortSpec>,
    pub time_capsule: bool,
}

impl UrlState {
    pub fn new(filters: FilterSelection, sort: SortSpec, mode: ViewMode) -> Self {
        Self {
            filters,
            sort: Some(sort),
            time_capsule: mode.is_time_capsule(),
        }
    }

    pub fn view_mode(&self) -> ViewMode {
        ViewMode::from(self.time_capsule)
    }

    /// Query pairs, in a stable order.
    pub fn encode(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .filters
            .active_categories()
            .map(|(category, values)| {
                let joined = values
                    .iter()
                    .map(|v| escape_value(v))
                    .collect::<Vec<_>>()
                    .join(",");
                (format!("{FILTER_PREFIX}{category}"), joined)
            })
            .collect();

        if let Some(sort) = self.sort.filter(|s| !s.is_default()) {
            pairs.push((SORT_PARAM.to_string(), sort.to_param()));
        }
        if self.time_capsule {
            pairs.push((TIME_CAPSULE_PARAM.to_string(), "true".to_string()));
        }
        pairs
    }

    /// Read pairs, skipping unknown names, unknown categories and bad sorts.
    pub fn decode<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut state = UrlState::default();
        for (name, value) in pairs {
            if let Some(category) = name.strip_prefix(FILTER_PREFIX) {
                let Some(category) = FilterCategory::from_str(category) else {
                    tracing::debug!(param = name, "ignoring unknown filter category");
                    continue;
                };
                let values = value
                    .split(VALUE_SEPARATOR)
                    .map(|v| unescape_value(v.trim()))
                    .filter(|v| !v.is_empty());
                state.filters.set_values(category, values);
            } else if name == SORT_PARAM {
                state.sort = SortSpec::try_parse(value);
            } else if name == TIME_CAPSULE_PARAM {
                state.time_capsule = value.eq_ignore_ascii_case("true");
            }
        }
        state
    }

    /// Parse a form-urlencoded query string, with or without the leading `?`.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs: Vec<(String, String)> =
            form_urlencoded::parse(query.as_bytes()).into_owned().collect();
        Self::decode(pairs.iter().map(|(name, value)| (name.as_str(), value.as_str())))
    }

    /// Render as a form-urlencoded query string without the leading `?`.
    pub fn to_query(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.encode())
            .finish()
    }
}

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' => out.push_str("%25"),
            VALUE_SEPARATOR => out.push_str("%2C"),
            c => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape_value`]. Any other `%` sequence is kept as written.
fn unescape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(at) = rest.find('%') {
        out.push_str(&rest[..at]);
        let tail = &rest[at..];
        if let Some(after) = tail.strip_prefix("%2C").or_else(|| tail.strip_prefix("%2c")) {
            out.push(VALUE_SEPARATOR);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("%25") {
            out.push('%');
            rest = after;
        } else {
            out.push('%');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use capsule_types::SortKey;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_state_encodes_nothing() {
        let state = UrlState::new(FilterSelection::new(), SortSpec::default(), ViewMode::Classic);
        assert!(state.encode().is_empty());
    }

    #[test]
    fn test_encode() {
        let state = UrlState::new(
            FilterSelection::new()
                .with(FilterCategory::Country, ["US", "France"])
                .with(FilterCategory::Year, ["2024"]),
            SortSpec::desc(SortKey::Popularity),
            ViewMode::TimeCapsule,
        );
        assert_eq!(
            state.to_query(),
            "filter_Country=France%2CUS&filter_Year=2024&sort=popularity%3Adesc&timeCapsule=true"
        );
    }

    #[test]
    fn test_punctuation_in_values_round_trips() {
        let state = UrlState::new(
            FilterSelection::new()
                .with(FilterCategory::City, ["Washington, D.C.", "A&B=C", "100%"]),
            SortSpec::default(),
            ViewMode::Classic,
        );
        assert_eq!(
            state.encode(),
            vec![(
                "filter_City".to_string(),
                "100%25,A&B=C,Washington%2C D.C.".to_string()
            )]
        );

        let query = state.to_query();
        assert!(!query.contains("A&B"), "separators escaped: {query}");
        let back = UrlState::from_query(&query);
        assert_eq!(back.filters, state.filters);
    }

    #[test]
    fn test_decode_plus_and_percent_escapes() {
        let state = UrlState::from_query("filter_City=New+York%2CSan%252C+Jose");
        assert_eq!(
            state.filters,
            FilterSelection::new().with(FilterCategory::City, ["New York", "San, Jose"])
        );
    }

    #[test]
    fn test_decode_skips_junk() {
        let state = UrlState::from_query(
            "?filter_Country=US,,FR&filter_Galaxy=Andromeda&sort=sideways&utm_source=x&timeCapsule=true",
        );
        assert_eq!(
            state.filters,
            FilterSelection::new().with(FilterCategory::Country, ["US", "FR"])
        );
        assert_eq!(state.sort, None);
        assert_eq!(state.view_mode(), ViewMode::TimeCapsule);
    }

    #[test]
    fn test_decode_legacy_sort() {
        let state = UrlState::from_query("sort=most_popular");
        assert_eq!(state.sort, Some(SortSpec::desc(SortKey::Popularity)));
    }

    #[test]
    fn test_round_trip() {
        let state = UrlState::new(
            FilterSelection::new().with(FilterCategory::Moments, ["has_moments"]),
            SortSpec::asc(SortKey::StartDate),
            ViewMode::Classic,
        );
        assert_eq!(UrlState::from_query(&state.to_query()), state);
    }
}
