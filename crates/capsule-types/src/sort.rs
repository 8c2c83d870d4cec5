//! Sort keys and the single active sort.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

/// What a collection is ordered by.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum SortKey {
    /// When the token was collected.
    #[default]
    #[serde(alias = "date", alias = "collected")]
    #[strum(serialize = "collected_date", serialize = "date", serialize = "collected")]
    CollectedDate,
    /// When the drop started.
    #[serde(alias = "start")]
    #[strum(serialize = "start_date", serialize = "start")]
    StartDate,
    /// Whether the drop has moments (0/1).
    #[serde(alias = "moments")]
    #[strum(serialize = "moments_count", serialize = "moments")]
    MomentsCount,
    /// Drop supply.
    #[serde(alias = "supply")]
    #[strum(serialize = "popularity", serialize = "supply")]
    Popularity,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [
        SortKey::CollectedDate,
        SortKey::StartDate,
        SortKey::MomentsCount,
        SortKey::Popularity,
    ];

    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::CollectedDate => "collected_date",
            SortKey::StartDate => "start_date",
            SortKey::MomentsCount => "moments_count",
            SortKey::Popularity => "popularity",
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// The active sort: exactly one key and a direction.
///
/// Persisted as `{"key": "popularity", "direction": "desc"}`. The default is
/// newest-collected first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    #[serde(default)]
    pub key: SortKey,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    pub fn desc(key: SortKey) -> Self {
        Self::new(key, SortDirection::Desc)
    }

    pub fn asc(key: SortKey) -> Self {
        Self::new(key, SortDirection::Asc)
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Parse a sort identifier, falling back to the default when unknown.
    ///
    /// Accepts `key:direction` (e.g. `popularity:asc`) as well as the
    /// legacy single-token sort menu identifiers (`collected_newest`,
    /// `most_popular`, ...).
    pub fn parse(raw: &str) -> Self {
        Self::try_parse(raw).unwrap_or_default()
    }

    /// Like [`parse`](Self::parse) but reports unknown identifiers.
    pub fn try_parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Some((key, direction)) = raw.split_once(':') {
            return Some(Self::new(
                SortKey::from_str(key)?,
                SortDirection::from_str(direction)?,
            ));
        }

        let spec = match raw.to_ascii_lowercase().as_str() {
            "collected_newest" | "date" => Self::desc(SortKey::CollectedDate),
            "collected_oldest" => Self::asc(SortKey::CollectedDate),
            "start_date_newest" => Self::desc(SortKey::StartDate),
            "start_date_oldest" => Self::asc(SortKey::StartDate),
            "most_moments" => Self::desc(SortKey::MomentsCount),
            "most_popular" => Self::desc(SortKey::Popularity),
            other => Self::desc(SortKey::from_str(other)?),
        };
        Some(spec)
    }

    /// `key:direction` form used in shareable URLs.
    pub fn to_param(&self) -> String {
        format!("{}:{}", self.key.as_str(), self.direction.as_str())
    }
}
