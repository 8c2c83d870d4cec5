//! Collection items and the drop metadata they carry.
//!
//! Items arrive as registry JSON and are never mutated afterwards. Every field
//! the engine reads degrades to a documented default instead of failing
//! deserialization:
//!
//! - missing or empty country/city → [`NONE_PLACEHOLDER`]
//! - missing or empty chain → [`DEFAULT_CHAIN`]
//! - missing or unparseable timestamps → absent, read as the Unix epoch
//! - missing or malformed supply → 0

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder used for a drop without a country or city.
pub const NONE_PLACEHOLDER: &str = "(None)";

/// Chain assumed for tokens that don't report one.
pub const DEFAULT_CHAIN: &str = "mainnet";

/// A drop (event). Many tokens share one drop.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub id: u64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub fancy_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "non_empty")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "non_empty")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image_url: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_timestamp"
    )]
    pub start_date: Option<DateTime<Utc>>,
    /// Total tokens minted for the drop. Drives the popularity sort.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub supply: u64,
}

impl Event {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into()).filter(|c: &String| !c.is_empty());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into()).filter(|c: &String| !c.is_empty());
        self
    }

    pub fn with_start_date(mut self, start: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self
    }

    pub fn with_supply(mut self, supply: u64) -> Self {
        self.supply = supply;
        self
    }
}

/// A single collected attendance token.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionItem {
    #[serde(default)]
    pub event: Event,
    #[serde(rename = "tokenId", default, deserialize_with = "lenient_string")]
    pub token_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "non_empty")]
    pub chain: Option<String>,
    /// When the token was collected.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_timestamp"
    )]
    pub created: Option<DateTime<Utc>>,
}

impl CollectionItem {
    pub fn new(token_id: impl Into<String>, event: Event) -> Self {
        Self {
            event,
            token_id: token_id.into(),
            ..Self::default()
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn with_chain(mut self, chain: impl Into<String>) -> Self {
        self.chain = Some(chain.into()).filter(|c: &String| !c.is_empty());
        self
    }

    pub fn collected_at(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    pub fn event_id(&self) -> u64 {
        self.event.id
    }

    /// Drop country, or [`NONE_PLACEHOLDER`].
    pub fn country(&self) -> &str {
        self.event.country.as_deref().unwrap_or(NONE_PLACEHOLDER)
    }

    /// Drop city, or [`NONE_PLACEHOLDER`].
    pub fn city(&self) -> &str {
        self.event.city.as_deref().unwrap_or(NONE_PLACEHOLDER)
    }

    /// Token chain, or [`DEFAULT_CHAIN`].
    pub fn chain(&self) -> &str {
        self.chain.as_deref().unwrap_or(DEFAULT_CHAIN)
    }

    /// Collection time as Unix milliseconds (0 when absent).
    pub fn collected_millis(&self) -> i64 {
        self.created.map_or(0, |t| t.timestamp_millis())
    }

    /// Drop start time as Unix milliseconds (0 when absent).
    pub fn start_millis(&self) -> i64 {
        self.event.start_date.map_or(0, |t| t.timestamp_millis())
    }

    /// Four-digit UTC calendar year of collection (1970 when absent).
    pub fn collected_year(&self) -> i32 {
        self.created.map_or(1970, |t| t.year())
    }

    pub fn supply(&self) -> u64 {
        self.event.supply
    }
}

/// Parse the timestamp shapes the registry and CMS are known to emit.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff]`, `YYYY-MM-DDTHH:MM:SS[.fff]`
/// (naive values are taken as UTC), `YYYY-MM-DD`, and `DD-Mon-YYYY`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }

    const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d-%b-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    None
}

// ── Lenient field deserializers ─────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
#[allow(dead_code)]
enum RawScalar {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
#[allow(dead_code)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
    Other(IgnoredAny),
}

fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let value = match Option::<RawScalar>::deserialize(d)? {
        Some(RawScalar::Unsigned(n)) => n,
        Some(RawScalar::Signed(n)) => n.max(0) as u64,
        Some(RawScalar::Float(f)) if f.is_finite() && f > 0.0 => f as u64,
        Some(RawScalar::Text(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    };
    Ok(value)
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Option::<RawScalar>::deserialize(d)? {
        Some(RawScalar::Text(s)) => s,
        Some(RawScalar::Unsigned(n)) => n.to_string(),
        Some(RawScalar::Signed(n)) => n.to_string(),
        _ => String::new(),
    })
}

fn non_empty<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Option::<RawScalar>::deserialize(d)?;
    Ok(match value {
        Some(RawScalar::Text(s)) if !s.is_empty() => Some(s),
        _ => None,
    })
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    Ok(match Option::<RawTimestamp>::deserialize(d)? {
        Some(RawTimestamp::Millis(ms)) => DateTime::from_timestamp_millis(ms),
        Some(RawTimestamp::Text(s)) => parse_timestamp(&s),
        _ => None,
    })
}
