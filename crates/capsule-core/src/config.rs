//! Runtime configuration.
//!
//! Every section has defaults, so an empty RON document (`()`) is a valid
//! config. Durations are written in milliseconds:
//!
//! ```ron
//! (
//!     prefetch: (delay_ms: 2000, hint_ttl_ms: 60000, resource_hints: true),
//!     transition: (fade_out_ms: 300, total_ms: 800),
//!     auto_activation: (delay_ms: 2000),
//!     pagination: (page_size: 60),
//! )
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    ADVANCED_PREFETCH_DELAY, AUTO_ACTIVATION_DELAY, DEFAULT_PAGE_SIZE, RESOURCE_HINT_TTL,
    SIMPLE_PREFETCH_DELAY, TRANSITION_FADE_OUT, TRANSITION_TOTAL,
};

/// Error type for config loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("RON syntax error: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration for one viewer session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapsuleConfig {
    pub prefetch: PrefetchConfig,
    pub transition: TransitionTiming,
    pub auto_activation: AutoActivationConfig,
    pub pagination: PaginationConfig,
}

impl CapsuleConfig {
    /// Parse and validate a RON document.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: CapsuleConfig =
            ron::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.transition.validate()?;
        if self.pagination.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1".into()));
        }
        Ok(())
    }
}

/// Prefetch cache behaviour.
///
/// The simple variant only loads sibling data; the advanced variant waits
/// longer and also inserts module-preload and prefetch hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefetchConfig {
    #[serde(rename = "delay_ms", with = "millis")]
    pub delay: Duration,
    #[serde(rename = "hint_ttl_ms", with = "millis")]
    pub hint_ttl: Duration,
    pub resource_hints: bool,
}

impl PrefetchConfig {
    pub fn simple() -> Self {
        Self {
            delay: SIMPLE_PREFETCH_DELAY,
            hint_ttl: RESOURCE_HINT_TTL,
            resource_hints: false,
        }
    }

    pub fn advanced() -> Self {
        Self {
            delay: ADVANCED_PREFETCH_DELAY,
            hint_ttl: RESOURCE_HINT_TTL,
            resource_hints: true,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_hint_ttl(mut self, ttl: Duration) -> Self {
        self.hint_ttl = ttl;
        self
    }
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self::advanced()
    }
}

/// Delays of an animated mode switch, both measured from its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionTiming {
    #[serde(rename = "fade_out_ms", with = "millis")]
    pub fade_out: Duration,
    #[serde(rename = "total_ms", with = "millis")]
    pub total: Duration,
}

impl TransitionTiming {
    pub fn new(fade_out: Duration, total: Duration) -> Result<Self, ConfigError> {
        let timing = Self { fade_out, total };
        timing.validate()?;
        Ok(timing)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fade_out >= self.total {
            return Err(ConfigError::Invalid(format!(
                "fade_out ({}ms) must be shorter than total ({}ms)",
                self.fade_out.as_millis(),
                self.total.as_millis()
            )));
        }
        Ok(())
    }
}

impl Default for TransitionTiming {
    fn default() -> Self {
        Self {
            fade_out: TRANSITION_FADE_OUT,
            total: TRANSITION_TOTAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoActivationConfig {
    #[serde(rename = "delay_ms", with = "millis")]
    pub delay: Duration,
}

impl Default for AutoActivationConfig {
    fn default() -> Self {
        Self {
            delay: AUTO_ACTIVATION_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
