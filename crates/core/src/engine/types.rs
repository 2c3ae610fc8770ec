//! Response payload and engine errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::leaderboard::LeaderboardEntry;
use crate::reconcile::SourceStats;
use crate::source::SourceError;

/// Result of one ticket request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    pub success: bool,
    pub total_tickets: usize,
    /// Sorted by ticket count, descending.
    pub leaderboard: Vec<LeaderboardEntry>,
    /// When the payload was computed.
    #[serde(with = "iso_millis")]
    pub last_updated: DateTime<Utc>,
    pub cached: bool,
    /// Snapshot age in whole seconds; only set when served from cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_age: Option<u64>,
    pub data_sources: SourceStats,
}

impl ResponseData {
    /// Copy of this payload annotated as a cache hit.
    pub fn served_from_cache(&self, age_secs: u64) -> Self {
        Self {
            cached: true,
            cache_age: Some(age_secs),
            ..self.clone()
        }
    }

    /// Copy of this payload annotated as freshly computed.
    pub fn served_fresh(&self) -> Self {
        Self {
            cached: false,
            cache_age: None,
            ..self.clone()
        }
    }
}

/// Errors surfaced to callers of the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A required primary credential is missing.
    #[error("{0}")]
    Configuration(String),

    /// The primary source could not be fetched.
    #[error("Failed to fetch tickets: {0}")]
    SourceFetch(SourceError),
}

impl From<SourceError> for EngineError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotConfigured(msg) => EngineError::Configuration(msg),
            other => EngineError::SourceFetch(other),
        }
    }
}

/// RFC 3339 timestamps with millisecond precision and a `Z` suffix.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
