//! Record types for the catalog and activity families

use crate::types::{Level, SourceFamily, NEXT_SONG_PAGE};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// A record type decodable from one raw input line
pub trait RawRecord: DeserializeOwned + Send + Sync {
    /// Which input family this record comes from
    const FAMILY: SourceFamily;
}

// ============================================================================
// Catalog Record
// ============================================================================

/// One song from the catalog, with its artist attributes inlined
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CatalogRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub song_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub artist_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub artist_name: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub artist_location: Option<String>,

    #[serde(default)]
    pub artist_latitude: Option<f64>,

    #[serde(default)]
    pub artist_longitude: Option<f64>,

    /// Release year, 0 when unknown
    #[serde(default, deserialize_with = "year_or_zero")]
    pub year: i32,

    /// Length in seconds
    #[serde(default)]
    pub duration: Option<f64>,
}

impl RawRecord for CatalogRecord {
    const FAMILY: SourceFamily = SourceFamily::Catalog;
}

// ============================================================================
// Activity Record
// ============================================================================

/// One user event from the activity logs
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub page: Option<String>,

    /// Empty for logged-out sessions, which decode as `None`
    #[serde(default, deserialize_with = "non_empty_id")]
    pub user_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub first_name: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub last_name: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub gender: Option<String>,

    #[serde(default)]
    pub level: Option<Level>,

    /// Event time in epoch milliseconds (UTC)
    #[serde(default, deserialize_with = "epoch_millis")]
    pub ts: Option<i64>,

    /// Track title as logged
    #[serde(default, deserialize_with = "lenient_string")]
    pub song: Option<String>,

    /// Artist name as logged
    #[serde(default, deserialize_with = "lenient_string")]
    pub artist: Option<String>,

    #[serde(default)]
    pub session_id: Option<i64>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub user_agent: Option<String>,
}

impl ActivityRecord {
    /// Whether this event is a song play
    pub fn is_song_play(&self) -> bool {
        self.page.as_deref() == Some(NEXT_SONG_PAGE)
    }
}

impl RawRecord for ActivityRecord {
    const FAMILY: SourceFamily = SourceFamily::Activity;
}

// ============================================================================
// Field Deserializers
// ============================================================================

/// Accept strings, and numbers/bools rendered as strings
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(v.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a scalar, found {other}"
        ))),
    }
}

fn non_empty_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.filter(|s| !s.trim().is_empty()))
}

fn year_or_zero<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i32>::deserialize(deserializer)?.unwrap_or(0))
}

/// Integer milliseconds; an integral float (`1.5e12`) is accepted too
fn epoch_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(ms) = n.as_i64() {
                return Ok(Some(ms));
            }
            match n.as_f64() {
                #[allow(clippy::cast_precision_loss)]
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Some(f as i64)),
                _ => Err(de::Error::custom(format!("invalid ts: {n}"))),
            }
        }
        Some(other) => Err(de::Error::custom(format!("invalid ts: {other}"))),
    }
}
