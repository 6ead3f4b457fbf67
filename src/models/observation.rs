//! Symptom observations as received from the persistence layer.
//!
//! Dates are parsed leniently: a malformed or missing date never rejects
//! the request, the observation simply has no place in the chronology.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::enums::{EnergyLevel, FlowLevel, Mood};

/// Highest valid pain score.
pub const MAX_PAIN_LEVEL: u8 = 10;

/// One user-reported entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomObservation {
    #[serde(default)]
    pub id: String,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_date",
        serialize_with = "serialize_date"
    )]
    pub date: Option<NaiveDate>,
    pub flow_level: FlowLevel,
    pub pain_level: u8,
    pub mood: Mood,
    pub energy_level: EnergyLevel,
    pub sleep_hours: f64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub symptoms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SymptomObservation {
    /// Range checks serde cannot express. Returns the offending field name.
    pub fn out_of_range_field(&self) -> Option<&'static str> {
        if self.pain_level > MAX_PAIN_LEVEL {
            return Some("painLevel");
        }
        if !self.sleep_hours.is_finite() || self.sleep_hours < 0.0 {
            return Some("sleepHours");
        }
        None
    }
}

/// Parse a calendar date from an RFC 3339 timestamp, a naive timestamp,
/// or a bare `YYYY-MM-DD`. Time-of-day is discarded.
pub fn parse_lenient_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

pub(crate) fn deserialize_lenient_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_lenient_date))
}

pub(crate) fn serialize_date<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match date {
        Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
        None => serializer.serialize_none(),
    }
}

/// `null` and missing both mean "empty" for list fields.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
