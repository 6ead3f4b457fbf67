use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::observation::{deserialize_lenient_date, null_as_empty, serialize_date};

/// Patient profile. Every field may be absent; the chat endpoint accepts
/// the same shape as a partial user context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_range: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub conditions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_cycle_length: Option<u32>,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_date",
        serialize_with = "serialize_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_period_start: Option<NaiveDate>,
}

impl PatientProfile {
    pub fn name(&self) -> Option<&str> {
        non_blank(self.display_name.as_deref())
    }

    pub fn age_range(&self) -> Option<&str> {
        non_blank(self.age_range.as_deref())
    }

    /// Cycle length in days; zero is treated as unknown.
    pub fn cycle_length(&self) -> Option<u32> {
        self.average_cycle_length.filter(|days| *days > 0)
    }

    /// Named conditions, trimmed, blanks dropped.
    pub fn named_conditions(&self) -> impl Iterator<Item = &str> {
        self.conditions
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    }

    /// Case-insensitive substring match against any named condition.
    pub fn has_condition_matching(&self, needles: &[&str]) -> bool {
        self.named_conditions().any(|c| {
            let lower = c.to_lowercase();
            needles.iter().any(|n| lower.contains(n))
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
