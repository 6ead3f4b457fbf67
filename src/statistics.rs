//! Aggregation of symptom observations into report statistics.
//!
//! Pure and synchronous. Every aggregate covers the full collection,
//! including observations without a usable date.

use std::collections::{BTreeMap, HashMap, HashSet};

use thiserror::Error;

use crate::models::{ComputedStatistics, EnergyLevel, FlowLevel, SymptomObservation};

/// Pain score at or above which a day counts as high-pain.
pub const HIGH_PAIN_THRESHOLD: u8 = 7;

/// Number of symptom tags kept in `topSymptoms`.
pub const TOP_SYMPTOM_COUNT: usize = 5;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StatisticsError {
    #[error("Cannot compute statistics from an empty observation set")]
    EmptyObservations,
}

/// Compute summary statistics for a non-empty observation set.
pub fn compute(observations: &[SymptomObservation]) -> Result<ComputedStatistics, StatisticsError> {
    if observations.is_empty() {
        return Err(StatisticsError::EmptyObservations);
    }

    let total = observations.len();
    let pain_sum: f64 = observations.iter().map(|o| f64::from(o.pain_level)).sum();
    let sleep_sum: f64 = observations.iter().map(|o| o.sleep_hours).sum();

    let mut mood_counts = BTreeMap::new();
    let mut flow_counts = BTreeMap::new();
    let mut energy_counts = BTreeMap::new();
    for obs in observations {
        *mood_counts.entry(obs.mood).or_insert(0u32) += 1;
        *flow_counts.entry(obs.flow_level).or_insert(0u32) += 1;
        *energy_counts.entry(obs.energy_level).or_insert(0u32) += 1;
    }

    let top_symptoms = rank_symptoms(observations)
        .into_iter()
        .take(TOP_SYMPTOM_COUNT)
        .map(|(tag, _)| tag)
        .collect();

    Ok(ComputedStatistics {
        total_logs: count_u32(total),
        avg_pain: mean_rounded(pain_sum, total),
        avg_sleep: mean_rounded(sleep_sum, total),
        high_pain_days: count_where(observations, |o| o.pain_level >= HIGH_PAIN_THRESHOLD),
        flow_days: count_where(observations, |o| o.flow_level.is_flow()),
        heavy_flow_days: count_where(observations, |o| o.flow_level == FlowLevel::Heavy),
        low_energy_days: count_where(observations, |o| o.energy_level == EnergyLevel::Low),
        poor_mood_days: count_where(observations, |o| o.mood.is_poor()),
        mood_counts,
        flow_counts,
        energy_counts,
        top_symptoms,
    })
}

/// Symptom tags ranked by the number of observations mentioning them.
///
/// A tag repeated within one observation counts once for it. Ties keep
/// first-appearance order (the sort is stable).
pub fn rank_symptoms(observations: &[SymptomObservation]) -> Vec<(String, u32)> {
    let mut ranked: Vec<(String, u32)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for obs in observations {
        let mut seen_here: HashSet<&str> = HashSet::new();
        for tag in obs.symptoms.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            if !seen_here.insert(tag) {
                continue;
            }
            match index.get(tag).copied() {
                Some(i) => ranked[i].1 += 1,
                None => {
                    index.insert(tag.to_string(), ranked.len());
                    ranked.push((tag.to_string(), 1));
                }
            }
        }
    }

    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// Round half-up to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn mean_rounded(sum: f64, count: usize) -> f64 {
    round1(sum / count as f64)
}

fn count_where<F>(observations: &[SymptomObservation], predicate: F) -> u32
where
    F: Fn(&SymptomObservation) -> bool,
{
    count_u32(observations.iter().filter(|o| predicate(*o)).count())
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
