//! Health report and computed statistics as returned to clients.
//!
//! The same types validate AI output: a completion that does not
//! deserialise into [`HealthReport`] is rejected as a whole.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::enums::{EnergyLevel, FlowLevel, Mood, RiskLevel};

/// Top-level keys every report must carry. Checked before deserialising
/// so a rejection names the missing section.
pub const REQUIRED_REPORT_FIELDS: &[&str] = &[
    "executiveSummary",
    "cycleInsights",
    "symptomAnalysis",
    "riskAssessment",
    "recommendations",
    "questionsForDoctor",
    "lifestyleTips",
    "urgentFlags",
    "generatedAt",
    "periodStart",
    "periodEnd",
    "totalLogsAnalyzed",
    "patientInfo",
    "statistics",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedStatistics {
    pub total_logs: u32,
    pub avg_pain: f64,
    pub avg_sleep: f64,
    pub high_pain_days: u32,
    pub flow_days: u32,
    pub heavy_flow_days: u32,
    pub low_energy_days: u32,
    pub poor_mood_days: u32,
    pub mood_counts: BTreeMap<Mood, u32>,
    pub flow_counts: BTreeMap<FlowLevel, u32>,
    pub energy_counts: BTreeMap<EnergyLevel, u32>,
    pub top_symptoms: Vec<String>,
}

impl ComputedStatistics {
    /// Share of observations satisfying a count, in `[0, 1]`.
    pub fn proportion(&self, count: u32) -> f64 {
        if self.total_logs == 0 {
            0.0
        } else {
            f64::from(count) / f64::from(self.total_logs)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub executive_summary: String,
    pub cycle_insights: CycleInsights,
    pub symptom_analysis: SymptomAnalysis,
    pub risk_assessment: Vec<RiskAssessment>,
    pub recommendations: Vec<String>,
    pub questions_for_doctor: Vec<String>,
    pub lifestyle_tips: Vec<String>,
    pub urgent_flags: Vec<String>,
    pub generated_at: String,
    pub period_start: String,
    pub period_end: String,
    pub total_logs_analyzed: u32,
    pub patient_info: PatientInfo,
    pub statistics: ComputedStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleInsights {
    pub overall_pattern: String,
    pub average_pain_level: f64,
    pub flow_pattern_description: String,
    pub cycle_regularity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomAnalysis {
    pub most_frequent_symptoms: Vec<SymptomFrequency>,
    pub pain_trend: String,
    pub mood_pattern: String,
    pub sleep_quality: String,
    pub energy_pattern: String,
    #[serde(default)]
    pub notable_correlations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomFrequency {
    pub symptom: String,
    pub count: u32,
    pub percentage: f64,
}

/// A flagged condition correlation. Not a diagnosis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub condition: String,
    pub risk_level: RiskLevel,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    #[serde(default)]
    pub indicators: Vec<String>,
    pub recommendation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_range: Option<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_cycle_length: Option<u32>,
}
