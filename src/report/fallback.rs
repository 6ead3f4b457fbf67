//! Rule-based health report used whenever AI generation is unavailable.
//!
//! Total and deterministic: identical inputs give identical reports apart
//! from `generatedAt`. Risk entries only ever name a condition the patient
//! listed, or the one hard-coded heavy-bleeding rule.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::models::{
    ComputedStatistics, CycleInsights, EnergyLevel, FlowLevel, HealthReport, Mood, PatientInfo,
    PatientProfile, RiskAssessment, RiskLevel, SymptomAnalysis, SymptomFrequency,
    SymptomObservation,
};
use crate::statistics::{rank_symptoms, round1, HIGH_PAIN_THRESHOLD, TOP_SYMPTOM_COUNT};

/// Dated observations needed before cycle regularity is judged.
pub const MIN_DATED_FOR_REGULARITY: usize = 7;

/// High-pain share above which an urgent flag is raised.
pub const URGENT_HIGH_PAIN_FRACTION: f64 = 0.5;

pub const SEVERE_PAIN_LEVEL: u8 = 8;
pub const SEVERE_PAIN_RUN_DAYS: usize = 3;

/// Heavy-flow share above which heavy menstrual bleeding is flagged.
pub const HEAVY_FLOW_RISK_FRACTION: f64 = 0.3;

/// High-pain share at which endometriosis risk is raised.
pub const ENDOMETRIOSIS_PAIN_FRACTION: f64 = 0.3;

/// Poor-mood share at which PMDD/PMS risk is raised.
pub const POOR_MOOD_RISK_FRACTION: f64 = 0.5;

/// Flow days further apart than this start a new period.
pub const PERIOD_GAP_DAYS: i64 = 7;

/// Allowed deviation of a cycle interval from the reference length.
pub const REGULARITY_TOLERANCE_DAYS: f64 = 3.0;

/// Mean pain difference between halves that counts as a trend.
pub const PAIN_TREND_DELTA: f64 = 1.0;

const PCOS_TERMS: &[&str] = &["pcos", "polycystic"];
const ENDOMETRIOSIS_TERMS: &[&str] = &["endometriosis"];
const BLEEDING_TERMS: &[&str] = &["fibroid", "adenomyosis", "von willebrand", "bleeding"];
const MOOD_DISORDER_TERMS: &[&str] = &["pmdd", "pms", "premenstrual"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleRegularity {
    Regular,
    Irregular,
    InsufficientData,
}

impl CycleRegularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Irregular => "irregular",
            Self::InsufficientData => "insufficient data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PainTrend {
    Increasing,
    Decreasing,
    Stable,
}

impl PainTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
        }
    }
}

// ═══════════════════════════════════════════
// Chronology
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default)]
struct DaySummary {
    max_pain: u8,
    flow: bool,
}

/// Dated view of the observations. Input order is never trusted.
struct Chronology<'a> {
    dated: Vec<&'a SymptomObservation>,
    days: BTreeMap<NaiveDate, DaySummary>,
}

impl<'a> Chronology<'a> {
    fn build(observations: &'a [SymptomObservation]) -> Self {
        let mut dated: Vec<&SymptomObservation> =
            observations.iter().filter(|o| o.date.is_some()).collect();
        dated.sort_by_key(|o| o.date);

        let mut days: BTreeMap<NaiveDate, DaySummary> = BTreeMap::new();
        for obs in &dated {
            if let Some(date) = obs.date {
                let day = days.entry(date).or_default();
                day.max_pain = day.max_pain.max(obs.pain_level);
                day.flow |= obs.flow_level.is_flow();
            }
        }

        Self { dated, days }
    }

    fn first_day(&self) -> Option<NaiveDate> {
        self.days.keys().next().copied()
    }

    fn last_day(&self) -> Option<NaiveDate> {
        self.days.keys().next_back().copied()
    }

    /// First flow day of each period.
    fn period_starts(&self) -> Vec<NaiveDate> {
        let mut starts = Vec::new();
        let mut previous: Option<NaiveDate> = None;
        for (date, _) in self.days.iter().filter(|(_, d)| d.flow) {
            let new_period = match previous {
                None => true,
                Some(prev) => (*date - prev).num_days() > PERIOD_GAP_DAYS,
            };
            if new_period {
                starts.push(*date);
            }
            previous = Some(*date);
        }
        starts
    }

    /// Longest run of consecutive calendar days at or above `level`.
    fn longest_pain_run(&self, level: u8) -> usize {
        let mut longest = 0;
        let mut current = 0;
        let mut previous: Option<NaiveDate> = None;
        for (date, day) in &self.days {
            if day.max_pain >= level {
                let continues = previous.is_some_and(|p| (*date - p).num_days() == 1);
                current = if continues { current + 1 } else { 1 };
                previous = Some(*date);
                longest = longest.max(current);
            } else {
                current = 0;
                previous = None;
            }
        }
        longest
    }

    fn pain_trend(&self) -> PainTrend {
        let n = self.dated.len();
        if n < 4 {
            return PainTrend::Stable;
        }
        let (first, second) = self.dated.split_at(n / 2);
        let delta = mean_pain(second) - mean_pain(first);
        if delta > PAIN_TREND_DELTA {
            PainTrend::Increasing
        } else if delta < -PAIN_TREND_DELTA {
            PainTrend::Decreasing
        } else {
            PainTrend::Stable
        }
    }
}

fn mean_pain(observations: &[&SymptomObservation]) -> f64 {
    let sum: f64 = observations.iter().map(|o| f64::from(o.pain_level)).sum();
    sum / observations.len() as f64
}

fn cycle_intervals(starts: &[NaiveDate]) -> Vec<i64> {
    starts.windows(2).map(|w| (w[1] - w[0]).num_days()).collect()
}

/// Regularity from period-start spacing, checked against their own mean
/// or, with a single interval, against the profile's cycle length.
fn classify_regularity(
    chronology: &Chronology<'_>,
    trend: PainTrend,
    profile: &PatientProfile,
) -> CycleRegularity {
    if chronology.dated.len() < MIN_DATED_FOR_REGULARITY {
        return CycleRegularity::InsufficientData;
    }
    let intervals = cycle_intervals(&chronology.period_starts());
    let reference = match intervals.len() {
        0 => return CycleRegularity::InsufficientData,
        1 => match profile.cycle_length() {
            Some(days) => f64::from(days),
            None => return CycleRegularity::InsufficientData,
        },
        n => intervals.iter().sum::<i64>() as f64 / n as f64,
    };
    let consistent = intervals
        .iter()
        .all(|i| (*i as f64 - reference).abs() <= REGULARITY_TOLERANCE_DAYS);
    if consistent && trend == PainTrend::Stable {
        CycleRegularity::Regular
    } else {
        CycleRegularity::Irregular
    }
}

// ═══════════════════════════════════════════
// Composition
// ═══════════════════════════════════════════

/// Compose a complete report stamped with the current time.
pub fn compose(
    observations: &[SymptomObservation],
    profile: &PatientProfile,
    stats: &ComputedStatistics,
) -> HealthReport {
    compose_at(observations, profile, stats, Utc::now())
}

/// Compose a complete report stamped with `now`.
pub fn compose_at(
    observations: &[SymptomObservation],
    profile: &PatientProfile,
    stats: &ComputedStatistics,
    now: DateTime<Utc>,
) -> HealthReport {
    let chronology = Chronology::build(observations);
    let trend = chronology.pain_trend();
    let regularity = classify_regularity(&chronology, trend, profile);
    let starts = chronology.period_starts();
    let intervals = cycle_intervals(&starts);

    let today = now.date_naive();
    let period_start = chronology.first_day().unwrap_or(today);
    let period_end = chronology.last_day().unwrap_or(today);

    let urgent_flags = urgent_flags(&chronology, stats);
    let risk_assessment = assess_risks(profile, stats, regularity);

    HealthReport {
        executive_summary: executive_summary(
            profile,
            stats,
            regularity,
            &urgent_flags,
            period_start,
            period_end,
        ),
        cycle_insights: CycleInsights {
            overall_pattern: overall_pattern(
                regularity,
                &intervals,
                chronology.dated.len(),
                profile,
            ),
            average_pain_level: stats.avg_pain,
            flow_pattern_description: flow_description(stats),
            cycle_regularity: regularity.as_str().to_string(),
        },
        symptom_analysis: SymptomAnalysis {
            most_frequent_symptoms: most_frequent_symptoms(observations),
            pain_trend: trend.as_str().to_string(),
            mood_pattern: mood_pattern(stats),
            sleep_quality: sleep_quality(stats),
            energy_pattern: energy_pattern(stats),
            notable_correlations: notable_correlations(observations),
        },
        risk_assessment,
        recommendations: recommendations(stats, regularity, trend),
        questions_for_doctor: questions_for_doctor(profile, stats, regularity, trend),
        lifestyle_tips: lifestyle_tips(stats),
        urgent_flags,
        generated_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        period_start: period_start.format("%Y-%m-%d").to_string(),
        period_end: period_end.format("%Y-%m-%d").to_string(),
        total_logs_analyzed: stats.total_logs,
        patient_info: PatientInfo {
            name: profile.name().unwrap_or("Patient").to_string(),
            age_range: profile.age_range().map(str::to_string),
            conditions: profile.named_conditions().map(str::to_string).collect(),
            average_cycle_length: profile.cycle_length(),
        },
        statistics: stats.clone(),
    }
}

fn executive_summary(
    profile: &PatientProfile,
    stats: &ComputedStatistics,
    regularity: CycleRegularity,
    urgent_flags: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> String {
    let subject = profile.name().unwrap_or("The patient");
    let mut summary = format!(
        "{subject} logged {} entries between {} and {}. Average pain was {:.1}/10 with {} high-pain day(s), and flow was recorded on {} day(s).",
        stats.total_logs,
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d"),
        stats.avg_pain,
        stats.high_pain_days,
        stats.flow_days,
    );
    summary.push(' ');
    summary.push_str(match regularity {
        CycleRegularity::Regular => "Cycle timing looks regular.",
        CycleRegularity::Irregular => "Cycle timing looks irregular.",
        CycleRegularity::InsufficientData => {
            "There is not yet enough dated data to judge cycle regularity."
        }
    });
    if !urgent_flags.is_empty() {
        summary.push_str(" Some entries need prompt attention; see the urgent flags.");
    }
    summary.push_str(" This summary was generated from logged data without AI analysis.");
    summary
}

fn overall_pattern(
    regularity: CycleRegularity,
    intervals: &[i64],
    dated: usize,
    profile: &PatientProfile,
) -> String {
    let mut pattern = match regularity {
        CycleRegularity::Regular => {
            let mean = intervals.iter().sum::<i64>() as f64 / intervals.len().max(1) as f64;
            format!("Period starts recur about every {mean:.0} days.")
        }
        CycleRegularity::Irregular => {
            let min = intervals.iter().min().copied().unwrap_or_default();
            let max = intervals.iter().max().copied().unwrap_or_default();
            format!("Intervals between period starts ranged from {min} to {max} days.")
        }
        CycleRegularity::InsufficientData => format!(
            "Not enough data to identify a cycle pattern yet ({dated} dated entries, at least {MIN_DATED_FOR_REGULARITY} and two period starts needed)."
        ),
    };
    if let Some(days) = profile.cycle_length() {
        pattern.push_str(&format!(" Reported average cycle length is {days} days."));
    }
    pattern
}

fn flow_description(stats: &ComputedStatistics) -> String {
    if stats.flow_days == 0 {
        return "No menstrual flow was recorded in this period.".to_string();
    }
    let count = |level: FlowLevel| stats.flow_counts.get(&level).copied().unwrap_or(0);
    format!(
        "Flow recorded on {} of {} days ({} heavy, {} medium, {} light).",
        stats.flow_days,
        stats.total_logs,
        count(FlowLevel::Heavy),
        count(FlowLevel::Medium),
        count(FlowLevel::Light),
    )
}

fn most_frequent_symptoms(observations: &[SymptomObservation]) -> Vec<SymptomFrequency> {
    let total = observations.len() as f64;
    rank_symptoms(observations)
        .into_iter()
        .take(TOP_SYMPTOM_COUNT)
        .map(|(symptom, count)| SymptomFrequency {
            symptom,
            count,
            percentage: round1(f64::from(count) * 100.0 / total),
        })
        .collect()
}

/// Most frequent key; ties go to the earlier key in declaration order.
fn dominant<K: Copy + Ord>(counts: &BTreeMap<K, u32>) -> Option<K> {
    counts
        .iter()
        .fold(None, |best: Option<(K, u32)>, (k, c)| match best {
            Some((_, bc)) if bc >= *c => best,
            _ => Some((*k, *c)),
        })
        .map(|(k, _)| k)
}

fn mood_pattern(stats: &ComputedStatistics) -> String {
    let mood = dominant(&stats.mood_counts).unwrap_or(Mood::Neutral);
    format!(
        "Mood was most often {}; poor mood (bad or terrible) on {} of {} days.",
        mood.as_str(),
        stats.poor_mood_days,
        stats.total_logs
    )
}

fn sleep_quality(stats: &ComputedStatistics) -> String {
    let label = if stats.avg_sleep >= 7.0 {
        "Good"
    } else if stats.avg_sleep >= 6.0 {
        "Fair"
    } else {
        "Poor"
    };
    format!("{label}: averaging {:.1} hours per night.", stats.avg_sleep)
}

fn energy_pattern(stats: &ComputedStatistics) -> String {
    if stats.proportion(stats.low_energy_days) >= 0.5 {
        return format!(
            "Low energy on most days ({} of {}).",
            stats.low_energy_days, stats.total_logs
        );
    }
    let energy = dominant(&stats.energy_counts).unwrap_or(EnergyLevel::Medium);
    format!(
        "Energy was mostly {}; low energy on {} of {} days.",
        energy.as_str(),
        stats.low_energy_days,
        stats.total_logs
    )
}

fn count_matching<F>(observations: &[SymptomObservation], predicate: F) -> usize
where
    F: Fn(&SymptomObservation) -> bool,
{
    observations.iter().filter(|o| predicate(*o)).count()
}

fn notable_correlations(observations: &[SymptomObservation]) -> Vec<String> {
    let mut correlations = Vec::new();

    let pain_with_heavy = count_matching(observations, |o| {
        o.flow_level == FlowLevel::Heavy && o.pain_level >= HIGH_PAIN_THRESHOLD
    });
    if pain_with_heavy >= 2 {
        correlations.push(format!(
            "High pain frequently coincides with heavy flow ({pain_with_heavy} days)."
        ));
    }

    let short_sleep_low_energy = count_matching(observations, |o| {
        o.sleep_hours < 6.0 && o.energy_level == EnergyLevel::Low
    });
    if short_sleep_low_energy >= 2 {
        correlations.push(format!(
            "Short sleep (under 6 hours) often accompanies low energy ({short_sleep_low_energy} days)."
        ));
    }

    let mood_with_pain = count_matching(observations, |o| {
        o.mood.is_poor() && o.pain_level >= HIGH_PAIN_THRESHOLD
    });
    if mood_with_pain >= 2 {
        correlations.push(format!(
            "Poor mood often occurs on high-pain days ({mood_with_pain} days)."
        ));
    }

    correlations
}

fn urgent_flags(chronology: &Chronology<'_>, stats: &ComputedStatistics) -> Vec<String> {
    let mut flags = Vec::new();
    if stats.proportion(stats.high_pain_days) > URGENT_HIGH_PAIN_FRACTION {
        flags.push(format!(
            "Pain of {HIGH_PAIN_THRESHOLD}/10 or higher was logged on {} of {} days. Pain this frequent should be reviewed by a healthcare provider soon.",
            stats.high_pain_days, stats.total_logs
        ));
    }
    let run = chronology.longest_pain_run(SEVERE_PAIN_LEVEL);
    if run >= SEVERE_PAIN_RUN_DAYS {
        flags.push(format!(
            "Severe pain ({SEVERE_PAIN_LEVEL}/10 or higher) was logged on {run} consecutive days. Contact a healthcare provider if this continues."
        ));
    }
    flags
}

// ═══════════════════════════════════════════
// Risk rules
// ═══════════════════════════════════════════

fn matches_any(condition_lower: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| condition_lower.contains(t))
}

fn assess_risks(
    profile: &PatientProfile,
    stats: &ComputedStatistics,
    regularity: CycleRegularity,
) -> Vec<RiskAssessment> {
    let high_pain_share = stats.proportion(stats.high_pain_days);
    let heavy_share = stats.proportion(stats.heavy_flow_days);
    let poor_mood_share = stats.proportion(stats.poor_mood_days);
    let heavy_flagged = heavy_share > HEAVY_FLOW_RISK_FRACTION;

    let mut seen = HashSet::new();
    let mut risks = Vec::new();

    for condition in profile.named_conditions() {
        let lower = condition.to_lowercase();
        if !seen.insert(lower.clone()) {
            continue;
        }

        let entry = if matches_any(&lower, PCOS_TERMS) {
            if regularity == CycleRegularity::Irregular {
                risk(
                    condition,
                    RiskLevel::Medium,
                    0.6,
                    vec![
                        "Irregular intervals between period starts".into(),
                        format!("{condition} listed in profile"),
                    ],
                    "Irregular cycles can be associated with PCOS. Share these logs with your provider at your next visit.",
                )
            } else {
                monitor(condition)
            }
        } else if matches_any(&lower, ENDOMETRIOSIS_TERMS) {
            if high_pain_share >= ENDOMETRIOSIS_PAIN_FRACTION {
                risk(
                    condition,
                    RiskLevel::High,
                    0.7,
                    vec![
                        format!(
                            "High pain on {} of {} days",
                            stats.high_pain_days, stats.total_logs
                        ),
                        format!("{condition} listed in profile"),
                    ],
                    "Frequent high pain alongside endometriosis warrants a review of your pain management plan with your provider.",
                )
            } else {
                monitor(condition)
            }
        } else if matches_any(&lower, BLEEDING_TERMS) {
            // Reported with the heavy-bleeding rule below when that fires.
            if heavy_flagged {
                continue;
            }
            monitor(condition)
        } else if matches_any(&lower, MOOD_DISORDER_TERMS) {
            if poor_mood_share >= POOR_MOOD_RISK_FRACTION {
                risk(
                    condition,
                    RiskLevel::Medium,
                    0.6,
                    vec![
                        format!(
                            "Poor mood on {} of {} days",
                            stats.poor_mood_days, stats.total_logs
                        ),
                        format!("{condition} listed in profile"),
                    ],
                    "Frequent low mood can be linked to premenstrual conditions. Discuss mood tracking and support options with your provider.",
                )
            } else {
                monitor(condition)
            }
        } else {
            monitor(condition)
        };
        risks.push(entry);
    }

    if heavy_flagged {
        let bleeding_condition = profile.has_condition_matching(BLEEDING_TERMS);
        let mut indicators = vec![format!(
            "Heavy flow on {} of {} days",
            stats.heavy_flow_days, stats.total_logs
        )];
        if bleeding_condition {
            indicators.extend(
                profile
                    .named_conditions()
                    .filter(|c| matches_any(&c.to_lowercase(), BLEEDING_TERMS))
                    .map(|c| format!("{c} listed in profile")),
            );
        }
        risks.push(risk(
            "Heavy menstrual bleeding",
            if bleeding_condition { RiskLevel::High } else { RiskLevel::Medium },
            if bleeding_condition { 0.6 } else { 0.5 },
            indicators,
            "Heavy flow on many days can lead to low iron. Ask your provider whether a blood count or iron check is appropriate.",
        ));
    }

    risks
}

fn risk(
    condition: &str,
    risk_level: RiskLevel,
    confidence: f64,
    indicators: Vec<String>,
    recommendation: &str,
) -> RiskAssessment {
    RiskAssessment {
        condition: condition.to_string(),
        risk_level,
        confidence,
        indicators,
        recommendation: recommendation.to_string(),
    }
}

fn monitor(condition: &str) -> RiskAssessment {
    risk(
        condition,
        RiskLevel::Low,
        0.3,
        vec![format!("{condition} listed in profile")],
        &format!("Continue monitoring {condition} with your healthcare provider."),
    )
}

// ═══════════════════════════════════════════
// Advice lists
// ═══════════════════════════════════════════

fn recommendations(
    stats: &ComputedStatistics,
    regularity: CycleRegularity,
    trend: PainTrend,
) -> Vec<String> {
    let mut recs =
        vec!["Keep logging symptoms daily to build a clearer picture over time.".to_string()];
    if regularity == CycleRegularity::InsufficientData {
        recs.push("Log through at least two full cycles so cycle timing can be assessed.".into());
    }
    if stats.high_pain_days > 0 {
        recs.push("Discuss pain management options with your healthcare provider.".into());
    }
    if trend == PainTrend::Increasing {
        recs.push(
            "Pain has been rising over the period; mention this change at your next appointment."
                .into(),
        );
    }
    if stats.heavy_flow_days > 0 {
        recs.push(
            "Note how often you change pads or tampons on heavy days to share with your provider."
                .into(),
        );
    }
    if stats.avg_sleep < 7.0 {
        recs.push(
            "Aim for 7 to 9 hours of sleep, especially in the days before your period.".into(),
        );
    }
    if stats.poor_mood_days > 0 {
        recs.push("Track mood alongside cycle days to spot premenstrual patterns.".into());
    }
    recs
}

fn questions_for_doctor(
    profile: &PatientProfile,
    stats: &ComputedStatistics,
    regularity: CycleRegularity,
    trend: PainTrend,
) -> Vec<String> {
    let mut questions = Vec::new();
    if stats.high_pain_days > 0 {
        questions.push("What pain relief options are appropriate for my cramps?".to_string());
    }
    if trend == PainTrend::Increasing {
        questions.push("Why might my period pain be getting worse?".to_string());
    }
    if stats.heavy_flow_days > 0 {
        questions.push(
            "Is my flow heavier than normal, and should my iron levels be checked?".to_string(),
        );
    }
    if regularity == CycleRegularity::Irregular {
        questions.push("What could be causing my cycle length to vary?".to_string());
    }
    for condition in profile.named_conditions() {
        questions.push(format!("How might {condition} be affecting my cycle symptoms?"));
    }
    if questions.is_empty() {
        questions.push(
            "Is there anything in my symptom log I should keep a closer eye on?".to_string(),
        );
    }
    questions
}

fn lifestyle_tips(stats: &ComputedStatistics) -> Vec<String> {
    let mut tips = vec!["Stay hydrated throughout your cycle.".to_string()];
    let cramps = stats
        .top_symptoms
        .iter()
        .any(|s| s.to_lowercase().contains("cramp"));
    if stats.high_pain_days > 0 || cramps {
        tips.push("A heating pad or warm bath can ease cramps.".into());
    }
    if stats.heavy_flow_days > 0 {
        tips.push("Include iron-rich foods such as leafy greens, beans and lean meat.".into());
    }
    if stats.avg_sleep < 7.0 {
        tips.push("Keep a consistent bedtime and limit screens before sleep.".into());
    }
    if stats.low_energy_days > 0 {
        tips.push("Gentle movement like walking or yoga can help with low energy.".into());
    }
    tips
}
