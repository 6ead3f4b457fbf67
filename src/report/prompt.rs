use crate::generation::sanitize::{sanitize_user_text, MAX_NOTE_CHARS};
use crate::generation::{Content, GenerateContentRequest, REPORT_GENERATION};
use crate::models::{ComputedStatistics, PatientProfile, SymptomObservation};

/// Most recent observations listed in the prompt; older ones are only
/// represented through the statistics.
pub const MAX_PROMPT_OBSERVATIONS: usize = 120;

pub const REPORT_INSTRUCTIONS: &str = r#"You are a clinical documentation assistant preparing a menstrual health summary that a patient will bring to their healthcare provider. You are NOT a doctor.

RULES:
1. Base every statement on the statistics and logs below.
2. NEVER diagnose. Risk entries describe patterns worth discussing, not conditions the patient has.
3. Only include a risk entry for a condition when the logs show supporting indicators. Confidence is a number between 0 and 1.
4. Flag anything that warrants prompt medical attention in urgentFlags; otherwise leave it empty.
5. Use plain, patient-friendly language.

OUTPUT FORMAT:
Respond with a single JSON object and nothing else (no Markdown, no commentary) with exactly these fields:
{
  "executiveSummary": string,
  "cycleInsights": { "overallPattern": string, "averagePainLevel": number, "flowPatternDescription": string, "cycleRegularity": "regular" | "irregular" | "insufficient data" },
  "symptomAnalysis": { "mostFrequentSymptoms": [{ "symptom": string, "count": number, "percentage": number }], "painTrend": string, "moodPattern": string, "sleepQuality": string, "energyPattern": string, "notableCorrelations": [string] },
  "riskAssessment": [{ "condition": string, "riskLevel": "low" | "medium" | "high", "confidence": number, "indicators": [string], "recommendation": string }],
  "recommendations": [string],
  "questionsForDoctor": [string],
  "lifestyleTips": [string],
  "urgentFlags": [string],
  "generatedAt": ISO-8601 timestamp,
  "periodStart": "YYYY-MM-DD",
  "periodEnd": "YYYY-MM-DD",
  "totalLogsAnalyzed": number,
  "patientInfo": { "name": string, "ageRange": string, "conditions": [string], "averageCycleLength": number },
  "statistics": copy the STATISTICS object below unchanged
}"#;

/// Build the single-turn report request.
pub fn build_report_request(
    observations: &[SymptomObservation],
    profile: &PatientProfile,
    stats: &ComputedStatistics,
) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content::user(build_report_prompt(observations, profile, stats))],
        generation_config: REPORT_GENERATION,
    }
}

fn build_report_prompt(
    observations: &[SymptomObservation],
    profile: &PatientProfile,
    stats: &ComputedStatistics,
) -> String {
    let mut prompt = String::from(REPORT_INSTRUCTIONS);

    prompt.push_str("\n\nPATIENT PROFILE:\n");
    prompt.push_str(&profile_lines(profile));

    // Serialising plain maps and numbers cannot fail.
    let stats_json = serde_json::to_string_pretty(stats).unwrap_or_default();
    prompt.push_str(&format!("\nSTATISTICS:\n{stats_json}\n"));

    let listed = observation_lines(observations);
    prompt.push_str(&format!(
        "\nSYMPTOM LOGS ({} of {}, oldest first):\n{}",
        listed.len(),
        observations.len(),
        listed.join("\n")
    ));

    prompt
}

fn profile_lines(profile: &PatientProfile) -> String {
    let mut lines = String::new();
    if let Some(name) = profile.name() {
        lines.push_str(&format!("- Name: {name}\n"));
    }
    if let Some(age) = profile.age_range() {
        lines.push_str(&format!("- Age range: {age}\n"));
    }
    let conditions: Vec<&str> = profile.named_conditions().collect();
    if !conditions.is_empty() {
        lines.push_str(&format!("- Known conditions: {}\n", conditions.join(", ")));
    }
    if let Some(days) = profile.cycle_length() {
        lines.push_str(&format!("- Average cycle length: {days} days\n"));
    }
    if let Some(start) = profile.last_period_start {
        lines.push_str(&format!("- Last period start: {}\n", start.format("%Y-%m-%d")));
    }
    if lines.is_empty() {
        lines.push_str("- No profile details provided\n");
    }
    lines
}

/// Dated observations in date order, then undated ones in input order,
/// keeping the most recent `MAX_PROMPT_OBSERVATIONS`.
fn observation_lines(observations: &[SymptomObservation]) -> Vec<String> {
    let mut dated: Vec<&SymptomObservation> =
        observations.iter().filter(|o| o.date.is_some()).collect();
    dated.sort_by_key(|o| o.date);
    let undated = observations.iter().filter(|o| o.date.is_none());

    let ordered: Vec<&SymptomObservation> = dated.into_iter().chain(undated).collect();
    let skip = ordered.len().saturating_sub(MAX_PROMPT_OBSERVATIONS);
    ordered.into_iter().skip(skip).map(observation_line).collect()
}

fn observation_line(obs: &SymptomObservation) -> String {
    let date = obs
        .date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "undated".to_string());
    let mut line = format!(
        "- {date}: flow {}, pain {}/10, mood {}, energy {}, sleep {:.1}h",
        obs.flow_level, obs.pain_level, obs.mood, obs.energy_level, obs.sleep_hours
    );

    let symptoms: Vec<&str> = obs
        .symptoms
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if !symptoms.is_empty() {
        line.push_str(&format!(", symptoms: {}", symptoms.join(", ")));
    }

    if let Some(notes) = obs.notes.as_deref() {
        let notes = sanitize_user_text(notes, MAX_NOTE_CHARS).replace('\n', " ");
        if !notes.is_empty() {
            line.push_str(&format!(", notes: \"{notes}\""));
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistics::{compute, tests::obs};
    use chrono::NaiveDate;

    fn full_profile() -> PatientProfile {
        PatientProfile {
            display_name: Some("Test User".into()),
            age_range: Some("25-30".into()),
            conditions: vec!["PCOS".into()],
            average_cycle_length: Some(28),
            last_period_start: NaiveDate::from_ymd_opt(2024, 1, 1),
        }
    }

    fn text_of(request: &GenerateContentRequest) -> &str {
        &request.contents[0].parts[0].text
    }

    #[test]
    fn single_user_turn_with_report_settings() {
        let logs = vec![obs(1, 5)];
        let stats = compute(&logs).unwrap();
        let request = build_report_request(&logs, &full_profile(), &stats);

        assert_eq!(request.contents.len(), 1);
        assert_eq!(request.contents[0].role, crate::generation::Role::User);
        assert_eq!(request.generation_config.temperature, 0.4);
        assert_eq!(request.generation_config.max_output_tokens, 8192);
    }

    #[test]
    fn prompt_contains_profile_fields() {
        let logs = vec![obs(1, 5)];
        let stats = compute(&logs).unwrap();
        let request = build_report_request(&logs, &full_profile(), &stats);
        let text = text_of(&request);

        assert!(text.contains("Test User"));
        assert!(text.contains("25-30"));
        assert!(text.contains("PCOS"));
        assert!(text.contains("28 days"));
    }

    #[test]
    fn absent_profile_fields_are_omitted() {
        let logs = vec![obs(1, 5)];
        let stats = compute(&logs).unwrap();
        let profile = PatientProfile {
            display_name: Some("User".into()),
            ..Default::default()
        };
        let request = build_report_request(&logs, &profile, &stats);
        let text = text_of(&request);

        assert!(text.contains("- Name: User"));
        assert!(!text.contains("Age range:"));
        assert!(!text.contains("Known conditions"));
    }

    #[test]
    fn prompt_lists_observations_chronologically() {
        let logs = vec![obs(20, 3), obs(5, 8)];
        let stats = compute(&logs).unwrap();
        let request = build_report_request(&logs, &full_profile(), &stats);
        let text = text_of(&request);

        let early = text.find("2024-01-05").unwrap();
        let late = text.find("2024-01-20").unwrap();
        assert!(early < late);
        assert!(text.contains("pain 8/10"));
        assert!(text.contains("symptoms: cramps, fatigue"));
    }

    #[test]
    fn prompt_embeds_statistics_and_schema() {
        let logs = vec![obs(1, 9), obs(2, 1)];
        let stats = compute(&logs).unwrap();
        let request = build_report_request(&logs, &full_profile(), &stats);
        let text = text_of(&request);

        assert!(text.contains("\"highPainDays\": 1"));
        assert!(text.contains("executiveSummary"));
        assert!(text.contains("NEVER diagnose"));
    }

    #[test]
    fn long_histories_keep_most_recent() {
        let logs: Vec<_> = (0..(MAX_PROMPT_OBSERVATIONS + 10))
            .map(|i| {
                let mut o = obs(1, 5);
                o.date = NaiveDate::from_ymd_opt(2023, 1, 1)
                    .map(|d| d + chrono::Duration::days(i as i64));
                o
            })
            .collect();
        let lines = observation_lines(&logs);
        assert_eq!(lines.len(), MAX_PROMPT_OBSERVATIONS);
        assert!(!lines[0].contains("2023-01-01"));
    }

    #[test]
    fn notes_are_sanitised_and_undated_listed_last() {
        let mut undated = obs(1, 2);
        undated.date = None;
        undated.notes = Some("felt\u{200B} dizzy\nafter run".into());
        let lines = observation_lines(&[undated, obs(3, 4)]);

        assert!(lines[0].starts_with("- 2024-01-03"));
        assert!(lines[1].starts_with("- undated"));
        assert!(lines[1].contains("notes: \"felt dizzy after run\""));
    }
}
