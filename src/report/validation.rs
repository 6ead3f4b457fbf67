// Validation of AI-generated report text.
// A completion is accepted only when it parses into a complete HealthReport;
// anything else is rejected so the ladder can try the next model.
// Accepted reports are returned as the JSON the model produced. Rejection
// messages and warnings name fields only, never their values.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::error::Category;
use serde_json::{Map, Value};

use crate::generation::GenerationError;
use crate::models::{
    ComputedStatistics, CycleInsights, HealthReport, PatientInfo, RiskAssessment,
    SymptomAnalysis, REQUIRED_REPORT_FIELDS,
};

/// Parse completion text into the report JSON to return.
///
/// Tolerates a surrounding Markdown code fence (` ```json … ``` `), which
/// models add despite being told not to.
pub fn parse_report_completion(text: &str) -> Result<Value, GenerationError> {
    let json = strip_code_fence(text);
    if json.is_empty() {
        return Err(GenerationError::EmptyCompletion);
    }

    let value: Value = serde_json::from_str(json).map_err(|e| {
        GenerationError::InvalidReport(format!(
            "not valid JSON ({} error at line {}, column {})",
            category_name(&e),
            e.line(),
            e.column()
        ))
    })?;
    let report = validate_report_value(&value)?;

    let warnings = plausibility_warnings(&report);
    if !warnings.is_empty() {
        tracing::warn!(
            warning_count = warnings.len(),
            warnings = ?warnings,
            "AI report accepted with plausibility warnings"
        );
    }
    Ok(value)
}

/// Structural check: a JSON object carrying every required section, each
/// of the right shape.
pub fn validate_report_value(value: &Value) -> Result<HealthReport, GenerationError> {
    let object = value
        .as_object()
        .ok_or_else(|| GenerationError::InvalidReport("top-level value is not an object".into()))?;

    let missing: Vec<&str> = REQUIRED_REPORT_FIELDS
        .iter()
        .copied()
        .filter(|field| !object.contains_key(*field))
        .collect();
    if !missing.is_empty() {
        return Err(GenerationError::InvalidReport(format!(
            "missing fields: {}",
            missing.join(", ")
        )));
    }

    HealthReport::deserialize(value).map_err(|e| {
        let section = mismatched_section(object).unwrap_or("report");
        GenerationError::InvalidReport(format!(
            "{section} has the wrong shape ({} error)",
            category_name(&e)
        ))
    })
}

fn category_name(e: &serde_json::Error) -> &'static str {
    match e.classify() {
        Category::Io => "io",
        Category::Syntax => "syntax",
        Category::Data => "data",
        Category::Eof => "eof",
    }
}

fn fits<T: DeserializeOwned>(value: &Value) -> bool {
    T::deserialize(value).is_ok()
}

/// First required section whose value does not deserialise on its own.
fn mismatched_section(object: &Map<String, Value>) -> Option<&'static str> {
    REQUIRED_REPORT_FIELDS.iter().copied().find(|field| {
        let Some(value) = object.get(*field) else {
            return true;
        };
        let ok = match *field {
            "cycleInsights" => fits::<CycleInsights>(value),
            "symptomAnalysis" => fits::<SymptomAnalysis>(value),
            "riskAssessment" => fits::<Vec<RiskAssessment>>(value),
            "recommendations" | "questionsForDoctor" | "lifestyleTips" | "urgentFlags" => {
                fits::<Vec<String>>(value)
            }
            "totalLogsAnalyzed" => fits::<u32>(value),
            "patientInfo" => fits::<PatientInfo>(value),
            "statistics" => fits::<ComputedStatistics>(value),
            _ => fits::<String>(value),
        };
        !ok
    })
}

/// Inner text of the first fenced block, or the trimmed input if unfenced.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };
    let after_open = &trimmed[open + 3..];
    // Skip the language tag (`json`, `JSON`, or nothing) up to the newline.
    let body_start = after_open.find('\n').map_or(after_open.len(), |i| i + 1);
    let body = &after_open[body_start..];
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// Non-fatal oddities in an otherwise valid report.
fn plausibility_warnings(report: &HealthReport) -> Vec<String> {
    let mut warnings = Vec::new();

    for (index, risk) in report.risk_assessment.iter().enumerate() {
        if !(0.0..=1.0).contains(&risk.confidence) {
            warnings.push(format!(
                "riskAssessment[{index}].confidence {} outside [0, 1]",
                risk.confidence
            ));
        }
    }

    let pain = report.cycle_insights.average_pain_level;
    if !(0.0..=10.0).contains(&pain) {
        warnings.push(format!("Average pain level {pain} outside [0, 10]"));
    }

    if report.total_logs_analyzed != report.statistics.total_logs {
        warnings.push(format!(
            "totalLogsAnalyzed ({}) differs from statistics.totalLogs ({})",
            report.total_logs_analyzed, report.statistics.total_logs
        ));
    }

    if report.executive_summary.trim().is_empty() {
        warnings.push("Empty executive summary".into());
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::tests::sample_report_json;

    fn summary_of(value: &Value) -> &str {
        value["executiveSummary"].as_str().unwrap()
    }

    #[test]
    fn plain_json_is_accepted() {
        let text = sample_report_json().to_string();
        let value = parse_report_completion(&text).unwrap();
        assert_eq!(
            summary_of(&value),
            "Patient shows regular menstrual patterns with moderate symptoms."
        );
    }

    #[test]
    fn fenced_json_is_accepted() {
        let text = format!("```json\n{}\n```", sample_report_json());
        let value = parse_report_completion(&text).unwrap();
        assert_eq!(value["totalLogsAnalyzed"], 10);
    }

    #[test]
    fn bare_fence_and_leading_prose_are_accepted() {
        let text = format!("Here is the report:\n```\n{}\n```\nThanks", sample_report_json());
        assert!(parse_report_completion(&text).is_ok());
    }

    #[test]
    fn accepted_report_is_unchanged() {
        let original = sample_report_json();
        let value = parse_report_completion(&original.to_string()).unwrap();
        assert_eq!(value, original);
    }

    #[test]
    fn extra_keys_and_nulls_survive_acceptance() {
        let mut original = sample_report_json();
        original["disclaimer"] = Value::from("Not medical advice");
        original["patientInfo"]["ageRange"] = Value::Null;

        let value = parse_report_completion(&original.to_string()).unwrap();
        assert_eq!(value, original);
        assert!(value["patientInfo"]
            .as_object()
            .unwrap()
            .contains_key("ageRange"));
    }

    #[test]
    fn non_json_is_rejected() {
        let err = parse_report_completion("This is not valid JSON").unwrap_err();
        assert!(matches!(err, GenerationError::InvalidReport(_)));
        assert!(err.to_string().contains("syntax error at line 1"));
    }

    #[test]
    fn blank_text_is_empty_completion() {
        assert!(matches!(
            parse_report_completion("  ```json\n```  "),
            Err(GenerationError::EmptyCompletion)
        ));
    }

    #[test]
    fn non_object_is_rejected() {
        let err = validate_report_value(&serde_json::json!(["a"])).unwrap_err();
        assert!(err.to_string().contains("not an object"));
    }

    #[test]
    fn missing_fields_are_named() {
        let mut value = sample_report_json();
        let object = value.as_object_mut().unwrap();
        object.remove("riskAssessment");
        object.remove("statistics");

        let err = validate_report_value(&value).unwrap_err().to_string();
        assert!(err.contains("riskAssessment"));
        assert!(err.contains("statistics"));
    }

    #[test]
    fn wrong_shape_names_section_without_its_value() {
        let mut value = sample_report_json();
        value["recommendations"] = Value::from("Jane Doe, 30-35, PCOS: see a doctor");

        let err = validate_report_value(&value).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidReport(_)));
        let message = err.to_string();
        assert!(message.contains("recommendations has the wrong shape (data error)"));
        assert!(!message.contains("Jane Doe"));
    }

    #[test]
    fn null_required_section_is_rejected() {
        let mut value = sample_report_json();
        value["symptomAnalysis"] = Value::Null;
        let err = validate_report_value(&value).unwrap_err();
        assert!(err.to_string().contains("symptomAnalysis"));
    }

    #[test]
    fn plausibility_warnings_do_not_reject() {
        let mut value = sample_report_json();
        value["riskAssessment"] = serde_json::json!([{
            "condition": "Endometriosis (Jane Doe)",
            "riskLevel": "medium",
            "confidence": 80,
            "indicators": [],
            "recommendation": "Discuss with your doctor"
        }]);
        value["totalLogsAnalyzed"] = serde_json::json!(12);

        let report = validate_report_value(&value).unwrap();
        let warnings = plausibility_warnings(&report);
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0], "riskAssessment[0].confidence 80 outside [0, 1]");
        assert!(warnings.iter().all(|w| !w.contains("Jane Doe")));
    }

    #[test]
    fn strip_code_fence_variants() {
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```JSON\n{\"a\":1}"), "{\"a\":1}");
    }
}
