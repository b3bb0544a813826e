use serde::Deserialize;
use tracing::warn;

use crate::entities::trial::TrialRecord;
use crate::utils::acronym;
use crate::utils::text;

pub(crate) const GENERATIVE_LABEL: &str = "AI-generated";

const MAX_GENERATED_RESULTS: usize = 3;

#[derive(Debug, Deserialize)]
struct GenerativePayload {
    #[serde(default)]
    results: Vec<GenerativeResult>,
}

#[derive(Debug, Deserialize)]
struct GenerativeResult {
    trial_acronym: Option<String>,
    #[serde(alias = "name")]
    trial_full_name: Option<String>,
    #[serde(alias = "outcome")]
    result: Option<String>,
    #[serde(alias = "summary")]
    brief_abstract: Option<String>,
    reference_article: Option<String>,
    source_label: Option<String>,
    confidence: Option<serde_json::Value>,
}

/// Accepts a confidence encoded as a JSON number or a numeric string and
/// keeps it only when it lands in [0, 1]; anything else is omitted rather
/// than invented.
fn parse_confidence(value: Option<&serde_json::Value>) -> Option<f64> {
    let value = value?;
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (0.0..=1.0).contains(&parsed).then_some(parsed)
}

fn from_result(entry: &GenerativeResult, index: usize, subject: &str) -> Option<TrialRecord> {
    let title = text::clean_opt(entry.trial_full_name.as_deref())?;

    let acronym = text::clean_opt(entry.trial_acronym.as_deref())
        .unwrap_or_else(|| acronym::derive_acronym_from_title(&title));

    let outcome = text::clean_opt(entry.result.as_deref()).unwrap_or_else(|| "Unknown".to_string());
    let summary = text::clean_opt(entry.brief_abstract.as_deref())
        .unwrap_or_else(|| "No summary available".to_string());

    let source_url = text::clean_opt(entry.reference_article.as_deref()).unwrap_or_else(|| {
        text::encoded_search_url("https://pubmed.ncbi.nlm.nih.gov/", "term", subject)
    });
    let source_label = text::clean_opt(entry.source_label.as_deref())
        .unwrap_or_else(|| GENERATIVE_LABEL.to_string());

    Some(TrialRecord {
        id: format!("ai_{index}"),
        visualization_hint: format!("AI-generated visualization for {acronym}"),
        acronym,
        title,
        subject: subject.to_string(),
        outcome,
        summary,
        source_url: Some(source_url),
        source_label,
        confidence: parse_confidence(entry.confidence.as_ref()),
    })
}

/// Parses the model's message content as the structured result payload.
/// Returns `None` when the content is not valid JSON of the expected shape;
/// individually unmappable entries are dropped, not surfaced.
pub(crate) fn from_model_content(content: &str, subject: &str) -> Option<Vec<TrialRecord>> {
    let payload: GenerativePayload = match serde_json::from_str(content) {
        Ok(payload) => payload,
        Err(err) => {
            warn!("generative payload was not the expected JSON shape: {err}");
            return None;
        }
    };

    let mut out = Vec::new();
    for (index, entry) in payload.results.iter().take(MAX_GENERATED_RESULTS).enumerate() {
        match from_result(entry, index, subject) {
            Some(record) => out.push(record),
            None => warn!("dropping generative result without a usable title"),
        }
    }
    Some(out)
}

/// Deterministic stand-in results used when no generative credential is
/// configured. The shape mirrors what the live model is prompted to return.
pub(crate) fn mock_records(subject: &str) -> Vec<TrialRecord> {
    let base = subject
        .split_whitespace()
        .next()
        .map(str::to_uppercase)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "TRIAL".to_string());

    vec![
        TrialRecord {
            id: "ai_mock_0".to_string(),
            acronym: format!("{base}-I"),
            title: format!("{subject} Early Phase Study"),
            subject: subject.to_string(),
            outcome:
                "Demonstrated promising improvements across cardiometabolic biomarkers in a 24-week cohort."
                    .to_string(),
            summary: format!(
                "Pilot study evaluating {subject} versus standard care across 120 participants. \
                 Primary endpoints included HbA1c, LDL, and weight change."
            ),
            visualization_hint: format!("AI-generated visualization for {base}-I"),
            source_url: Some(text::encoded_search_url(
                "https://clinicaltrials.gov/search",
                "term",
                subject,
            )),
            source_label: "ClinicalTrials.gov (mock)".to_string(),
            confidence: Some(0.72),
        },
        TrialRecord {
            id: "ai_mock_1".to_string(),
            acronym: format!("{base}-II"),
            title: format!("{subject} Global Outcomes"),
            subject: subject.to_string(),
            outcome: "Met composite cardiology endpoints with favorable safety signals.".to_string(),
            summary: format!(
                "Randomized phase II trial comparing {subject} against placebo with background therapy. \
                 Secondary analysis highlights regional variations."
            ),
            visualization_hint: format!("AI-generated visualization for {base}-II"),
            source_url: Some(text::encoded_search_url(
                "https://pubmed.ncbi.nlm.nih.gov/",
                "term",
                subject,
            )),
            source_label: "PubMed (mock)".to_string(),
            confidence: Some(0.64),
        },
    ]
}
