use tracing::warn;

use crate::entities::trial::TrialRecord;
use crate::sources::ctgov::{CtGovSearchResponse, CtGovStudy};
use crate::utils::acronym;
use crate::utils::text;

pub(crate) const REGISTRY_LABEL: &str = "ClinicalTrials.gov";

const SUMMARY_MAX_BYTES: usize = 500;

/// Maps one registry study to a canonical record. Studies without an id or
/// title are unmappable and yield `None`.
fn from_study(study: &CtGovStudy, subject: &str) -> Option<TrialRecord> {
    let protocol = study.protocol_section.as_ref()?;
    let identification = protocol.identification_module.as_ref()?;

    let nct_id = text::clean_opt(identification.nct_id.as_deref())?;
    let title = text::clean_opt(identification.brief_title.as_deref())?;

    let acronym = text::clean_opt(identification.acronym.as_deref())
        .unwrap_or_else(|| acronym::derive_acronym_from_title(&title));

    let outcome = protocol
        .status_module
        .as_ref()
        .and_then(|m| text::clean_opt(m.overall_status.as_deref()))
        .unwrap_or_else(|| "Unknown".to_string());

    let summary = protocol
        .description_module
        .as_ref()
        .and_then(|m| text::clean_opt(m.brief_summary.as_deref()))
        .map(|s| text::truncate_utf8(&s, SUMMARY_MAX_BYTES, "..."))
        .unwrap_or_else(|| "No summary available".to_string());

    Some(TrialRecord {
        id: format!("ct_{nct_id}"),
        visualization_hint: format!("Clinical trial diagram for {acronym} study"),
        source_url: Some(format!("https://clinicaltrials.gov/study/{nct_id}")),
        acronym,
        title,
        subject: subject.to_string(),
        outcome,
        summary,
        source_label: REGISTRY_LABEL.to_string(),
        confidence: None,
    })
}

pub(crate) fn from_search_response(
    resp: &CtGovSearchResponse,
    subject: &str,
) -> Vec<TrialRecord> {
    let mut out = Vec::with_capacity(resp.studies.len());
    for study in &resp.studies {
        match from_study(study, subject) {
            Some(record) => out.push(record),
            None => warn!("dropping unmappable registry study"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn study(value: serde_json::Value) -> CtGovStudy {
        serde_json::from_value(value).expect("valid study")
    }

    #[test]
    fn maps_a_complete_study() {
        let study = study(serde_json::json!({
            "protocolSection": {
                "identificationModule": {
                    "nctId": "NCT04184622",
                    "briefTitle": "Semaglutide for Weight Management",
                    "acronym": "SURMOUNT"
                },
                "statusModule": {"overallStatus": "COMPLETED"},
                "descriptionModule": {"briefSummary": "A weight management study."}
            }
        }));

        let record = from_study(&study, "semaglutide").unwrap();
        assert_eq!(record.id, "ct_NCT04184622");
        assert_eq!(record.acronym, "SURMOUNT");
        assert_eq!(record.outcome, "COMPLETED");
        assert_eq!(record.subject, "semaglutide");
        assert_eq!(
            record.source_url.as_deref(),
            Some("https://clinicaltrials.gov/study/NCT04184622")
        );
        assert_eq!(record.source_label, REGISTRY_LABEL);
        assert!(record.confidence.is_none());
    }

    #[test]
    fn substitutes_defaults_for_missing_status_and_summary() {
        let study = study(serde_json::json!({
            "protocolSection": {
                "identificationModule": {
                    "nctId": "NCT00000001",
                    "briefTitle": "An Untitled Registry Entry"
                }
            }
        }));

        let record = from_study(&study, "metformin").unwrap();
        assert_eq!(record.outcome, "Unknown");
        assert_eq!(record.summary, "No summary available");
    }

    #[test]
    fn derives_an_acronym_when_the_registry_supplies_none() {
        let study = study(serde_json::json!({
            "protocolSection": {
                "identificationModule": {
                    "nctId": "NCT00000002",
                    "briefTitle": "The STEP Weight Management Program"
                }
            }
        }));

        let record = from_study(&study, "semaglutide").unwrap();
        assert_eq!(record.acronym, "STEP");
    }

    #[test]
    fn truncates_long_summaries_with_an_ellipsis_marker() {
        let long_summary = "x".repeat(SUMMARY_MAX_BYTES + 100);
        let study = study(serde_json::json!({
            "protocolSection": {
                "identificationModule": {
                    "nctId": "NCT00000003",
                    "briefTitle": "A Long Winded Study"
                },
                "descriptionModule": {"briefSummary": long_summary}
            }
        }));

        let record = from_study(&study, "metformin").unwrap();
        assert!(record.summary.ends_with("..."));
        assert!(record.summary.len() <= SUMMARY_MAX_BYTES + 3);
    }

    #[test]
    fn drops_studies_without_an_id_instead_of_failing() {
        let resp: CtGovSearchResponse = serde_json::from_value(serde_json::json!({
            "studies": [
                {"protocolSection": {}},
                {
                    "protocolSection": {
                        "identificationModule": {
                            "nctId": "NCT00000004",
                            "briefTitle": "Kept Study"
                        }
                    }
                }
            ]
        }))
        .unwrap();

        let records = from_search_response(&resp, "metformin");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "ct_NCT00000004");
    }
}
