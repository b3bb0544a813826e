use crate::entities::trial::{ProviderId, SearchOutcome};

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

pub(crate) fn render_outcome(subject: &str, outcome: &SearchOutcome) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Trial search: {subject}\n\n"));

    out.push_str("| Acronym | Title | Outcome | Source | Confidence |\n");
    out.push_str("|---------|-------|---------|--------|------------|\n");
    for record in &outcome.records {
        let confidence = record
            .confidence
            .map(|c| format!("{:.0}%", c * 100.0))
            .unwrap_or_else(|| "n/a".to_string());
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            escape_cell(&record.acronym),
            escape_cell(&record.title),
            escape_cell(&record.outcome),
            escape_cell(&record.source_label),
            confidence
        ));
    }

    out.push_str("\n## Sources\n\n");
    out.push_str("| Source | Status |\n");
    out.push_str("|--------|--------|\n");
    for id in ProviderId::ALL {
        out.push_str(&format!("| {} | {} |\n", id, outcome.status.outcome(id)));
    }

    out.push_str(&format!("\n{} records total", outcome.status.total_records));
    if outcome.status.exhausted {
        out.push_str(" (offline dataset only)");
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::render_outcome;
    use crate::entities::trial::{
        AggregationStatus, ProviderOutcome, SearchOutcome, TrialRecord,
    };

    fn outcome() -> SearchOutcome {
        SearchOutcome {
            records: vec![TrialRecord {
                id: "ct_NCT00242099".to_string(),
                acronym: "UKPDS".to_string(),
                title: "United Kingdom Prospective Diabetes Study".to_string(),
                subject: "metformin".to_string(),
                outcome: "Reduced microvascular complications".to_string(),
                summary: "No summary available".to_string(),
                visualization_hint: "Clinical trial diagram for UKPDS study".to_string(),
                source_url: None,
                source_label: "Offline dataset".to_string(),
                confidence: Some(0.72),
            }],
            status: AggregationStatus {
                registry: ProviderOutcome::SoftFailed {
                    reason: "HTTP 500".into(),
                },
                literature: ProviderOutcome::Disabled,
                generative: ProviderOutcome::SucceededMock { records: 2 },
                offline: ProviderOutcome::Succeeded { records: 1 },
                total_records: 1,
                exhausted: true,
            },
        }
    }

    #[test]
    fn renders_record_rows_and_status_footer() {
        let md = render_outcome("metformin", &outcome());

        assert!(md.contains("# Trial search: metformin"));
        assert!(md.contains("| UKPDS |"));
        assert!(md.contains("| 72% |"));
        assert!(md.contains("| generative | succeeded (mock) |"));
        assert!(md.contains("| registry | soft-failed: HTTP 500 |"));
        assert!(md.contains("1 records total (offline dataset only)"));
    }

    #[test]
    fn escapes_pipes_inside_cells() {
        let mut o = outcome();
        o.records[0].title = "A | B".to_string();
        let md = render_outcome("metformin", &o);
        assert!(md.contains("A \\| B"));
    }
}
