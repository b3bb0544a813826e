use std::sync::OnceLock;

use regex::Regex;

use crate::entities::trial::TrialRecord;
use crate::utils::acronym;
use crate::utils::text;

pub(crate) const LITERATURE_LABEL: &str = "PubMed";

const SUMMARY_MAX_BYTES: usize = 500;

fn article_title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<ArticleTitle[^>]*>(.*?)</ArticleTitle>").expect("valid regex")
    })
}

fn abstract_text_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<AbstractText[^>]*>(.*?)</AbstractText>").expect("valid regex")
    })
}

fn first_capture(re: &Regex, xml: &str) -> Option<String> {
    let raw = re.captures(xml)?.get(1)?.as_str();
    let cleaned = text::clean_markup(raw);
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

/// Maps one `efetch` article payload to a canonical record. Articles whose
/// XML carries no title are unmappable and yield `None`.
pub(crate) fn from_article_xml(xml: &str, pmid: &str, subject: &str) -> Option<TrialRecord> {
    let title = first_capture(article_title_re(), xml)?;

    let summary = first_capture(abstract_text_re(), xml)
        .map(|s| text::truncate_utf8(&s, SUMMARY_MAX_BYTES, "..."))
        .unwrap_or_else(|| "No summary available".to_string());

    let acronym = acronym::derive_acronym_from_title(&title);

    Some(TrialRecord {
        id: format!("pubmed_{pmid}"),
        visualization_hint: format!("Research article visualization for {acronym} study"),
        source_url: Some(format!("https://pubmed.ncbi.nlm.nih.gov/{pmid}/")),
        acronym,
        title,
        subject: subject.to_string(),
        outcome: "PubMed Research Article".to_string(),
        summary,
        source_label: LITERATURE_LABEL.to_string(),
        confidence: None,
    })
}
