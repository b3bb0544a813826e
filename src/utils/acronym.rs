//! Display-acronym heuristics shared by the normalizers and the offline dataset.
//!
//! Both functions are total and side-effect-free: any input maps to the same
//! non-empty string on every call.

/// Drug-class keyword → conventional acronym style, matched as a substring.
const CLASS_ACRONYMS: &[(&str, &str)] = &[
    ("glp", "GLP-TRIAL"),
    ("sglt", "SGLT-STUDY"),
    ("dpp", "DPP-RESEARCH"),
    ("metformin", "MET-STUDY"),
    ("insulin", "INSULIN-TRIAL"),
    ("statin", "STATIN-RESEARCH"),
];

const MAX_INITIALS: usize = 6;

fn is_acronym_token(word: &str) -> bool {
    word.chars().count() > 1
        && word.chars().any(|c| c.is_ascii_uppercase())
        && !word.chars().any(|c| c.is_lowercase())
}

/// Extracts the concatenated all-uppercase tokens of length > 1 from a study
/// title, e.g. "The SURMOUNT Weight Management Trial" → "SURMOUNT".
///
/// Titles without such a token fall through to [`generate_acronym`] so the
/// result is always non-empty.
pub(crate) fn derive_acronym_from_title(title: &str) -> String {
    let literal: String = title
        .split_whitespace()
        .filter(|word| is_acronym_token(word))
        .collect();

    if literal.is_empty() {
        generate_acronym(title)
    } else {
        literal
    }
}

/// Builds a display acronym for a search subject.
///
/// Checks the subject against the drug-class keyword table first, then falls
/// back to the initials of its whitespace/hyphen/underscore-delimited words
/// (capped at [`MAX_INITIALS`] characters), and finally to the literal
/// "TRIAL" when the subject has no usable fragments.
pub(crate) fn generate_acronym(subject: &str) -> String {
    let lower = subject.to_lowercase();
    for (keyword, acronym) in CLASS_ACRONYMS {
        if lower.contains(keyword) {
            return (*acronym).to_string();
        }
    }

    let initials: String = subject
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter_map(|word| word.chars().next())
        .map(|c| c.to_ascii_uppercase())
        .take(MAX_INITIALS)
        .collect();

    if initials.is_empty() {
        "TRIAL".to_string()
    } else {
        initials
    }
}
