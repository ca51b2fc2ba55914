use std::sync::LazyLock;

use regex::Regex;

pub const GEC_LABEL: &str = "Grade 9 (GEC)";
pub const ANA_LABEL: &str = "ANA (Grades 1-6 & 9)";
pub const OTHER_LABEL: &str = "Other";

// Years are matched with explicit non-digit guards rather than `\b`, so that
// `2021_GEC.htm` still yields 2021.
static YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^0-9])(20[0-9]{2})(?:[^0-9]|$)").expect("year pattern"));

static GRADE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)gr(?:ade)?\.?\s*([0-9]+)").expect("grade pattern"));

static ANA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^a-z])ana(?:[^a-z]|$)").expect("ana pattern"));

/// First `20xx` year found in `text`.
pub fn infer_year(text: &str) -> Option<String> {
    YEAR.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Year from the link text, falling back to the link URL.
pub fn infer_session_year(link_text: &str, url: &str) -> Option<String> {
    infer_year(link_text).or_else(|| infer_year(url))
}

/// Grade label for a listing link.
///
/// Certificate and assessment markers win over a bare grade number, so
/// "Gr. 9 (General Education Certificate)" is the GEC sitting, not Grade 9.
pub fn infer_grade(text: &str) -> String {
    let lower = text.to_lowercase();
    if lower.contains("gec") || lower.contains("general education certificate") {
        return GEC_LABEL.to_string();
    }
    if lower.contains("annual national assessment") || ANA.is_match(&lower) {
        return ANA_LABEL.to_string();
    }
    if let Some(number) = GRADE.captures(&lower).and_then(|caps| caps.get(1)) {
        let number = number.as_str().trim_start_matches('0');
        let number = if number.is_empty() { "0" } else { number };
        return format!("Grade {number}");
    }
    OTHER_LABEL.to_string()
}
