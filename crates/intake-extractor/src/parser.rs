//! Parse model output into a summary and a decision

use intake_domain::Decision;
use regex::Regex;
use std::sync::LazyLock;

/// Trailing decision clause; group 1 is the summary, group 2 the token
static DECISION_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^(.*)\s+Decision:\s*(ESCALATE|APPROVE|FLAG)\s*$").unwrap()
});

/// Summary and decision extracted from a model response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    /// Response text without the decision clause
    pub summary: String,
    /// Parsed decision, `Unknown` when no trailing clause was found
    pub decision: Decision,
}

/// Remove markdown emphasis and heading characters (`*`, `_`, `#`)
pub fn strip_markup(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '*' | '_' | '#')).collect()
}

/// Split a model response into summary and decision
///
/// The clause is only recognized at the very end of the cleaned text, so
/// earlier mentions of "Decision" in the body are ignored. When no clause is
/// found the whole cleaned text becomes the summary and the decision is
/// `Unknown`; this never fails.
///
/// # Examples
///
/// ```
/// use intake_extractor::parse_decision;
/// use intake_domain::Decision;
///
/// let parsed = parse_decision("**Summary:** Missing indemnity clause.\n\nDecision: flag");
/// assert_eq!(parsed.decision, Decision::Flag);
/// assert_eq!(parsed.summary, "Summary: Missing indemnity clause.");
/// ```
pub fn parse_decision(response: &str) -> ParsedResponse {
    let cleaned = strip_markup(response);

    if let Some(caps) = DECISION_CLAUSE.captures(&cleaned) {
        let summary = caps.get(1).map_or("", |m| m.as_str()).trim().to_string();
        let decision = caps
            .get(2)
            .and_then(|m| Decision::parse(m.as_str()))
            .unwrap_or(Decision::Unknown);
        return ParsedResponse { summary, decision };
    }

    ParsedResponse {
        summary: cleaned,
        decision: Decision::Unknown,
    }
}
