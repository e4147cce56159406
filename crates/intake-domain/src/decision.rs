//! Decision module - compliance verdict attached to a processed document

use serde::{Deserialize, Serialize};
use std::fmt;

/// Compliance decision derived from the model's answer
///
/// `Unknown` is a valid, expected outcome: it means the model did not end its
/// answer with a recognizable decision clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    /// Needs escalation to a human reviewer
    Escalate,

    /// Compliant, no action needed
    Approve,

    /// Potential issues worth flagging
    Flag,

    /// No parseable decision in the model output
    Unknown,
}

impl Decision {
    /// Uppercase name as stored in the result table
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Escalate => "ESCALATE",
            Decision::Approve => "APPROVE",
            Decision::Flag => "FLAG",
            Decision::Unknown => "UNKNOWN",
        }
    }

    /// Parse a decision token (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "ESCALATE" => Some(Decision::Escalate),
            "APPROVE" => Some(Decision::Approve),
            "FLAG" => Some(Decision::Flag),
            "UNKNOWN" => Some(Decision::Unknown),
            _ => None,
        }
    }

    /// Whether the front-end should present this as needing review
    pub fn requires_review(&self) -> bool {
        matches!(self, Decision::Escalate | Decision::Flag)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid decision: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Decision::parse("escalate"), Some(Decision::Escalate));
        assert_eq!(Decision::parse("Approve"), Some(Decision::Approve));
        assert_eq!(Decision::parse(" FLAG "), Some(Decision::Flag));
        assert_eq!(Decision::parse("maybe"), None);
    }

    #[test]
    fn test_requires_review() {
        assert!(Decision::Escalate.requires_review());
        assert!(Decision::Flag.requires_review());
        assert!(!Decision::Approve.requires_review());
        assert!(!Decision::Unknown.requires_review());
    }

    #[test]
    fn test_serde_uses_uppercase() {
        assert_eq!(serde_json::to_string(&Decision::Flag).unwrap(), "\"FLAG\"");
        let d: Decision = serde_json::from_str("\"UNKNOWN\"").unwrap();
        assert_eq!(d, Decision::Unknown);
    }
}
