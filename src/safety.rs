//! Regex-based content classification and sanitization.
//!
//! Mirrors the shape of a diff-scanner (pattern table → matches → flags),
//! retargeted from scanning source diffs to scanning mission text.

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::domain::safety::FlagSource;
use crate::domain::{RedTeamFlag, Severity};

struct Pattern {
    category: &'static str,
    severity: Severity,
    explanation: &'static str,
    regex: fn() -> &'static Regex,
}

macro_rules! pattern_regex {
    ($name:ident, $re:expr) => {
        fn $name() -> &'static Regex {
            static RE: Lazy<Regex> = Lazy::new(|| Regex::new($re).expect("valid safety pattern"));
            &RE
        }
    };
}

pattern_regex!(
    violence_re,
    r"(?i)\b(how to (make|build) a (bomb|explosive|weapon)|kill (him|her|them|everyone)|mass shooting)\b"
);
pattern_regex!(
    illegal_re,
    r"(?i)\b(how to (launder money|evade taxes|hack into)|buy (drugs|stolen) (online|goods))\b"
);
pattern_regex!(
    pii_re,
    r"(?i)\b(social security number|credit card number|home address) (is|of)\b"
);
pattern_regex!(
    manipulation_re,
    r"(?i)\b(pretend you have no (restrictions|rules)|ignore (all|your) (previous|prior) instructions)\b"
);
pattern_regex!(
    self_harm_re,
    r"(?i)\b(how to (commit suicide|self[- ]harm)|ways to hurt myself)\b"
);
pattern_regex!(
    csam_re,
    r"(?i)\b(child sexual abuse material|sexual (content|images) (of|involving) (a )?minors?)\b"
);

fn patterns() -> &'static [Pattern] {
    static PATTERNS: &[Pattern] = &[
        Pattern {
            category: "violence",
            severity: Severity::Critical,
            explanation: "content describing or requesting violent harm",
            regex: violence_re,
        },
        Pattern {
            category: "illegal",
            severity: Severity::High,
            explanation: "content requesting assistance with illegal activity",
            regex: illegal_re,
        },
        Pattern {
            category: "pii",
            severity: Severity::Medium,
            explanation: "content referencing personally identifiable information",
            regex: pii_re,
        },
        Pattern {
            category: "manipulation",
            severity: Severity::Medium,
            explanation: "content attempting to manipulate the system's behavior",
            regex: manipulation_re,
        },
        Pattern {
            category: "self_harm",
            severity: Severity::High,
            explanation: "content referencing self-harm",
            regex: self_harm_re,
        },
        Pattern {
            category: "csam",
            severity: Severity::Critical,
            explanation: "content referencing child sexual abuse material",
            regex: csam_re,
        },
    ];
    PATTERNS
}

/// Scan free text for safety issues, tagging each finding with where it came
/// from in the mission lifecycle.
pub fn scan(content: &str, source: FlagSource) -> Vec<RedTeamFlag> {
    let mut flags = Vec::new();
    for pattern in patterns() {
        let re = (pattern.regex)();
        for m in re.find_iter(content) {
            flags.push(RedTeamFlag {
                flag_id: Uuid::new_v4(),
                severity: pattern.severity,
                categories: vec![pattern.category.to_string()],
                explanation: pattern.explanation.to_string(),
                source,
                content: m.as_str().to_string(),
            });
        }
    }
    flags
}

pattern_regex!(ssn_re, r"\b\d{3}-\d{2}-\d{4}\b");
pattern_regex!(card_re, r"\b\d{4}[ -]?\d{4}[ -]?\d{4}[ -]?\d{4}\b");
pattern_regex!(email_re, r"\b[\w.+-]+@[\w-]+\.[A-Za-z]{2,}\b");
pattern_regex!(phone_re, r"\b\d{3}[ -]?\d{3}[ -]?\d{4}\b");

/// Redact common PII shapes before persistence. Idempotent: redacting
/// already-redacted text is a no-op.
pub fn sanitize(text: &str) -> String {
    let text = ssn_re().replace_all(text, "[REDACTED_SSN]");
    let text = card_re().replace_all(&text, "[REDACTED_CARD]");
    let text = email_re().replace_all(&text, "[REDACTED_EMAIL]");
    let text = phone_re().replace_all(&text, "[REDACTED_PHONE]");
    text.into_owned()
}
