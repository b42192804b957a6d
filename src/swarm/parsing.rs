//! Regex-based extraction of confidence tags and reviewer critique lines from
//! free-text model output. Tolerant of whitespace/case; never fails the
//! mission on a parse miss — callers fall back to documented defaults.

use once_cell::sync::Lazy;
use regex::Regex;

static CONFIDENCE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[\s*confidence\s*:\s*([0-9]*\.?[0-9]+)\s*\]").expect("valid regex"));

static CRITIQUE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*(agent-[\w-]+)\s*:\s*([0-9]*\.?[0-9]+)").expect("valid regex"));

static CONSENSUS_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[\s*consensus\s*\]\s*:\s*([0-9]*\.?[0-9]+)").expect("valid regex"));

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Strip a `[CONFIDENCE: X.XX]` tag from response text and return the
/// cleaned text plus the parsed confidence (default 0.5, clamped [0,1]).
pub fn extract_confidence(text: &str) -> (String, f64) {
    match CONFIDENCE_TAG.captures(text) {
        Some(caps) => {
            let value = caps[1].parse::<f64>().map(clamp01).unwrap_or(0.5);
            let cleaned = CONFIDENCE_TAG.replace(text, "").trim().to_string();
            (cleaned, value)
        }
        None => (text.trim().to_string(), 0.5),
    }
}

/// Parse reviewer output into per-agent score updates plus an overall
/// consensus score. Agents not mentioned are simply absent from the map.
pub fn parse_critique(text: &str) -> (std::collections::HashMap<String, f64>, f64) {
    let mut scores = std::collections::HashMap::new();
    for caps in CRITIQUE_LINE.captures_iter(text) {
        let agent_id = caps[1].to_string();
        if let Ok(score) = caps[2].parse::<f64>() {
            scores.insert(agent_id, clamp01(score));
        }
    }

    let consensus = CONSENSUS_LINE
        .captures(text)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .map(clamp01)
        .unwrap_or_else(|| {
            if scores.is_empty() {
                0.0
            } else {
                scores.values().sum::<f64>() / scores.len() as f64
            }
        });

    (scores, consensus)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_confidence_parses_and_strips_tag() {
        let (text, confidence) = extract_confidence("the answer is 42 [CONFIDENCE: 0.87]");
        assert_eq!(text, "the answer is 42");
        assert_eq!(confidence, 0.87);
    }

    #[test]
    fn extract_confidence_defaults_when_tag_missing() {
        let (text, confidence) = extract_confidence("no tag here");
        assert_eq!(text, "no tag here");
        assert_eq!(confidence, 0.5);
    }

    #[test]
    fn extract_confidence_clamps_out_of_range() {
        let (_, confidence) = extract_confidence("[confidence: 3.5]");
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn parse_critique_reads_agent_lines_and_consensus() {
        let text = "agent-1: 0.9 | solid reasoning\nagent-2: 0.7 | minor gaps\n[CONSENSUS]: 0.85 | good alignment";
        let (scores, consensus) = parse_critique(text);
        assert_eq!(scores.get("agent-1"), Some(&0.9));
        assert_eq!(scores.get("agent-2"), Some(&0.7));
        assert_eq!(consensus, 0.85);
    }

    #[test]
    fn parse_critique_falls_back_to_mean_when_consensus_tag_missing() {
        let text = "agent-1: 0.8\nagent-2: 0.4";
        let (_, consensus) = parse_critique(text);
        assert!((consensus - 0.6).abs() < 1e-9);
    }

    #[test]
    fn parse_critique_returns_zero_consensus_when_nothing_parses() {
        let (scores, consensus) = parse_critique("no useful lines here");
        assert!(scores.is_empty());
        assert_eq!(consensus, 0.0);
    }
}
