//! Pure tiering classifier: decides whether a mission is a free local task
//! or must be routed to the swarm.

use crate::domain::TierDecision;

const SIMPLE_TASK_PATTERNS: &[&str] = &[
    "clean", "format", "case", "convert", "extract", "count", "sort",
];

const MISSION_INDICATORS: &[&str] = &[
    "analyze",
    "synthesize",
    "design",
    "architect",
    "evaluate",
    "investigate",
    "compare",
    "strategize",
    "plan",
    "optimize",
    "research",
];

fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// Classify a mission into a tier, per the fixed rule ordering.
pub fn classify(mission: &str) -> TierDecision {
    let lower = mission.to_lowercase();
    let words = word_count(mission);
    let chars = mission.chars().count();

    if let Some(pattern) = SIMPLE_TASK_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return TierDecision::task(
            0.95,
            format!("matched simple-task pattern '{pattern}'"),
            Some(handler_for_pattern(pattern)),
        );
    }

    if words < 5 && chars < 40 {
        return TierDecision::task(0.7, "short, low-complexity input", None);
    }

    let indicator_hits = MISSION_INDICATORS.iter().filter(|kw| lower.contains(**kw)).count();
    if indicator_hits >= 2 {
        return TierDecision::mission(0.9, format!("{indicator_hits} mission indicators present"));
    }
    if indicator_hits == 1 && words >= 15 {
        return TierDecision::mission(0.8, "one mission indicator with substantial length");
    }

    if words >= 15 || chars >= 80 {
        return TierDecision::mission(0.75, "long-form input without explicit indicators");
    }

    TierDecision::task(0.6, "default: short, ambiguous input", None)
}

fn handler_for_pattern(pattern: &str) -> &'static str {
    match pattern {
        "clean" | "format" => "text_cleaner",
        "case" => "case_transformer",
        "convert" | "extract" => "whitespace_handler",
        "count" | "sort" => "counter",
        _ => "identity",
    }
}

/// Apply the local handler named by a task-tier decision to auxiliary
/// content. Unknown handler ids fall through to identity.
pub fn apply_local_handler(handler: &str, content: &str) -> String {
    match handler {
        "text_cleaner" => text_cleaner(content),
        "whitespace_handler" => whitespace_handler(content),
        "case_transformer" => case_transformer(content),
        "counter" => counter(content),
        _ => content.to_string(),
    }
}

fn text_cleaner(content: &str) -> String {
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
}

fn whitespace_handler(content: &str) -> String {
    content.split_whitespace().collect::<Vec<_>>().join(" ").trim().to_string()
}

fn case_transformer(content: &str) -> String {
    if content.chars().all(|c| !c.is_alphabetic() || c.is_uppercase()) {
        content.to_lowercase()
    } else if content.chars().all(|c| !c.is_alphabetic() || c.is_lowercase()) {
        content.to_uppercase()
    } else {
        let mut chars = content.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    }
}

fn counter(content: &str) -> String {
    let words = word_count(content);
    let chars = content.chars().count();
    let lines = content.lines().count();
    format!("words={words} chars={chars} lines={lines}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Tier;

    #[test]
    fn simple_task_pattern_routes_to_task() {
        let d = classify("please clean this text");
        assert_eq!(d.tier, Tier::Task);
        assert_eq!(d.confidence, 0.95);
        assert!(d.local_handler.is_some());
    }

    #[test]
    fn short_input_routes_to_task() {
        let d = classify("fix this");
        assert_eq!(d.tier, Tier::Task);
    }

    #[test]
    fn two_mission_indicators_route_to_mission_high_confidence() {
        let d = classify("please analyze and synthesize the results");
        assert_eq!(d.tier, Tier::Mission);
        assert_eq!(d.confidence, 0.9);
    }

    #[test]
    fn one_indicator_with_length_routes_to_mission() {
        let d = classify("please analyze this situation thoroughly across many different stakeholders");
        assert_eq!(d.tier, Tier::Mission);
        assert_eq!(d.confidence, 0.8);
    }

    #[test]
    fn long_input_without_indicators_routes_to_mission() {
        let d = classify("the quick brown fox jumps over the lazy dog near the riverbank every single morning");
        assert_eq!(d.tier, Tier::Mission);
        assert_eq!(d.confidence, 0.75);
    }

    #[test]
    fn classify_is_pure() {
        let a = classify("design a new system architecture for scaling");
        let b = classify("design a new system architecture for scaling");
        assert_eq!(a.tier, b.tier);
        assert_eq!(a.confidence, b.confidence);
    }

    #[test]
    fn counter_handler_reports_counts() {
        let out = apply_local_handler("counter", "one two\nthree");
        assert!(out.contains("words=3"));
        assert!(out.contains("lines=2"));
    }

    #[test]
    fn text_cleaner_normalizes_quotes_and_whitespace() {
        let out = apply_local_handler("text_cleaner", "  it\u{2019}s   great  ");
        assert_eq!(out, "it's great");
    }
}
