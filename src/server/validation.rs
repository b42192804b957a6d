//! Request-boundary validation, independent of any single endpoint.

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::domain::MAX_MISSION_LEN;
use crate::error::CoreError;

static XSS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(<script|javascript:|\bon\w+\s*=)").expect("valid regex"));

pub fn validate_mission(mission: &str) -> Result<(), CoreError> {
    if mission.is_empty() || mission.chars().count() > MAX_MISSION_LEN {
        return Err(CoreError::Validation(format!(
            "mission must be 1..{MAX_MISSION_LEN} characters"
        )));
    }
    if XSS_PATTERN.is_match(mission) {
        return Err(CoreError::Validation("mission contains disallowed markup".to_string()));
    }
    Ok(())
}

pub fn validate_swarm_size(size: Option<i64>) -> Result<Option<usize>, CoreError> {
    match size {
        None => Ok(None),
        Some(n) if (1..=20).contains(&n) => Ok(Some(n as usize)),
        Some(_) => Err(CoreError::Validation("swarmSize must be in [1, 20]".to_string())),
    }
}

pub fn validate_max_budget(budget: Option<f64>) -> Result<Option<f64>, CoreError> {
    match budget {
        None => Ok(None),
        Some(b) if (0.01..=5.0).contains(&b) => Ok(Some(b)),
        Some(_) => Err(CoreError::Validation("maxBudget must be in [0.01, 5.0]".to_string())),
    }
}

pub fn validate_trace_id(raw: &str) -> Result<Uuid, CoreError> {
    Uuid::parse_str(raw).map_err(|_| CoreError::Validation("traceId must be a UUID".to_string()))
}

pub fn validate_pagination(limit: Option<i64>, offset: Option<i64>) -> Result<(usize, usize), CoreError> {
    let limit = match limit {
        None => 50,
        Some(l) if (1..=100).contains(&l) => l as usize,
        Some(_) => return Err(CoreError::Validation("limit must be in [1, 100]".to_string())),
    };
    let offset = match offset {
        None => 0,
        Some(o) if o >= 0 => o as usize,
        Some(_) => return Err(CoreError::Validation("offset must be >= 0".to_string())),
    };
    Ok((limit, offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mission_boundary_lengths() {
        assert!(validate_mission(&"x".repeat(MAX_MISSION_LEN)).is_ok());
        assert!(validate_mission(&"x".repeat(MAX_MISSION_LEN + 1)).is_err());
        assert!(validate_mission("").is_err());
    }

    #[test]
    fn mission_rejects_script_like_substrings() {
        assert!(validate_mission("please <script>alert(1)</script>").is_err());
        assert!(validate_mission("click javascript:alert(1)").is_err());
        assert!(validate_mission("<img onerror=alert(1)>").is_err());
    }

    #[test]
    fn swarm_size_boundaries() {
        assert!(validate_swarm_size(Some(0)).is_err());
        assert!(validate_swarm_size(Some(21)).is_err());
        assert_eq!(validate_swarm_size(Some(1)).unwrap(), Some(1));
        assert_eq!(validate_swarm_size(Some(20)).unwrap(), Some(20));
    }

    #[test]
    fn pagination_boundaries() {
        assert!(validate_pagination(Some(0), None).is_err());
        assert!(validate_pagination(Some(101), None).is_err());
        assert!(validate_pagination(Some(1), Some(0)).is_ok());
        assert!(validate_pagination(Some(100), None).is_ok());
    }

    #[test]
    fn trace_id_must_be_uuid() {
        assert!(validate_trace_id("not-a-uuid").is_err());
        assert!(validate_trace_id(&Uuid::new_v4().to_string()).is_ok());
    }
}
