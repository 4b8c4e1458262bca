//! Field salvage: last-resort extraction of known top-level scalars from text that
//! no structural repair could parse.
//!
//! Anchors are hard-coded per result shape. Every placeholder is explicitly labeled so
//! nobody mistakes a salvaged result for a real one.

use regex::Regex;
use serde_json::{json, Value};

pub const PLACEHOLDER_FOCUS: &str = "Data parsing error";
pub const PLACEHOLDER_MESSAGE: &str = "AI response was malformed. Try again.";
pub const TRUNCATED_MESSAGE: &str = "Response was truncated, please retry.";

/// First `"key": "value"` string in the text.
pub fn string_field(raw: &str, key: &str) -> Option<String> {
    let pattern = format!(r#""{}"\s*:\s*"([^"]+)""#, regex::escape(key));
    let re = Regex::new(&pattern).ok()?;
    re.captures(raw).map(|caps| caps[1].to_string())
}

/// First `"key": <number>` in the text.
pub fn number_field(raw: &str, key: &str) -> Option<f64> {
    let pattern = format!(r#""{}"\s*:\s*(-?\d+(?:\.\d+)?)"#, regex::escape(key));
    let re = Regex::new(&pattern).ok()?;
    re.captures(raw).and_then(|caps| caps[1].parse().ok())
}

fn placeholder_phase() -> Value {
    json!({ "focus": PLACEHOLDER_FOCUS, "goals": [PLACEHOLDER_MESSAGE] })
}

/// 90-day plan: anchored on `roleContext`.
pub fn plan_90_days(raw: &str) -> Option<Value> {
    let role_context = string_field(raw, "roleContext")?;
    Some(json!({
        "roleContext": role_context,
        "days30": placeholder_phase(),
        "days60": placeholder_phase(),
        "days90": placeholder_phase(),
    }))
}

/// Resume analysis: any of `candidateName`, `overallScore`, `roastHeadline`.
pub fn analysis(raw: &str) -> Option<Value> {
    let candidate_name = string_field(raw, "candidateName");
    let overall_score = number_field(raw, "overallScore");
    let roast_headline = string_field(raw, "roastHeadline");

    if candidate_name.is_none() && overall_score.is_none() && roast_headline.is_none() {
        return None;
    }

    Some(json!({
        "candidateName": candidate_name.unwrap_or_default(),
        "overallScore": overall_score.map(|s| s.round() as i64).unwrap_or(0),
        "roastHeadline": roast_headline.unwrap_or_else(|| PLACEHOLDER_FOCUS.to_string()),
        "brutalTruth": TRUNCATED_MESSAGE,
        "redFlags": [PLACEHOLDER_MESSAGE],
    }))
}

/// Skill roadmap: anchored on `targetGoal`.
pub fn roadmap(raw: &str) -> Option<Value> {
    let target_goal = string_field(raw, "targetGoal")?;
    Some(json!({
        "targetGoal": target_goal,
        "schedule": [{
            "week": 1,
            "theme": PLACEHOLDER_FOCUS,
            "tasks": [PLACEHOLDER_MESSAGE],
            "resources": [],
            "checkpoint": TRUNCATED_MESSAGE,
        }],
    }))
}

/// Salary scripts: anchored on `estimatedMarketValue`.
pub fn salary(raw: &str) -> Option<Value> {
    let market_value = string_field(raw, "estimatedMarketValue")?;
    Some(json!({
        "estimatedMarketValue": market_value,
        "leveragePoints": [PLACEHOLDER_MESSAGE],
        "scripts": [],
    }))
}
