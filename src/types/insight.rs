//! Insight report types.
//!
//! The serialized shape (`trends` / `frictionPoints` / `recommendations`) is
//! the coupling point with an external text-generation service: a response in
//! the same shape deserializes into the same `InsightReport`.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::Result;

/// Three-level label shared by severity, impact and priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    High,
    Medium,
    Low,
}

impl Level {
    /// Label a share in `[0, 1]` against strict upper thresholds.
    pub fn from_share(share: f64, high_above: f64, medium_above: f64) -> Self {
        if share > high_above {
            Level::High
        } else if share > medium_above {
            Level::Medium
        } else {
            Level::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::High => "High",
            Level::Medium => "Medium",
            Level::Low => "Low",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub category: String,
    pub description: String,
    pub frequency: usize,
    pub severity: Level,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrictionPoint {
    pub category: String,
    pub description: String,
    pub impact: Level,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: String,
    pub description: String,
    pub priority: Level,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightReport {
    #[serde(default)]
    pub trends: Vec<Trend>,
    #[serde(default)]
    pub friction_points: Vec<FrictionPoint>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

impl InsightReport {
    /// Parse a report produced elsewhere (e.g. a text-generation service).
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn is_empty(&self) -> bool {
        self.trends.is_empty() && self.friction_points.is_empty() && self.recommendations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_thresholds_are_strict() {
        assert_eq!(Level::from_share(0.71, 0.7, 0.3), Level::High);
        assert_eq!(Level::from_share(0.7, 0.7, 0.3), Level::Medium);
        assert_eq!(Level::from_share(0.3, 0.7, 0.3), Level::Low);
        assert_eq!(Level::from_share(0.0, 0.7, 0.3), Level::Low);
    }

    #[test]
    fn test_report_wire_shape() {
        let report = InsightReport {
            trends: vec![],
            friction_points: vec![FrictionPoint {
                category: "Equipment Issues".to_string(),
                description: "Radios failed.".to_string(),
                impact: Level::High,
            }],
            recommendations: vec![],
        };

        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("frictionPoints").is_some());
        assert_eq!(value["frictionPoints"][0]["impact"], "High");
    }

    #[test]
    fn test_from_json_accepts_external_response() {
        let json = r#"{
            "trends": [{"category": "Communication", "description": "Clear nets.", "frequency": 4, "severity": "Medium"}],
            "frictionPoints": [],
            "recommendations": [{"category": "Training", "description": "Drill more.", "priority": "High"}]
        }"#;

        let report = InsightReport::from_json(json).unwrap();
        assert_eq!(report.trends[0].frequency, 4);
        assert_eq!(report.recommendations[0].priority, Level::High);
        assert!(report.friction_points.is_empty());
    }
}
