//! Outcome domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Kind of completion a user earned in a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeType {
    Certificate,
    Grade,
    PathwayCompletion,
    CollegeCredit,
}

impl OutcomeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeType::Certificate => "certificate",
            OutcomeType::Grade => "grade",
            OutcomeType::PathwayCompletion => "pathway_completion",
            OutcomeType::CollegeCredit => "college_credit",
        }
    }
}

impl FromStr for OutcomeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "certificate" => Ok(OutcomeType::Certificate),
            "grade" => Ok(OutcomeType::Grade),
            "pathway_completion" => Ok(OutcomeType::PathwayCompletion),
            "college_credit" => Ok(OutcomeType::CollegeCredit),
            other => Err(format!("unknown outcome type: {}", other)),
        }
    }
}

impl fmt::Display for OutcomeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal completion record for a user/program pair.
///
/// Any outcome excludes the program from recent-program and
/// current-enrollment views.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Outcome {
    pub id: i64,
    pub user_id: i64,
    pub program_id: i64,
    #[serde(rename = "type")]
    pub outcome_type: OutcomeType,
    pub value: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOutcomeRequest {
    pub program_id: i64,

    #[serde(rename = "type")]
    pub outcome_type: OutcomeType,

    /// Grade letter, credit hours and the like; empty for certificates.
    #[serde(default)]
    #[validate(length(max = 255, message = "value must be at most 255 characters"))]
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct OutcomePatch {
    #[serde(rename = "type")]
    pub outcome_type: Option<OutcomeType>,
    #[validate(length(max = 255, message = "value must be at most 255 characters"))]
    pub value: Option<String>,
}

impl OutcomePatch {
    pub fn is_empty(&self) -> bool {
        self.outcome_type.is_none() && self.value.is_none()
    }

    pub fn apply(&self, outcome: &mut Outcome) {
        if let Some(v) = self.outcome_type {
            outcome.outcome_type = v;
        }
        if let Some(v) = &self.value {
            outcome.value = v.clone();
        }
    }
}

/// `?type=` filter for listing a user's outcomes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutcomeFilter {
    #[serde(rename = "type")]
    pub outcome_type: Option<OutcomeType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_type_round_trips_through_str() {
        assert_eq!(
            "Pathway_Completion".parse::<OutcomeType>().unwrap(),
            OutcomeType::PathwayCompletion
        );
        assert_eq!(OutcomeType::CollegeCredit.to_string(), "college_credit");
        assert!("diploma".parse::<OutcomeType>().is_err());
    }

    #[test]
    fn test_patch_changes_only_given_fields() {
        let mut outcome = Outcome {
            id: 1,
            user_id: 2,
            program_id: 3,
            outcome_type: OutcomeType::Grade,
            value: "B".to_string(),
            created_at: Utc::now(),
        };
        let patch: OutcomePatch = serde_json::from_str(r#"{"value":"A-"}"#).unwrap();
        assert!(!patch.is_empty());
        patch.apply(&mut outcome);
        assert_eq!(outcome.value, "A-");
        assert_eq!(outcome.outcome_type, OutcomeType::Grade);
        assert!(OutcomePatch::default().is_empty());
    }

    #[test]
    fn test_create_request_rejects_unknown_type() {
        let result = serde_json::from_str::<CreateOutcomeRequest>(
            r#"{"program_id": 4, "type": "diploma"}"#,
        );
        assert!(result.is_err());

        let request: CreateOutcomeRequest =
            serde_json::from_str(r#"{"program_id": 4, "type": "certificate"}"#).unwrap();
        assert_eq!(request.value, "");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_value_length_is_validated() {
        let patch = OutcomePatch {
            value: Some("x".repeat(256)),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }
}
