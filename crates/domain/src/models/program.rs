//! Program catalog domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Kind of program offered by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramType {
    FixedGrade,
    OpenEnrollment,
    OpenContent,
}

impl ProgramType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramType::FixedGrade => "fixed_grade",
            ProgramType::OpenEnrollment => "open_enrollment",
            ProgramType::OpenContent => "open_content",
        }
    }
}

impl FromStr for ProgramType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed_grade" => Ok(ProgramType::FixedGrade),
            "open_enrollment" => Ok(ProgramType::OpenEnrollment),
            "open_content" => Ok(ProgramType::OpenContent),
            other => Err(format!("unknown program type: {}", other)),
        }
    }
}

impl fmt::Display for ProgramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal catalog entry bound to one provider by its external id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Program {
    pub id: i64,
    pub provider_platform_id: i64,
    pub name: String,
    pub alt_name: String,
    pub description: String,
    pub external_id: String,
    pub thumbnail_url: String,
    pub external_url: String,
    #[serde(rename = "type")]
    pub program_type: ProgramType,
    /// Comma-separated outcome types.
    pub outcome_types: String,
    pub total_progress_milestones: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting or refreshing a program during import.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProgram {
    pub provider_platform_id: i64,
    pub name: String,
    pub alt_name: String,
    pub description: String,
    pub external_id: String,
    pub thumbnail_url: String,
    pub external_url: String,
    pub program_type: ProgramType,
    pub outcome_types: String,
    pub total_progress_milestones: i64,
}

/// Partial update of a program. Only fields that are `Some` are written.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProgramPatch {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: Option<String>,
    pub alt_name: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub external_url: Option<String>,
    #[serde(rename = "type")]
    pub program_type: Option<ProgramType>,
    pub outcome_types: Option<String>,
    #[validate(range(min = 0, message = "total_progress_milestones cannot be negative"))]
    pub total_progress_milestones: Option<i64>,
}

impl ProgramPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.alt_name.is_none()
            && self.description.is_none()
            && self.thumbnail_url.is_none()
            && self.external_url.is_none()
            && self.program_type.is_none()
            && self.outcome_types.is_none()
            && self.total_progress_milestones.is_none()
    }

    pub fn apply(&self, program: &mut Program) {
        if let Some(v) = &self.name {
            program.name = v.clone();
        }
        if let Some(v) = &self.alt_name {
            program.alt_name = v.clone();
        }
        if let Some(v) = &self.description {
            program.description = v.clone();
        }
        if let Some(v) = &self.thumbnail_url {
            program.thumbnail_url = v.clone();
        }
        if let Some(v) = &self.external_url {
            program.external_url = v.clone();
        }
        if let Some(v) = self.program_type {
            program.program_type = v;
        }
        if let Some(v) = &self.outcome_types {
            program.outcome_types = v.clone();
        }
        if let Some(v) = self.total_progress_milestones {
            program.total_progress_milestones = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program() -> Program {
        Program {
            id: 3,
            provider_platform_id: 1,
            name: "Algebra I".to_string(),
            alt_name: "MATH-101".to_string(),
            description: String::new(),
            external_id: "c-1".to_string(),
            thumbnail_url: String::new(),
            external_url: "https://canvas.example.edu/courses/1".to_string(),
            program_type: ProgramType::FixedGrade,
            outcome_types: "grade".to_string(),
            total_progress_milestones: 10,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_program_type_from_str() {
        assert_eq!("open_content".parse::<ProgramType>().unwrap(), ProgramType::OpenContent);
        assert_eq!(" Fixed_Grade ".parse::<ProgramType>().unwrap(), ProgramType::FixedGrade);
        assert!("semester".parse::<ProgramType>().is_err());
    }

    #[test]
    fn test_patch_zero_value_is_written() {
        let mut p = program();
        let patch = ProgramPatch {
            total_progress_milestones: Some(0),
            description: Some(String::new()),
            ..Default::default()
        };
        patch.apply(&mut p);
        assert_eq!(p.total_progress_milestones, 0);
        assert_eq!(p.description, "");
        assert_eq!(p.name, "Algebra I");
    }

    #[test]
    fn test_patch_deserialize_unset_fields() {
        let patch: ProgramPatch = serde_json::from_str(r#"{"name":"Geometry"}"#).unwrap();
        assert_eq!(patch.name.as_deref(), Some("Geometry"));
        assert!(patch.program_type.is_none());
        assert!(!patch.is_empty());
        assert!(ProgramPatch::default().is_empty());
    }

    #[test]
    fn test_patch_validation() {
        let patch = ProgramPatch {
            total_progress_milestones: Some(-1),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }
}
