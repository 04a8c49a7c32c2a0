//! Provider-shaped records received from the provider gateway.
//!
//! These are transient: they are reconciled into internal entities and never
//! persisted as-is.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ExternalIdentity, NewUser, ProgramType};

/// Fields tried, in order, to name a record that failed to decode.
const IDENTIFYING_FIELDS: [&str; 2] = ["external_id", "external_user_id"];

/// One element of a provider response list.
///
/// Elements are decoded one at a time; an element that does not match the
/// record shape becomes `Malformed` and the rest of the list is unaffected.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportRecord<T> {
    Valid(T),
    Malformed { external_id: String, reason: String },
}

impl<T: DeserializeOwned> ImportRecord<T> {
    pub fn decode(value: Value) -> Self {
        let external_id = IDENTIFYING_FIELDS
            .iter()
            .find_map(|field| match value.get(*field) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            })
            .unwrap_or_default();
        match serde_json::from_value(value) {
            Ok(record) => ImportRecord::Valid(record),
            Err(e) => ImportRecord::Malformed {
                external_id,
                reason: e.to_string(),
            },
        }
    }

    pub fn decode_all(values: Vec<Value>) -> Vec<Self> {
        values.into_iter().map(Self::decode).collect()
    }
}

impl<T> From<T> for ImportRecord<T> {
    fn from(record: T) -> Self {
        ImportRecord::Valid(record)
    }
}

/// A user as reported by a provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportUser {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name_first: String,
    #[serde(default)]
    pub name_last: String,
    #[serde(default)]
    pub external_user_id: String,
    #[serde(default)]
    pub external_username: String,
}

impl ImportUser {
    /// A record with no username, email or surname carries nothing to import.
    pub fn is_empty(&self) -> bool {
        self.username.trim().is_empty()
            && self.email.trim().is_empty()
            && self.name_last.trim().is_empty()
    }

    /// Internal username: the provider username, else the external login, else
    /// the local part of the email.
    pub fn resolved_username(&self) -> Option<String> {
        [self.username.trim(), self.external_username.trim()]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| {
                self.email
                    .split('@')
                    .next()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
    }

    /// Builds the internal user, synthesizing an email when the provider has none.
    pub fn to_new_user(&self, default_email_domain: &str) -> Option<NewUser> {
        let username = self.resolved_username()?;
        let email = if self.email.trim().is_empty() {
            format!("{}@{}", username, default_email_domain)
        } else {
            self.email.trim().to_string()
        };
        Some(NewUser {
            username,
            email,
            name_first: self.name_first.trim().to_string(),
            name_last: self.name_last.trim().to_string(),
        })
    }

    /// Provider-side identifiers stored on the mapping row.
    pub fn identity(&self, provider_platform_id: i64) -> ExternalIdentity {
        ExternalIdentity {
            provider_platform_id,
            external_user_id: self.external_user_id.trim().to_string(),
            external_username: self.username.trim().to_string(),
            external_login_id: self.external_username.trim().to_string(),
        }
    }
}

/// A program (course, content channel) as reported by a provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportProgram {
    pub name: String,
    #[serde(default)]
    pub alt_name: String,
    #[serde(default)]
    pub description: String,
    pub external_id: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub external_url: String,
    #[serde(rename = "type")]
    pub program_type: String,
    #[serde(default)]
    pub outcome_types: Vec<String>,
    #[serde(default)]
    pub total_progress_milestones: i64,
}

impl ImportProgram {
    /// Outcome types joined into the stored comma-separated form.
    pub fn joined_outcome_types(&self) -> String {
        self.outcome_types
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn parsed_program_type(&self) -> Result<ProgramType, String> {
        self.program_type.parse()
    }
}

/// A discrete progress event for one user in one program.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportMilestone {
    pub external_id: String,
    #[serde(rename = "type")]
    pub milestone_type: String,
    #[serde(default)]
    pub is_completed: bool,
}

/// Cumulative usage reported for one user in one program.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportActivity {
    pub external_user_id: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub total_time: i64,
    #[serde(default)]
    pub external_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_import_user_is_empty() {
        assert!(ImportUser::default().is_empty());
        let user = ImportUser {
            name_first: "Only".to_string(),
            external_user_id: "42".to_string(),
            ..Default::default()
        };
        assert!(user.is_empty());
        let user = ImportUser {
            name_last: "Doe".to_string(),
            ..Default::default()
        };
        assert!(!user.is_empty());
    }

    #[test]
    fn test_resolved_username_fallbacks() {
        let user = ImportUser {
            external_username: "jdoe-login".to_string(),
            email: "jdoe@example.edu".to_string(),
            ..Default::default()
        };
        assert_eq!(user.resolved_username().as_deref(), Some("jdoe-login"));

        let user = ImportUser {
            email: "jdoe@example.edu".to_string(),
            ..Default::default()
        };
        assert_eq!(user.resolved_username().as_deref(), Some("jdoe"));

        let user = ImportUser {
            name_last: "Doe".to_string(),
            ..Default::default()
        };
        assert_eq!(user.resolved_username(), None);
    }

    #[test]
    fn test_to_new_user_synthesizes_email() {
        let user = ImportUser {
            username: "jdoe".to_string(),
            name_first: "Jane".to_string(),
            name_last: "Doe".to_string(),
            ..Default::default()
        };
        let new_user = user.to_new_user("imported.local").unwrap();
        assert_eq!(new_user.email, "jdoe@imported.local");
        assert_eq!(new_user.name_last, "Doe");
    }

    #[test]
    fn test_to_new_user_keeps_provider_email() {
        use fake::faker::internet::en::{SafeEmail, Username};
        use fake::Fake;

        let user = ImportUser {
            username: Username().fake(),
            email: SafeEmail().fake(),
            name_last: "Doe".to_string(),
            ..Default::default()
        };
        let new_user = user.to_new_user("imported.local").unwrap();
        assert_eq!(new_user.email, user.email);
        assert_eq!(new_user.username, user.username);
    }

    #[test]
    fn test_joined_outcome_types() {
        let program: ImportProgram = serde_json::from_value(json!({
            "name": "Algebra I",
            "external_id": "c-1",
            "type": "fixed_grade",
            "outcome_types": ["grade", " certificate ", ""],
            "total_progress_milestones": 12
        }))
        .unwrap();
        assert_eq!(program.joined_outcome_types(), "grade,certificate");
        assert_eq!(program.parsed_program_type().unwrap(), ProgramType::FixedGrade);
    }

    #[test]
    fn test_decode_all_keeps_valid_neighbours_of_malformed_record() {
        let records = ImportRecord::<ImportProgram>::decode_all(vec![
            json!({ "name": "A", "external_id": "c-1", "type": "fixed_grade" }),
            json!({ "name": "B", "type": "fixed_grade" }),
            json!({ "name": "C", "external_id": 3, "type": "open_content" }),
            json!({ "name": "D", "external_id": "c-4", "type": "open_content" }),
        ]);

        assert!(matches!(&records[0], ImportRecord::Valid(p) if p.external_id == "c-1"));
        match &records[1] {
            ImportRecord::Malformed { external_id, reason } => {
                assert_eq!(external_id, "");
                assert!(reason.contains("external_id"));
            }
            other => panic!("expected malformed record, got {:?}", other),
        }
        assert!(matches!(&records[2], ImportRecord::Malformed { external_id, .. } if external_id == "3"));
        assert!(matches!(&records[3], ImportRecord::Valid(_)));
    }

    #[test]
    fn test_null_total_time_is_malformed() {
        let records = ImportRecord::<ImportActivity>::decode_all(vec![
            json!({ "external_user_id": "u-1", "type": "interaction", "total_time": 60 }),
            json!({ "external_user_id": "u-2", "type": "interaction", "total_time": null }),
        ]);
        assert!(matches!(&records[0], ImportRecord::Valid(a) if a.total_time == 60));
        assert!(matches!(&records[1], ImportRecord::Malformed { external_id, .. } if external_id == "u-2"));
    }

    #[test]
    fn test_import_activity_deserialize() {
        let activity: ImportActivity = serde_json::from_value(json!({
            "external_user_id": "u-9",
            "type": "interaction",
            "total_time": 3600
        }))
        .unwrap();
        assert_eq!(activity.total_time, 3600);
        assert_eq!(activity.external_id, None);
    }
}
