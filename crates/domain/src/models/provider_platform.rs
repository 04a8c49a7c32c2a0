//! Provider platform domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

/// Kind of external learning system behind a provider platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderPlatformType {
    CanvasOss,
    CanvasCloud,
    Kolibri,
}

impl ProviderPlatformType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CanvasOss => "canvas_oss",
            Self::CanvasCloud => "canvas_cloud",
            Self::Kolibri => "kolibri",
        }
    }

    /// Kolibri stores `username:password` in the access key instead of a token.
    pub fn uses_combined_credentials(&self) -> bool {
        matches!(self, Self::Kolibri)
    }
}

impl FromStr for ProviderPlatformType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "canvas_oss" => Ok(Self::CanvasOss),
            "canvas_cloud" => Ok(Self::CanvasCloud),
            "kolibri" => Ok(Self::Kolibri),
            _ => Err(format!("Unknown provider platform type: {}", s)),
        }
    }
}

impl std::fmt::Display for ProviderPlatformType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state of a provider platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderPlatformState {
    #[default]
    Enabled,
    Disabled,
    Archived,
}

impl ProviderPlatformState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::Archived => "archived",
        }
    }
}

impl FromStr for ProviderPlatformState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "enabled" => Ok(Self::Enabled),
            "disabled" => Ok(Self::Disabled),
            "archived" => Ok(Self::Archived),
            _ => Err(format!("Unknown provider platform state: {}", s)),
        }
    }
}

/// An external system supplying learning programs and user activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderPlatform {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub platform_type: ProviderPlatformType,
    pub description: Option<String>,
    pub base_url: String,
    pub account_id: String,
    #[serde(skip_serializing)]
    pub access_key: String,
    pub state: ProviderPlatformState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProviderPlatform {
    pub fn is_enabled(&self) -> bool {
        self.state == ProviderPlatformState::Enabled
    }
}

/// Request body for registering a provider platform.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProviderPlatformRequest {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,

    #[serde(rename = "type")]
    pub platform_type: ProviderPlatformType,

    #[validate(length(max = 1000, message = "description must be at most 1000 characters"))]
    pub description: Option<String>,

    #[validate(url(message = "base_url must be a valid URL"))]
    pub base_url: String,

    #[validate(length(min = 1, max = 255, message = "account_id must be 1-255 characters"))]
    pub account_id: String,

    #[validate(length(min = 1, message = "access_key is required"))]
    pub access_key: String,

    #[serde(default)]
    pub state: ProviderPlatformState,
}

impl CreateProviderPlatformRequest {
    /// Checks cross-field rules that the derive cannot express.
    pub fn check_credentials(&self) -> Result<(), String> {
        if self.platform_type.uses_combined_credentials() {
            shared::credentials::split_access_key(&self.access_key)
                .map(|_| ())
                .map_err(|e| format!("invalid access key for {}: {}", self.platform_type, e))
        } else {
            Ok(())
        }
    }
}

/// Partial update of a provider platform. The type is fixed at registration.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProviderPlatformPatch {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 1000, message = "description must be at most 1000 characters"))]
    pub description: Option<String>,

    #[validate(url(message = "base_url must be a valid URL"))]
    pub base_url: Option<String>,

    #[validate(length(min = 1, max = 255, message = "account_id must be 1-255 characters"))]
    pub account_id: Option<String>,

    #[validate(length(min = 1, message = "access_key is required"))]
    pub access_key: Option<String>,

    pub state: Option<ProviderPlatformState>,
}

impl ProviderPlatformPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.base_url.is_none()
            && self.account_id.is_none()
            && self.access_key.is_none()
            && self.state.is_none()
    }

    /// Applies the patch and re-checks the credential rule against the result.
    pub fn apply(&self, platform: &mut ProviderPlatform) -> Result<(), String> {
        if let Some(v) = &self.access_key {
            if platform.platform_type.uses_combined_credentials() {
                shared::credentials::split_access_key(v).map_err(|e| {
                    format!("invalid access key for {}: {}", platform.platform_type, e)
                })?;
            }
            platform.access_key = v.clone();
        }
        if let Some(v) = &self.name {
            platform.name = v.clone();
        }
        if let Some(v) = &self.description {
            platform.description = Some(v.clone());
        }
        if let Some(v) = &self.base_url {
            platform.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = &self.account_id {
            platform.account_id = v.clone();
        }
        if let Some(v) = self.state {
            platform.state = v;
        }
        Ok(())
    }
}
