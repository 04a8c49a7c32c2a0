//! Provider credential parsing.

use thiserror::Error;

/// Error returned when a combined credential cannot be split.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("access key must be in the format username:password")]
    MissingSeparator,
    #[error("access key has an empty username")]
    EmptyUsername,
}

/// Username/password pair recovered from a combined access key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitCredentials {
    pub username: String,
    pub password: String,
}

/// Splits a `username:password` access key on the first colon.
///
/// Passwords may themselves contain colons.
pub fn split_access_key(access_key: &str) -> Result<SplitCredentials, CredentialError> {
    let (username, password) = access_key
        .split_once(':')
        .ok_or(CredentialError::MissingSeparator)?;
    if username.is_empty() {
        return Err(CredentialError::EmptyUsername);
    }
    Ok(SplitCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple() {
        let creds = split_access_key("admin:secret").unwrap();
        assert_eq!(creds.username, "admin");
        assert_eq!(creds.password, "secret");
    }

    #[test]
    fn test_split_password_with_colon() {
        let creds = split_access_key("admin:se:cret").unwrap();
        assert_eq!(creds.username, "admin");
        assert_eq!(creds.password, "se:cret");
    }

    #[test]
    fn test_split_missing_separator() {
        assert_eq!(
            split_access_key("adminsecret"),
            Err(CredentialError::MissingSeparator)
        );
    }

    #[test]
    fn test_split_empty_username() {
        assert_eq!(split_access_key(":secret"), Err(CredentialError::EmptyUsername));
    }
}
