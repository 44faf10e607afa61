use serde::{Deserialize, Serialize};
use std::fmt;

const ANONYMOUS: &str = "Anonymous";

/// The signed-in applicant as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl Identity {
    pub fn new(email: impl Into<String>, display_name: Option<&str>, photo_url: Option<&str>) -> Self {
        Self {
            email: email.into(),
            display_name: display_name.map(str::to_string),
            photo_url: photo_url.map(str::to_string),
        }
    }

    pub fn name_or_anonymous(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(ANONYMOUS)
    }
}

/// A short-lived credential presented as `Authorization: Bearer <token>`.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keep tokens out of logs.
impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_display_name_is_anonymous() {
        assert_eq!(Identity::new("a@b.c", None, None).name_or_anonymous(), "Anonymous");
        assert_eq!(Identity::new("a@b.c", Some("  "), None).name_or_anonymous(), "Anonymous");
        assert_eq!(Identity::new("a@b.c", Some("Ada"), None).name_or_anonymous(), "Ada");
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = BearerToken::new("secret-token");
        assert!(!format!("{token:?}").contains("secret"));
    }
}
