mod repository;

pub use repository::*;

use serde::{Deserialize, Serialize};

/// User as saved on database.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: Option<String>,
    pub nostr_key: Option<String>,
}

impl User {
    /// Human readable identifier, email first.
    pub fn label(&self) -> &str {
        self.email
            .as_deref()
            .or(self.nostr_key.as_deref())
            .unwrap_or("anonymous")
    }
}

/// Identifiers supplied with a purchase.
///
/// Blank values are treated as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identity {
    pub email: Option<String>,
    pub nostr_key: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

impl Identity {
    /// Create a new [`Identity`].
    pub fn new(email: Option<String>, nostr_key: Option<String>) -> Self {
        Self {
            email: non_blank(email),
            nostr_key: non_blank(nostr_key),
        }
    }

    /// Neither an email nor a key was given.
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.nostr_key.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_identifiers_are_absent() {
        let identity = Identity::new(Some("  ".into()), Some(String::new()));
        assert!(identity.is_empty());

        let identity = Identity::new(Some(" a@b.com ".into()), None);
        assert_eq!(identity.email.as_deref(), Some("a@b.com"));
        assert!(!identity.is_empty());
    }

    #[test]
    fn test_label() {
        let user = User {
            id: 1,
            email: None,
            nostr_key: Some("npub1xyz".into()),
        };
        assert_eq!(user.label(), "npub1xyz");
        assert_eq!(User::default().label(), "anonymous");
    }
}
