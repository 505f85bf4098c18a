//! The authenticated principal.
//!
//! An `Identity` is built from the identity provider's profile at login and
//! rebuilt from the session token on every request. It is never stored
//! server-side.

use serde::{Deserialize, Serialize};

/// An authenticated user as reported by the identity provider.
///
/// Downstream handlers authorize by [`email`](Identity::email); the `id` is
/// the provider's stable subject identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable external identifier (the provider's subject).
    id: String,
    /// Display name.
    name: String,
    /// Email address.
    email: String,
    /// Profile picture URL, if the provider supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    picture: Option<String>,
}

impl Identity {
    /// Creates an identity without a profile picture.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            picture: None,
        }
    }

    /// Sets the profile picture URL.
    #[must_use]
    pub fn with_picture(mut self, picture: Option<String>) -> Self {
        self.picture = picture;
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn picture(&self) -> Option<&str> {
        self.picture.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_identity_has_no_picture() {
        let identity = Identity::new("1234", "Alice", "alice@example.com");

        assert_eq!(identity.id(), "1234");
        assert_eq!(identity.name(), "Alice");
        assert_eq!(identity.email(), "alice@example.com");
        assert!(identity.picture().is_none());
    }

    #[test]
    fn with_picture_sets_url() {
        let identity = Identity::new("1234", "Alice", "alice@example.com")
            .with_picture(Some("https://example.com/alice.png".to_string()));

        assert_eq!(identity.picture(), Some("https://example.com/alice.png"));
    }

    #[test]
    fn picture_is_omitted_when_absent() {
        let identity = Identity::new("1234", "Alice", "alice@example.com");
        let json = serde_json::to_string(&identity).expect("serialize");
        assert!(!json.contains("picture"));
    }
}
