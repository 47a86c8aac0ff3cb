//! Session credential and variables for the signed-in user.

use std::collections::HashMap;

/// The signed-in user's credential plus any session variables.
///
/// Passed explicitly to the HTTP collaborator instead of being read from
/// process-wide state, so several isolated carts can coexist:
///
/// ```ignore
/// let session = Session::with_token("eyJhbGciOi...")
///     .variable("user-id", "user-42");
/// let api = HttpStorefront::new(ApiConfig::default(), session)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Option<String>,
    variables: HashMap<String, String>,
}

impl Session {
    /// Create an anonymous session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session carrying a bearer token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            variables: HashMap::new(),
        }
    }

    /// Create a session from a map of variables.
    pub fn from_map(variables: HashMap<String, String>) -> Self {
        Self {
            token: None,
            variables,
        }
    }

    /// Builder-style variant of [`Session::set`].
    pub fn variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// The bearer token, if signed in.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Replace the bearer token (e.g. after re-authentication).
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Forget the bearer token.
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Get the user ID (`user-id`).
    pub fn user_id(&self) -> Option<&str> {
        self.get("user-id")
    }

    /// Get a session variable by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(|v| v.as_str())
    }

    /// Set a session variable.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Check if a session variable exists.
    pub fn has(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }

    /// Get all session variables.
    pub fn variables(&self) -> &HashMap<String, String> {
        &self.variables
    }
}
