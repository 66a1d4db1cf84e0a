use crate::infrastructure::storage::{KeyValueStorage, MemoryStorage};
use std::collections::HashMap;
use thiserror::Error;

/// Session-scoped key set to `"true"` while the session is authenticated
pub const SESSION_AUTH_KEY: &str = "admin_auth";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
}

/// Demonstration-grade admin credentials. A plain equality check, not a
/// security boundary.
#[derive(Debug, Clone)]
pub struct Credentials {
    identifier: String,
    secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    pub fn matches(&self, identifier: &str, secret: &str) -> bool {
        self.identifier == identifier && self.secret == secret
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated,
}

/// Admin flag for one session, mirrored into session-scoped storage
pub struct AuthGate {
    credentials: Credentials,
    session: Box<dyn KeyValueStorage>,
    state: AuthState,
}

impl AuthGate {
    /// Initial state comes from session storage; anything other than
    /// `"true"` means anonymous.
    pub fn new(credentials: Credentials, session: Box<dyn KeyValueStorage>) -> Self {
        let state = match session.get(SESSION_AUTH_KEY) {
            Ok(Some(flag)) if flag == "true" => AuthState::Authenticated,
            Ok(_) => AuthState::Anonymous,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session auth flag");
                AuthState::Anonymous
            }
        };

        Self {
            credentials,
            session,
            state,
        }
    }

    pub fn check_credentials(&self, identifier: &str, secret: &str) -> bool {
        self.credentials.matches(identifier, secret)
    }

    pub fn login(&mut self) {
        self.state = AuthState::Authenticated;
        if let Err(e) = self.session.set(SESSION_AUTH_KEY, "true") {
            tracing::warn!(error = %e, "Failed to store session auth flag");
        }
    }

    pub fn logout(&mut self) {
        self.state = AuthState::Anonymous;
        if let Err(e) = self.session.remove(SESSION_AUTH_KEY) {
            tracing::warn!(error = %e, "Failed to clear session auth flag");
        }
    }

    /// Check credentials and log in on a match. A mismatch leaves the
    /// current state alone.
    pub fn attempt_login(&mut self, identifier: &str, secret: &str) -> Result<(), AuthError> {
        if !self.check_credentials(identifier, secret) {
            return Err(AuthError::InvalidCredentials);
        }
        self.login();
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    pub fn state(&self) -> AuthState {
        self.state
    }
}

/// Authenticated sessions keyed by client session id.
///
/// Only a successful login creates an entry and logout removes it, so
/// anonymous traffic never grows the map.
pub struct SessionRegistry {
    credentials: Credentials,
    sessions: HashMap<String, AuthGate>,
}

impl SessionRegistry {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            sessions: HashMap::new(),
        }
    }

    /// Log `session_id` in when the credentials match
    pub fn login(&mut self, session_id: &str, identifier: &str, secret: &str) -> Result<(), AuthError> {
        if !self.credentials.matches(identifier, secret) {
            return Err(AuthError::InvalidCredentials);
        }

        let credentials = &self.credentials;
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| AuthGate::new(credentials.clone(), Box::new(MemoryStorage::new())))
            .login();
        Ok(())
    }

    /// End the session; returns whether it was logged in
    pub fn logout(&mut self, session_id: &str) -> bool {
        match self.sessions.remove(session_id) {
            Some(mut gate) => {
                gate.logout();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, session_id: &str) -> Option<&AuthGate> {
        self.sessions.get(session_id)
    }

    pub fn is_authenticated(&self, session_id: &str) -> bool {
        self.sessions
            .get(session_id)
            .map_or(false, AuthGate::is_authenticated)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
