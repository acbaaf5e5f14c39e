use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 6;

/// An authenticated identity issued by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl Session {
    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// What the application knows about the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Status not yet known.
    #[default]
    Initializing,
    SignedOut,
    SignedIn(Session),
}

impl SessionState {
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::SignedIn(session) => Some(&session.user_id),
            Self::Initializing | Self::SignedOut => None,
        }
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::SignedIn(session) => Some(session),
            Self::Initializing | Self::SignedOut => None,
        }
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        !matches!(self, Self::Initializing)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Enter a valid e-mail address")]
    InvalidEmail,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("E-mail or password is incorrect")]
    InvalidCredentials,

    #[error("This e-mail address is already registered")]
    AlreadyRegistered,

    #[error("Check your inbox to confirm your e-mail address, then log in")]
    ConfirmationPending,

    #[error("Session expired, please log in again")]
    SessionExpired,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), AuthError> {
        if !looks_like_email(&self.email) {
            return Err(AuthError::InvalidEmail);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::PasswordTooShort);
        }
        Ok(())
    }
}

fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

/// Issues and refreshes sessions.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    async fn sign_out(&self, session: &Session) -> Result<(), AuthError>;

    async fn refresh(&self, session: &Session) -> Result<Session, AuthError>;
}

#[async_trait]
impl<T: AuthProvider + ?Sized> AuthProvider for Arc<T> {
    async fn sign_up(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        (**self).sign_up(credentials).await
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        (**self).sign_in(credentials).await
    }

    async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        (**self).sign_out(session).await
    }

    async fn refresh(&self, session: &Session) -> Result<Session, AuthError> {
        (**self).refresh(session).await
    }
}
