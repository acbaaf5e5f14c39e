//! Embedded backend: the fitness tables and e-mail/password accounts in a
//! single SQLite file.

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::db::{Database, SessionRecord};
use crate::models::{Meal, NewMeal, NewWorkout, Profile, ProfileUpdate, Workout};
use crate::session::{AuthError, AuthProvider, Credentials, Session};
use crate::store::FitnessStore;

/// Lifetime of an access token, in seconds.
pub const SESSION_TTL_SECS: i64 = 3600;

pub struct LocalBackend {
    db: Mutex<Database>,
    hash_cost: u32,
}

impl LocalBackend {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self {
            db: Mutex::new(db),
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// bcrypt work factor for new passwords.
    #[must_use]
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// bcrypt is CPU-bound, so it runs on the blocking pool.
async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .context("Password hashing task failed")?
        .context("Failed to hash password")
}

async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let (password, hash) = (password.to_string(), hash.to_string());
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .context("Password check task failed")?
        .context("Failed to verify password")
}

fn to_session(record: SessionRecord) -> Session {
    Session {
        user_id: record.user_id,
        email: record.email,
        access_token: record.access_token,
        refresh_token: Some(record.refresh_token),
        expires_at: Some(record.expires_at),
    }
}

#[async_trait]
impl FitnessStore for LocalBackend {
    async fn workouts_for_day(&self, user_id: &str, date: NaiveDate) -> Result<Vec<Workout>> {
        self.db().workouts_for_day(user_id, date)
    }

    async fn meals_for_day(&self, user_id: &str, date: NaiveDate) -> Result<Vec<Meal>> {
        self.db().meals_for_day(user_id, date)
    }

    async fn profile_for_user(&self, user_id: &str) -> Result<Option<Profile>> {
        self.db().get_profile(user_id)
    }

    async fn insert_workout(&self, user_id: &str, workout: &NewWorkout) -> Result<Workout> {
        self.db().insert_workout(user_id, workout)
    }

    async fn insert_meal(&self, user_id: &str, meal: &NewMeal) -> Result<Meal> {
        self.db().insert_meal(user_id, meal)
    }

    async fn set_workout_completed(&self, id: &str, completed: bool) -> Result<()> {
        if !self.db().set_workout_completed(id, completed)? {
            debug!(id, "no workout matched completion update");
        }
        Ok(())
    }

    async fn delete_workout(&self, id: &str) -> Result<()> {
        if !self.db().delete_workout(id)? {
            debug!(id, "no workout matched delete");
        }
        Ok(())
    }

    async fn delete_meal(&self, id: &str) -> Result<()> {
        if !self.db().delete_meal(id)? {
            debug!(id, "no meal matched delete");
        }
        Ok(())
    }

    async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<()> {
        if !self.db().update_profile(user_id, update)? {
            warn!(user_id, "profile update matched no row");
        }
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for LocalBackend {
    async fn sign_up(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        credentials.validate()?;
        let existing = self.db().find_user_by_email(&credentials.email)?;
        if existing.is_some() {
            return Err(AuthError::AlreadyRegistered);
        }
        let hash = hash_password(&credentials.password, self.hash_cost).await?;

        let db = self.db();
        let user = db.insert_user(&credentials.email, &hash)?;
        db.ensure_profile(&user.id)?;
        let session = db.create_session(&user, SESSION_TTL_SECS)?;
        info!(user = %user.id, "local account created");
        Ok(to_session(session))
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        credentials.validate()?;
        let found = self.db().find_user_by_email(&credentials.email)?;
        let Some(user) = found else {
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(&credentials.password, &user.password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }
        let session = self.db().create_session(&user, SESSION_TTL_SECS)?;
        debug!(user = %user.id, "signed in");
        Ok(to_session(session))
    }

    async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        self.db().delete_session(&session.access_token)?;
        Ok(())
    }

    async fn refresh(&self, session: &Session) -> Result<Session, AuthError> {
        let Some(refresh_token) = session.refresh_token.as_deref() else {
            return Err(AuthError::SessionExpired);
        };
        let db = self.db();
        let Some(current) = db.find_session_by_refresh_token(refresh_token)? else {
            return Err(AuthError::SessionExpired);
        };
        let Some(user) = db.find_user_by_email(&current.email)? else {
            return Err(AuthError::SessionExpired);
        };
        db.delete_session(&current.access_token)?;
        let next = db.create_session(&user, SESSION_TTL_SECS)?;
        debug!(user = %user.id, expires_at = next.expires_at, "session refreshed");
        Ok(to_session(next))
    }
}
