use std::fmt::Write;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use fitday_core::models::{Meal, NewMeal, NewWorkout, Profile, ProfileUpdate, Workout};
use fitday_core::session::{AuthError, AuthProvider, Credentials, Session};
use fitday_core::store::FitnessStore;

/// Hosted backend: `PostgREST` tables under `/rest/v1` and `GoTrue` auth under
/// `/auth/v1`.
#[derive(Clone)]
pub struct SupabaseClient {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
}

/// Error body returned by `PostgREST`.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

/// Error body returned by `GoTrue`. The field carrying the message varies by
/// endpoint and server version.
#[derive(Debug, Default, Deserialize)]
struct AuthErrorBody {
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl AuthErrorBody {
    fn text(self) -> String {
        self.msg
            .or(self.error_description)
            .or(self.message)
            .or(self.error)
            .unwrap_or_else(|| "unknown auth error".to_string())
    }
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Either a full session or, when e-mail confirmation is on, just the user.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    user: Option<AuthUser>,
}

#[derive(Serialize)]
struct OwnedRow<'a, T> {
    user_id: &'a str,
    #[serde(flatten)]
    row: &'a T,
}

impl SupabaseClient {
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("fitday-cli/{}", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(15))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            access_token: None,
        })
    }

    /// A copy that sends `token` as the bearer on table requests.
    #[must_use]
    pub fn with_access_token(&self, token: &str) -> Self {
        Self {
            access_token: Some(token.to_string()),
            ..self.clone()
        }
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        req.header("apikey", &self.anon_key).bearer_auth(bearer)
    }

    async fn send(&self, req: RequestBuilder, what: &str) -> Result<Response> {
        let resp = self
            .authorize(req)
            .send()
            .await
            .with_context(|| format!("Failed to reach Supabase ({what})"))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        match serde_json::from_str::<PostgrestError>(&body) {
            Ok(err) => {
                let mut text = format!("{what} failed ({status}): {}", err.message);
                if let Some(code) = err.code {
                    let _ = write!(text, " [{code}]");
                }
                if let Some(details) = err.details {
                    let _ = write!(text, "; {details}");
                }
                if let Some(hint) = err.hint {
                    let _ = write!(text, "; hint: {hint}");
                }
                Err(anyhow!(text))
            }
            Err(_) => bail!("{what} failed ({status}): {body}"),
        }
    }

    async fn select<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let mut query: Vec<(&str, String)> = vec![("select", "*".to_string())];
        query.extend(filters.iter().cloned());
        let resp = self
            .send(self.client.get(self.rest_url(table)).query(&query), table)
            .await?;
        resp.json()
            .await
            .with_context(|| format!("Failed to parse {table} rows"))
    }

    async fn insert<B: Serialize + Sync, T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<T> {
        let req = self
            .client
            .post(self.rest_url(table))
            .header("Prefer", "return=representation")
            .json(body);
        let rows: Vec<T> = self
            .send(req, table)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse inserted {table} row"))?;
        rows.into_iter()
            .next()
            .with_context(|| format!("Insert into {table} returned no row"))
    }

    // --- Auth ---

    async fn token_request(
        &self,
        url: String,
        body: serde_json::Value,
        fallback_email: Option<&str>,
    ) -> Result<Option<Session>, (StatusCode, String)> {
        let resp = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| (StatusCode::SERVICE_UNAVAILABLE, format!("{e:#}")))?;
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            let err: AuthErrorBody = serde_json::from_str(&text).unwrap_or_default();
            return Err((status, err.text()));
        }
        let token: TokenResponse = serde_json::from_str(&text)
            .map_err(|e| (status, format!("Failed to parse auth response: {e}")))?;
        Ok(session_from_token(token, fallback_email))
    }
}

fn session_from_token(token: TokenResponse, fallback_email: Option<&str>) -> Option<Session> {
    let access_token = token.access_token?;
    let user = token.user?;
    let expires_at = token
        .expires_at
        .or_else(|| token.expires_in.map(|secs| Utc::now().timestamp() + secs));
    Some(Session {
        user_id: user.id,
        email: user
            .email
            .or_else(|| fallback_email.map(str::to_string))
            .unwrap_or_default(),
        access_token,
        refresh_token: token.refresh_token,
        expires_at,
    })
}

fn classify(status: StatusCode, message: &str) -> AuthError {
    let lower = message.to_lowercase();
    if lower.contains("already registered") || lower.contains("already been registered") {
        AuthError::AlreadyRegistered
    } else if lower.contains("invalid login credentials") {
        AuthError::InvalidCredentials
    } else if lower.contains("email not confirmed") {
        AuthError::ConfirmationPending
    } else {
        AuthError::Backend(anyhow!("Auth request failed ({status}): {message}"))
    }
}

#[async_trait]
impl FitnessStore for SupabaseClient {
    async fn workouts_for_day(&self, user_id: &str, date: NaiveDate) -> Result<Vec<Workout>> {
        debug!(user_id, %date, "GET workouts");
        self.select(
            "workouts",
            &[
                ("user_id", format!("eq.{user_id}")),
                ("workout_date", format!("eq.{date}")),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn meals_for_day(&self, user_id: &str, date: NaiveDate) -> Result<Vec<Meal>> {
        debug!(user_id, %date, "GET meals");
        self.select(
            "meals",
            &[
                ("user_id", format!("eq.{user_id}")),
                ("meal_date", format!("eq.{date}")),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn profile_for_user(&self, user_id: &str) -> Result<Option<Profile>> {
        let rows: Vec<Profile> = self
            .select("profiles", &[("user_id", format!("eq.{user_id}"))])
            .await?;
        if rows.len() > 1 {
            bail!("Expected at most one profile for user, got {}", rows.len());
        }
        Ok(rows.into_iter().next())
    }

    async fn insert_workout(&self, user_id: &str, workout: &NewWorkout) -> Result<Workout> {
        self.insert("workouts", &OwnedRow { user_id, row: workout })
            .await
    }

    async fn insert_meal(&self, user_id: &str, meal: &NewMeal) -> Result<Meal> {
        self.insert("meals", &OwnedRow { user_id, row: meal }).await
    }

    async fn set_workout_completed(&self, id: &str, completed: bool) -> Result<()> {
        let req = self
            .client
            .patch(self.rest_url("workouts"))
            .query(&[("id", format!("eq.{id}"))])
            .json(&serde_json::json!({ "completed": completed }));
        self.send(req, "workouts").await?;
        Ok(())
    }

    async fn delete_workout(&self, id: &str) -> Result<()> {
        let req = self
            .client
            .delete(self.rest_url("workouts"))
            .query(&[("id", format!("eq.{id}"))]);
        self.send(req, "workouts").await?;
        Ok(())
    }

    async fn delete_meal(&self, id: &str) -> Result<()> {
        let req = self
            .client
            .delete(self.rest_url("meals"))
            .query(&[("id", format!("eq.{id}"))]);
        self.send(req, "meals").await?;
        Ok(())
    }

    async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<()> {
        let req = self
            .client
            .patch(self.rest_url("profiles"))
            .query(&[("user_id", format!("eq.{user_id}"))])
            .json(update);
        self.send(req, "profiles").await?;
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for SupabaseClient {
    async fn sign_up(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        credentials.validate()?;
        let body = serde_json::json!({
            "email": credentials.email,
            "password": credentials.password,
        });
        match self
            .token_request(self.auth_url("signup"), body, Some(&credentials.email))
            .await
        {
            Ok(Some(session)) => Ok(session),
            Ok(None) => Err(AuthError::ConfirmationPending),
            Err((status, message)) => Err(classify(status, &message)),
        }
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        credentials.validate()?;
        let body = serde_json::json!({
            "email": credentials.email,
            "password": credentials.password,
        });
        match self
            .token_request(
                self.auth_url("token?grant_type=password"),
                body,
                Some(&credentials.email),
            )
            .await
        {
            Ok(Some(session)) => Ok(session),
            Ok(None) => Err(AuthError::Backend(anyhow!("Auth response carried no session"))),
            Err((status, message)) => Err(classify(status, &message)),
        }
    }

    async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        let resp = self
            .client
            .post(self.auth_url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await
            .context("Failed to reach Supabase auth")?;
        let status = resp.status();
        // An already-invalid token means we are signed out anyway.
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        let err: AuthErrorBody = resp.json().await.unwrap_or_default();
        Err(classify(status, &err.text()))
    }

    async fn refresh(&self, session: &Session) -> Result<Session, AuthError> {
        let Some(refresh_token) = session.refresh_token.as_deref() else {
            return Err(AuthError::SessionExpired);
        };
        let body = serde_json::json!({ "refresh_token": refresh_token });
        match self
            .token_request(
                self.auth_url("token?grant_type=refresh_token"),
                body,
                Some(&session.email),
            )
            .await
        {
            Ok(Some(next)) => Ok(next),
            Ok(None) => Err(AuthError::SessionExpired),
            Err((status, _)) if status.is_client_error() => Err(AuthError::SessionExpired),
            Err((status, message)) => Err(classify(status, &message)),
        }
    }
}
