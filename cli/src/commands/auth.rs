use anyhow::Result;
use chrono::{Local, TimeZone, Utc};
use serde_json::json;
use tracing::{info, warn};

use fitday_core::session::{AuthError, Credentials, Session, SessionState};

use super::helpers::{json_error, prompt_secret};
use crate::backend::App;

fn credentials(email: &str, password: Option<String>) -> Result<Credentials> {
    credentials_with(email, password, prompt_secret)
}

fn credentials_with(
    email: &str,
    password: Option<String>,
    read_secret: impl FnOnce(&str) -> Result<String>,
) -> Result<Credentials> {
    let password = match password {
        Some(p) => p,
        None => read_secret("Password: ")?,
    };
    Ok(Credentials::new(email, password))
}

fn print_session(session: &Session, verb: &str, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "user_id": session.user_id,
                "email": session.email,
                "expires_at": session.expires_at,
            }))?
        );
    } else {
        println!("{verb} as {}", session.email);
    }
    Ok(())
}

/// Auth failures the user can fix are printed plainly and exit 1; anything
/// else propagates.
fn report_auth_error(err: AuthError, json: bool) -> Result<()> {
    if let AuthError::Backend(inner) = err {
        return Err(inner);
    }
    if json {
        println!("{}", json_error(&err.to_string()));
    } else {
        eprintln!("{err}");
    }
    std::process::exit(1);
}

pub(crate) async fn cmd_signup(
    app: &App,
    email: &str,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    let creds = credentials(email, password)?;
    match app.backend.auth().sign_up(&creds).await {
        Ok(session) => {
            app.sessions.save(&session)?;
            info!(user = %session.user_id, "signed up");
            print_session(&session, "Signed up and logged in", json)
        }
        Err(AuthError::ConfirmationPending) => {
            let message = AuthError::ConfirmationPending.to_string();
            if json {
                println!("{}", json!({ "status": "confirmation_pending", "message": message }));
            } else {
                println!("{message}");
            }
            Ok(())
        }
        Err(e) => report_auth_error(e, json),
    }
}

pub(crate) async fn cmd_login(
    app: &App,
    email: &str,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    let creds = credentials(email, password)?;
    match app.backend.auth().sign_in(&creds).await {
        Ok(session) => {
            app.sessions.save(&session)?;
            info!(user = %session.user_id, "logged in");
            print_session(&session, "Logged in", json)
        }
        Err(e) => report_auth_error(e, json),
    }
}

pub(crate) async fn cmd_logout(app: &App, json: bool) -> Result<()> {
    let Some(session) = app.sessions.load()? else {
        if json {
            println!("{}", json!({ "logged_out": false }));
        } else {
            println!("Not logged in");
        }
        return Ok(());
    };
    if let Err(e) = app.backend.auth().sign_out(&session).await {
        // The local session goes away regardless.
        warn!(error = %e, "remote sign-out failed");
    }
    app.sessions.clear()?;
    if json {
        println!("{}", json!({ "logged_out": true }));
    } else {
        println!("Logged out {}", session.email);
    }
    Ok(())
}

pub(crate) async fn cmd_status(app: &App, json: bool) -> Result<()> {
    let state = app.session_state().await?;
    if json {
        let value = match &state {
            SessionState::SignedIn(s) => json!({
                "signed_in": true,
                "user_id": s.user_id,
                "email": s.email,
                "expires_at": s.expires_at,
                "backend": app.config.backend,
            }),
            SessionState::Initializing | SessionState::SignedOut => {
                json!({ "signed_in": false, "backend": app.config.backend })
            }
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match state {
        SessionState::SignedIn(s) => {
            println!("Logged in as {} ({})", s.email, s.user_id);
            if let Some(at) = s.expires_at.and_then(|t| Utc.timestamp_opt(t, 0).single()) {
                println!(
                    "Session valid until {}",
                    at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
                );
            }
        }
        SessionState::Initializing | SessionState::SignedOut => {
            println!("Not logged in. Run `fitday auth login <email>`");
        }
    }
    Ok(())
}
