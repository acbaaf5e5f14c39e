use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info, warn};

use fitday_core::session::{AuthProvider, Session, SessionState};

/// The signed-in session, persisted between invocations.
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&self.path).context("Failed to read session file")?;
        match serde_json::from_str(&text) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, json).context("Failed to write session file")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to set session file permissions")?;
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).context("Failed to remove session file")?;
        }
        Ok(())
    }

    /// Load the stored session, refreshing it first if it has expired. A
    /// session that cannot be refreshed is discarded.
    pub async fn restore(&self, auth: &dyn AuthProvider) -> Result<SessionState> {
        let Some(session) = self.load()? else {
            return Ok(SessionState::SignedOut);
        };
        if !session.is_expired(Utc::now().timestamp()) {
            debug!(user = %session.user_id, "restored session");
            return Ok(SessionState::SignedIn(session));
        }
        match auth.refresh(&session).await {
            Ok(next) => {
                info!(user = %next.user_id, "session refreshed");
                self.save(&next)?;
                Ok(SessionState::SignedIn(next))
            }
            Err(e) => {
                warn!(error = %e, "stored session could not be refreshed");
                self.clear()?;
                Ok(SessionState::SignedOut)
            }
        }
    }
}
