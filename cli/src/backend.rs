use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::debug;

use fitday_core::db::Database;
use fitday_core::local::LocalBackend;
use fitday_core::session::{AuthProvider, Session, SessionState};
use fitday_core::store::FitnessStore;
use fitday_core::tracker::FitnessTracker;

use crate::config::{BackendKind, Config};
use crate::notifier::TerminalNotifier;
use crate::session_file::SessionFile;
use crate::supabase::SupabaseClient;

pub(crate) type Tracker = FitnessTracker<Arc<dyn FitnessStore>, TerminalNotifier>;

/// Where rows and accounts live.
pub(crate) enum Backend {
    Local(Arc<LocalBackend>),
    Supabase(SupabaseClient),
}

impl Backend {
    pub(crate) fn open(config: &Config) -> Result<Self> {
        match config.backend {
            BackendKind::Local => {
                debug!(path = %config.db_path.display(), "opening local database");
                let db = Database::open(&config.db_path)?;
                Ok(Self::Local(Arc::new(LocalBackend::new(db))))
            }
            BackendKind::Supabase => {
                let (url, key) = config.supabase()?;
                debug!(url, "using supabase backend");
                Ok(Self::Supabase(SupabaseClient::new(url, key)?))
            }
        }
    }

    pub(crate) fn auth(&self) -> Arc<dyn AuthProvider> {
        match self {
            Self::Local(local) => Arc::clone(local) as Arc<dyn AuthProvider>,
            Self::Supabase(client) => Arc::new(client.clone()),
        }
    }

    /// A store that acts on behalf of `session`.
    pub(crate) fn store_for(&self, session: &Session) -> Arc<dyn FitnessStore> {
        match self {
            Self::Local(local) => Arc::clone(local) as Arc<dyn FitnessStore>,
            Self::Supabase(client) => Arc::new(client.with_access_token(&session.access_token)),
        }
    }
}

/// Everything a command needs.
pub(crate) struct App {
    pub config: Config,
    pub backend: Backend,
    pub sessions: SessionFile,
}

impl App {
    pub(crate) fn open(config: Config) -> Result<Self> {
        let backend = Backend::open(&config)?;
        let sessions = SessionFile::new(config.session_path.clone());
        Ok(Self {
            config,
            backend,
            sessions,
        })
    }

    pub(crate) async fn session_state(&self) -> Result<SessionState> {
        self.sessions.restore(self.backend.auth().as_ref()).await
    }

    pub(crate) async fn require_session(&self) -> Result<Session> {
        match self.session_state().await? {
            SessionState::SignedIn(session) => Ok(session),
            SessionState::Initializing | SessionState::SignedOut => {
                bail!("Not logged in. Run `fitday auth login <email>` first")
            }
        }
    }

    /// A tracker loaded with today's data for the signed-in user. Exits if
    /// the initial load failed, after the failure notice has been printed.
    pub(crate) async fn open_tracker(&self, json: bool) -> Result<Tracker> {
        let session = self.require_session().await?;
        let mut tracker =
            FitnessTracker::new(self.backend.store_for(&session), TerminalNotifier::new(json));
        tracker.set_user(Some(session.user_id));
        debug!(loading = tracker.is_loading(), "loading today");
        tracker.refresh().await;
        exit_on_failure(&tracker);
        Ok(tracker)
    }
}

/// Failures have already been reported by the notifier.
pub(crate) fn exit_on_failure(tracker: &Tracker) {
    if tracker.notifier().failure_count() > 0 {
        std::process::exit(1);
    }
}
