use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// SQLite file in the data directory.
    #[default]
    Local,
    /// A hosted Supabase project.
    Supabase,
}

impl std::str::FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" | "sqlite" => Ok(Self::Local),
            "supabase" => Ok(Self::Supabase),
            other => bail!("Unknown backend '{other}'. Use 'local' or 'supabase'"),
        }
    }
}

/// Contents of `config.json`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    backend: Option<BackendKind>,
    supabase_url: Option<String>,
    supabase_anon_key: Option<String>,
    db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub backend: BackendKind,
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    pub config_dir: PathBuf,
    pub session_path: PathBuf,
    pub supabase_url: Option<String>,
    #[serde(skip)]
    pub supabase_anon_key: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        // A missing .env is normal.
        let _ = dotenvy::dotenv();

        let proj_dirs =
            ProjectDirs::from("", "", "fitday").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let config_dir = proj_dirs.config_dir().to_path_buf();
        Self::resolve(data_dir, config_dir, |key| std::env::var(key).ok())
    }

    /// Layer `config.json` from `config_dir` and then `env` over the defaults.
    fn resolve(
        data_dir: PathBuf,
        config_dir: PathBuf,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let file = read_file_config(&config_dir.join("config.json"))?;

        let backend = match env("FITDAY_BACKEND") {
            Some(value) => value.parse()?,
            None => file.backend.unwrap_or_default(),
        };
        let db_path = env("FITDAY_DB")
            .map(PathBuf::from)
            .or(file.db_path)
            .unwrap_or_else(|| data_dir.join("fitday.db"));
        let supabase_url = env("FITDAY_SUPABASE_URL").or(file.supabase_url);
        let supabase_anon_key = env("FITDAY_SUPABASE_ANON_KEY").or(file.supabase_anon_key);

        Ok(Config {
            backend,
            db_path,
            session_path: data_dir.join("session.json"),
            data_dir,
            config_dir,
            supabase_url,
            supabase_anon_key,
        })
    }

    /// URL and anon key, required when the backend is Supabase.
    pub fn supabase(&self) -> Result<(&str, &str)> {
        let Some(url) = self.supabase_url.as_deref().filter(|u| !u.trim().is_empty()) else {
            bail!("Supabase backend needs a project URL. Set FITDAY_SUPABASE_URL or supabase_url in config.json");
        };
        let Some(key) = self
            .supabase_anon_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
        else {
            bail!("Supabase backend needs an anon key. Set FITDAY_SUPABASE_ANON_KEY or supabase_anon_key in config.json");
        };
        Ok((url, key))
    }

    /// The anon key with all but its last four characters hidden.
    pub fn redacted_anon_key(&self) -> Option<String> {
        self.supabase_anon_key.as_deref().map(|key| {
            let visible: String = key
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("****{visible}")
        })
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve_with(dir: &Path, env: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::resolve(dir.join("data"), dir.join("config"), |key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults_to_local_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let config = resolve_with(dir.path(), &[]).unwrap();
        assert_eq!(config.backend, BackendKind::Local);
        assert_eq!(config.db_path, dir.path().join("data").join("fitday.db"));
        assert_eq!(config.session_path, dir.path().join("data").join("session.json"));
        assert!(config.supabase().is_err());
    }

    #[test]
    fn test_file_config_then_env_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("config")).unwrap();
        std::fs::write(
            dir.path().join("config").join("config.json"),
            r#"{"backend": "supabase", "supabase_url": "https://file.supabase.co", "supabase_anon_key": "file-key"}"#,
        )
        .unwrap();

        let config = resolve_with(dir.path(), &[]).unwrap();
        assert_eq!(config.backend, BackendKind::Supabase);
        assert_eq!(
            config.supabase().unwrap(),
            ("https://file.supabase.co", "file-key")
        );

        let config = resolve_with(
            dir.path(),
            &[
                ("FITDAY_BACKEND", "local"),
                ("FITDAY_SUPABASE_URL", "https://env.supabase.co"),
            ],
        )
        .unwrap();
        assert_eq!(config.backend, BackendKind::Local);
        assert_eq!(config.supabase_url.as_deref(), Some("https://env.supabase.co"));
        assert_eq!(config.supabase_anon_key.as_deref(), Some("file-key"));
    }

    #[test]
    fn test_invalid_backend_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_with(dir.path(), &[("FITDAY_BACKEND", "firebase")]).unwrap_err();
        assert!(err.to_string().contains("Unknown backend"));
    }

    #[test]
    fn test_invalid_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("config")).unwrap();
        std::fs::write(dir.path().join("config").join("config.json"), "{not json").unwrap();
        assert!(resolve_with(dir.path(), &[]).is_err());
    }

    #[test]
    fn test_redacted_anon_key() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            resolve_with(dir.path(), &[("FITDAY_SUPABASE_ANON_KEY", "eyJhbGciOiJIUzI1NiJ9.abcd1234")])
                .unwrap();
        assert_eq!(config.redacted_anon_key().as_deref(), Some("****1234"));
    }
}
