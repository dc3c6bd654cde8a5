//! Application-level configuration loading: upload policy, session lifetime and leaderboard size.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "ARCADE_BOARD_CONFIG_PATH";

const DEFAULT_UPLOAD_DIR: &str = "static/uploads";
const DEFAULT_ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];
const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_LEADERBOARD_SIZE: usize = 10;
const DEFAULT_MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    upload_dir: PathBuf,
    allowed_extensions: Vec<String>,
    session_ttl: Duration,
    leaderboard_size: usize,
    max_photo_bytes: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        upload_dir = %app_config.upload_dir.display(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Override the directory uploads are written to.
    pub fn with_upload_dir(mut self, upload_dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = upload_dir.into();
        self
    }

    /// Override how long an idle session stays valid.
    pub fn with_session_ttl(mut self, session_ttl: Duration) -> Self {
        self.session_ttl = session_ttl;
        self
    }

    /// Directory where captured photos are written.
    pub fn upload_dir(&self) -> &PathBuf {
        &self.upload_dir
    }

    /// Return the normalized extension of `filename` when it is on the whitelist.
    ///
    /// Matching is case-insensitive; `"x.PNG"` yields `Some("png")`, `"x.exe"` and `"png"`
    /// (no dot) yield `None`.
    pub fn allowed_extension(&self, filename: &str) -> Option<String> {
        let (_, extension) = filename.rsplit_once('.')?;
        let extension = extension.to_ascii_lowercase();
        self.allowed_extensions
            .iter()
            .any(|allowed| *allowed == extension)
            .then_some(extension)
    }

    /// Extensions accepted for photo uploads.
    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    /// Idle lifetime of a visitor session.
    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Number of entries served when a leaderboard request does not ask for a size.
    pub fn leaderboard_size(&self) -> usize {
        self.leaderboard_size
    }

    /// Upper bound on the size of an uploaded photo.
    pub fn max_photo_bytes(&self) -> usize {
        self.max_photo_bytes
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
            max_photo_bytes: DEFAULT_MAX_PHOTO_BYTES,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    upload_dir: Option<PathBuf>,
    allowed_extensions: Option<Vec<String>>,
    session_ttl_secs: Option<u64>,
    leaderboard_size: Option<usize>,
    max_photo_bytes: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        let allowed_extensions = value
            .allowed_extensions
            .map(|extensions| {
                extensions
                    .into_iter()
                    .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                    .filter(|ext| !ext.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|extensions| !extensions.is_empty())
            .unwrap_or(defaults.allowed_extensions);

        Self {
            upload_dir: value.upload_dir.unwrap_or(defaults.upload_dir),
            allowed_extensions,
            session_ttl: value
                .session_ttl_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_ttl),
            leaderboard_size: value
                .leaderboard_size
                .filter(|size| *size > 0)
                .unwrap_or(defaults.leaderboard_size),
            max_photo_bytes: value
                .max_photo_bytes
                .filter(|bytes| *bytes > 0)
                .unwrap_or(defaults.max_photo_bytes),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_match_is_case_insensitive() {
        let config = AppConfig::default();
        assert_eq!(config.allowed_extension("x.PNG").as_deref(), Some("png"));
        assert_eq!(config.allowed_extension("face.Jpeg").as_deref(), Some("jpeg"));
        assert_eq!(config.allowed_extension("x.exe"), None);
        assert_eq!(config.allowed_extension("png"), None);
        assert_eq!(config.allowed_extension("archive.png.exe"), None);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"allowed_extensions": [".GIF"], "leaderboard_size": 0}"#)
                .unwrap();
        let config: AppConfig = raw.into();

        assert_eq!(config.allowed_extensions(), ["gif".to_string()]);
        assert_eq!(config.leaderboard_size(), DEFAULT_LEADERBOARD_SIZE);
        assert_eq!(config.upload_dir(), &PathBuf::from(DEFAULT_UPLOAD_DIR));
        assert_eq!(
            config.session_ttl(),
            Duration::from_secs(DEFAULT_SESSION_TTL_SECS)
        );
    }
}
