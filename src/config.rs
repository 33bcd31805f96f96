use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Environment variable that overrides the configured backend address.
pub const BASE_URL_ENV: &str = "NEPHRO_CONNECT_BASE_URL";

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address of the chat backend, without trailing slash
    pub base_url: String,

    /// Per-request timeout in seconds; 0 waits forever
    pub request_timeout_secs: u64,

    /// Where the interactive client writes its tracing output
    pub log_file: Option<PathBuf>,

    /// UI preferences
    pub ui: UiConfig,

    /// Directory holding config.toml and the default log file
    #[serde(skip)]
    pub home: PathBuf,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Show the session start time in the header
    pub show_clock: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { show_clock: true }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".nephro-connect");

        Config {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_file: None,
            ui: UiConfig::default(),
            home,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".nephro-connect").join("config.toml"))
    }

    /// Resolve the effective configuration. Precedence, highest first:
    /// CLI flag, `NEPHRO_CONNECT_BASE_URL`, config file, defaults.
    pub fn resolve(
        path: Option<&Path>,
        env_base_url: Option<String>,
        cli_base_url: Option<&str>,
    ) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load_from(&Self::default_path()?)?,
        };

        if let Some(url) = env_base_url.filter(|u| !u.trim().is_empty()) {
            config.set_base_url(&url);
        }
        if let Some(url) = cli_base_url {
            config.set_base_url(url);
        }
        Ok(config)
    }

    /// Read the base URL override from the environment
    pub fn env_base_url() -> Option<String> {
        std::env::var(BASE_URL_ENV).ok()
    }

    /// Load configuration from an explicit file. A missing file yields the
    /// defaults rooted next to that path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            toml::from_str::<Config>(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        } else {
            Config::default()
        };

        if let Some(parent) = path.parent() {
            config.home = parent.to_path_buf();
        }
        config.base_url = normalize_base_url(&config.base_url);

        Ok(config)
    }

    /// Save configuration to `<home>/config.toml`
    pub fn save(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.home)
            .with_context(|| format!("Failed to create {}", self.home.display()))?;

        let config_path = self.home.join("config.toml");
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(&config_path, content)
            .context("Failed to write config file")?;
        Ok(config_path)
    }

    pub fn set_base_url(&mut self, url: &str) {
        self.base_url = normalize_base_url(url);
    }

    /// Request timeout, `None` when disabled
    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Record the effective settings once a subscriber is installed
    pub fn log_summary(&self) {
        info!(
            base_url = %self.base_url,
            timeout_secs = self.request_timeout_secs,
            home = %self.home.display(),
            show_clock = self.ui.show_clock,
            "configuration loaded"
        );
    }

    /// File the interactive client logs to
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.home.join("nephro-connect.log"))
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(60)));
        assert!(config.ui.show_clock);
        assert_eq!(config.home, dir.path());
        assert_eq!(config.log_path(), dir.path().join("nephro-connect.log"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "base_url = \"http://clinic.local:9000/\"\nrequest_timeout_secs = 0\n\n[ui]\nshow_clock = false\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.base_url, "http://clinic.local:9000");
        assert_eq!(config.request_timeout(), None);
        assert!(!config.ui.show_clock);
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        config.set_base_url("http://10.0.0.5:8000");
        config.log_file = Some(dir.path().join("chat.log"));

        let written = config.save().unwrap();
        let reloaded = Config::load_from(&written).unwrap();

        assert_eq!(reloaded.base_url, "http://10.0.0.5:8000");
        assert_eq!(reloaded.log_path(), dir.path().join("chat.log"));
    }

    #[test]
    fn env_overrides_file_and_cli_overrides_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "base_url = \"http://file.local:1\"\n").unwrap();

        let from_file = Config::resolve(Some(path.as_path()), None, None).unwrap();
        assert_eq!(from_file.base_url, "http://file.local:1");

        let from_env =
            Config::resolve(Some(path.as_path()), Some("http://env.local:2/".to_string()), None).unwrap();
        assert_eq!(from_env.base_url, "http://env.local:2");

        let from_cli = Config::resolve(
            Some(path.as_path()),
            Some("http://env.local:2".to_string()),
            Some("http://cli.local:3"),
        )
        .unwrap();
        assert_eq!(from_cli.base_url, "http://cli.local:3");
    }

    #[test]
    fn blank_env_value_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::resolve(Some(path.as_path()), Some("  ".to_string()), None).unwrap();
        assert_eq!(config.base_url, "http://localhost:8000");
    }

    #[derive(Clone, Default)]
    struct CapturedLog(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn summary_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::resolve(
            Some(dir.path().join("config.toml").as_path()),
            None,
            Some("http://clinic.local:9000"),
        )
        .unwrap();

        let captured = CapturedLog::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || config.log_summary());

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("configuration loaded"));
        assert!(output.contains("http://clinic.local:9000"));
    }

    #[test]
    fn garbage_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "base_url = [").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
