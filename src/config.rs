//! Runtime configuration read from the environment.

use crate::constants::TICK_INTERVAL_MS;
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

pub const ENV_SUPABASE_URL: &str = "FLAPPY_SUPABASE_URL";
pub const ENV_SUPABASE_KEY: &str = "FLAPPY_SUPABASE_KEY";
pub const ENV_DATA_DIR: &str = "FLAPPY_DATA_DIR";
pub const ENV_TICK_MS: &str = "FLAPPY_TICK_MS";

/// Credentials for the hosted store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Project URL without a trailing slash, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Anonymous API key sent as `apikey` and bearer token.
    pub api_key: String,
}

impl RemoteConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Present only when both the URL and the key are set and non-empty.
    pub fn from_env() -> Option<Self> {
        let url = read_env_string(ENV_SUPABASE_URL)?;
        let key = read_env_string(ENV_SUPABASE_KEY)?;
        Some(Self::new(url, key))
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub tick_ms: u64,
    pub remote: Option<RemoteConfig>,
}

impl AppConfig {
    pub fn from_env() -> io::Result<Self> {
        let data_dir = match read_env_string(ENV_DATA_DIR) {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };
        fs::create_dir_all(&data_dir)?;

        Ok(Self {
            data_dir,
            tick_ms: read_env_u64(ENV_TICK_MS, TICK_INTERVAL_MS),
            remote: RemoteConfig::from_env(),
        })
    }

    /// Log the settings that differ from the defaults. Call once logging is up.
    pub fn log_overrides(&self) {
        if self.tick_ms != TICK_INTERVAL_MS {
            tracing::info!(tick_ms = self.tick_ms, "using custom tick interval");
        }
        if let Some(remote) = &self.remote {
            tracing::debug!(url = %remote.url, "hosted store configured");
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("flappy.log")
    }
}

/// `~/.flappy`
pub fn default_data_dir() -> io::Result<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "Could not determine home directory",
        )
    })?;
    Ok(home_dir.join(".flappy"))
}

fn read_env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(crate) fn read_env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn logged_overrides(config: &AppConfig) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || config.log_overrides());
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn config_with_tick(tick_ms: u64) -> AppConfig {
        AppConfig {
            data_dir: PathBuf::from("unused"),
            tick_ms,
            remote: None,
        }
    }

    #[test]
    fn test_custom_tick_logged_once_subscriber_is_up() {
        let output = logged_overrides(&config_with_tick(30));
        assert!(output.contains("using custom tick interval"));
        assert!(output.contains("tick_ms=30"));
    }

    #[test]
    fn test_default_settings_log_nothing() {
        assert!(logged_overrides(&config_with_tick(TICK_INTERVAL_MS)).is_empty());
    }

    #[test]
    fn test_remote_url_trailing_slash_trimmed() {
        let config = RemoteConfig::new("https://example.supabase.co/", "key");
        assert_eq!(config.url, "https://example.supabase.co");
    }

    #[test]
    fn test_read_env_u64_falls_back() {
        assert_eq!(read_env_u64("FLAPPY_TEST_UNSET_VARIABLE_12345", 16), 16);
    }

    #[test]
    fn test_default_data_dir_name() {
        if let Ok(dir) = default_data_dir() {
            assert!(dir.ends_with(".flappy"));
        }
    }
}
