//! Application-level configuration loading, including the deployment mode flags.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PHOTO_CONTEST_CONFIG_PATH";

const MANUAL_CONTROL_ENV: &str = "MANUAL_CONTEST_CONTROL";
const DISABLE_JOIN_ENV: &str = "DISABLE_JOIN_WHEN_VOTING_STARTS";
const USERNAME_ONLY_ENV: &str = "USERNAME_ONLY";
const FIXED_PASSWORD_ENV: &str = "FIXED_USER_PASSWORD";
const API_KEY_ENV: &str = "API_KEY";

/// Process-wide deployment flags, resolved once at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeConfig {
    /// New contests are manually controlled unless the request says otherwise.
    pub manual_control_default: bool,
    /// Refuse new entries once voting has opened.
    pub disable_join_when_voting_starts: bool,
    /// Identities are usernames instead of email addresses.
    pub username_only_mode: bool,
    /// A shared password is configured for every participant.
    pub fixed_password_mode: bool,
}

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    mode: ModeConfig,
    api_key: Option<String>,
}

impl AppConfig {
    /// Build a configuration from explicit parts.
    pub fn new(mode: ModeConfig, api_key: Option<String>) -> Self {
        Self { mode, api_key }
    }

    /// Load the configuration file, then apply environment overrides.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let raw = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded mode flags from config");
                    raw
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    RawConfig::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                RawConfig::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                RawConfig::default()
            }
        };

        let config = Self::from_raw(raw, |name| env::var(name).ok());
        info!(
            manual_control_default = config.mode.manual_control_default,
            disable_join_when_voting_starts = config.mode.disable_join_when_voting_starts,
            username_only_mode = config.mode.username_only_mode,
            fixed_password_mode = config.mode.fixed_password_mode,
            api_key = config.api_key.is_some(),
            "resolved mode configuration"
        );
        config
    }

    /// Merge file values with environment overrides provided by `lookup`.
    fn from_raw(raw: RawConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |name: &str, fallback: bool| match lookup(name) {
            Some(value) => value.trim().eq_ignore_ascii_case("true"),
            None => fallback,
        };
        let present = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mode = ModeConfig {
            manual_control_default: flag(MANUAL_CONTROL_ENV, raw.manual_control_default),
            disable_join_when_voting_starts: flag(
                DISABLE_JOIN_ENV,
                raw.disable_join_when_voting_starts,
            ),
            username_only_mode: flag(USERNAME_ONLY_ENV, raw.username_only_mode),
            fixed_password_mode: present(FIXED_PASSWORD_ENV).is_some()
                || raw.fixed_password_mode,
        };

        let api_key = present(API_KEY_ENV).or(raw.api_key.filter(|key| !key.is_empty()));

        Self { mode, api_key }
    }

    /// Deployment mode flags.
    pub fn mode(&self) -> &ModeConfig {
        &self.mode
    }

    /// API key required on `/api` routes, if any.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    manual_control_default: bool,
    disable_join_when_voting_starts: bool,
    username_only_mode: bool,
    fixed_password_mode: bool,
    api_key: Option<String>,
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
