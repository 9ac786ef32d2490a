//! TOML-based configuration for snowscope.
//!
//! Supports a config file (snowscope.toml) with environment variable
//! expansion.
//!
//! Example configuration:
//! ```toml
//! [connections.production]
//! account = "xy12345"
//! user = "operator"
//! password = "${SNOWFLAKE_PASSWORD}"
//! warehouse = "ADHOC_WH"
//!
//! [worker]
//! path = "./snowscope-worker"
//!
//! [session]
//! credential_ttl_seconds = 120
//! label = "Snowflake Login"
//!
//! [dashboard]
//! default_window_days = 31
//! ```

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::connection::{DEFAULT_DATABASE, DEFAULT_ROLE, DEFAULT_SCHEMA};
use crate::session::protocol::ConnectionParams;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Named Snowflake connections.
    #[serde(default)]
    pub connections: HashMap<String, ConnectionSettings>,

    /// Worker configuration.
    #[serde(default)]
    pub worker: WorkerSettings,

    /// Session provider configuration.
    #[serde(default)]
    pub session: SessionSettings,

    /// Dashboard configuration.
    #[serde(default)]
    pub dashboard: DashboardSettings,
}

/// One named connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionSettings {
    /// Account locator.
    pub account: String,

    /// User name.
    pub user: String,

    /// Password (supports ${ENV_VAR} expansion).
    #[serde(default)]
    pub password: Option<String>,

    /// Role to assume.
    #[serde(default = "default_role")]
    pub role: String,

    /// Compute warehouse.
    pub warehouse: String,

    /// Database holding the telemetry views.
    #[serde(default = "default_database")]
    pub database: String,

    /// Schema exposing the telemetry views.
    #[serde(default = "default_schema")]
    pub schema: String,
}

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

impl ConnectionSettings {
    /// Resolve into protocol connection parameters, expanding `${ENV_VAR}`
    /// references in the password.
    pub fn to_params(&self) -> Result<ConnectionParams, SettingsError> {
        let password = match &self.password {
            Some(raw) => Some(expand_env_vars(raw)?),
            None => None,
        };

        Ok(ConnectionParams {
            account: self.account.clone(),
            user: self.user.clone(),
            password,
            role: self.role.clone(),
            warehouse: self.warehouse.clone(),
            database: self.database.clone(),
            schema: self.schema.clone(),
        })
    }
}

/// Worker configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Path to the worker binary (searched if unset).
    pub path: Option<String>,

    /// Request timeout in seconds.
    pub timeout_seconds: Option<u64>,
}

/// Session provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Time-to-live for cached credentials, in seconds.
    pub credential_ttl_seconds: u64,

    /// Label shown by the login prompt.
    pub label: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            credential_ttl_seconds: 120,
            label: "Snowflake Login".to_string(),
        }
    }
}

/// Dashboard configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DashboardSettings {
    /// Default trailing window when no explicit range is given, in days.
    pub default_window_days: i64,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            default_window_days: 31,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SNOWSCOPE_CONFIG`
    /// 2. `./snowscope.toml`
    /// 3. `~/.config/snowscope/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("SNOWSCOPE_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("snowscope.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("snowscope").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Get a connection by name.
    pub fn get_connection(&self, name: &str) -> Result<&ConnectionSettings, SettingsError> {
        self.connections
            .get(name)
            .ok_or_else(|| SettingsError::ConnectionNotFound(name.to_string()))
    }

    /// Get the default connection ("default" if it exists, otherwise the
    /// first one defined).
    pub fn default_connection(&self) -> Option<(&str, &ConnectionSettings)> {
        if let Some(conn) = self.connections.get("default") {
            return Some(("default", conn));
        }
        self.connections.iter().next().map(|(k, v)| (k.as_str(), v))
    }

    /// Get the worker binary path, expanding env vars in a configured path
    /// and falling back to common locations.
    pub fn worker_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.worker.path {
            let expanded = expand_env_vars(path).ok()?;
            return Some(PathBuf::from(expanded));
        }

        let candidates = ["snowscope-worker", "./snowscope-worker"];
        for candidate in candidates {
            let path = PathBuf::from(candidate);
            if path.exists() {
                return Some(path);
            }
        }

        None
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' {
            if chars.peek() == Some(&'{') {
                chars.next();
                let mut var_name = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch == '}' {
                        chars.next();
                        break;
                    }
                    var_name.push(ch);
                    chars.next();
                }
                let value = env::var(&var_name)
                    .map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
                result.push_str(&value);
            } else {
                let mut var_name = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_alphanumeric() || ch == '_' {
                        var_name.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if var_name.is_empty() {
                    result.push('$');
                } else {
                    let value = env::var(&var_name)
                        .map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
                    result.push_str(&value);
                }
            }
        } else {
            result.push(c);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars_braces() {
        env::set_var("SNOWSCOPE_TEST_VAR", "hello");
        assert_eq!(expand_env_vars("${SNOWSCOPE_TEST_VAR}").unwrap(), "hello");
        assert_eq!(
            expand_env_vars("a_${SNOWSCOPE_TEST_VAR}_b").unwrap(),
            "a_hello_b"
        );
        env::remove_var("SNOWSCOPE_TEST_VAR");
    }

    #[test]
    fn test_expand_env_vars_missing() {
        assert!(expand_env_vars("${SNOWSCOPE_NONEXISTENT_VAR_123}").is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[connections.production]
account = "xy12345"
user = "operator"
warehouse = "ADHOC_WH"

[connections.staging]
account = "ab67890"
user = "operator"
warehouse = "STAGE_WH"
role = "USAGE_READER"

[worker]
path = "./snowscope-worker"
timeout_seconds = 60

[session]
credential_ttl_seconds = 300

[dashboard]
default_window_days = 14
"#;

        let settings: Settings = toml::from_str(toml).unwrap();

        assert_eq!(settings.connections.len(), 2);
        let prod = &settings.connections["production"];
        assert_eq!(prod.role, "ACCOUNTADMIN");
        assert_eq!(prod.database, "SNOWFLAKE");
        assert_eq!(prod.schema, "ACCOUNT_USAGE");
        assert_eq!(settings.connections["staging"].role, "USAGE_READER");

        assert_eq!(settings.worker.timeout_seconds, Some(60));
        assert_eq!(settings.session.credential_ttl_seconds, 300);
        assert_eq!(settings.dashboard.default_window_days, 14);
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.session.credential_ttl_seconds, 120);
        assert_eq!(settings.session.label, "Snowflake Login");
        assert_eq!(settings.dashboard.default_window_days, 31);
        assert!(settings.connections.is_empty());
    }

    #[test]
    fn test_password_expansion() {
        env::set_var("SNOWSCOPE_TEST_PW", "hunter2");
        let conn = ConnectionSettings {
            account: "xy12345".into(),
            user: "operator".into(),
            password: Some("${SNOWSCOPE_TEST_PW}".into()),
            role: default_role(),
            warehouse: "ADHOC_WH".into(),
            database: default_database(),
            schema: default_schema(),
        };
        let params = conn.to_params().unwrap();
        assert_eq!(params.password.as_deref(), Some("hunter2"));
        env::remove_var("SNOWSCOPE_TEST_PW");
    }

    #[test]
    fn test_default_connection_prefers_default_key() {
        let toml = r#"
[connections.other]
account = "a"
user = "u"
warehouse = "W"

[connections.default]
account = "b"
user = "u"
warehouse = "W"
"#;
        let settings: Settings = toml::from_str(toml).unwrap();
        let (name, conn) = settings.default_connection().unwrap();
        assert_eq!(name, "default");
        assert_eq!(conn.account, "b");
    }
}
