//! Snowflake connection configuration.
//!
//! Supports configuration via environment variables:
//! - `SNOWSCOPE_ACCOUNT`: account locator (the piece between `https://` and
//!   `.snowflakecomputing.com`)
//! - `SNOWSCOPE_USER`: user name
//! - `SNOWSCOPE_PASSWORD`: password (optional; SSO flows leave it unset)
//! - `SNOWSCOPE_ROLE`, `SNOWSCOPE_WAREHOUSE`, `SNOWSCOPE_DATABASE`,
//!   `SNOWSCOPE_SCHEMA`: optional overrides

use std::env;

use crate::session::protocol::ConnectionParams;

/// Role with delegated access to the account-usage views.
pub const DEFAULT_ROLE: &str = "ACCOUNTADMIN";
/// Database holding the telemetry views.
pub const DEFAULT_DATABASE: &str = "SNOWFLAKE";
/// Schema exposing QUERY_HISTORY, WAREHOUSE_METERING_HISTORY and friends.
pub const DEFAULT_SCHEMA: &str = "ACCOUNT_USAGE";

/// Error type for connection configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Snowflake connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Account locator.
    pub account: String,
    /// User name.
    pub user: String,
    /// Password (optional).
    pub password: Option<String>,
    /// Role to assume.
    pub role: String,
    /// Compute warehouse for the dashboard's own queries.
    pub warehouse: String,
    /// Database holding the telemetry views.
    pub database: String,
    /// Schema exposing the telemetry views.
    pub schema: String,
}

impl ConnectionConfig {
    /// Create a config pointed at the standard account-usage schema.
    pub fn account_usage(
        account: impl Into<String>,
        user: impl Into<String>,
        warehouse: impl Into<String>,
    ) -> Self {
        Self {
            account: account.into(),
            user: user.into(),
            password: None,
            role: DEFAULT_ROLE.to_string(),
            warehouse: warehouse.into(),
            database: DEFAULT_DATABASE.to_string(),
            schema: DEFAULT_SCHEMA.to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Required: `SNOWSCOPE_ACCOUNT`, `SNOWSCOPE_USER`, `SNOWSCOPE_WAREHOUSE`.
    /// Optional: `SNOWSCOPE_PASSWORD`, `SNOWSCOPE_ROLE`, `SNOWSCOPE_DATABASE`,
    /// `SNOWSCOPE_SCHEMA`.
    pub fn from_env() -> Result<Self, ConnectionError> {
        let required = |name: &str| {
            env::var(name).map_err(|_| ConnectionError::MissingEnvVar(name.to_string()))
        };

        Ok(Self {
            account: required("SNOWSCOPE_ACCOUNT")?,
            user: required("SNOWSCOPE_USER")?,
            warehouse: required("SNOWSCOPE_WAREHOUSE")?,
            password: env::var("SNOWSCOPE_PASSWORD").ok(),
            role: env::var("SNOWSCOPE_ROLE").unwrap_or_else(|_| DEFAULT_ROLE.to_string()),
            database: env::var("SNOWSCOPE_DATABASE")
                .unwrap_or_else(|_| DEFAULT_DATABASE.to_string()),
            schema: env::var("SNOWSCOPE_SCHEMA").unwrap_or_else(|_| DEFAULT_SCHEMA.to_string()),
        })
    }

    /// Convert into the worker protocol's connection parameters.
    pub fn to_params(&self) -> ConnectionParams {
        ConnectionParams {
            account: self.account.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            role: self.role.clone(),
            warehouse: self.warehouse.clone(),
            database: self.database.clone(),
            schema: self.schema.clone(),
        }
    }
}
