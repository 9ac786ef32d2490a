//! Configuration module for snowscope.
//!
//! Handles connection configuration, environment variables, and settings.

mod connection;
mod settings;

pub use connection::{
    ConnectionConfig, ConnectionError, DEFAULT_DATABASE, DEFAULT_ROLE, DEFAULT_SCHEMA,
};
pub use settings::{
    expand_env_vars, ConnectionSettings, DashboardSettings, SessionSettings, Settings,
    SettingsError, WorkerSettings,
};
