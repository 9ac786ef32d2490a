//! Session provider: an authenticated, query-capable Snowflake handle.
//!
//! The actual connection and authentication live in an external worker
//! process; this module wraps it in a [`Session`] created once at login and
//! shared read-only by every panel. The [`QuerySession`] trait is the seam
//! between the dashboard and the warehouse: panels only ever see
//! `execute(sql) -> Table`, so tests substitute a scripted implementation.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                snowscope (Rust + Tokio)                  │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │  Session (session_id + Arc<WorkerClient>)          │  │
//! │  │  - session.login once, query.execute per panel     │  │
//! │  └────────────────────────────────────────────────────┘  │
//! │                 stdin (NDJSON) │ stdout (NDJSON)         │
//! └────────────────────────────────┼─────────────────────────┘
//!                                  ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │        snowscope-worker (holds the Snowflake session)    │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod client;
mod error;
pub mod protocol;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

pub use client::WorkerClient;
pub use error::{SessionError, SessionResult};

use crate::table::Table;
use protocol::{
    methods, ConnectionParams, ExecuteQueryParams, ExecuteQueryResponse, LoginParams,
    LoginResponse,
};

/// Options for the login call.
#[derive(Debug, Clone)]
pub struct LoginOptions {
    /// Time-to-live for cached credentials, in seconds.
    pub ttl_seconds: u64,
    /// Label shown by the login prompt.
    pub label: String,
}

impl Default for LoginOptions {
    fn default() -> Self {
        Self {
            ttl_seconds: 120,
            label: "Snowflake Login".to_string(),
        }
    }
}

/// A query-capable session.
///
/// Implementations must be read-only from the caller's perspective:
/// executing a query never mutates the handle.
#[async_trait]
pub trait QuerySession: Send + Sync {
    /// Execute one SQL statement and materialize the result.
    async fn execute(&self, sql: &str) -> SessionResult<Table>;
}

/// An authenticated session held by the worker, addressed by id.
///
/// Created once at login; cloned handles share the same worker client and
/// session id.
#[derive(Clone)]
pub struct Session {
    client: Arc<WorkerClient>,
    session_id: String,
    label: String,
}

impl Session {
    /// Authenticate against the warehouse and return a session handle.
    pub async fn login(
        client: Arc<WorkerClient>,
        connection: ConnectionParams,
        options: LoginOptions,
    ) -> SessionResult<Self> {
        let label = options.label.clone();
        let response: LoginResponse = client
            .request(
                methods::SESSION_LOGIN,
                LoginParams {
                    connection,
                    ttl_seconds: options.ttl_seconds,
                    label: options.label,
                },
            )
            .await?;

        debug!(session_id = %response.session_id, "session established");

        Ok(Self {
            client,
            session_id: response.session_id,
            label,
        })
    }

    /// The label this session was opened under.
    pub fn label(&self) -> &str {
        &self.label
    }
}

#[async_trait]
impl QuerySession for Session {
    async fn execute(&self, sql: &str) -> SessionResult<Table> {
        let response: ExecuteQueryResponse = self
            .client
            .request(
                methods::EXECUTE_QUERY,
                ExecuteQueryParams {
                    session_id: self.session_id.clone(),
                    sql: sql.to_string(),
                },
            )
            .await?;

        Ok(Table::from_response(&response))
    }
}
