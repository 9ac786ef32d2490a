//! Protocol types for worker communication.
//!
//! The worker speaks NDJSON over stdin/stdout: one request envelope per
//! line in, one response envelope per line out, correlated by id.

use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Envelope
// ============================================================================

/// Request envelope sent to the worker.
#[derive(Debug, Clone, Serialize)]
pub struct RequestEnvelope {
    /// Unique request ID for correlation.
    pub id: String,
    /// Method name (e.g., "query.execute").
    pub method: String,
    /// Method-specific parameters.
    pub params: serde_json::Value,
}

/// Response envelope received from the worker.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseEnvelope {
    /// Request ID this response corresponds to.
    pub id: String,
    /// Whether the request succeeded.
    pub success: bool,
    /// Result data (present if success = true).
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// Error information (present if success = false).
    #[serde(default)]
    pub error: Option<ErrorInfo>,
}

/// Error information in a failed response.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorInfo {
    /// Error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

// ============================================================================
// Connection Parameters
// ============================================================================

/// Snowflake connection parameters passed to `session.login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Account locator.
    pub account: String,
    /// User name.
    pub user: String,
    /// Password (omitted for SSO flows).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Role to assume.
    pub role: String,
    /// Compute warehouse.
    pub warehouse: String,
    /// Database holding the telemetry views.
    pub database: String,
    /// Schema exposing the telemetry views.
    pub schema: String,
}

// ============================================================================
// Session Parameters
// ============================================================================

/// Parameters for `session.login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginParams {
    #[serde(flatten)]
    pub connection: ConnectionParams,
    /// Time-to-live for cached credentials, in seconds.
    pub ttl_seconds: u64,
    /// Label shown by the login prompt.
    pub label: String,
}

/// Response from `session.login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Opaque session handle; carried by every subsequent query.
    pub session_id: String,
}

// ============================================================================
// Query Execution
// ============================================================================

/// Parameters for `query.execute`.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteQueryParams {
    /// Session to execute against.
    pub session_id: String,
    /// SQL query to execute.
    pub sql: String,
}

/// Column information in query results.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResultColumn {
    /// Column name or alias.
    pub name: String,
    /// Database-specific type.
    pub data_type: String,
}

/// Response from `query.execute`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteQueryResponse {
    /// Result column descriptions.
    pub columns: Vec<QueryResultColumn>,
    /// Result data rows.
    pub rows: Vec<Vec<serde_json::Value>>,
    /// Number of rows returned.
    pub row_count: i64,
}

// ============================================================================
// Method Names
// ============================================================================

/// Worker method names.
pub mod methods {
    pub const SESSION_LOGIN: &str = "session.login";
    pub const EXECUTE_QUERY: &str = "query.execute";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_envelope_serialization() {
        let request = RequestEnvelope {
            id: "req-1".to_string(),
            method: methods::EXECUTE_QUERY.to_string(),
            params: serde_json::json!({
                "session_id": "sess-1",
                "sql": "SELECT 1",
            }),
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("req-1"));
        assert!(json.contains("query.execute"));
        assert!(json.contains("SELECT 1"));
    }

    #[test]
    fn test_login_params_flatten_connection() {
        let params = LoginParams {
            connection: ConnectionParams {
                account: "xy12345".into(),
                user: "operator".into(),
                password: None,
                role: "ACCOUNTADMIN".into(),
                warehouse: "ADHOC_WH".into(),
                database: "SNOWFLAKE".into(),
                schema: "ACCOUNT_USAGE".into(),
            },
            ttl_seconds: 120,
            label: "Snowflake Login".into(),
        };

        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["account"], "xy12345");
        assert_eq!(json["ttl_seconds"], 120);
        // No password key at all when unset.
        assert!(json.get("password").is_none());
    }

    #[test]
    fn test_response_envelope_deserialization() {
        let json = r#"{
            "id": "req-2",
            "success": true,
            "result": {"columns": [{"name": "CREDITS", "data_type": "FLOAT"}], "rows": [[4.75]], "row_count": 1}
        }"#;

        let response: ResponseEnvelope = serde_json::from_str(json).unwrap();
        assert!(response.success);

        let result: ExecuteQueryResponse =
            serde_json::from_value(response.result.unwrap()).unwrap();
        assert_eq!(result.row_count, 1);
        assert_eq!(result.columns[0].name, "CREDITS");
    }

    #[test]
    fn test_error_response_deserialization() {
        let json = r#"{
            "id": "req-3",
            "success": false,
            "error": {"code": "LOGIN_FAILED", "message": "bad credentials"}
        }"#;

        let response: ResponseEnvelope = serde_json::from_str(json).unwrap();
        assert!(!response.success);
        let error = response.error.unwrap();
        assert_eq!(error.code, "LOGIN_FAILED");
    }
}
