// Structured error taxonomies: server-side (HTTP surface) and monitoring-side.
// The logging middleware is the single point that turns a ServerError into the
// canonical JSON error body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Monitoring-side errors raised by the OS stat collectors. The stats cache
/// treats all of these as non-fatal (zero-fill and continue) except
/// `Cancelled`, which aborts the in-flight collection.
#[derive(Debug, Error)]
pub enum MonitoringError {
    #[error("sensor error in {operation}: {message}")]
    Sensor {
        operation: &'static str,
        message: String,
    },
    #[error("system error in {operation}: {message}")]
    System {
        operation: &'static str,
        message: String,
    },
    #[error("io error in {operation}")]
    Io {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },
    #[error("permission denied in {operation}: {message}")]
    Permission {
        operation: &'static str,
        message: String,
    },
    #[error("{operation} is not supported on this platform")]
    Unsupported { operation: &'static str },
    #[error("network stats error in {operation}: {message}")]
    NetworkStats {
        operation: &'static str,
        message: String,
    },
    #[error("process stats error in {operation}: {message}")]
    ProcessStats {
        operation: &'static str,
        message: String,
    },
    #[error("collection cancelled before {operation}")]
    Cancelled { operation: &'static str },
}

impl MonitoringError {
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Sensor { operation, .. }
            | Self::System { operation, .. }
            | Self::Io { operation, .. }
            | Self::Timeout { operation, .. }
            | Self::Permission { operation, .. }
            | Self::Unsupported { operation }
            | Self::NetworkStats { operation, .. }
            | Self::ProcessStats { operation, .. }
            | Self::Cancelled { operation } => operation,
        }
    }

    /// True for hard cancellation, the only error that aborts a whole
    /// collection pass.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Server-side structured error: category + operation + message, with an
/// explicit status override for the `Http` category.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("http error in {operation}: {message}")]
    Http {
        operation: String,
        message: String,
        status: StatusCode,
    },
    #[error("routing error in {operation}: {message}")]
    Routing { operation: String, message: String },
    #[error("auth error in {operation}: {message}")]
    Auth { operation: String, message: String },
    #[error("template error in {operation}: {message}")]
    Template { operation: String, message: String },
    #[error("config error in {operation}: {message}")]
    Config { operation: String, message: String },
    #[error("database error in {operation}: {message}")]
    Database { operation: String, message: String },
    #[error("middleware error in {operation}: {message}")]
    Middleware { operation: String, message: String },
    #[error("internal error in {operation}: {message}")]
    Internal {
        operation: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ServerError {
    pub fn not_found(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Routing {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn internal(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Internal {
            operation: operation.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http { .. } => "http",
            Self::Routing { .. } => "routing",
            Self::Auth { .. } => "auth",
            Self::Template { .. } => "template",
            Self::Config { .. } => "config",
            Self::Database { .. } => "database",
            Self::Middleware { .. } => "middleware",
            Self::Internal { .. } => "internal",
        }
    }

    pub fn operation(&self) -> &str {
        match self {
            Self::Http { operation, .. }
            | Self::Routing { operation, .. }
            | Self::Auth { operation, .. }
            | Self::Template { operation, .. }
            | Self::Config { operation, .. }
            | Self::Database { operation, .. }
            | Self::Middleware { operation, .. }
            | Self::Internal { operation, .. } => operation,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Http { message, .. }
            | Self::Routing { message, .. }
            | Self::Auth { message, .. }
            | Self::Template { message, .. }
            | Self::Config { message, .. }
            | Self::Database { message, .. }
            | Self::Middleware { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Http { status, .. } => *status,
            Self::Routing { .. } => StatusCode::NOT_FOUND,
            Self::Auth { .. } => StatusCode::UNAUTHORIZED,
            Self::Template { .. }
            | Self::Config { .. }
            | Self::Database { .. }
            | Self::Middleware { .. }
            | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Canonical JSON error body; `trace_id` is filled in by the middleware.
    pub fn payload(&self, trace_id: &str) -> ErrorPayload {
        ErrorPayload {
            status: "error".into(),
            message: self.message().to_string(),
            kind: self.kind().to_string(),
            operation: self.operation().to_string(),
            status_code: self.http_status().as_u16(),
            trace_id: trace_id.to_string(),
        }
    }
}

impl From<MonitoringError> for ServerError {
    fn from(err: MonitoringError) -> Self {
        Self::Internal {
            operation: err.operation().to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// The one JSON shape every error response uses.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub status: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub operation: String,
    pub status_code: u16,
    pub trace_id: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        // Body gets an empty trace id here; the logging middleware finds the
        // payload in the response extensions and rewrites it with the real one.
        let payload = self.payload("");
        let status = self.http_status();
        let mut response = (status, axum::Json(&payload)).into_response();
        response.extensions_mut().insert(payload);
        response
    }
}
