//! Error types for startup and request handling.
//!
//! An opaque [`Error`] is paired with an [`ErrorKind`], following the
//! `std::io::Error` pattern. Startup failures (configuration, metrics
//! exporter, trace exporter, listener) bubble up to the binary and end the
//! process; request-level failures turn into a JSON [`ErrorResponse`].
//!
//! ```rust
//! use graphql_server::{Error, ErrorKind};
//! use axum::http::StatusCode;
//!
//! let error = Error::authorization("admin access denied");
//! assert_eq!(error.kind(), ErrorKind::Authorization);
//! assert_eq!(error.status_code(), StatusCode::FORBIDDEN);
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Missing or invalid configuration. Fatal at startup.
    #[error("configuration error")]
    Configuration,

    /// The metrics exporter could not be created or a collector could not
    /// be registered. Fatal at startup.
    #[error("metrics exporter error")]
    Metrics,

    /// The trace exporter could not be created. Fatal at startup.
    #[error("trace exporter error")]
    Telemetry,

    /// Socket or file I/O, including a failed listener bind.
    #[error("I/O error")]
    Io,

    /// Credentials were rejected by the verifier.
    #[error("authentication error")]
    Authentication,

    /// The admin authorizer denied the request.
    #[error("authorization error")]
    Authorization,

    #[error("invalid input")]
    InvalidInput,

    /// A view could not be rendered.
    #[error("rendering error")]
    Rendering,

    #[error("internal error")]
    Internal,
}

/// Error type used throughout the crate.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl Error {
    pub fn new<E>(kind: ErrorKind, error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self {
            kind,
            source: error.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Stable, machine-readable code for clients.
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            ErrorKind::Configuration => "CONFIG_ERROR",
            ErrorKind::Metrics => "METRICS_ERROR",
            ErrorKind::Telemetry => "TELEMETRY_ERROR",
            ErrorKind::Io => "IO_ERROR",
            ErrorKind::Authentication => "AUTH_ERROR",
            ErrorKind::Authorization => "FORBIDDEN",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::Rendering => "RENDER_ERROR",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::Configuration
            | ErrorKind::Metrics
            | ErrorKind::Telemetry
            | ErrorKind::Io
            | ErrorKind::Rendering
            | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Server-side failures are reported with a generic message so internal
    /// detail never reaches the client.
    pub fn to_error_response(&self) -> ErrorResponse {
        if self.status_code().is_server_error() {
            ErrorResponse::new(self.error_code(), self.kind.to_string())
        } else {
            ErrorResponse::new(self.error_code(), self.to_string())
        }
    }
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, msg.into())
    }

    pub fn metrics(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Metrics, msg.into())
    }

    pub fn telemetry(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Telemetry, msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, msg.into())
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, msg.into())
    }

    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, msg.into())
    }

    pub fn rendering(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Rendering, msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = self.to_error_response();

        if status.is_server_error() {
            tracing::error!(
                error_code = %error_response.error_code,
                error = %self,
                status = %status.as_u16(),
                "Request failed"
            );
        } else {
            tracing::debug!(
                error_code = %error_response.error_code,
                message = %error_response.message,
                status = %status.as_u16(),
                "Request rejected"
            );
        }

        (status, Json(error_response)).into_response()
    }
}

/// `From` conversions for foreign errors, each pinned to one kind.
macro_rules! from_foreign_error {
    ($($source:ty => $kind:ident),+ $(,)?) => {
        $(
            impl From<$source> for Error {
                fn from(err: $source) -> Self {
                    Self::new(ErrorKind::$kind, err)
                }
            }
        )+
    };
}

from_foreign_error! {
    std::io::Error => Io,
    toml::de::Error => Configuration,
    url::ParseError => Configuration,
    std::env::VarError => Configuration,
    http::header::InvalidHeaderValue => InvalidInput,
    prometheus::Error => Metrics,
    tower_sessions::session::Error => Internal,
}

/// JSON body returned for failed requests.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error_code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::Configuration.to_string(), "configuration error");
        assert_eq!(ErrorKind::Metrics.to_string(), "metrics exporter error");
        assert_eq!(ErrorKind::Authorization.to_string(), "authorization error");
    }

    #[test]
    fn test_constructors_set_kind() {
        assert_eq!(Error::config("x").kind(), ErrorKind::Configuration);
        assert_eq!(Error::metrics("x").kind(), ErrorKind::Metrics);
        assert_eq!(Error::telemetry("x").kind(), ErrorKind::Telemetry);
        assert_eq!(Error::io("x").kind(), ErrorKind::Io);
        assert_eq!(Error::authentication("x").kind(), ErrorKind::Authentication);
        assert_eq!(Error::authorization("x").kind(), ErrorKind::Authorization);
        assert_eq!(Error::invalid_input("x").kind(), ErrorKind::InvalidInput);
        assert_eq!(Error::rendering("x").kind(), ErrorKind::Rendering);
        assert_eq!(Error::internal("x").kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::authentication("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::authorization("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(Error::invalid_input("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::rendering("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            Error::metrics("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::config("x").error_code(), "CONFIG_ERROR");
        assert_eq!(Error::authorization("x").error_code(), "FORBIDDEN");
        assert_eq!(Error::rendering("x").error_code(), "RENDER_ERROR");
    }

    #[test]
    fn test_server_errors_hide_detail() {
        let response = Error::internal("connection refused at 10.0.0.3").to_error_response();
        assert_eq!(response.error_code, "INTERNAL_ERROR");
        assert_eq!(response.message, "internal error");
    }

    #[test]
    fn test_client_errors_keep_message() {
        let response = Error::authentication("invalid login or password").to_error_response();
        assert_eq!(response.message, "invalid login or password");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use");
        let err: Error = io_err.into();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_from_toml_error() {
        let toml_err = "invalid".parse::<toml::Value>().unwrap_err();
        let err: Error = toml_err.into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_from_url_parse_error() {
        let url_err = url::Url::parse("not a url").unwrap_err();
        let err: Error = url_err.into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_from_prometheus_error() {
        let err: Error = prometheus::Error::Msg("duplicate".into()).into();
        assert_eq!(err.kind(), ErrorKind::Metrics);
    }

    #[test]
    fn test_error_response_with_details() {
        let response = ErrorResponse::new("CODE", "message").with_details("extra info");
        assert_eq!(response.details, Some("extra info".to_string()));
    }

    #[tokio::test]
    async fn test_into_response_is_json() {
        let response = Error::authorization("nope").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error_code"], "FORBIDDEN");
        assert_eq!(json["message"], "nope");
    }

    #[test]
    fn test_error_source_and_display() {
        let err = Error::internal("my error message");
        assert_eq!(format!("{err}"), "my error message");
        assert!(StdError::source(&err).is_some());
        assert!(format!("{err:?}").contains("Internal"));
    }
}
