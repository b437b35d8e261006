use crate::cache::CacheError;
use crate::error_code::ServiceErrorCode;
use crate::transport::TransportError;
use std::fmt;
use thiserror::Error;

/// Where a malformed response or a bad setting was detected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// XML location or setting name, e.g. `lfm@status`, `session/key`, `proxy_url`
    pub field_path: Option<String>,
    /// Offending value or what was expected instead
    pub details: Option<String>,
    /// Component that raised it: `envelope`, `client_builder`, `http_transport`, ...
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Renders ` (field: .., details: .., source: ..)`, or nothing when empty.
impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labelled = [
            ("field", &self.field_path),
            ("details", &self.details),
            ("source", &self.source),
        ];
        let mut open = false;
        for (label, value) in labelled {
            if let Some(value) = value {
                f.write_str(if open { ", " } else { " (" })?;
                write!(f, "{}: {}", label, value)?;
                open = true;
            }
        }
        if open {
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// Unified error type for the caller.
///
/// [`LastFmClient`](crate::LastFmClient) calls never return `Cache`; a signed
/// call without a secret is a `Configuration` error. `Cache` surfaces when a
/// [`CacheStore`](crate::cache::CacheStore) is used directly; the client itself
/// absorbs cache failures.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Service error {code}: {message}")]
    Service { code: u32, message: String },

    #[error("Malformed response: {message}{context}")]
    MalformedResponse {
        message: String,
        context: ErrorContext,
    },

    #[error("Cache backend error: {0}")]
    Cache(#[from] CacheError),

    #[error("Configuration error: {message}{context}")]
    Configuration {
        message: String,
        context: ErrorContext,
    },
}

impl Error {
    pub fn service(code: u32, message: impl Into<String>) -> Self {
        Error::Service {
            code,
            message: message.into(),
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::malformed_with_context(msg, ErrorContext::new())
    }

    /// Create a new malformed-response error with structured context
    pub fn malformed_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::MalformedResponse {
            message: msg.into(),
            context,
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::configuration_with_context(msg, ErrorContext::new())
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::MalformedResponse { context, .. } | Error::Configuration { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }

    /// Classify an upstream failure. `None` for non-service errors and for codes
    /// the service documents no meaning for.
    pub fn service_code(&self) -> Option<ServiceErrorCode> {
        match self {
            Error::Service { code, .. } => ServiceErrorCode::from_code(*code),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}
