// Error types module

use std::fmt;

/// Error categories used for logging and status mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Timeout,
    Upstream,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Centralized error type for the gateway
///
/// Every failure after request construction ends up here so the response
/// layer can pick the HTTP status and render the error image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimsError {
    /// Failure carrying an explicit HTTP status (bad request, upstream non-200, ...)
    Status { status: u16, message: String },

    /// Failure raised by a pipeline command
    Operation {
        status: u16,
        message: String,
        command: String,
        args: String,
    },

    /// Signature mismatch
    Unauthorized(String),

    /// Source or overlay fetch exceeded the download timeout
    Timeout(String),

    /// Codec failure or other unrecoverable error
    Internal(String),
}

impl fmt::Display for DimsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimsError::Status { status, message } => {
                write!(f, "Error: {} (status: {})", message, status)
            }
            DimsError::Operation {
                status,
                message,
                command,
                args,
            } => write!(
                f,
                "OperationError: {} (status: {}) (command: {}) (args: {})",
                message, status, command, args
            ),
            DimsError::Unauthorized(msg) => write!(f, "Error: {} (status: 401)", msg),
            DimsError::Timeout(msg) => write!(f, "Error: {} (status: 504)", msg),
            DimsError::Internal(msg) => write!(f, "Error: {} (status: 500)", msg),
        }
    }
}

impl std::error::Error for DimsError {}

impl DimsError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        DimsError::Status {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::status(400, message)
    }

    pub fn operation(
        command: impl Into<String>,
        args: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        DimsError::Operation {
            status: 400,
            message: message.into(),
            command: command.into(),
            args: args.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        DimsError::Unauthorized(message.into())
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        DimsError::Timeout(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        DimsError::Internal(message.into())
    }

    /// Maps errors to HTTP status codes
    ///
    /// - Status, Operation → carried status
    /// - Unauthorized → 401
    /// - Timeout → 504
    /// - Internal → 500
    pub fn status_code(&self) -> u16 {
        match self {
            DimsError::Status { status, .. } | DimsError::Operation { status, .. } => *status,
            DimsError::Unauthorized(_) => 401,
            DimsError::Timeout(_) => 504,
            DimsError::Internal(_) => 500,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DimsError::Unauthorized(_) => ErrorKind::Unauthorized,
            DimsError::Timeout(_) => ErrorKind::Timeout,
            DimsError::Internal(_) => ErrorKind::Internal,
            DimsError::Operation { .. } => ErrorKind::BadRequest,
            DimsError::Status { status, .. } => match *status {
                400 => ErrorKind::BadRequest,
                401 | 403 => ErrorKind::Unauthorized,
                504 => ErrorKind::Timeout,
                500 => ErrorKind::Internal,
                _ => ErrorKind::Upstream,
            },
        }
    }

    /// The message without status decoration
    pub fn message(&self) -> &str {
        match self {
            DimsError::Status { message, .. } | DimsError::Operation { message, .. } => message,
            DimsError::Unauthorized(msg) | DimsError::Timeout(msg) | DimsError::Internal(msg) => {
                msg
            }
        }
    }

    /// Message suitable for logs and plain-text responses
    ///
    /// Multi-line codec traces are cut down to their first line.
    pub fn public_message(&self) -> String {
        let message = self.to_string();
        message.lines().next().unwrap_or_default().to_string()
    }
}

/// Errors surfaced before a request reaches the pipeline
impl From<crate::signing::SigningError> for DimsError {
    fn from(err: crate::signing::SigningError) -> Self {
        DimsError::bad_request(err.to_string())
    }
}
