use std::fmt;

use serde::{Deserialize, Serialize};

/// Coded category for a [`Status`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    /// The requested wavelet, version, or block does not exist. Recoverable
    /// by the caller.
    NotFound,
    /// I/O or storage-backend fault. Fatal to the operation, not to the
    /// process; the whole operation may be retried.
    PersistenceFailure,
    /// A core operation's precondition was violated against target state.
    /// A programming or data-consistency error.
    OperationFailed,
    /// A locally-detectable precondition failure on an argument.
    BadArgument,
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::PersistenceFailure => write!(f, "persistence failure"),
            Self::OperationFailed => write!(f, "operation failed"),
            Self::BadArgument => write!(f, "bad argument"),
        }
    }
}

/// Uniform status crossing the persistence boundary.
///
/// Pairs a coded category with an optional message and an optional
/// stringified underlying cause. Internal failures are translated into this
/// type before leaving the core; equality compares code, message, and
/// cause.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    code: StatusCode,
    message: Option<String>,
    cause: Option<String>,
}

impl Status {
    pub fn new(code: StatusCode) -> Self {
        Self {
            code,
            message: None,
            cause: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NotFound).with_message(message)
    }

    pub fn persistence_failure(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PersistenceFailure).with_message(message)
    }

    pub fn operation_failed(message: impl Into<String>) -> Self {
        Self::new(StatusCode::OperationFailed).with_message(message)
    }

    pub fn bad_argument(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BadArgument).with_message(message)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    pub fn code(&self) -> StatusCode {
        self.code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }

    /// Returns `true` if this status is the recoverable not-found case.
    pub fn is_not_found(&self) -> bool {
        self.code == StatusCode::NotFound
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(cause) = &self.cause {
            write!(f, " (caused by: {cause})")?;
        }
        Ok(())
    }
}

impl std::error::Error for Status {}
