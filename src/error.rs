use serde::Serialize;
use thiserror::Error;

use crate::registration::dto::OrphanedIdentity;

/// Rejection reported by a remote collaborator (auth or storage).
///
/// `message` is the collaborator's own text and is surfaced verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CollaboratorError {
    pub message: String,
    /// HTTP status, when the rejection came from a response rather than the transport.
    pub status: Option<u16>,
    /// Machine code from the response body (`error_code` / `code`), if any.
    pub code: Option<String>,
}

impl CollaboratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            code: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(e: reqwest::Error) -> Self {
        Self {
            message: e.to_string(),
            status: e.status().map(|s| s.as_u16()),
            code: None,
        }
    }
}

/// Machine-readable tag of a [`RegistrationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AuthFailure,
    ProfileWriteFailure,
    AlreadySubmitting,
    Unauthorized,
    Forbidden,
    InvalidRequest,
}

/// Outcome of a failed submission attempt.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    /// Sign-up was rejected; nothing was created.
    #[error("{message}")]
    AuthFailure {
        message: String,
        status: Option<u16>,
    },

    /// The identity exists but its profile row could not be written.
    #[error("{message}")]
    ProfileWriteFailure {
        message: String,
        orphan: Box<OrphanedIdentity>,
    },

    /// Another submission or profile retry for the same subject is still running.
    #[error("a registration for {subject} is already in progress")]
    AlreadySubmitting { subject: String },

    /// The caller presented no usable access token.
    #[error("{message}")]
    Unauthorized { message: String },

    /// The access token belongs to a different identity than the one addressed.
    #[error("{message}")]
    Forbidden { message: String },

    #[error("{message}")]
    InvalidRequest { message: String },
}

impl RegistrationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AuthFailure { .. } => ErrorKind::AuthFailure,
            Self::ProfileWriteFailure { .. } => ErrorKind::ProfileWriteFailure,
            Self::AlreadySubmitting { .. } => ErrorKind::AlreadySubmitting,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::InvalidRequest { .. } => ErrorKind::InvalidRequest,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    /// The identity left without a profile, if this failure produced one.
    pub fn orphan(&self) -> Option<&OrphanedIdentity> {
        match self {
            Self::ProfileWriteFailure { orphan, .. } => Some(orphan),
            _ => None,
        }
    }
}

/// Refusals of the form session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("submission already in progress")]
    Submitting,
    #[error("no submission in progress")]
    NotSubmitting,
}
