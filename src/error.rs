use crate::kind::{FailureKind, Kind};

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use http::{Method, StatusCode};

pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Raised while building a router. Fatal: no traffic is served.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("binding declares no path: owner = {owner:?}")]
    MissingPath { owner: Box<str> },

    #[error("{reason}: pattern = {pattern:?}, owner = {owner:?}")]
    MalformedPattern {
        pattern: Box<str>,
        owner: Box<str>,
        reason: &'static str,
    },

    #[error(
        "pattern collision occurred: pattern = {pattern:?}, method = {}, owners = ({existing:?}, {owner:?})",
        .method.as_ref().map_or("*", Method::as_str)
    )]
    Collision {
        pattern: Box<str>,
        method: Option<Method>,
        existing: Box<str>,
        owner: Box<str>,
    },

    #[error("invalid router settings: {0}")]
    Settings(#[from] toml::de::Error),

    #[error("can not read router settings: {0}")]
    Io(#[from] std::io::Error),
}

/// A failure raised by a handler.
///
/// The kind selects the failure route. The status hint, when present,
/// overrides the kind's default status in [`Failure::status`].
pub struct Failure<K = Kind> {
    kind: K,
    status: Option<StatusCode>,
    message: Option<Cow<'static, str>>,
    cause: Option<BoxError>,
}

impl<K: FailureKind> Failure<K> {
    pub fn new(kind: K) -> Self {
        Self {
            kind,
            status: None,
            message: None,
            cause: None,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn kind(&self) -> K {
        self.kind
    }

    pub fn status_hint(&self) -> Option<StatusCode> {
        self.status
    }

    /// The status hint, or the kind's default status.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or_else(|| self.kind.status())
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

impl<K: FailureKind> From<K> for Failure<K> {
    fn from(kind: K) -> Self {
        Self::new(kind)
    }
}

impl<K: FailureKind> fmt::Debug for Failure<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("kind", &self.kind)
            .field("status", &self.status)
            .field("message", &self.message)
            .field("cause", &self.cause)
            .finish()
    }
}

impl<K: FailureKind> fmt::Display for Failure<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(ref msg) = self.message {
            write!(f, ": {}", msg)?;
        }
        if let Some(ref cause) = self.cause {
            write!(f, " (caused by: {})", cause)?;
        }
        Ok(())
    }
}

impl<K: FailureKind> StdError for Failure<K> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_deref().map(|e| e as &(dyn StdError + 'static))
    }
}
