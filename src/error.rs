use crate::types::TypeMismatch;
use serde::{Deserialize, Serialize};
use std::{error::Error as StdError, fmt};
use thiserror::Error;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure an endpoint, codec, or transport can produce.
///
/// Adapters never translate an error: whatever a wrapped callable returns is
/// handed back as the same value. The only error they raise themselves is
/// [`Error::TypeMismatch`].
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatch),

    #[error("context canceled")]
    Canceled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("codec: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("transport: {0}")]
    Transport(#[source] BoxError),

    #[error("remote: {0}")]
    Remote(RemoteError),

    #[error(transparent)]
    Endpoint(BoxError),
}

impl Error {
    /// Wraps an application error so it can travel through endpoints.
    pub fn new<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::Endpoint(err.into())
    }

    pub fn transport<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::Transport(err.into())
    }

    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Error::TypeMismatch(_))
    }

    pub fn is_context_error(&self) -> bool {
        matches!(self, Error::Canceled | Error::DeadlineExceeded)
    }

    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            Error::Remote(remote) => Some(remote),
            _ => None,
        }
    }

    /// Looks through [`Error::Endpoint`] and [`Error::Transport`] for an `E`.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        match self {
            Error::Endpoint(inner) | Error::Transport(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// Numeric error codes shared by every transport. The first five are the
/// JSON-RPC 2.0 codes; the rest sit in its implementation-defined range.
pub mod code {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    pub const TYPE_MISMATCH: i64 = -32001;
    pub const CANCELED: i64 = -32002;
    pub const DEADLINE_EXCEEDED: i64 = -32003;
}

/// An error as it crosses the wire.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RemoteError {
    pub code: i64,
    pub message: String,
}

impl RemoteError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Renders a local error. Type mismatches and context errors keep their
    /// own codes so the other side can tell them apart.
    pub fn from_error(err: &Error) -> Self {
        let code = match err {
            Error::TypeMismatch(_) => code::TYPE_MISMATCH,
            Error::Canceled => code::CANCELED,
            Error::DeadlineExceeded => code::DEADLINE_EXCEEDED,
            Error::Remote(remote) => return remote.clone(),
            _ => code::INTERNAL_ERROR,
        };
        Self::new(code, err.to_string())
    }

    pub fn is_context_error(&self) -> bool {
        matches!(self.code, code::CANCELED | code::DEADLINE_EXCEEDED)
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl StdError for RemoteError {}

/// Context errors come back as the local kinds so they can be matched the
/// same way on both sides of a transport.
impl From<RemoteError> for Error {
    fn from(remote: RemoteError) -> Self {
        match remote.code {
            code::CANCELED => Error::Canceled,
            code::DEADLINE_EXCEEDED => Error::DeadlineExceeded,
            _ => Error::Remote(remote),
        }
    }
}
