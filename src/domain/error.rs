use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A failure reported by XAPI itself: an error code plus its parameters,
/// e.g. `HANDLE_INVALID [VM, OpaqueRef:...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XapiFailure {
    pub code: String,
    pub params: Vec<String>,
}

impl XapiFailure {
    pub fn new(code: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            code: code.into(),
            params,
        }
    }

    pub fn is_authentication_failure(&self) -> bool {
        self.code == "SESSION_AUTHENTICATION_FAILED"
    }
}

impl fmt::Display for XapiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{} [{}]", self.code, self.params.join(", "))
        }
    }
}

impl std::error::Error for XapiFailure {}

/// xentools unified error type
#[derive(Error, Debug)]
pub enum XenError {
    #[error("Could not connect to XenServer: {message}")]
    Connection { message: String },

    #[error("Could not connect to XenServer: authentication failed: {message}")]
    Authentication { message: String },

    #[error("{0}")]
    Api(#[from] XapiFailure),

    #[error("No VM named '{name}'")]
    VmNotFound { name: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Cannot create cache directory {}: {source}", path.display())]
    CacheDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Output error: {0}")]
    Output(String),
}

impl XenError {
    /// True for failures that happen before a session exists.
    pub fn is_session_failure(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Authentication { .. })
    }
}

pub type XenResult<T> = Result<T, XenError>;
