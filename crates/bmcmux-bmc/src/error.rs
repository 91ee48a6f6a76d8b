//! Error types for BMC operations
//!
//! [`BmcError`] is what a single provider (or the framework itself) reports.
//! [`MultiError`] is the ordered aggregate handed back to callers when no
//! provider satisfied a request.

use std::fmt;

use thiserror::Error;

use crate::context::ContextError;

/// Error type for BMC operations
#[derive(Debug, Error)]
pub enum BmcError {
    /// Connection failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Command failed
    #[error("command failed: {0}")]
    CommandFailed(String),

    /// Operation timed out inside the provider
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// Unsupported operation
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Network error
    #[error("network error: {0}")]
    NetworkError(String),

    /// The firmware task id is not known to the provider
    #[error("firmware install task not found: {0}")]
    TaskNotFound(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Caller cancellation or an expired deadline
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The provider reported "did not succeed" without an error value
    #[error("{0}")]
    Unsuccessful(String),

    /// A failure attributed to one provider
    #[error("provider: {provider}: {source}")]
    Provider {
        provider: String,
        #[source]
        source: Box<BmcError>,
    },

    /// A provider value that does not implement the requested capability
    #[error("not a {capability} implementation: {type_name}")]
    NotImplemented {
        capability: &'static str,
        type_name: String,
    },

    /// No provider implements the requested capability
    #[error("no {capability} implementations found")]
    NoImplementations { capability: &'static str },

    /// Every candidate was attempted and none succeeded
    #[error("{0}")]
    Exhausted(String),
}

/// Result type for BMC operations
pub type Result<T> = std::result::Result<T, BmcError>;

/// Classification of failures, usable without string matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller's context was cancelled
    ContextCanceled,
    /// A deadline passed (caller deadline or per-attempt timeout)
    DeadlineExceeded,
    /// Dispatch found no matching provider
    NoCompatibleProvider,
    /// A provider returned "not ok" without an error
    ProviderSoftFailure,
    /// A provider returned an error
    ProviderHardError,
    /// Every candidate was tried and none succeeded
    AggregateExhausted,
}

impl BmcError {
    /// Wrap an error with the name of the provider that produced it
    pub fn for_provider(provider: impl Into<String>, source: BmcError) -> Self {
        BmcError::Provider {
            provider: provider.into(),
            source: Box::new(source),
        }
    }

    /// Top-level kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            BmcError::Context(ContextError::Canceled) => ErrorKind::ContextCanceled,
            BmcError::Context(ContextError::DeadlineExceeded) => ErrorKind::DeadlineExceeded,
            BmcError::NotImplemented { .. } | BmcError::NoImplementations { .. } => {
                ErrorKind::NoCompatibleProvider
            }
            BmcError::Unsuccessful(_) => ErrorKind::ProviderSoftFailure,
            BmcError::Exhausted(_) => ErrorKind::AggregateExhausted,
            BmcError::Provider { source, .. } => match source.kind() {
                ErrorKind::ProviderSoftFailure => ErrorKind::ProviderSoftFailure,
                _ => ErrorKind::ProviderHardError,
            },
            _ => ErrorKind::ProviderHardError,
        }
    }

    /// Whether this error, or any error it wraps, is of `kind`
    pub fn is(&self, kind: ErrorKind) -> bool {
        if self.kind() == kind {
            return true;
        }
        match self {
            BmcError::Provider { source, .. } => source.is(kind),
            _ => false,
        }
    }

    /// Name of the provider this error is attributed to
    pub fn provider(&self) -> Option<&str> {
        match self {
            BmcError::Provider { provider, .. } => Some(provider),
            _ => None,
        }
    }
}

/// Ordered aggregate of failures
///
/// Entries keep attempt order. The last entry is usually the summary
/// ("failed to set power state", "no PowerSetter implementations found").
#[derive(Debug, Default)]
pub struct MultiError {
    errors: Vec<BmcError>,
}

impl MultiError {
    /// Create an empty aggregate
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error
    pub fn push(&mut self, err: BmcError) {
        self.errors.push(err);
    }

    /// Append an error and return the aggregate
    pub fn with(mut self, err: BmcError) -> Self {
        self.push(err);
        self
    }

    /// All errors in the order they were recorded
    pub fn errors(&self) -> &[BmcError] {
        &self.errors
    }

    /// Consume the aggregate, returning its errors
    pub fn into_errors(self) -> Vec<BmcError> {
        self.errors
    }

    /// Number of recorded errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether any entry (or a wrapped source) is of `kind`
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.is(kind))
    }

    /// Errors attributed to `provider`
    pub fn for_provider<'a>(&'a self, provider: &'a str) -> impl Iterator<Item = &'a BmcError> {
        self.errors
            .iter()
            .filter(move |e| e.provider() == Some(provider))
    }

    /// The trailing entry, normally the summary message
    pub fn summary(&self) -> Option<&BmcError> {
        self.errors.last()
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}

impl From<BmcError> for MultiError {
    fn from(err: BmcError) -> Self {
        Self { errors: vec![err] }
    }
}

impl Extend<BmcError> for MultiError {
    fn extend<I: IntoIterator<Item = BmcError>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}
