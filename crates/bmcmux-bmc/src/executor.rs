//! Multi-provider executor
//!
//! The [`Executor`] runs one operation against an ordered list of
//! candidates: it checks the caller's context before every attempt, invokes
//! the candidate, classifies the [`Outcome`] and stops at the first success.
//! When every candidate has failed the result is a [`MultiError`] listing
//! each failure in attempt order, followed by the operation's summary
//! message.
//!
//! # Example
//!
//! ```ignore
//! use bmcmux_bmc::{dispatch, Context, Executor, Outcome};
//! use bmcmux_bmc::ops::power::{PowerSetter, POWER_SET};
//!
//! let executor = Executor::for_host("10.0.0.5");
//! let execution = executor
//!     .run(&ctx, POWER_SET, dispatch::<dyn PowerSetter>(&providers), |p, ctx| async move {
//!         Outcome::from_flag(p.power_set(&ctx, PowerAction::Off).await)
//!     })
//!     .await;
//! ```

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, info_span, warn, Instrument, Span};

use crate::capability::Capability;
use crate::context::{Context, ContextError};
use crate::dispatch::{Candidate, Dispatched};
use crate::error::{BmcError, MultiError, Result};
use crate::metadata::Metadata;

/// Default per-attempt timeout
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// How long a single provider attempt may run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptTimeout {
    /// Attempts run under the caller's context unchanged
    Inherit,
    /// Each attempt gets its own deadline, never later than the caller's
    Fixed(Duration),
}

impl Default for AttemptTimeout {
    fn default() -> Self {
        AttemptTimeout::Fixed(DEFAULT_ATTEMPT_TIMEOUT)
    }
}

/// Name and summary message of one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    /// Short operation name used in logs ("power_set")
    pub name: &'static str,
    /// Summary appended when every candidate failed ("failed to set power state")
    pub failure: &'static str,
}

impl Operation {
    pub const fn new(name: &'static str, failure: &'static str) -> Self {
        Self { name, failure }
    }
}

/// Classified result of one provider attempt
#[derive(Debug)]
pub enum Outcome<T> {
    /// The provider satisfied the request
    Success(T),
    /// The provider reported "did not succeed" without an error
    SoftFailure(Option<String>),
    /// The provider returned an error
    HardError(BmcError),
}

/// `Unsuccessful` errors count as soft failures, everything else is hard
impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(BmcError::Unsuccessful(reason)) => Outcome::SoftFailure(Some(reason)),
            Err(e) => Outcome::HardError(e),
        }
    }
}

impl Outcome<bool> {
    /// `Ok(true)` succeeds, `Ok(false)` is a soft failure
    pub fn from_flag(result: Result<bool>) -> Self {
        match result {
            Ok(false) => Outcome::SoftFailure(None),
            other => Outcome::from(other),
        }
    }
}

/// Result of a multi-provider call together with its metadata
#[derive(Debug)]
pub struct Execution<T> {
    pub result: std::result::Result<T, MultiError>,
    pub metadata: Metadata,
}

impl<T> Execution<T> {
    /// A call that failed before any provider was attempted
    pub fn failed(err: MultiError) -> Self {
        Self {
            result: Err(err),
            metadata: Metadata::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Drop the metadata and keep the result
    pub fn into_result(self) -> std::result::Result<T, MultiError> {
        self.result
    }

    /// Map the successful value, keeping the metadata
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Execution<U> {
        Execution {
            result: self.result.map(f),
            metadata: self.metadata,
        }
    }
}

/// Runs operations against ordered candidates
#[derive(Clone)]
pub struct Executor {
    attempt_timeout: AttemptTimeout,
    span: Span,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    /// Executor logging into the current span
    pub fn new() -> Self {
        Self {
            attempt_timeout: AttemptTimeout::default(),
            span: Span::current(),
        }
    }

    /// Executor logging into a `bmc` span tagged with `host`
    pub fn for_host(host: &str) -> Self {
        Self::new().with_span(info_span!("bmc", host = %host))
    }

    /// Set the per-attempt timeout policy
    pub fn with_attempt_timeout(mut self, attempt_timeout: AttemptTimeout) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// Set the span attempts are logged in
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn attempt_timeout(&self) -> AttemptTimeout {
        self.attempt_timeout
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Context handed to one attempt
    pub fn attempt_context(&self, ctx: &Context) -> Context {
        match self.attempt_timeout {
            AttemptTimeout::Inherit => ctx.clone(),
            AttemptTimeout::Fixed(timeout) => ctx.with_timeout(timeout),
        }
    }

    /// Run `op` against the dispatched candidates, stopping at the first success
    ///
    /// A dispatch error is returned as-is with empty metadata; no candidate
    /// is attempted.
    pub async fn run<'a, C, T, F, Fut>(
        &self,
        ctx: &Context,
        op: Operation,
        dispatched: Dispatched<'a, C>,
        invoke: F,
    ) -> Execution<T>
    where
        C: Capability + ?Sized,
        F: FnMut(C::Handle<'a>, Context) -> Fut,
        Fut: Future<Output = Outcome<T>>,
    {
        let candidates = match dispatched {
            Ok(candidates) => candidates,
            Err(err) => {
                self.span
                    .in_scope(|| warn!(operation = op.name, error = %err, "No compatible provider"));
                return Execution::failed(err);
            }
        };

        let execution = self
            .attempt_all(ctx, op, candidates, invoke)
            .instrument(self.span.clone())
            .await;

        self.span.in_scope(|| execution.metadata.trace(op.name));
        execution
    }

    async fn attempt_all<'a, C, T, F, Fut>(
        &self,
        ctx: &Context,
        op: Operation,
        candidates: Vec<Candidate<'a, C>>,
        mut invoke: F,
    ) -> Execution<T>
    where
        C: Capability + ?Sized,
        F: FnMut(C::Handle<'a>, Context) -> Fut,
        Fut: Future<Output = Outcome<T>>,
    {
        let mut metadata = Metadata::new();
        let mut errors = MultiError::new();

        for candidate in candidates {
            if let Some(e) = ctx.err() {
                warn!(operation = op.name, error = %e, "Context ended, not attempting remaining providers");
                errors.push(BmcError::Context(e));
                break;
            }

            let name = candidate.name;
            metadata.record_attempt(name);
            debug!(provider = %name, operation = op.name, "Attempting provider");

            match self.attempt(ctx, candidate.handle, &mut invoke).await {
                Outcome::Success(value) => {
                    info!(provider = %name, operation = op.name, "Provider succeeded");
                    metadata.record_success(name);
                    return Execution {
                        result: Ok(value),
                        metadata,
                    };
                }
                Outcome::SoftFailure(reason) => {
                    let reason = reason.unwrap_or_else(|| op.failure.to_string());
                    warn!(provider = %name, operation = op.name, reason = %reason, "Provider did not succeed");
                    metadata.record_failure(name, reason.clone());
                    errors.push(BmcError::for_provider(name, BmcError::Unsuccessful(reason)));
                }
                Outcome::HardError(e) => {
                    warn!(provider = %name, operation = op.name, error = %e, "Provider failed");
                    metadata.record_failure(name, e.to_string());
                    errors.push(BmcError::for_provider(name, e));
                }
            }
        }

        errors.push(BmcError::Exhausted(op.failure.to_string()));
        Execution {
            result: Err(errors),
            metadata,
        }
    }

    pub(crate) async fn attempt<H, T, F, Fut>(&self, ctx: &Context, handle: H, invoke: &mut F) -> Outcome<T>
    where
        F: FnMut(H, Context) -> Fut,
        Fut: Future<Output = Outcome<T>>,
    {
        let attempt_ctx = self.attempt_context(ctx);
        let deadline = match self.attempt_timeout {
            AttemptTimeout::Fixed(_) => attempt_ctx.deadline(),
            AttemptTimeout::Inherit => None,
        };

        let fut = invoke(handle, attempt_ctx);
        match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, fut).await {
                Ok(outcome) => outcome,
                Err(_) => Outcome::HardError(BmcError::Context(ContextError::DeadlineExceeded)),
            },
            None => fut.await,
        }
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("attempt_timeout", &self.attempt_timeout)
            .finish_non_exhaustive()
    }
}
