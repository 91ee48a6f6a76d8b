//! Connection lifecycle
//!
//! Opening and closing differ from every other operation: instead of
//! stopping at the first success, every provider is tried once and the
//! ones that worked are kept. [`open_all`] returns that live subset as the
//! working set for the rest of the session, so a provider whose connection
//! failed is never handed to a later operation.

use std::future::Future;

use async_trait::async_trait;
use tracing::{debug, info, warn, Instrument};

use crate::capability::{capability, Capability};
use crate::context::Context;
use crate::error::{BmcError, MultiError, Result};
use crate::executor::{Execution, Executor, Operation, Outcome};
use crate::metadata::Metadata;
use crate::provider::RegisteredProvider;

/// Opens a provider's session with the BMC
#[async_trait]
pub trait Opener: Send + Sync {
    async fn open(&self, ctx: &Context) -> Result<()>;
}

/// Closes a provider's session with the BMC
#[async_trait]
pub trait Closer: Send + Sync {
    async fn close(&self, ctx: &Context) -> Result<()>;
}

capability!(Opener, as_opener);
capability!(Closer, as_closer);

pub const OPEN: Operation = Operation::new("open", "failed to open connection");
pub const CLOSE: Operation = Operation::new("close", "failed to close connection");

/// Open every provider, returning the ones that opened
///
/// Fails only when no provider opened. Individual failures are kept in
/// `failed_provider_detail` either way.
pub async fn open_all(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
) -> Execution<Vec<RegisteredProvider>> {
    let swept = sweep::<dyn Opener, _, _>(executor, ctx, OPEN, providers, |opener, ctx| async move {
        Outcome::from(opener.open(&ctx).await)
    })
    .instrument(executor.span().clone())
    .await;

    let Sweep {
        succeeded,
        mut metadata,
        errors,
    } = match swept {
        Ok(sweep) => sweep,
        Err(err) => return Execution::failed(err),
    };

    for registered in &succeeded {
        metadata.record_open(registered.name());
    }
    executor.span().in_scope(|| metadata.trace(OPEN.name));

    if succeeded.is_empty() {
        return Execution {
            result: Err(errors.with(BmcError::Exhausted(OPEN.failure.to_string()))),
            metadata,
        };
    }

    Execution {
        result: Ok(succeeded.into_iter().cloned().collect()),
        metadata,
    }
}

/// Close every provider in the working set
///
/// Succeeds when at least one connection closed.
pub async fn close_all(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
) -> Execution<()> {
    let swept = sweep::<dyn Closer, _, _>(executor, ctx, CLOSE, providers, |closer, ctx| async move {
        Outcome::from(closer.close(&ctx).await)
    })
    .instrument(executor.span().clone())
    .await;

    let Sweep {
        succeeded,
        mut metadata,
        errors,
    } = match swept {
        Ok(sweep) => sweep,
        Err(err) => return Execution::failed(err),
    };

    for registered in &succeeded {
        metadata.record_close(registered.name());
    }
    executor.span().in_scope(|| metadata.trace(CLOSE.name));

    let result = if succeeded.is_empty() {
        Err(errors.with(BmcError::Exhausted(CLOSE.failure.to_string())))
    } else {
        Ok(())
    };
    Execution { result, metadata }
}

struct Sweep<'a> {
    succeeded: Vec<&'a RegisteredProvider>,
    metadata: Metadata,
    errors: MultiError,
}

/// Attempt `invoke` once on every provider implementing `C`, in order
///
/// Unlike [`crate::dispatch::dispatch`], providers without `C` stay in the
/// aggregate as `NotImplemented` entries even when others matched, so a
/// failed open lists every provider that was skipped.
async fn sweep<'a, C, F, Fut>(
    executor: &Executor,
    ctx: &Context,
    op: Operation,
    providers: &'a [RegisteredProvider],
    mut invoke: F,
) -> std::result::Result<Sweep<'a>, MultiError>
where
    C: Capability + ?Sized,
    F: FnMut(C::Handle<'a>, Context) -> Fut,
    Fut: Future<Output = Outcome<()>>,
{
    let mut sweep = Sweep {
        succeeded: Vec::new(),
        metadata: Metadata::new(),
        errors: MultiError::new(),
    };
    let mut matched = false;

    for registered in providers {
        let Some(handle) = C::resolve(registered.provider()) else {
            sweep.errors.push(BmcError::NotImplemented {
                capability: C::NAME,
                type_name: registered.type_name().to_string(),
            });
            continue;
        };
        matched = true;

        if let Some(e) = ctx.err() {
            warn!(operation = op.name, error = %e, "Context ended, not attempting remaining providers");
            sweep.errors.push(BmcError::Context(e));
            break;
        }

        let name = registered.name();
        sweep.metadata.record_attempt(name);
        debug!(provider = %name, operation = op.name, "Attempting provider");

        match executor.attempt(ctx, handle, &mut invoke).await {
            Outcome::Success(()) => {
                info!(provider = %name, operation = op.name, "Provider succeeded");
                sweep.metadata.record_success(name);
                sweep.succeeded.push(registered);
            }
            Outcome::SoftFailure(reason) => {
                let reason = reason.unwrap_or_else(|| op.failure.to_string());
                warn!(provider = %name, operation = op.name, reason = %reason, "Provider did not succeed");
                sweep.metadata.record_failure(name, reason.clone());
                sweep
                    .errors
                    .push(BmcError::for_provider(name, BmcError::Unsuccessful(reason)));
            }
            Outcome::HardError(e) => {
                warn!(provider = %name, operation = op.name, error = %e, "Provider failed");
                sweep.metadata.record_failure(name, e.to_string());
                sweep.errors.push(BmcError::for_provider(name, e));
            }
        }
    }

    if !matched {
        return Err(sweep
            .errors
            .with(BmcError::NoImplementations { capability: C::NAME }));
    }
    Ok(sweep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{Behavior, ScriptedProvider};

    fn conn(name: &str, open: Behavior, close: Behavior) -> RegisteredProvider {
        RegisteredProvider::new(
            ScriptedProvider::new(name)
                .script::<dyn Opener>(open)
                .script::<dyn Closer>(close),
        )
    }

    #[tokio::test]
    async fn test_open_all_keeps_live_subset() {
        let providers = vec![
            conn("a", Behavior::Fail("refused".into()), Behavior::Succeed),
            conn("b", Behavior::Succeed, Behavior::Succeed),
        ];

        let execution = open_all(&Executor::new(), &Context::background(), &providers).await;

        let live = execution.result.unwrap();
        let names: Vec<&str> = live.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["b"]);
        assert_eq!(execution.metadata.successful_open_conns, vec!["b"]);
        assert_eq!(execution.metadata.providers_attempted, vec!["a", "b"]);
        assert!(execution.metadata.failed_provider_detail.contains_key("a"));
    }

    #[tokio::test]
    async fn test_open_all_tries_every_provider() {
        let providers = vec![
            conn("a", Behavior::Succeed, Behavior::Succeed),
            conn("b", Behavior::Succeed, Behavior::Succeed),
            conn("c", Behavior::Succeed, Behavior::Succeed),
        ];

        let execution = open_all(&Executor::new(), &Context::background(), &providers).await;

        assert_eq!(execution.result.unwrap().len(), 3);
        assert_eq!(execution.metadata.successful_open_conns, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_open_all_fails_when_nothing_opens() {
        let providers = vec![
            conn("a", Behavior::Fail("refused".into()), Behavior::Succeed),
            conn("b", Behavior::Fail("auth".into()), Behavior::Succeed),
        ];

        let execution = open_all(&Executor::new(), &Context::background(), &providers).await;

        let err = execution.result.unwrap_err();
        assert_eq!(err.len(), 3);
        assert_eq!(
            err.summary().map(|e| e.to_string()),
            Some("failed to open connection".to_string())
        );
        assert!(execution.metadata.successful_open_conns.is_empty());
    }

    #[tokio::test]
    async fn test_open_all_without_openers() {
        let providers = vec![RegisteredProvider::new(ScriptedProvider::new("plain"))];

        let execution = open_all(&Executor::new(), &Context::background(), &providers).await;

        let err = execution.result.unwrap_err();
        assert!(err.is(ErrorKind::NoCompatibleProvider));
        assert!(err.to_string().ends_with("no Opener implementations found"));
    }

    #[tokio::test]
    async fn test_open_all_skips_non_openers() {
        let providers = vec![
            RegisteredProvider::new(ScriptedProvider::new("plain")),
            conn("b", Behavior::Succeed, Behavior::Succeed),
        ];

        let execution = open_all(&Executor::new(), &Context::background(), &providers).await;

        let live = execution.result.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].name(), "b");
        assert_eq!(execution.metadata.providers_attempted, vec!["b"]);
    }

    #[tokio::test]
    async fn test_open_all_cancelled() {
        let providers = vec![conn("a", Behavior::Succeed, Behavior::Succeed)];
        let ctx = Context::background();
        ctx.cancel();

        let execution = open_all(&Executor::new(), &ctx, &providers).await;

        assert!(execution.metadata.providers_attempted.is_empty());
        assert!(execution.result.unwrap_err().is(ErrorKind::ContextCanceled));
    }

    #[tokio::test]
    async fn test_close_all_succeeds_with_one_close() {
        let providers = vec![
            conn("a", Behavior::Succeed, Behavior::Fail("reset by peer".into())),
            conn("b", Behavior::Succeed, Behavior::Succeed),
        ];

        let execution = close_all(&Executor::new(), &Context::background(), &providers).await;

        assert!(execution.is_ok());
        assert_eq!(execution.metadata.successful_close_conns, vec!["b"]);
        assert_eq!(
            execution.metadata.failed_provider_detail.get("a").map(String::as_str),
            Some("command failed: reset by peer")
        );
    }

    #[tokio::test]
    async fn test_close_all_fails_when_nothing_closes() {
        let providers = vec![conn("a", Behavior::Succeed, Behavior::Fail("gone".into()))];

        let execution = close_all(&Executor::new(), &Context::background(), &providers).await;

        assert_eq!(
            execution.result.unwrap_err().to_string(),
            "provider: a: command failed: gone; failed to close connection"
        );
    }
}
