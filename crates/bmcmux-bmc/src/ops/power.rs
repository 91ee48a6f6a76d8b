//! Power control

use async_trait::async_trait;

use crate::capability::capability;
use crate::context::Context;
use crate::dispatch::dispatch;
use crate::error::Result;
use crate::executor::{Execution, Executor, Operation, Outcome};
use crate::provider::RegisteredProvider;
use crate::types::{PowerAction, PowerState};

/// Changes the chassis power state
#[async_trait]
pub trait PowerSetter: Send + Sync {
    /// Apply `action`; `Ok(false)` means the BMC did not accept it
    async fn power_set(&self, ctx: &Context, action: PowerAction) -> Result<bool>;
}

/// Reads the chassis power state
#[async_trait]
pub trait PowerStateGetter: Send + Sync {
    async fn power_state_get(&self, ctx: &Context) -> Result<PowerState>;
}

capability!(PowerSetter, as_power_setter);
capability!(PowerStateGetter, as_power_state_getter);

pub const POWER_SET: Operation = Operation::new("power_set", "failed to set power state");
pub const POWER_STATE_GET: Operation = Operation::new("power_state_get", "failed to get power state");

/// Apply a power action through the first provider that accepts it
pub async fn set_power_state(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
    action: PowerAction,
) -> Execution<bool> {
    executor
        .run(ctx, POWER_SET, dispatch::<dyn PowerSetter>(providers), |setter, ctx| async move {
            Outcome::from_flag(setter.power_set(&ctx, action).await)
        })
        .await
}

/// Read the power state from the first provider that answers
pub async fn get_power_state(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
) -> Execution<PowerState> {
    executor
        .run(
            ctx,
            POWER_STATE_GET,
            dispatch::<dyn PowerStateGetter>(providers),
            |getter, ctx| async move { Outcome::from(getter.power_state_get(&ctx).await) },
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BmcError, ErrorKind};
    use crate::executor::AttemptTimeout;
    use crate::testing::{Behavior, ScriptedProvider};
    use std::time::Duration;

    fn setter(name: &str, behavior: Behavior) -> ScriptedProvider {
        ScriptedProvider::new(name).script::<dyn PowerSetter>(behavior)
    }

    #[tokio::test]
    async fn test_falls_back_after_error() {
        let a = setter("A", Behavior::Fail("boot device set failed".into()));
        let b = setter("B", Behavior::Succeed);
        let b_calls = b.calls();
        let providers = vec![RegisteredProvider::new(a), RegisteredProvider::new(b)];

        let execution = set_power_state(
            &Executor::new(),
            &Context::background(),
            &providers,
            PowerAction::Off,
        )
        .await;

        assert!(execution.result.unwrap());
        assert_eq!(execution.metadata.providers_attempted, vec!["A", "B"]);
        assert_eq!(execution.metadata.successful_provider.as_deref(), Some("B"));
        assert_eq!(b_calls.count("PowerSetter"), 1);
    }

    #[tokio::test]
    async fn test_later_providers_not_attempted_after_success() {
        let a = setter("A", Behavior::Succeed);
        let b = setter("B", Behavior::Succeed);
        let b_calls = b.calls();
        let providers = vec![RegisteredProvider::new(a), RegisteredProvider::new(b)];

        let execution = set_power_state(
            &Executor::new(),
            &Context::background(),
            &providers,
            PowerAction::On,
        )
        .await;

        assert_eq!(execution.metadata.providers_attempted, vec!["A"]);
        assert_eq!(b_calls.count("PowerSetter"), 0);
    }

    #[tokio::test]
    async fn test_attempt_timeout_reports_deadline() {
        let providers = vec![RegisteredProvider::new(setter(
            "slow",
            Behavior::Hang(Duration::from_secs(30)),
        ))];
        let executor =
            Executor::new().with_attempt_timeout(AttemptTimeout::Fixed(Duration::from_nanos(1)));

        let execution =
            set_power_state(&executor, &Context::background(), &providers, PowerAction::Cycle).await;

        assert_eq!(execution.metadata.providers_attempted, vec!["slow"]);
        let err = execution.result.unwrap_err();
        assert!(err.to_string().contains("context deadline exceeded"));
        assert!(err.is(ErrorKind::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_no_power_setters() {
        let providers = vec![
            RegisteredProvider::new(ScriptedProvider::new("reader").script::<dyn PowerStateGetter>(Behavior::Succeed)),
        ];

        let execution = set_power_state(
            &Executor::new(),
            &Context::background(),
            &providers,
            PowerAction::On,
        )
        .await;

        let err = execution.result.unwrap_err();
        assert!(matches!(err.errors()[0], BmcError::NotImplemented { capability: "PowerSetter", .. }));
        assert_eq!(
            err.summary().map(|e| e.to_string()),
            Some("no PowerSetter implementations found".to_string())
        );
        assert!(execution.metadata.providers_attempted.is_empty());
    }

    #[tokio::test]
    async fn test_get_power_state() {
        let providers = vec![RegisteredProvider::new(
            ScriptedProvider::new("ipmi")
                .script::<dyn PowerStateGetter>(Behavior::Succeed)
                .with_power_state(PowerState::Off),
        )];

        let execution =
            get_power_state(&Executor::new(), &Context::background(), &providers).await;

        assert_eq!(execution.result.unwrap(), PowerState::Off);
    }
}
