//! Serial-over-LAN

use async_trait::async_trait;

use crate::capability::capability;
use crate::context::Context;
use crate::dispatch::dispatch;
use crate::error::Result;
use crate::executor::{Execution, Executor, Operation, Outcome};
use crate::provider::RegisteredProvider;

/// Terminates an active SOL session, freeing the console for a new one
#[async_trait]
pub trait SolDeactivator: Send + Sync {
    async fn deactivate_sol(&self, ctx: &Context) -> Result<()>;
}

capability!(SolDeactivator, as_sol_deactivator);

pub const SOL_DEACTIVATE: Operation = Operation::new("sol_deactivate", "failed to deactivate SOL");

pub async fn deactivate_sol(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
) -> Execution<()> {
    executor
        .run(
            ctx,
            SOL_DEACTIVATE,
            dispatch::<dyn SolDeactivator>(providers),
            |deactivator, ctx| async move { Outcome::from(deactivator.deactivate_sol(&ctx).await) },
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Behavior, ScriptedProvider};

    #[tokio::test]
    async fn test_deactivate_sol_all_fail() {
        let providers = vec![RegisteredProvider::new(
            ScriptedProvider::new("ipmitool")
                .script::<dyn SolDeactivator>(Behavior::Fail("no active session".into())),
        )];

        let execution = deactivate_sol(&Executor::new(), &Context::background(), &providers).await;

        assert_eq!(
            execution.result.unwrap_err().to_string(),
            "provider: ipmitool: command failed: no active session; failed to deactivate SOL"
        );
    }
}
