//! BMC reset

use async_trait::async_trait;

use crate::capability::capability;
use crate::context::Context;
use crate::dispatch::dispatch;
use crate::error::Result;
use crate::executor::{Execution, Executor, Operation, Outcome};
use crate::provider::RegisteredProvider;
use crate::types::BmcResetType;

/// Restarts the management controller itself
///
/// The host is not power cycled. Connections held by other providers are
/// usually dropped by the reset.
#[async_trait]
pub trait BmcResetter: Send + Sync {
    async fn bmc_reset(&self, ctx: &Context, reset_type: BmcResetType) -> Result<bool>;
}

capability!(BmcResetter, as_bmc_resetter);

pub const BMC_RESET: Operation = Operation::new("bmc_reset", "failed to reset BMC");

pub async fn reset_bmc(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
    reset_type: BmcResetType,
) -> Execution<bool> {
    executor
        .run(ctx, BMC_RESET, dispatch::<dyn BmcResetter>(providers), |resetter, ctx| async move {
            Outcome::from_flag(resetter.bmc_reset(&ctx, reset_type).await)
        })
        .await
}
