//! BIOS configuration

use async_trait::async_trait;

use crate::capability::capability;
use crate::context::Context;
use crate::dispatch::dispatch;
use crate::error::Result;
use crate::executor::{Execution, Executor, Operation, Outcome};
use crate::provider::RegisteredProvider;
use crate::types::BiosConfiguration;

#[async_trait]
pub trait BiosConfigurationGetter: Send + Sync {
    async fn get_bios_configuration(&self, ctx: &Context) -> Result<BiosConfiguration>;
}

#[async_trait]
pub trait BiosConfigurationSetter: Send + Sync {
    /// Apply the given attributes; attributes not listed are left alone
    async fn set_bios_configuration(&self, ctx: &Context, config: &BiosConfiguration) -> Result<()>;
}

/// Restores BIOS defaults
#[async_trait]
pub trait BiosConfigurationResetter: Send + Sync {
    async fn reset_bios_configuration(&self, ctx: &Context) -> Result<()>;
}

capability!(BiosConfigurationGetter, as_bios_configuration_getter);
capability!(BiosConfigurationSetter, as_bios_configuration_setter);
capability!(BiosConfigurationResetter, as_bios_configuration_resetter);

pub const BIOS_CONFIGURATION_GET: Operation =
    Operation::new("bios_configuration_get", "failed to get BIOS configuration");
pub const BIOS_CONFIGURATION_SET: Operation =
    Operation::new("bios_configuration_set", "failed to set BIOS configuration");
pub const BIOS_CONFIGURATION_RESET: Operation =
    Operation::new("bios_configuration_reset", "failed to reset BIOS configuration");

pub async fn get_bios_configuration(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
) -> Execution<BiosConfiguration> {
    executor
        .run(
            ctx,
            BIOS_CONFIGURATION_GET,
            dispatch::<dyn BiosConfigurationGetter>(providers),
            |getter, ctx| async move { Outcome::from(getter.get_bios_configuration(&ctx).await) },
        )
        .await
}

pub async fn set_bios_configuration(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
    config: &BiosConfiguration,
) -> Execution<()> {
    executor
        .run(
            ctx,
            BIOS_CONFIGURATION_SET,
            dispatch::<dyn BiosConfigurationSetter>(providers),
            |setter, ctx| async move {
                Outcome::from(setter.set_bios_configuration(&ctx, config).await)
            },
        )
        .await
}

pub async fn reset_bios_configuration(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
) -> Execution<()> {
    executor
        .run(
            ctx,
            BIOS_CONFIGURATION_RESET,
            dispatch::<dyn BiosConfigurationResetter>(providers),
            |resetter, ctx| async move {
                Outcome::from(resetter.reset_bios_configuration(&ctx).await)
            },
        )
        .await
}
