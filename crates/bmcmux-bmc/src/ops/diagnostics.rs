//! POST codes and console screenshots

use async_trait::async_trait;

use crate::capability::capability;
use crate::context::Context;
use crate::dispatch::dispatch;
use crate::error::Result;
use crate::executor::{Execution, Executor, Operation, Outcome};
use crate::provider::RegisteredProvider;
use crate::types::{PostCode, Screenshot};

#[async_trait]
pub trait PostCodeGetter: Send + Sync {
    async fn post_code(&self, ctx: &Context) -> Result<PostCode>;
}

#[async_trait]
pub trait Screenshotter: Send + Sync {
    async fn screenshot(&self, ctx: &Context) -> Result<Screenshot>;
}

capability!(PostCodeGetter, as_post_code_getter);
capability!(Screenshotter, as_screenshotter);

pub const POST_CODE: Operation = Operation::new("post_code", "failed to get POST code");
pub const SCREENSHOT: Operation = Operation::new("screenshot", "failed to take screenshot");

pub async fn get_post_code(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
) -> Execution<PostCode> {
    executor
        .run(ctx, POST_CODE, dispatch::<dyn PostCodeGetter>(providers), |getter, ctx| async move {
            Outcome::from(getter.post_code(&ctx).await)
        })
        .await
}

pub async fn take_screenshot(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
) -> Execution<Screenshot> {
    executor
        .run(ctx, SCREENSHOT, dispatch::<dyn Screenshotter>(providers), |shooter, ctx| async move {
            Outcome::from(shooter.screenshot(&ctx).await)
        })
        .await
}
