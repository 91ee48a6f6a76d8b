//! Non-maskable interrupt

use async_trait::async_trait;

use crate::capability::capability;
use crate::context::Context;
use crate::dispatch::dispatch;
use crate::error::Result;
use crate::executor::{Execution, Executor, Operation, Outcome};
use crate::provider::RegisteredProvider;

/// Sends an NMI to the host, typically to trigger a crash dump
#[async_trait]
pub trait NmiSender: Send + Sync {
    async fn send_nmi(&self, ctx: &Context) -> Result<()>;
}

capability!(NmiSender, as_nmi_sender);

pub const SEND_NMI: Operation = Operation::new("send_nmi", "failed to send NMI");

pub async fn send_nmi(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
) -> Execution<()> {
    executor
        .run(ctx, SEND_NMI, dispatch::<dyn NmiSender>(providers), |sender, ctx| async move {
            Outcome::from(sender.send_nmi(&ctx).await)
        })
        .await
}
