//! System event log

use async_trait::async_trait;

use crate::capability::capability;
use crate::context::Context;
use crate::dispatch::dispatch;
use crate::error::Result;
use crate::executor::{Execution, Executor, Operation, Outcome};
use crate::provider::RegisteredProvider;
use crate::types::SelEntry;

#[async_trait]
pub trait SystemEventLogClearer: Send + Sync {
    async fn clear_system_event_log(&self, ctx: &Context) -> Result<()>;
}

#[async_trait]
pub trait SystemEventLogGetter: Send + Sync {
    async fn get_system_event_log(&self, ctx: &Context) -> Result<Vec<SelEntry>>;
}

capability!(SystemEventLogClearer, as_system_event_log_clearer);
capability!(SystemEventLogGetter, as_system_event_log_getter);

pub const SEL_CLEAR: Operation = Operation::new("sel_clear", "failed to clear system event log");
pub const SEL_GET: Operation = Operation::new("sel_get", "failed to get system event log");

pub async fn clear_system_event_log(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
) -> Execution<()> {
    executor
        .run(
            ctx,
            SEL_CLEAR,
            dispatch::<dyn SystemEventLogClearer>(providers),
            |clearer, ctx| async move { Outcome::from(clearer.clear_system_event_log(&ctx).await) },
        )
        .await
}

pub async fn get_system_event_log(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
) -> Execution<Vec<SelEntry>> {
    executor
        .run(
            ctx,
            SEL_GET,
            dispatch::<dyn SystemEventLogGetter>(providers),
            |getter, ctx| async move { Outcome::from(getter.get_system_event_log(&ctx).await) },
        )
        .await
}
