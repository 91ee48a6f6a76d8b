//! Hardware inventory

use async_trait::async_trait;

use crate::capability::capability;
use crate::context::Context;
use crate::dispatch::dispatch;
use crate::error::Result;
use crate::executor::{Execution, Executor, Operation, Outcome};
use crate::provider::RegisteredProvider;
use crate::types::Device;

#[async_trait]
pub trait InventoryGetter: Send + Sync {
    async fn inventory(&self, ctx: &Context) -> Result<Device>;
}

capability!(InventoryGetter, as_inventory_getter);

pub const INVENTORY: Operation = Operation::new("inventory", "failed to get inventory");

pub async fn get_inventory(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
) -> Execution<Device> {
    executor
        .run(ctx, INVENTORY, dispatch::<dyn InventoryGetter>(providers), |getter, ctx| async move {
            Outcome::from(getter.inventory(&ctx).await)
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Behavior, ScriptedProvider};

    #[tokio::test]
    async fn test_get_inventory() {
        let providers = vec![
            RegisteredProvider::new(
                ScriptedProvider::new("slow").script::<dyn InventoryGetter>(Behavior::Fail("timeout".into())),
            ),
            RegisteredProvider::new(ScriptedProvider::new("fast").script::<dyn InventoryGetter>(Behavior::Succeed)),
        ];

        let execution = get_inventory(&Executor::new(), &Context::background(), &providers).await;

        let device = execution.result.unwrap();
        assert_eq!(device.vendor, "Scripted");
        assert!(!device.components.is_empty());
        assert_eq!(execution.metadata.successful_provider.as_deref(), Some("fast"));
    }
}
