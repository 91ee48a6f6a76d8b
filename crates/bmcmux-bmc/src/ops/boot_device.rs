//! Boot device selection

use async_trait::async_trait;

use crate::capability::capability;
use crate::context::Context;
use crate::dispatch::dispatch;
use crate::error::Result;
use crate::executor::{Execution, Executor, Operation, Outcome};
use crate::provider::RegisteredProvider;
use crate::types::{BootDevice, BootDeviceOverride};

/// Sets the next (or persistent) boot device
#[async_trait]
pub trait BootDeviceSetter: Send + Sync {
    /// `persistent` keeps the override across boots; `efi_boot` requests UEFI boot
    async fn boot_device_set(
        &self,
        ctx: &Context,
        device: BootDevice,
        persistent: bool,
        efi_boot: bool,
    ) -> Result<bool>;
}

/// Reads the current boot override
#[async_trait]
pub trait BootDeviceOverrideGetter: Send + Sync {
    async fn boot_device_override_get(&self, ctx: &Context) -> Result<BootDeviceOverride>;
}

capability!(BootDeviceSetter, as_boot_device_setter);
capability!(BootDeviceOverrideGetter, as_boot_device_override_getter);

pub const BOOT_DEVICE_SET: Operation = Operation::new("boot_device_set", "failed to set boot device");
pub const BOOT_DEVICE_OVERRIDE_GET: Operation =
    Operation::new("boot_device_override_get", "failed to get boot device override");

pub async fn set_boot_device(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
    device: BootDevice,
    persistent: bool,
    efi_boot: bool,
) -> Execution<bool> {
    executor
        .run(
            ctx,
            BOOT_DEVICE_SET,
            dispatch::<dyn BootDeviceSetter>(providers),
            |setter, ctx| async move {
                Outcome::from_flag(setter.boot_device_set(&ctx, device, persistent, efi_boot).await)
            },
        )
        .await
}

/// Read the boot override
///
/// Hard errors move on to the next provider like every other operation.
pub async fn get_boot_device_override(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
) -> Execution<BootDeviceOverride> {
    executor
        .run(
            ctx,
            BOOT_DEVICE_OVERRIDE_GET,
            dispatch::<dyn BootDeviceOverrideGetter>(providers),
            |getter, ctx| async move { Outcome::from(getter.boot_device_override_get(&ctx).await) },
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BmcError, ErrorKind};
    use crate::testing::{Behavior, ScriptedProvider};

    fn setter(name: &str, behavior: Behavior) -> RegisteredProvider {
        RegisteredProvider::new(ScriptedProvider::new(name).script::<dyn BootDeviceSetter>(behavior))
    }

    fn getter(name: &str, behavior: Behavior) -> RegisteredProvider {
        RegisteredProvider::new(
            ScriptedProvider::new(name).script::<dyn BootDeviceOverrideGetter>(behavior),
        )
    }

    #[tokio::test]
    async fn test_all_providers_decline() {
        let providers = vec![setter("A", Behavior::Decline), setter("B", Behavior::Decline)];

        let execution = set_boot_device(
            &Executor::new(),
            &Context::background(),
            &providers,
            BootDevice::Pxe,
            false,
            false,
        )
        .await;

        assert!(execution.metadata.successful_provider.is_none());
        assert_eq!(execution.metadata.providers_attempted, vec!["A", "B"]);

        let err = execution.result.unwrap_err();
        let errors = err.errors();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].to_string(), "provider: A: failed to set boot device");
        assert_eq!(errors[1].to_string(), "provider: B: failed to set boot device");
        assert!(matches!(&errors[2], BmcError::Exhausted(msg) if msg == "failed to set boot device"));
        assert!(err.is(ErrorKind::ProviderSoftFailure));
        assert_eq!(
            execution.metadata.failed_provider_detail.get("A").map(String::as_str),
            Some("failed to set boot device")
        );
    }

    #[tokio::test]
    async fn test_override_read_continues_past_errors() {
        let providers = vec![
            getter("redfish", Behavior::Fail("404".into())),
            getter("ipmitool", Behavior::Succeed),
        ];

        let execution =
            get_boot_device_override(&Executor::new(), &Context::background(), &providers).await;

        let current = execution.result.unwrap();
        assert_eq!(current.device, BootDevice::Pxe);
        assert_eq!(execution.metadata.successful_provider.as_deref(), Some("ipmitool"));
    }
}
