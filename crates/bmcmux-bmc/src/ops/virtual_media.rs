//! Virtual media and floppy images

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::capability::capability;
use crate::context::Context;
use crate::dispatch::dispatch;
use crate::error::Result;
use crate::executor::{Execution, Executor, Operation, Outcome};
use crate::provider::RegisteredProvider;
use crate::types::{Payload, VirtualMediaKind};

/// Points a virtual media slot at a remote image, or empties it when `media_url` is empty
#[async_trait]
pub trait VirtualMediaSetter: Send + Sync {
    async fn set_virtual_media(&self, ctx: &Context, kind: VirtualMediaKind, media_url: &str) -> Result<bool>;
}

#[async_trait]
pub trait VirtualMediaInserter: Send + Sync {
    async fn insert_virtual_media(&self, ctx: &Context, kind: VirtualMediaKind, media_url: &str) -> Result<()>;
}

#[async_trait]
pub trait VirtualMediaEjector: Send + Sync {
    async fn eject_virtual_media(&self, ctx: &Context, kind: VirtualMediaKind) -> Result<()>;
}

/// Uploads a floppy image to the BMC and attaches it
#[async_trait]
pub trait FloppyImageMounter: Send + Sync {
    async fn mount_floppy_image(&self, ctx: &Context, image: Box<dyn AsyncRead + Send + Unpin>) -> Result<()>;
}

#[async_trait]
pub trait FloppyImageUnmounter: Send + Sync {
    async fn unmount_floppy_image(&self, ctx: &Context) -> Result<()>;
}

capability!(VirtualMediaSetter, as_virtual_media_setter);
capability!(VirtualMediaInserter, as_virtual_media_inserter);
capability!(VirtualMediaEjector, as_virtual_media_ejector);
capability!(FloppyImageMounter, as_floppy_image_mounter);
capability!(FloppyImageUnmounter, as_floppy_image_unmounter);

pub const VIRTUAL_MEDIA_SET: Operation = Operation::new("virtual_media_set", "failed to set virtual media");
pub const VIRTUAL_MEDIA_INSERT: Operation =
    Operation::new("virtual_media_insert", "failed to insert virtual media");
pub const VIRTUAL_MEDIA_EJECT: Operation =
    Operation::new("virtual_media_eject", "failed to eject virtual media");
pub const FLOPPY_IMAGE_MOUNT: Operation = Operation::new("floppy_image_mount", "failed to mount floppy image");
pub const FLOPPY_IMAGE_UNMOUNT: Operation =
    Operation::new("floppy_image_unmount", "failed to unmount floppy image");

pub async fn set_virtual_media(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
    kind: VirtualMediaKind,
    media_url: &str,
) -> Execution<bool> {
    executor
        .run(
            ctx,
            VIRTUAL_MEDIA_SET,
            dispatch::<dyn VirtualMediaSetter>(providers),
            |setter, ctx| async move {
                Outcome::from_flag(setter.set_virtual_media(&ctx, kind, media_url).await)
            },
        )
        .await
}

pub async fn insert_virtual_media(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
    kind: VirtualMediaKind,
    media_url: &str,
) -> Execution<()> {
    executor
        .run(
            ctx,
            VIRTUAL_MEDIA_INSERT,
            dispatch::<dyn VirtualMediaInserter>(providers),
            |inserter, ctx| async move {
                Outcome::from(inserter.insert_virtual_media(&ctx, kind, media_url).await)
            },
        )
        .await
}

pub async fn eject_virtual_media(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
    kind: VirtualMediaKind,
) -> Execution<()> {
    executor
        .run(
            ctx,
            VIRTUAL_MEDIA_EJECT,
            dispatch::<dyn VirtualMediaEjector>(providers),
            |ejector, ctx| async move { Outcome::from(ejector.eject_virtual_media(&ctx, kind).await) },
        )
        .await
}

/// Mount a floppy image; each attempt reads the payload from the start
pub async fn mount_floppy_image(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
    image: &Payload,
) -> Execution<()> {
    executor
        .run(
            ctx,
            FLOPPY_IMAGE_MOUNT,
            dispatch::<dyn FloppyImageMounter>(providers),
            |mounter, ctx| async move {
                let reader = match image.open().await {
                    Ok(reader) => reader,
                    Err(e) => return Outcome::HardError(e),
                };
                Outcome::from(mounter.mount_floppy_image(&ctx, reader).await)
            },
        )
        .await
}

pub async fn unmount_floppy_image(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
) -> Execution<()> {
    executor
        .run(
            ctx,
            FLOPPY_IMAGE_UNMOUNT,
            dispatch::<dyn FloppyImageUnmounter>(providers),
            |unmounter, ctx| async move { Outcome::from(unmounter.unmount_floppy_image(&ctx).await) },
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Behavior, ScriptedProvider};

    #[tokio::test]
    async fn test_set_virtual_media_soft_failure_then_success() {
        let providers = vec![
            RegisteredProvider::new(
                ScriptedProvider::new("a").script::<dyn VirtualMediaSetter>(Behavior::Decline),
            ),
            RegisteredProvider::new(
                ScriptedProvider::new("b").script::<dyn VirtualMediaSetter>(Behavior::Succeed),
            ),
        ];

        let execution = set_virtual_media(
            &Executor::new(),
            &Context::background(),
            &providers,
            VirtualMediaKind::Cd,
            "http://images.local/installer.iso",
        )
        .await;

        assert!(execution.result.unwrap());
        assert_eq!(
            execution.metadata.failed_provider_detail.get("a").map(String::as_str),
            Some("failed to set virtual media")
        );
    }

    #[tokio::test]
    async fn test_insert_and_eject() {
        let providers = vec![RegisteredProvider::new(
            ScriptedProvider::new("redfish")
                .script::<dyn VirtualMediaInserter>(Behavior::Succeed)
                .script::<dyn VirtualMediaEjector>(Behavior::Succeed),
        )];
        let executor = Executor::new();
        let ctx = Context::background();

        let inserted = insert_virtual_media(
            &executor,
            &ctx,
            &providers,
            VirtualMediaKind::Usb,
            "http://images.local/tools.img",
        )
        .await;
        assert!(inserted.is_ok());

        let ejected = eject_virtual_media(&executor, &ctx, &providers, VirtualMediaKind::Usb).await;
        assert!(ejected.is_ok());
    }

    #[tokio::test]
    async fn test_floppy_mount_reopens_payload() {
        let first = ScriptedProvider::new("a")
            .script::<dyn FloppyImageMounter>(Behavior::Fail("no floppy slot".into()));
        let second = ScriptedProvider::new("b").script::<dyn FloppyImageMounter>(Behavior::Succeed);
        let uploads = second.uploads();
        let providers = vec![RegisteredProvider::new(first), RegisteredProvider::new(second)];

        let image = Payload::from(vec![0u8; 1440]);
        let execution =
            mount_floppy_image(&Executor::new(), &Context::background(), &providers, &image).await;

        assert!(execution.is_ok());
        assert_eq!(uploads.sizes(), vec![1440]);

        let unmounted = unmount_floppy_image(&Executor::new(), &Context::background(), &providers).await;
        assert!(unmounted.result.is_err());
    }
}
