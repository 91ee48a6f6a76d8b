//! BMC user accounts

use async_trait::async_trait;

use crate::capability::capability;
use crate::context::Context;
use crate::dispatch::dispatch;
use crate::error::Result;
use crate::executor::{Execution, Executor, Operation, Outcome};
use crate::provider::RegisteredProvider;
use crate::types::UserRecord;

#[async_trait]
pub trait UserCreator: Send + Sync {
    async fn user_create(&self, ctx: &Context, user: &str, pass: &str, role: &str) -> Result<bool>;
}

#[async_trait]
pub trait UserUpdater: Send + Sync {
    async fn user_update(&self, ctx: &Context, user: &str, pass: &str, role: &str) -> Result<bool>;
}

#[async_trait]
pub trait UserDeleter: Send + Sync {
    async fn user_delete(&self, ctx: &Context, user: &str) -> Result<bool>;
}

#[async_trait]
pub trait UserReader: Send + Sync {
    async fn user_read(&self, ctx: &Context) -> Result<Vec<UserRecord>>;
}

capability!(UserCreator, as_user_creator);
capability!(UserUpdater, as_user_updater);
capability!(UserDeleter, as_user_deleter);
capability!(UserReader, as_user_reader);

pub const USER_CREATE: Operation = Operation::new("user_create", "failed to create user");
pub const USER_UPDATE: Operation = Operation::new("user_update", "failed to update user");
pub const USER_DELETE: Operation = Operation::new("user_delete", "failed to delete user");
pub const USER_READ: Operation = Operation::new("user_read", "failed to read users");

pub async fn create_user(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
    user: &str,
    pass: &str,
    role: &str,
) -> Execution<bool> {
    executor
        .run(ctx, USER_CREATE, dispatch::<dyn UserCreator>(providers), |creator, ctx| async move {
            Outcome::from_flag(creator.user_create(&ctx, user, pass, role).await)
        })
        .await
}

pub async fn update_user(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
    user: &str,
    pass: &str,
    role: &str,
) -> Execution<bool> {
    executor
        .run(ctx, USER_UPDATE, dispatch::<dyn UserUpdater>(providers), |updater, ctx| async move {
            Outcome::from_flag(updater.user_update(&ctx, user, pass, role).await)
        })
        .await
}

pub async fn delete_user(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
    user: &str,
) -> Execution<bool> {
    executor
        .run(ctx, USER_DELETE, dispatch::<dyn UserDeleter>(providers), |deleter, ctx| async move {
            Outcome::from_flag(deleter.user_delete(&ctx, user).await)
        })
        .await
}

pub async fn read_users(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
) -> Execution<Vec<UserRecord>> {
    executor
        .run(ctx, USER_READ, dispatch::<dyn UserReader>(providers), |reader, ctx| async move {
            Outcome::from(reader.user_read(&ctx).await)
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Behavior, ScriptedProvider};

    fn users() -> Vec<RegisteredProvider> {
        vec![RegisteredProvider::new(
            ScriptedProvider::new("redfish")
                .script::<dyn UserCreator>(Behavior::Succeed)
                .script::<dyn UserUpdater>(Behavior::Decline)
                .script::<dyn UserDeleter>(Behavior::Succeed)
                .script::<dyn UserReader>(Behavior::Succeed),
        )]
    }

    #[tokio::test]
    async fn test_user_lifecycle() {
        let providers = users();
        let executor = Executor::new();
        let ctx = Context::background();

        let created = create_user(&executor, &ctx, &providers, "ops", "s3cret", "Administrator").await;
        assert!(created.result.unwrap());

        let updated = update_user(&executor, &ctx, &providers, "ops", "n3w", "Operator").await;
        assert_eq!(
            updated.result.unwrap_err().to_string(),
            "provider: redfish: failed to update user; failed to update user"
        );

        let deleted = delete_user(&executor, &ctx, &providers, "ops").await;
        assert!(deleted.result.unwrap());
    }

    #[tokio::test]
    async fn test_read_users() {
        let execution = read_users(&Executor::new(), &Context::background(), &users()).await;

        let users = execution.result.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].get("name").map(String::as_str), Some("admin"));
    }
}
