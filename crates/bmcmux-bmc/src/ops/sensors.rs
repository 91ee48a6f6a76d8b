//! Sensor readings and chassis health

use async_trait::async_trait;

use crate::capability::capability;
use crate::context::Context;
use crate::dispatch::dispatch;
use crate::error::Result;
use crate::executor::{Execution, Executor, Operation, Outcome};
use crate::provider::RegisteredProvider;
use crate::types::{ChassisHealth, FanSensor, PowerSensor, TemperatureSensor};

#[async_trait]
pub trait PowerSensorGetter: Send + Sync {
    async fn power_sensors(&self, ctx: &Context) -> Result<Vec<PowerSensor>>;
}

#[async_trait]
pub trait TemperatureSensorGetter: Send + Sync {
    async fn temperature_sensors(&self, ctx: &Context) -> Result<Vec<TemperatureSensor>>;
}

#[async_trait]
pub trait FanSensorGetter: Send + Sync {
    async fn fan_sensors(&self, ctx: &Context) -> Result<Vec<FanSensor>>;
}

#[async_trait]
pub trait ChassisHealthGetter: Send + Sync {
    async fn chassis_health(&self, ctx: &Context) -> Result<Vec<ChassisHealth>>;
}

capability!(PowerSensorGetter, as_power_sensor_getter);
capability!(TemperatureSensorGetter, as_temperature_sensor_getter);
capability!(FanSensorGetter, as_fan_sensor_getter);
capability!(ChassisHealthGetter, as_chassis_health_getter);

pub const POWER_SENSORS: Operation = Operation::new("power_sensors", "failed to get power sensors");
pub const TEMPERATURE_SENSORS: Operation =
    Operation::new("temperature_sensors", "failed to get temperature sensors");
pub const FAN_SENSORS: Operation = Operation::new("fan_sensors", "failed to get fan sensors");
pub const CHASSIS_HEALTH: Operation = Operation::new("chassis_health", "failed to get chassis health");

pub async fn get_power_sensors(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
) -> Execution<Vec<PowerSensor>> {
    executor
        .run(
            ctx,
            POWER_SENSORS,
            dispatch::<dyn PowerSensorGetter>(providers),
            |getter, ctx| async move { Outcome::from(getter.power_sensors(&ctx).await) },
        )
        .await
}

pub async fn get_temperature_sensors(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
) -> Execution<Vec<TemperatureSensor>> {
    executor
        .run(
            ctx,
            TEMPERATURE_SENSORS,
            dispatch::<dyn TemperatureSensorGetter>(providers),
            |getter, ctx| async move { Outcome::from(getter.temperature_sensors(&ctx).await) },
        )
        .await
}

pub async fn get_fan_sensors(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
) -> Execution<Vec<FanSensor>> {
    executor
        .run(
            ctx,
            FAN_SENSORS,
            dispatch::<dyn FanSensorGetter>(providers),
            |getter, ctx| async move { Outcome::from(getter.fan_sensors(&ctx).await) },
        )
        .await
}

pub async fn get_chassis_health(
    executor: &Executor,
    ctx: &Context,
    providers: &[RegisteredProvider],
) -> Execution<Vec<ChassisHealth>> {
    executor
        .run(
            ctx,
            CHASSIS_HEALTH,
            dispatch::<dyn ChassisHealthGetter>(providers),
            |getter, ctx| async move { Outcome::from(getter.chassis_health(&ctx).await) },
        )
        .await
}
