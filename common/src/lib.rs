pub mod bang_bang;
pub mod config;
pub mod hysteresis;
pub mod setpoint;
pub mod threshold;
pub mod types;

pub use bang_bang::{
    BangBangBuilder, BangBangController, ClimateActions, ClimateTraits, FnActions,
};
pub use config::{
    BangBangConfig, ConfigError, ControllerConfig, HysteresisSpec, RuntimeConfig, TargetSpec,
    ThresholdConfig,
};
pub use hysteresis::evaluate;
pub use setpoint::{SetpointModel, TargetShape, TargetTemperatureConfig};
pub use threshold::{OutputActuator, ThermostatMode, ThermostatState, ThresholdThermostat};
pub use types::{ActuatorError, BangBangStatus, ControllerMode, ThresholdStatus, Transition};
