use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Most recently emitted controller action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ControllerMode {
    #[default]
    Idle,
    Cooling,
    Heating,
    Off,
}

impl ControllerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Cooling => "COOLING",
            Self::Heating => "HEATING",
            Self::Off => "OFF",
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Cooling | Self::Heating)
    }
}

/// A committed mode change, returned to the host after each evaluation that
/// actually switched the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ControllerMode,
    pub to: ControllerMode,
}

/// Failure reported by a host-supplied actuator callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("actuator failed: {0}")]
pub struct ActuatorError(pub String);

impl ActuatorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BangBangStatus {
    #[serde(rename = "currentTemp")]
    pub current_temp: Option<f32>,
    #[serde(rename = "targetLow")]
    pub target_low: f32,
    #[serde(rename = "targetHigh")]
    pub target_high: f32,
    pub hysteresis: f32,
    pub away: bool,
    pub mode: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThresholdStatus {
    #[serde(rename = "currentTemp")]
    pub current_temp: Option<f32>,
    #[serde(rename = "targetTemp")]
    pub target_temp: f32,
    pub cold: f32,
    pub hot: f32,
    pub cooling: bool,
    pub mode: &'static str,
    pub state: &'static str,
    #[serde(rename = "outputOn")]
    pub output_on: bool,
    #[serde(rename = "lockoutRemainingMs")]
    pub lockout_remaining_ms: u64,
}
