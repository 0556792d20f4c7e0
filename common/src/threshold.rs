use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    config::{ConfigError, ThresholdConfig},
    hysteresis::{next_mode, DeadBand, Edge},
    types::{ActuatorError, ControllerMode, ThresholdStatus, Transition},
};

/// Single binary output, e.g. one relay.
pub trait OutputActuator {
    fn set_output(&mut self, on: bool) -> Result<(), ActuatorError>;
}

impl<F> OutputActuator for F
where
    F: FnMut(bool) -> Result<(), ActuatorError>,
{
    fn set_output(&mut self, on: bool) -> Result<(), ActuatorError> {
        self(on)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThermostatMode {
    Off,
    #[default]
    Auto,
}

impl ThermostatMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Auto => "AUTO",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThermostatState {
    pub output_on: bool,
    pub last_transition_ms: u64,
    pub cold: f32,
    pub hot: f32,
    pub min_cycle_ms: u64,
}

/// Single-setpoint on/off thermostat with a minimum cycle duration.
///
/// Heating polarity switches the output on at `target - cold` and off once
/// the reading is back at the setpoint; cooling polarity switches on at
/// `target + hot`. No output change is made within `min_cycle_ms` of the
/// previous one, and construction counts as a change.
#[derive(Debug)]
pub struct ThresholdThermostat<O> {
    output: O,
    state: ThermostatState,
    target: f32,
    cooling: bool,
    mode: ThermostatMode,
    min_target: f32,
    max_target: f32,
    current_temp: Option<f32>,
}

impl<O: OutputActuator> ThresholdThermostat<O> {
    pub fn new(config: &ThresholdConfig, output: O, now_ms: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let (cold, hot) = config.hysteresis.offsets();
        Ok(Self {
            output,
            state: ThermostatState {
                output_on: false,
                last_transition_ms: now_ms,
                cold,
                hot,
                min_cycle_ms: config.min_cycle_ms,
            },
            target: config.target,
            cooling: config.cooling,
            mode: ThermostatMode::Auto,
            min_target: config.min_target,
            max_target: config.max_target,
            current_temp: None,
        })
    }

    pub fn state(&self) -> &ThermostatState {
        &self.state
    }

    pub fn is_output_on(&self) -> bool {
        self.state.output_on
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn mode(&self) -> ThermostatMode {
        self.mode
    }

    pub fn current_temp(&self) -> Option<f32> {
        self.current_temp
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn controller_mode(&self) -> ControllerMode {
        match (self.state.output_on, self.mode) {
            (true, _) => self.active_mode(),
            (false, ThermostatMode::Off) => ControllerMode::Off,
            (false, ThermostatMode::Auto) => ControllerMode::Idle,
        }
    }

    /// Evaluates a new reading taken at `now_ms`.
    ///
    /// A differing candidate output is committed only once `min_cycle_ms` has
    /// passed since the last change; otherwise it is dropped, not queued.
    pub fn on_temperature_update(
        &mut self,
        temp: f32,
        now_ms: u64,
    ) -> Result<Option<Transition>, ActuatorError> {
        if !temp.is_finite() {
            warn!("ignoring non-finite temperature reading: {temp}");
            return Ok(None);
        }
        self.current_temp = Some(temp);

        let candidate = self.candidate_output(temp);
        self.apply(candidate, now_ms)
    }

    /// Takes effect at the next reading, still subject to the minimum cycle.
    pub fn set_mode(&mut self, mode: ThermostatMode) -> bool {
        if self.mode != mode {
            self.mode = mode;
            true
        } else {
            false
        }
    }

    pub fn set_target(&mut self, temp: f32) -> bool {
        if !temp.is_finite() {
            return false;
        }
        let clamped = temp.clamp(self.min_target, self.max_target);
        if (self.target - clamped).abs() > f32::EPSILON {
            self.target = clamped;
            true
        } else {
            false
        }
    }

    pub fn lockout_remaining_ms(&self, now_ms: u64) -> u64 {
        let elapsed = now_ms.saturating_sub(self.state.last_transition_ms);
        self.state.min_cycle_ms.saturating_sub(elapsed)
    }

    pub fn status(&self, now_ms: u64) -> ThresholdStatus {
        ThresholdStatus {
            current_temp: self.current_temp,
            target_temp: self.target,
            cold: self.state.cold,
            hot: self.state.hot,
            cooling: self.cooling,
            mode: self.mode.as_str(),
            state: self.controller_mode().as_str(),
            output_on: self.state.output_on,
            lockout_remaining_ms: self.lockout_remaining_ms(now_ms),
        }
    }

    pub fn log_config(&self) {
        info!("threshold thermostat");
        info!("  cooling: {}", self.cooling);
        info!("  target: {:.1}", self.target);
        info!("  hysteresis cold: {:.1}", self.state.cold);
        info!("  hysteresis hot: {:.1}", self.state.hot);
        info!("  min cycle duration: {}ms", self.state.min_cycle_ms);
    }

    fn active_mode(&self) -> ControllerMode {
        if self.cooling {
            ControllerMode::Cooling
        } else {
            ControllerMode::Heating
        }
    }

    fn band(&self) -> DeadBand {
        if self.cooling {
            DeadBand {
                heat: None,
                cool: Some(Edge {
                    engage: self.target + self.state.hot,
                    release: self.target,
                }),
            }
        } else {
            DeadBand {
                heat: Some(Edge {
                    engage: self.target - self.state.cold,
                    release: self.target,
                }),
                cool: None,
            }
        }
    }

    fn candidate_output(&self, temp: f32) -> bool {
        if self.mode == ThermostatMode::Off {
            return false;
        }
        let prior = if self.state.output_on {
            self.active_mode()
        } else {
            ControllerMode::Idle
        };
        next_mode(self.band().classify(temp), prior) == self.active_mode()
    }

    fn can_change_state(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.state.last_transition_ms) >= self.state.min_cycle_ms
    }

    fn apply(&mut self, on: bool, now_ms: u64) -> Result<Option<Transition>, ActuatorError> {
        if on == self.state.output_on {
            return Ok(None);
        }
        if !self.can_change_state(now_ms) {
            debug!(
                "output change to {} suppressed, {}ms of minimum cycle remaining",
                if on { "on" } else { "off" },
                self.lockout_remaining_ms(now_ms)
            );
            return Ok(None);
        }

        let from = self.controller_mode();
        self.state.output_on = on;
        self.state.last_transition_ms = now_ms;
        let transition = Transition {
            from,
            to: self.controller_mode(),
        };
        debug!(
            "thermostat output {} -> {}",
            transition.from.as_str(),
            transition.to.as_str()
        );

        if let Err(err) = self.output.set_output(on) {
            warn!("set output {on} failed: {err}");
            return Err(err);
        }
        Ok(Some(transition))
    }
}
