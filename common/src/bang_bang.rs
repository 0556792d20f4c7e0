use tracing::{debug, info, warn};

use crate::{
    config::{check_capabilities, check_hysteresis, check_target, BangBangConfig, ConfigError},
    hysteresis::evaluate,
    setpoint::{SetpointModel, TargetShape, TargetTemperatureConfig},
    types::{ActuatorError, BangBangStatus, ControllerMode, Transition},
};

/// Host-side actuator hooks. Exactly one is invoked per committed mode change.
pub trait ClimateActions {
    fn idle(&mut self) -> Result<(), ActuatorError>;
    fn cool(&mut self) -> Result<(), ActuatorError>;
    fn heat(&mut self) -> Result<(), ActuatorError>;
}

/// [`ClimateActions`] backed by three closures.
pub struct FnActions<I, C, H> {
    idle: I,
    cool: C,
    heat: H,
}

impl<I, C, H> FnActions<I, C, H>
where
    I: FnMut() -> Result<(), ActuatorError>,
    C: FnMut() -> Result<(), ActuatorError>,
    H: FnMut() -> Result<(), ActuatorError>,
{
    pub fn new(idle: I, cool: C, heat: H) -> Self {
        Self { idle, cool, heat }
    }
}

impl<I, C, H> ClimateActions for FnActions<I, C, H>
where
    I: FnMut() -> Result<(), ActuatorError>,
    C: FnMut() -> Result<(), ActuatorError>,
    H: FnMut() -> Result<(), ActuatorError>,
{
    fn idle(&mut self) -> Result<(), ActuatorError> {
        (self.idle)()
    }

    fn cool(&mut self) -> Result<(), ActuatorError> {
        (self.cool)()
    }

    fn heat(&mut self) -> Result<(), ActuatorError> {
        (self.heat)()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClimateTraits {
    pub supports_cool: bool,
    pub supports_heat: bool,
    pub supports_away: bool,
    pub two_point_target: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BangBangBuilder {
    supports_cool: bool,
    supports_heat: bool,
    hysteresis: f32,
    normal: Option<TargetTemperatureConfig>,
    away: Option<TargetTemperatureConfig>,
}

impl BangBangBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &BangBangConfig) -> Result<Self, ConfigError> {
        let targets = config.resolve()?;
        Ok(Self {
            supports_cool: config.supports_cool,
            supports_heat: config.supports_heat,
            hysteresis: config.hysteresis,
            normal: Some(targets.normal),
            away: targets.away,
        })
    }

    pub fn supports_cool(mut self, supports_cool: bool) -> Self {
        self.supports_cool = supports_cool;
        self
    }

    pub fn supports_heat(mut self, supports_heat: bool) -> Self {
        self.supports_heat = supports_heat;
        self
    }

    pub fn hysteresis(mut self, hysteresis: f32) -> Self {
        self.hysteresis = hysteresis;
        self
    }

    pub fn normal(mut self, target: TargetTemperatureConfig) -> Self {
        self.normal = Some(target);
        self
    }

    pub fn away(mut self, target: TargetTemperatureConfig) -> Self {
        self.away = Some(target);
        self
    }

    pub fn build<A: ClimateActions>(
        self,
        actions: A,
    ) -> Result<BangBangController<A>, ConfigError> {
        check_capabilities(self.supports_cool, self.supports_heat)?;
        check_hysteresis(self.hysteresis)?;

        let normal = self.normal.ok_or(ConfigError::MissingTarget("normal"))?;
        check_target(normal, self.supports_cool, self.supports_heat)?;
        if let Some(away) = self.away {
            check_target(away, self.supports_cool, self.supports_heat)?;
        }

        Ok(BangBangController {
            actions,
            setpoints: SetpointModel::new(normal, self.away),
            hysteresis: self.hysteresis,
            supports_cool: self.supports_cool,
            supports_heat: self.supports_heat,
            mode: ControllerMode::Idle,
            current_temp: None,
        })
    }
}

/// Dual-setpoint on/off controller.
///
/// Each reading is evaluated against the active target; a changed result is
/// committed and then reported through exactly one [`ClimateActions`] hook.
/// The mode is always one of `Idle`, `Cooling` or `Heating`.
#[derive(Debug)]
pub struct BangBangController<A> {
    actions: A,
    setpoints: SetpointModel,
    hysteresis: f32,
    supports_cool: bool,
    supports_heat: bool,
    mode: ControllerMode,
    current_temp: Option<f32>,
}

impl<A: ClimateActions> BangBangController<A> {
    pub fn mode(&self) -> ControllerMode {
        self.mode
    }

    pub fn current_temp(&self) -> Option<f32> {
        self.current_temp
    }

    pub fn hysteresis(&self) -> f32 {
        self.hysteresis
    }

    pub fn is_away(&self) -> bool {
        self.setpoints.is_away()
    }

    pub fn target(&self) -> TargetTemperatureConfig {
        self.setpoints.active()
    }

    pub fn actions(&self) -> &A {
        &self.actions
    }

    pub fn actions_mut(&mut self) -> &mut A {
        &mut self.actions
    }

    pub fn traits(&self) -> ClimateTraits {
        ClimateTraits {
            supports_cool: self.supports_cool,
            supports_heat: self.supports_heat,
            supports_away: self.setpoints.supports_away(),
            two_point_target: TargetShape::for_capabilities(self.supports_cool, self.supports_heat)
                == TargetShape::TwoPoint,
        }
    }

    /// Evaluates a new reading. Non-finite readings are dropped and the
    /// current mode is kept.
    ///
    /// On a mode change the new mode is stored before the matching hook runs,
    /// so an `Err` from the hook leaves the controller in the new mode.
    pub fn on_temperature_update(
        &mut self,
        temp: f32,
    ) -> Result<Option<Transition>, ActuatorError> {
        if !temp.is_finite() {
            warn!("ignoring non-finite temperature reading: {temp}");
            return Ok(None);
        }
        self.current_temp = Some(temp);

        let next = evaluate(
            temp,
            self.setpoints.active(),
            self.hysteresis,
            self.mode,
            self.supports_cool,
            self.supports_heat,
        );
        self.switch_to(next)
    }

    /// Takes effect at the next reading.
    pub fn set_away(&mut self, away: bool) {
        if away && !self.setpoints.supports_away() {
            debug!("away requested without an away profile; normal target stays active");
        }
        self.setpoints.set_away(away);
    }

    /// Replaces the active profile's target. Like [`Self::set_away`], it is
    /// applied at the next reading.
    pub fn set_target(&mut self, target: TargetTemperatureConfig) -> Result<bool, ConfigError> {
        check_target(target, self.supports_cool, self.supports_heat)?;
        Ok(self.setpoints.replace_active(target))
    }

    pub fn status(&self) -> BangBangStatus {
        let target = self.setpoints.active();
        BangBangStatus {
            current_temp: self.current_temp,
            target_low: target.low,
            target_high: target.high,
            hysteresis: self.hysteresis,
            away: self.setpoints.is_away(),
            mode: self.mode.as_str(),
        }
    }

    pub fn log_config(&self) {
        let normal = self.setpoints.normal();
        info!("bang-bang climate controller");
        info!("  supports heat: {}", self.supports_heat);
        info!("  supports cool: {}", self.supports_cool);
        info!("  supports away: {}", self.setpoints.supports_away());
        info!("  hysteresis: {:.1}", self.hysteresis);
        info!("  normal target low: {:.1}", normal.low);
        info!("  normal target high: {:.1}", normal.high);
        if let Some(away) = self.setpoints.away() {
            info!("  away target low: {:.1}", away.low);
            info!("  away target high: {:.1}", away.high);
        }
    }

    fn switch_to(&mut self, next: ControllerMode) -> Result<Option<Transition>, ActuatorError> {
        if next == self.mode {
            return Ok(None);
        }

        let transition = Transition {
            from: self.mode,
            to: next,
        };
        self.mode = next;
        debug!(
            "climate action {} -> {}",
            transition.from.as_str(),
            transition.to.as_str()
        );

        let result = match next {
            ControllerMode::Idle | ControllerMode::Off => self.actions.idle(),
            ControllerMode::Cooling => self.actions.cool(),
            ControllerMode::Heating => self.actions.heat(),
        };
        if let Err(err) = &result {
            warn!("{} action failed: {err}", next.as_str());
        }

        result.map(|()| Some(transition))
    }
}
