use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::setpoint::{TargetShape, TargetTemperatureConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("target low ({low}) must not exceed target high ({high})")]
    InvertedBand { low: f32, high: f32 },
    #[error("at least one of cooling or heating must be supported")]
    NoCapability,
    #[error("{0} target temperature is required")]
    MissingTarget(&'static str),
    #[error("{0}")]
    UnexpectedTarget(&'static str),
    #[error("hysteresis must be non-negative, got {0}")]
    NegativeHysteresis(f32),
    #[error("{0} must be a finite temperature")]
    NonFinite(&'static str),
    #[error("target temperature {value} must be within {min}..={max}")]
    TargetOutOfRange { value: f32, min: f32, max: f32 },
    #[error("max target temperature ({max}) must not be below min ({min})")]
    InvalidRange { min: f32, max: f32 },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Target temperature as written by the user, before capability-dependent
/// normalization into a [`TargetTemperatureConfig`]. Mixing the two forms
/// in one object is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
pub enum TargetSpec {
    Single { target: f32 },
    Range { low: f32, high: f32 },
}

impl TargetSpec {
    pub fn resolve(
        self,
        supports_cool: bool,
        supports_heat: bool,
    ) -> Result<TargetTemperatureConfig, ConfigError> {
        check_capabilities(supports_cool, supports_heat)?;
        let resolved = match (TargetShape::for_capabilities(supports_cool, supports_heat), self) {
            (TargetShape::TwoPoint, Self::Range { low, high }) => {
                TargetTemperatureConfig::range(low, high)
            }
            (TargetShape::TwoPoint, Self::Single { .. }) => {
                return Err(ConfigError::UnexpectedTarget(
                    "a single target is not allowed when both cooling and heating are supported; use low and high",
                ));
            }
            (TargetShape::SinglePoint, Self::Single { target }) => {
                TargetTemperatureConfig::single(target)
            }
            (TargetShape::SinglePoint, Self::Range { .. }) => {
                return Err(ConfigError::UnexpectedTarget(
                    "low and high are only allowed when both cooling and heating are supported; use target",
                ));
            }
        };
        check_target(resolved, supports_cool, supports_heat)?;
        Ok(resolved)
    }
}

pub fn check_capabilities(supports_cool: bool, supports_heat: bool) -> Result<(), ConfigError> {
    if supports_cool || supports_heat {
        Ok(())
    } else {
        Err(ConfigError::NoCapability)
    }
}

pub fn check_hysteresis(hysteresis: f32) -> Result<(), ConfigError> {
    if !hysteresis.is_finite() {
        return Err(ConfigError::NonFinite("hysteresis"));
    }
    if hysteresis < 0.0 {
        return Err(ConfigError::NegativeHysteresis(hysteresis));
    }
    Ok(())
}

/// Rejects targets the evaluator cannot interpret for the given capabilities.
pub fn check_target(
    target: TargetTemperatureConfig,
    supports_cool: bool,
    supports_heat: bool,
) -> Result<(), ConfigError> {
    if !target.low.is_finite() {
        return Err(ConfigError::NonFinite("target low"));
    }
    if !target.high.is_finite() {
        return Err(ConfigError::NonFinite("target high"));
    }
    if target.low > target.high {
        return Err(ConfigError::InvertedBand {
            low: target.low,
            high: target.high,
        });
    }
    if TargetShape::for_capabilities(supports_cool, supports_heat) == TargetShape::SinglePoint
        && target.low != target.high
    {
        return Err(ConfigError::UnexpectedTarget(
            "a single-capability controller needs low and high mirrored from one target",
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BangBangConfig {
    #[serde(default)]
    pub supports_cool: bool,
    #[serde(default)]
    pub supports_heat: bool,
    #[serde(default)]
    pub hysteresis: f32,
    pub normal: TargetSpec,
    #[serde(default)]
    pub away: Option<TargetSpec>,
}

impl Default for BangBangConfig {
    fn default() -> Self {
        Self {
            supports_cool: true,
            supports_heat: true,
            hysteresis: 0.5,
            normal: TargetSpec::Range {
                low: 20.0,
                high: 24.0,
            },
            away: Some(TargetSpec::Range {
                low: 16.0,
                high: 28.0,
            }),
        }
    }
}

/// Normalized targets produced from a [`BangBangConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedTargets {
    pub normal: TargetTemperatureConfig,
    pub away: Option<TargetTemperatureConfig>,
}

impl BangBangConfig {
    pub fn resolve(&self) -> Result<ResolvedTargets, ConfigError> {
        check_hysteresis(self.hysteresis)?;
        let normal = self.normal.resolve(self.supports_cool, self.supports_heat)?;
        let away = self
            .away
            .map(|away| away.resolve(self.supports_cool, self.supports_heat))
            .transpose()?;
        Ok(ResolvedTargets { normal, away })
    }
}

/// Either one offset used on both sides, or independent cold/hot offsets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HysteresisSpec {
    Uniform(f32),
    Split { cold: f32, hot: f32 },
}

impl HysteresisSpec {
    pub fn offsets(self) -> (f32, f32) {
        match self {
            Self::Uniform(value) => (value, value),
            Self::Split { cold, hot } => (cold, hot),
        }
    }
}

impl Default for HysteresisSpec {
    fn default() -> Self {
        Self::Uniform(0.5)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub target: f32,
    pub hysteresis: HysteresisSpec,
    pub cooling: bool,
    pub min_cycle_ms: u64,
    pub min_target: f32,
    pub max_target: f32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            target: 21.0,
            hysteresis: HysteresisSpec::default(),
            cooling: false,
            min_cycle_ms: 0,
            min_target: 10.0,
            max_target: 30.0,
        }
    }
}

impl ThresholdConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (cold, hot) = self.hysteresis.offsets();
        check_hysteresis(cold)?;
        check_hysteresis(hot)?;

        if !self.min_target.is_finite() {
            return Err(ConfigError::NonFinite("min target"));
        }
        if !self.max_target.is_finite() {
            return Err(ConfigError::NonFinite("max target"));
        }
        if self.max_target < self.min_target {
            return Err(ConfigError::InvalidRange {
                min: self.min_target,
                max: self.max_target,
            });
        }
        if !self.target.is_finite() {
            return Err(ConfigError::NonFinite("target"));
        }
        if !(self.min_target..=self.max_target).contains(&self.target) {
            return Err(ConfigError::TargetOutOfRange {
                value: self.target,
                min: self.min_target,
                max: self.max_target,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControllerConfig {
    BangBang(BangBangConfig),
    Threshold(ThresholdConfig),
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::BangBang(BangBangConfig::default())
    }
}

fn default_sample_interval_ms() -> u64 {
    5_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub controller: ControllerConfig,
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            controller: ControllerConfig::default(),
            sample_interval_ms: default_sample_interval_ms(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.controller {
            ControllerConfig::BangBang(bang_bang) => bang_bang.resolve().map(|_| ()),
            ControllerConfig::Threshold(threshold) => threshold.validate(),
        }
    }
}
