//! Dead-band evaluation shared by both controller variants.
//!
//! A reading is first classified into a [`Zone`] against a [`DeadBand`], then
//! [`next_mode`] maps `(zone, prior mode)` to the next mode. The sticky
//! behavior lives entirely in that table.

use crate::{setpoint::TargetTemperatureConfig, types::ControllerMode};

/// Thresholds for one direction of control.
///
/// For heating, `engage` is the reading at or below which heat is demanded and
/// `release` the reading at or above which heating is satisfied. For cooling
/// the comparisons flip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub engage: f32,
    pub release: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadBand {
    pub heat: Option<Edge>,
    pub cool: Option<Edge>,
}

/// Where a reading falls relative to a [`DeadBand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// At or beyond the cooling engage threshold.
    TooHot,
    /// At or beyond the heating engage threshold.
    TooCold,
    /// Inside the band on every supported side.
    Settled,
    /// Between a release and an engage threshold.
    Margin,
}

impl DeadBand {
    /// Band around a low/high target with the same width on both sides.
    ///
    /// A two-point device releases on re-entering `[low, high]`. A
    /// single-capability device has no band to re-enter, so it releases at
    /// the mirror of its engage edge (`setpoint ± hysteresis`) and its
    /// unsupported side is left open.
    pub fn symmetric(
        target: TargetTemperatureConfig,
        hysteresis: f32,
        supports_cool: bool,
        supports_heat: bool,
    ) -> Self {
        let overshoot = if supports_cool && supports_heat {
            0.0
        } else {
            hysteresis
        };
        Self {
            heat: supports_heat.then_some(Edge {
                engage: target.low - hysteresis,
                release: target.low + overshoot,
            }),
            cool: supports_cool.then_some(Edge {
                engage: target.high + hysteresis,
                release: target.high - overshoot,
            }),
        }
    }

    pub fn classify(&self, current_temp: f32) -> Zone {
        if let Some(cool) = self.cool {
            if current_temp >= cool.engage {
                return Zone::TooHot;
            }
        }
        if let Some(heat) = self.heat {
            if current_temp <= heat.engage {
                return Zone::TooCold;
            }
        }

        let heat_satisfied = self.heat.map_or(true, |heat| current_temp >= heat.release);
        let cool_satisfied = self.cool.map_or(true, |cool| current_temp <= cool.release);
        if heat_satisfied && cool_satisfied {
            Zone::Settled
        } else {
            Zone::Margin
        }
    }
}

pub fn next_mode(zone: Zone, prior: ControllerMode) -> ControllerMode {
    match (zone, prior) {
        (Zone::TooHot, _) => ControllerMode::Cooling,
        (Zone::TooCold, _) => ControllerMode::Heating,
        (Zone::Settled, ControllerMode::Cooling | ControllerMode::Heating) => ControllerMode::Idle,
        (Zone::Settled | Zone::Margin, prior) => prior,
    }
}

/// Pure evaluation step for the bang-bang controller. NaN readings classify
/// as [`Zone::Margin`] and therefore keep `prior_mode`.
pub fn evaluate(
    current_temp: f32,
    target: TargetTemperatureConfig,
    hysteresis: f32,
    prior_mode: ControllerMode,
    supports_cool: bool,
    supports_heat: bool,
) -> ControllerMode {
    let band = DeadBand::symmetric(target, hysteresis, supports_cool, supports_heat);
    next_mode(band.classify(current_temp), prior_mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BAND: TargetTemperatureConfig = TargetTemperatureConfig {
        low: 18.0,
        high: 22.0,
    };

    #[test]
    fn idle_stays_idle_inside_band() {
        for temp in [18.5, 19.0, 20.0, 21.0, 21.9] {
            assert_eq!(
                evaluate(temp, BAND, 1.0, ControllerMode::Idle, true, true),
                ControllerMode::Idle,
                "reading {temp}"
            );
        }
    }

    #[test]
    fn activates_past_hysteresis_edges() {
        assert_eq!(
            evaluate(23.0, BAND, 1.0, ControllerMode::Idle, true, true),
            ControllerMode::Cooling
        );
        assert_eq!(
            evaluate(17.0, BAND, 1.0, ControllerMode::Idle, true, true),
            ControllerMode::Heating
        );
        assert_eq!(
            evaluate(22.5, BAND, 1.0, ControllerMode::Idle, true, true),
            ControllerMode::Idle
        );
    }

    #[test]
    fn active_mode_sticks_inside_hysteresis_margin() {
        assert_eq!(
            evaluate(22.5, BAND, 1.0, ControllerMode::Cooling, true, true),
            ControllerMode::Cooling
        );
        assert_eq!(
            evaluate(17.5, BAND, 1.0, ControllerMode::Heating, true, true),
            ControllerMode::Heating
        );
    }

    #[test]
    fn returns_to_idle_on_band_reentry() {
        assert_eq!(
            evaluate(22.0, BAND, 1.0, ControllerMode::Cooling, true, true),
            ControllerMode::Idle
        );
        assert_eq!(
            evaluate(18.0, BAND, 1.0, ControllerMode::Heating, true, true),
            ControllerMode::Idle
        );
    }

    #[test]
    fn zero_hysteresis_boundary_prefers_cooling() {
        assert_eq!(
            evaluate(22.0, BAND, 0.0, ControllerMode::Idle, true, true),
            ControllerMode::Cooling
        );
        assert_eq!(
            evaluate(18.0, BAND, 0.0, ControllerMode::Idle, true, true),
            ControllerMode::Heating
        );
    }

    #[test]
    fn unsupported_direction_is_skipped() {
        assert_eq!(
            evaluate(30.0, BAND, 0.0, ControllerMode::Idle, false, true),
            ControllerMode::Idle
        );
        assert_eq!(
            evaluate(10.0, BAND, 0.0, ControllerMode::Idle, true, false),
            ControllerMode::Idle
        );
    }

    #[test]
    fn heat_only_overshoots_setpoint_by_hysteresis() {
        let target = TargetTemperatureConfig::single(20.0);

        assert_eq!(
            evaluate(19.4, target, 0.5, ControllerMode::Idle, false, true),
            ControllerMode::Heating
        );
        assert_eq!(
            evaluate(19.8, target, 0.5, ControllerMode::Idle, false, true),
            ControllerMode::Idle
        );
        for temp in [20.0, 20.2, 20.4] {
            assert_eq!(
                evaluate(temp, target, 0.5, ControllerMode::Heating, false, true),
                ControllerMode::Heating,
                "reading {temp}"
            );
        }
        assert_eq!(
            evaluate(20.6, target, 0.5, ControllerMode::Heating, false, true),
            ControllerMode::Idle
        );
    }

    #[test]
    fn cool_only_undershoots_setpoint_by_hysteresis() {
        let target = TargetTemperatureConfig::single(24.0);

        assert_eq!(
            evaluate(24.6, target, 0.5, ControllerMode::Idle, true, false),
            ControllerMode::Cooling
        );
        assert_eq!(
            evaluate(23.6, target, 0.5, ControllerMode::Cooling, true, false),
            ControllerMode::Cooling
        );
        assert_eq!(
            evaluate(23.4, target, 0.5, ControllerMode::Cooling, true, false),
            ControllerMode::Idle
        );
        assert_eq!(
            evaluate(10.0, target, 0.5, ControllerMode::Idle, true, false),
            ControllerMode::Idle
        );
    }

    #[test]
    fn single_capability_without_hysteresis_releases_at_setpoint() {
        let target = TargetTemperatureConfig::single(21.0);

        assert_eq!(
            evaluate(21.0, target, 0.0, ControllerMode::Heating, false, true),
            ControllerMode::Idle
        );
        assert_eq!(
            evaluate(20.9, target, 0.0, ControllerMode::Heating, false, true),
            ControllerMode::Heating
        );
    }

    #[test]
    fn nan_reading_keeps_prior_mode() {
        assert_eq!(
            evaluate(f32::NAN, BAND, 1.0, ControllerMode::Cooling, true, true),
            ControllerMode::Cooling
        );
    }

    #[test]
    fn transition_table() {
        use ControllerMode::*;

        let cases = [
            (Zone::TooHot, Heating, Cooling),
            (Zone::TooCold, Cooling, Heating),
            (Zone::Settled, Cooling, Idle),
            (Zone::Settled, Heating, Idle),
            (Zone::Settled, Idle, Idle),
            (Zone::Settled, Off, Off),
            (Zone::Margin, Cooling, Cooling),
            (Zone::Margin, Heating, Heating),
            (Zone::Margin, Idle, Idle),
        ];

        for (zone, prior, expected) in cases {
            assert_eq!(next_mode(zone, prior), expected, "{zone:?} from {prior:?}");
        }
    }
}
