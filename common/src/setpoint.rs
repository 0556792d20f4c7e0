use serde::{Deserialize, Serialize};

/// Whether a target is a true band or a single point mirrored into both
/// bounds. Decided once when the configuration is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetShape {
    SinglePoint,
    TwoPoint,
}

impl TargetShape {
    pub fn for_capabilities(supports_cool: bool, supports_heat: bool) -> Self {
        if supports_cool && supports_heat {
            Self::TwoPoint
        } else {
            Self::SinglePoint
        }
    }
}

/// Low/high target pair. NaN marks a bound as unset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetTemperatureConfig {
    pub low: f32,
    pub high: f32,
}

impl TargetTemperatureConfig {
    pub const UNSET: Self = Self {
        low: f32::NAN,
        high: f32::NAN,
    };

    pub fn single(target: f32) -> Self {
        Self {
            low: target,
            high: target,
        }
    }

    pub fn range(low: f32, high: f32) -> Self {
        Self { low, high }
    }

    pub fn is_set(&self) -> bool {
        !self.low.is_nan() && !self.high.is_nan()
    }

    /// Bitwise comparison so that two unset configs compare equal.
    pub fn same_as(&self, other: &Self) -> bool {
        self.low.to_bits() == other.low.to_bits() && self.high.to_bits() == other.high.to_bits()
    }
}

impl Default for TargetTemperatureConfig {
    fn default() -> Self {
        Self::UNSET
    }
}

/// Normal and away targets, selected by the away flag at evaluation time.
///
/// Both profiles are immutable values; switching or adjusting a target swaps
/// a whole `TargetTemperatureConfig` rather than editing a bound in place.
#[derive(Debug, Clone)]
pub struct SetpointModel {
    normal: TargetTemperatureConfig,
    away: Option<TargetTemperatureConfig>,
    away_active: bool,
}

impl SetpointModel {
    pub fn new(normal: TargetTemperatureConfig, away: Option<TargetTemperatureConfig>) -> Self {
        Self {
            normal,
            away,
            away_active: false,
        }
    }

    /// Falls back to the normal profile when no away profile was configured.
    pub fn resolve_target(&self, away: bool) -> TargetTemperatureConfig {
        match (away, self.away) {
            (true, Some(away_target)) => away_target,
            _ => self.normal,
        }
    }

    pub fn active(&self) -> TargetTemperatureConfig {
        self.resolve_target(self.away_active)
    }

    pub fn is_away(&self) -> bool {
        self.away_active
    }

    pub fn supports_away(&self) -> bool {
        self.away.is_some()
    }

    pub fn set_away(&mut self, away: bool) {
        self.away_active = away;
    }

    pub fn normal(&self) -> TargetTemperatureConfig {
        self.normal
    }

    pub fn away(&self) -> Option<TargetTemperatureConfig> {
        self.away
    }

    /// Replaces whichever profile is currently selected. Returns `true` if
    /// the stored value changed.
    pub fn replace_active(&mut self, target: TargetTemperatureConfig) -> bool {
        let slot = match (self.away_active, self.away.as_mut()) {
            (true, Some(away_target)) => away_target,
            _ => &mut self.normal,
        };
        if slot.same_as(&target) {
            false
        } else {
            *slot = target;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> SetpointModel {
        SetpointModel::new(
            TargetTemperatureConfig::range(18.0, 22.0),
            Some(TargetTemperatureConfig::range(14.0, 28.0)),
        )
    }

    #[test]
    fn resolves_normal_and_away_profiles() {
        let model = model();

        assert_eq!(model.resolve_target(false), TargetTemperatureConfig::range(18.0, 22.0));
        assert_eq!(model.resolve_target(true), TargetTemperatureConfig::range(14.0, 28.0));
    }

    #[test]
    fn away_without_profile_falls_back_to_normal() {
        let mut model = SetpointModel::new(TargetTemperatureConfig::single(21.0), None);
        model.set_away(true);

        assert!(model.is_away());
        assert!(!model.supports_away());
        assert_eq!(model.active(), TargetTemperatureConfig::single(21.0));
    }

    #[test]
    fn replace_active_only_touches_selected_profile() {
        let mut model = model();
        model.set_away(true);

        assert!(model.replace_active(TargetTemperatureConfig::range(12.0, 30.0)));
        assert!(!model.replace_active(TargetTemperatureConfig::range(12.0, 30.0)));
        assert_eq!(model.normal(), TargetTemperatureConfig::range(18.0, 22.0));

        model.set_away(false);
        assert_eq!(model.active(), TargetTemperatureConfig::range(18.0, 22.0));
    }

    #[test]
    fn shape_follows_capabilities() {
        assert_eq!(TargetShape::for_capabilities(true, true), TargetShape::TwoPoint);
        assert_eq!(TargetShape::for_capabilities(false, true), TargetShape::SinglePoint);
        assert_eq!(TargetShape::for_capabilities(true, false), TargetShape::SinglePoint);
    }

    #[test]
    fn single_point_mirrors_both_bounds() {
        let target = TargetTemperatureConfig::single(21.5);

        assert_eq!(target.low, target.high);
        assert!(target.is_set());
        assert!(!TargetTemperatureConfig::UNSET.is_set());
        assert!(TargetTemperatureConfig::UNSET.same_as(&TargetTemperatureConfig::default()));
    }
}
