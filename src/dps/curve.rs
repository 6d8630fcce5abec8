//! DPS projection across a swept enemy defense or resistance axis.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::operator::Operator;
use crate::stats::{AttributeKey, AttributeReport, Attributes};

pub const FPS: f64 = 30.0;
pub const MIN_ATTACK_SPEED: f64 = 10.0;
pub const MAX_ATTACK_SPEED: f64 = 600.0;
/// Upper bound on samples per series.
pub const MAX_AXIS_POINTS: usize = 10_000;
/// Every hit deals at least this share of the attacker's atk.
pub const MIN_DAMAGE_RATIO: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    #[error("invalid axis: step {step} and max {max} must be finite, step positive, max non-negative")]
    InvalidAxis { step: f64, max: f64 },
    #[error("axis with step {step} and max {max} would have more than {limit} points")]
    TooManyPoints { step: f64, max: f64, limit: usize },
    #[error("duplicate series label '{0}'")]
    DuplicateLabel(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisKind {
    #[default]
    Defense,
    Resistance,
}

impl AxisKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "defense" | "def" => Some(Self::Defense),
            "resistance" | "res" => Some(Self::Resistance),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisConfig {
    pub kind: AxisKind,
    pub max_value: f64,
    pub step_size: f64,
    pub targets: u32,
}

impl AxisConfig {
    pub const fn defense() -> Self {
        Self {
            kind: AxisKind::Defense,
            max_value: 2000.0,
            step_size: 100.0,
            targets: 1,
        }
    }

    pub const fn resistance() -> Self {
        Self {
            kind: AxisKind::Resistance,
            max_value: 100.0,
            step_size: 10.0,
            targets: 1,
        }
    }

    pub const fn for_kind(kind: AxisKind) -> Self {
        match kind {
            AxisKind::Defense => Self::defense(),
            AxisKind::Resistance => Self::resistance(),
        }
    }

    /// Axis values `0, step, 2*step, ...` up to and including `max_value`.
    pub fn values(&self) -> Result<Vec<f64>, CurveError> {
        let valid = self.step_size.is_finite()
            && self.max_value.is_finite()
            && self.step_size > 0.0
            && self.max_value >= 0.0;
        if !valid {
            return Err(CurveError::InvalidAxis {
                step: self.step_size,
                max: self.max_value,
            });
        }
        let steps = (self.max_value / self.step_size + 1e-9).floor();
        let count = Some(steps)
            .filter(|steps| steps.is_finite() && *steps < MAX_AXIS_POINTS as f64)
            .map(|steps| steps as usize + 1)
            .ok_or(CurveError::TooManyPoints {
                step: self.step_size,
                max: self.max_value,
                limit: MAX_AXIS_POINTS,
            })?;
        Ok((0..count).map(|i| i as f64 * self.step_size).collect())
    }
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self::defense()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageKind {
    Physical,
    Arts,
}

/// Extra modifiers layered on the aggregated attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CurveBuff {
    /// Fractional atk bonus, `0.3` for +30%.
    pub atk: f64,
    pub flat_atk: f64,
    pub attack_speed: f64,
}

/// One operator being compared on the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveSubject {
    pub label: String,
    pub attributes: Attributes,
    pub damage: DamageKind,
    pub buff: CurveBuff,
    /// Hits per attack.
    pub hits: f64,
    /// Extra frames added after rounding the attack interval up.
    pub frame_correction: f64,
}

impl CurveSubject {
    pub fn new(label: impl Into<String>, attributes: Attributes, damage: DamageKind) -> Self {
        Self {
            label: label.into(),
            attributes,
            damage,
            buff: CurveBuff::default(),
            hits: 1.0,
            frame_correction: 0.0,
        }
    }

    pub fn from_report(
        label: impl Into<String>,
        operator: &Operator,
        report: &AttributeReport,
    ) -> Self {
        let damage = if operator.is_physical() {
            DamageKind::Physical
        } else {
            DamageKind::Arts
        };
        Self::new(label, report.attributes.clone(), damage)
    }

    pub fn final_atk(&self) -> f64 {
        self.attributes.get(AttributeKey::Atk) * (1.0 + self.buff.atk) + self.buff.flat_atk
    }

    pub fn seconds_per_attack(&self) -> f64 {
        let attack_speed = (self.attributes.get(AttributeKey::AttackSpeed) + self.buff.attack_speed)
            .clamp(MIN_ATTACK_SPEED, MAX_ATTACK_SPEED);
        let base_attack_time = self.attributes.get(AttributeKey::BaseAttackTime);
        seconds_per_attack(base_attack_time, attack_speed, self.frame_correction)
    }

    pub fn dps(&self, kind: AxisKind, axis_value: f64, targets: u32) -> f64 {
        let atk = self.final_atk();
        let hit = match (self.damage, kind) {
            (DamageKind::Physical, AxisKind::Defense) => physical_hit(atk, axis_value),
            (DamageKind::Arts, AxisKind::Resistance) => arts_hit(atk, axis_value),
            (DamageKind::Physical, AxisKind::Resistance) => physical_hit(atk, 0.0),
            (DamageKind::Arts, AxisKind::Defense) => arts_hit(atk, 0.0),
        };
        let interval = self.seconds_per_attack();
        if interval <= 0.0 {
            return 0.0;
        }
        self.hits * hit / interval * f64::from(targets.max(1))
    }
}

/// Attack interval snapped to the 30 fps game clock.
pub fn seconds_per_attack(base_attack_time: f64, attack_speed: f64, frame_correction: f64) -> f64 {
    let frames = base_attack_time * FPS / (attack_speed / 100.0);
    let frames = if frame_correction != 0.0 {
        frames.ceil() + frame_correction
    } else {
        frames.round()
    };
    frames / FPS
}

pub fn physical_hit(atk: f64, defense: f64) -> f64 {
    (atk - defense).max(atk * MIN_DAMAGE_RATIO)
}

pub fn arts_hit(atk: f64, resistance: f64) -> f64 {
    (atk * (1.0 - resistance / 100.0)).max(atk * MIN_DAMAGE_RATIO)
}

/// `{"axisValue": 100, "Blaze": 812.4, ...}` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurvePoint {
    pub axis_value: f64,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

/// Samples every subject at every axis value. Subjects run in parallel.
///
/// Labels key the series in each point, so they must be unique.
pub fn project_curve(
    subjects: &[CurveSubject],
    axis: &AxisConfig,
) -> Result<Vec<CurvePoint>, CurveError> {
    let mut seen = BTreeSet::new();
    if let Some(duplicate) = subjects
        .iter()
        .find(|subject| !seen.insert(subject.label.as_str()))
    {
        return Err(CurveError::DuplicateLabel(duplicate.label.clone()));
    }
    let axis_values = axis.values()?;
    let series: Vec<(String, Vec<f64>)> = subjects
        .par_iter()
        .map(|subject| {
            let samples = axis_values
                .iter()
                .map(|&value| subject.dps(axis.kind, value, axis.targets))
                .collect();
            (subject.label.clone(), samples)
        })
        .collect();

    Ok(axis_values
        .iter()
        .enumerate()
        .map(|(index, &axis_value)| CurvePoint {
            axis_value,
            values: series
                .iter()
                .map(|(label, samples)| (label.clone(), samples[index]))
                .collect(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_axes_cover_inclusive_ranges() {
        let defense = AxisConfig::defense().values().expect("valid axis");
        assert_eq!(defense.len(), 21);
        assert_eq!(defense.last(), Some(&2000.0));

        let resistance = AxisConfig::resistance().values().expect("valid axis");
        assert_eq!(resistance.len(), 11);
    }

    #[test]
    fn non_positive_step_is_rejected() {
        let axis = AxisConfig {
            step_size: 0.0,
            ..AxisConfig::defense()
        };
        assert!(matches!(axis.values(), Err(CurveError::InvalidAxis { .. })));
    }

    #[test]
    fn oversized_axes_are_rejected_before_allocating() {
        let huge = AxisConfig {
            max_value: 1e300,
            step_size: 1e-300,
            ..AxisConfig::defense()
        };
        assert!(matches!(huge.values(), Err(CurveError::TooManyPoints { .. })));

        let just_over = AxisConfig {
            max_value: MAX_AXIS_POINTS as f64,
            step_size: 1.0,
            ..AxisConfig::defense()
        };
        assert!(just_over.values().is_err());

        let at_limit = AxisConfig {
            max_value: (MAX_AXIS_POINTS - 1) as f64,
            step_size: 1.0,
            ..AxisConfig::defense()
        };
        assert_eq!(at_limit.values().map(|values| values.len()), Ok(MAX_AXIS_POINTS));
    }

    #[test]
    fn hits_never_drop_below_five_percent() {
        assert_eq!(physical_hit(1000.0, 400.0), 600.0);
        assert_eq!(physical_hit(1000.0, 2000.0), 50.0);
        assert_eq!(arts_hit(1000.0, 30.0), 700.0);
        assert_eq!(arts_hit(1000.0, 100.0), 50.0);
    }

    #[test]
    fn attack_interval_snaps_to_frames() {
        assert!((seconds_per_attack(1.0, 100.0, 0.0) - 1.0).abs() < 1e-12);
        // 1.6 * 30 / 1.1 = 43.63 frames, rounded to 44
        assert!((seconds_per_attack(1.6, 110.0, 0.0) - 44.0 / 30.0).abs() < 1e-12);
        assert!((seconds_per_attack(1.6, 110.0, 1.0) - 45.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn points_serialize_flat() {
        let point = CurvePoint {
            axis_value: 100.0,
            values: BTreeMap::from([("Blaze".to_string(), 512.0)]),
        };
        let json = serde_json::to_value(&point).expect("point serializes");
        assert_eq!(json, serde_json::json!({"axisValue": 100.0, "Blaze": 512.0}));
    }
}
