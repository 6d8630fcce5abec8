//! Operator attribute pipeline: keyframes, trust, potential and module
//! bonuses layered into one effective attribute set plus the active
//! talent/trait/module buff list.

pub mod aggregate;
pub mod attributes;
pub mod blackboard;
pub mod equip;
pub mod error;
pub mod interpolate;
pub mod potential;

pub use aggregate::{
    apply_trust, compute_attributes, select_candidate, AttributeReport, BuffDefaults, BuffEntry,
    BuffList, OperatorConfig, TalentBuff, TRAIT_KEY, TRAIT_LABEL,
};
pub use attributes::{AttributeChange, AttributeKey, Attributes, ChangeSource};
pub use blackboard::{resolve_blackboard, Blackboard};
pub use equip::{apply_equip, EquipBlackboard, EquipSelection};
pub use error::StatsError;
pub use interpolate::{interpolate, round_half_up};
pub use potential::{apply_potential, apply_potential_range, PotentialAttribute};
