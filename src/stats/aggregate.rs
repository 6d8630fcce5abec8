//! Attribute aggregation: keyframes, trust, potential and module layered
//! in that order, followed by talent/trait candidate resolution.

use std::ops::Index;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::data::operator::{Operator, Profession, TalentCandidate};
use crate::data::specs::SpecsLookup;
use crate::stats::attributes::{AttributeChange, AttributeKey, Attributes, ChangeSource};
use crate::stats::blackboard::{resolve_blackboard, Blackboard};
use crate::stats::equip::{apply_equip, EquipBlackboard, EquipSelection};
use crate::stats::error::StatsError;
use crate::stats::interpolate::interpolate;
use crate::stats::potential::apply_potential;

pub const TRAIT_KEY: &str = "trait";
pub const TRAIT_LABEL: &str = "Trait";

const MAX_FAVOR: u32 = 100;

fn default_equip_level() -> u32 {
    1
}

/// Caller-supplied build of an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorConfig {
    pub level: u32,
    #[serde(default)]
    pub favor: u32,
    /// Number of unlocked potential ranks, 0-based.
    #[serde(default)]
    pub potential_rank: u32,
    #[serde(default)]
    pub equip_id: Option<String>,
    #[serde(default = "default_equip_level")]
    pub equip_level: u32,
    #[serde(default)]
    pub skill_id: Option<String>,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            level: 1,
            favor: 0,
            potential_rank: 0,
            equip_id: None,
            equip_level: default_equip_level(),
            skill_id: None,
        }
    }
}

impl OperatorConfig {
    fn equip_id(&self) -> Option<&str> {
        self.equip_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Neutral skill-buff multipliers; no skill activation is modelled here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuffDefaults {
    pub atk_scale: f64,
    pub def_scale: f64,
    pub heal_scale: f64,
    pub damage_scale: f64,
    #[serde(rename = "maxTarget")]
    pub max_target: f64,
    pub times: f64,
    pub edef: f64,
    pub edef_scale: f64,
    pub edef_pene: f64,
    pub edef_pene_scale: f64,
    pub emr_pene: f64,
    pub emr: f64,
    pub emr_scale: f64,
    pub atk: f64,
    pub def: f64,
    #[serde(rename = "attackSpeed")]
    pub attack_speed: f64,
    #[serde(rename = "maxHp")]
    pub max_hp: f64,
    #[serde(rename = "baseAttackTime")]
    pub base_attack_time: f64,
    #[serde(rename = "spRecoveryPerSec")]
    pub sp_recovery_per_sec: f64,
    #[serde(rename = "spRecoverRatio")]
    pub sp_recover_ratio: f64,
}

impl Default for BuffDefaults {
    fn default() -> Self {
        Self {
            atk_scale: 1.0,
            def_scale: 1.0,
            heal_scale: 1.0,
            damage_scale: 1.0,
            max_target: 1.0,
            times: 1.0,
            edef: 0.0,
            edef_scale: 1.0,
            edef_pene: 0.0,
            edef_pene_scale: 0.0,
            emr_pene: 0.0,
            emr: 0.0,
            emr_scale: 1.0,
            atk: 0.0,
            def: 0.0,
            attack_speed: 0.0,
            max_hp: 0.0,
            base_attack_time: 0.0,
            sp_recovery_per_sec: 0.0,
            sp_recover_ratio: 0.0,
        }
    }
}

/// Resolved blackboard of an active talent or trait candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TalentBuff {
    pub name: String,
    pub prefab_key: String,
    pub blackboard: Blackboard,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BuffEntry {
    Module(EquipBlackboard),
    Talent(TalentBuff),
}

impl BuffEntry {
    /// Blackboard carried by a talent entry; module entries have none.
    pub fn blackboard(&self) -> Option<&Blackboard> {
        match self {
            Self::Module(_) => None,
            Self::Talent(talent) => Some(&talent.blackboard),
        }
    }
}

/// Active buffs keyed by buff id, in the order they were applied: the
/// module first, then talents, then the trait.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuffList {
    entries: Vec<(String, BuffEntry)>,
}

impl BuffList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&BuffEntry> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, entry)| entry)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Replaces an existing entry in place, otherwise appends.
    pub fn insert(&mut self, key: impl Into<String>, entry: BuffEntry) {
        let key = key.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = entry,
            None => self.entries.push((key, entry)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BuffEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }
}

impl Index<&str> for BuffList {
    type Output = BuffEntry;

    fn index(&self, key: &str) -> &BuffEntry {
        match self.get(key) {
            Some(entry) => entry,
            None => panic!("no buff '{key}' in buff list"),
        }
    }
}

impl Serialize for BuffList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeReport {
    pub attributes: Attributes,
    pub buffs: BuffDefaults,
    pub buff_list: BuffList,
    pub trace: Vec<AttributeChange>,
}

/// Highest-index candidate whose phase, level and potential gates all pass.
/// Candidate 0 is gated like any other; `None` when nothing qualifies.
pub fn select_candidate(
    candidates: &[TalentCandidate],
    phase_index: usize,
    level: u32,
    potential_rank: u32,
) -> Option<(usize, &TalentCandidate)> {
    candidates.iter().enumerate().rev().find(|(_, candidate)| {
        phase_index >= candidate.unlock_condition.phase.index()
            && level >= candidate.unlock_condition.level
            && potential_rank >= candidate.required_potential_rank
    })
}

fn base_attributes(
    operator: &Operator,
    config: &OperatorConfig,
    phase_index: usize,
) -> Result<Attributes, StatsError> {
    let phase = operator
        .phase(phase_index)
        .ok_or_else(|| StatsError::PhaseNotFound {
            operator: operator.id().to_string(),
            phase_index,
        })?;
    if config.level == 0 || config.level > phase.max_level {
        return Err(StatsError::LevelOutOfRange {
            level: config.level,
            max_level: phase.max_level,
        });
    }

    let frames = &phase.attributes_key_frames;
    if config.level == phase.max_level {
        let max_frame = frames.get(1).ok_or(StatsError::MissingKeyframes {
            attribute: AttributeKey::Atk.as_str(),
            found: frames.len(),
        })?;
        return Ok(AttributeKey::ALL
            .iter()
            .map(|&key| (key, max_frame.data.get(key)))
            .collect());
    }

    AttributeKey::ALL
        .iter()
        .map(|&key| Ok((key, interpolate(frames, config.level, 1, key)?)))
        .collect()
}

/// Adds the trust bonus for `favor` (0-100). Tokens and operators without a
/// trust curve get nothing.
pub fn apply_trust(
    operator: &Operator,
    favor: u32,
    mut attributes: Attributes,
    trace: &mut Vec<AttributeChange>,
) -> Result<Attributes, StatsError> {
    let Some(frames) = operator.favor_key_frames.as_deref() else {
        return Ok(attributes);
    };
    if operator.profession == Profession::Token {
        return Ok(attributes);
    }

    let favor_level = favor.min(MAX_FAVOR) / 2;
    let source = ChangeSource::Trust { favor_level };
    for key in AttributeKey::ALL {
        let delta = interpolate(frames, favor_level, 0, key)?;
        attributes = attributes.add(key, delta, &source, trace);
    }
    Ok(attributes)
}

/// Effective attributes and active buffs of `operator` built as `config`
/// at promotion `phase_index`.
pub fn compute_attributes(
    operator: &Operator,
    config: &OperatorConfig,
    phase_index: usize,
    specs: &dyn SpecsLookup,
) -> Result<AttributeReport, StatsError> {
    let mut trace = Vec::new();
    let mut buff_list = BuffList::new();

    let attributes = base_attributes(operator, config, phase_index)?;
    let attributes = apply_trust(operator, config.favor, attributes, &mut trace)?;
    let mut attributes = apply_potential(
        operator,
        config.potential_rank as usize,
        attributes,
        &mut trace,
    )?;

    let mut equip_blackboard = None;
    if let Some(equip_id) = config.equip_id().filter(|_| phase_index >= 2) {
        let selection = EquipSelection {
            equip_id: equip_id.to_string(),
            equip_level: config.equip_level,
            potential_rank: config.potential_rank,
        };
        let (updated, equip) = apply_equip(operator, &selection, specs, attributes, &mut trace);
        attributes = updated;
        if let Some(equip) = equip {
            buff_list.insert(equip_id, BuffEntry::Module(equip.clone()));
            equip_blackboard = Some(equip);
        }
    }

    let talents = operator.talents.iter().chain(operator.trait_.iter());
    for talent in talents {
        let Some((index, candidate)) = select_candidate(
            &talent.candidates,
            phase_index,
            config.level,
            config.potential_rank,
        ) else {
            continue;
        };

        let is_trait = candidate.is_trait();
        let (prefab_key, name) = if is_trait {
            (TRAIT_KEY.to_string(), TRAIT_LABEL.to_string())
        } else {
            let key = candidate.prefab_key.clone().unwrap_or_default();
            let name = candidate.name.clone().unwrap_or_else(|| key.clone());
            (key, name)
        };

        let mut blackboard = resolve_blackboard(&candidate.blackboard);
        if let Some(equip) = &equip_blackboard {
            blackboard = equip.apply_overrides(&prefab_key, is_trait, blackboard);
        }

        tracing::debug!(
            "{}: candidate {index} active for '{prefab_key}' ({} keys)",
            operator.id(),
            blackboard.len()
        );
        buff_list.insert(
            format!("tachr_{}_{}", operator.id_stem(), prefab_key),
            BuffEntry::Talent(TalentBuff {
                name,
                prefab_key,
                blackboard,
            }),
        );
    }

    Ok(AttributeReport {
        attributes,
        buffs: BuffDefaults::default(),
        buff_list,
        trace,
    })
}
