//! Operator static-data records, deserialized from the game-data JSON shape.

use serde::{Deserialize, Serialize};

use crate::data::module::Module;
use crate::stats::blackboard::BlackboardEntry;
use crate::stats::AttributeKey;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub profession: Profession,
    #[serde(default)]
    pub sub_profession_id: String,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default)]
    pub phases: Vec<Phase>,
    #[serde(default)]
    pub favor_key_frames: Option<Vec<KeyFrame>>,
    #[serde(default)]
    pub potential_ranks: Vec<PotentialRank>,
    #[serde(default, rename = "trait")]
    pub trait_: Option<Talent>,
    #[serde(default)]
    pub talents: Vec<Talent>,
    #[serde(default)]
    pub modules: Vec<Module>,
}

impl Operator {
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    /// Operator id without its `char_` prefix, e.g. `017_huang`.
    pub fn id_stem(&self) -> &str {
        let id = self.id();
        id.char_indices()
            .nth(5)
            .map(|(offset, _)| &id[offset..])
            .unwrap_or_default()
    }

    pub fn phase(&self, index: usize) -> Option<&Phase> {
        self.phases.get(index)
    }

    pub fn module(&self, equip_id: &str) -> Option<&Module> {
        self.modules.iter().find(|module| module.equip_id == equip_id)
    }

    /// Casters, medics and supporters deal arts damage; a few guard and
    /// specialist branches do too.
    pub fn is_physical(&self) -> bool {
        match self.profession {
            Profession::Caster | Profession::Medic | Profession::Supporter => false,
            _ => !matches!(self.sub_profession_id.as_str(), "artsfghter" | "artsprotector"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Profession {
    #[serde(rename = "MEDIC")]
    Medic,
    #[serde(rename = "CASTER")]
    Caster,
    #[serde(rename = "WARRIOR")]
    Guard,
    #[serde(rename = "PIONEER")]
    Vanguard,
    #[serde(rename = "SNIPER")]
    Sniper,
    #[serde(rename = "SPECIAL")]
    Specialist,
    #[serde(rename = "SUPPORT")]
    Supporter,
    #[serde(rename = "TANK")]
    Defender,
    #[serde(rename = "TOKEN")]
    Token,
    #[serde(rename = "TRAP")]
    Trap,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Rarity {
    #[default]
    #[serde(rename = "TIER_1")]
    Tier1,
    #[serde(rename = "TIER_2")]
    Tier2,
    #[serde(rename = "TIER_3")]
    Tier3,
    #[serde(rename = "TIER_4")]
    Tier4,
    #[serde(rename = "TIER_5")]
    Tier5,
    #[serde(rename = "TIER_6")]
    Tier6,
}

impl Rarity {
    pub const fn stars(self) -> u8 {
        match self {
            Self::Tier1 => 1,
            Self::Tier2 => 2,
            Self::Tier3 => 3,
            Self::Tier4 => 4,
            Self::Tier5 => 5,
            Self::Tier6 => 6,
        }
    }
}

/// Promotion tier a talent candidate unlocks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum PhaseTier {
    #[default]
    #[serde(rename = "PHASE_0")]
    Elite0,
    #[serde(rename = "PHASE_1")]
    Elite1,
    #[serde(rename = "PHASE_2")]
    Elite2,
}

impl PhaseTier {
    pub const fn index(self) -> usize {
        match self {
            Self::Elite0 => 0,
            Self::Elite1 => 1,
            Self::Elite2 => 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub max_level: u32,
    #[serde(default)]
    pub attributes_key_frames: Vec<KeyFrame>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct KeyFrame {
    pub level: u32,
    pub data: KeyFrameData,
}

/// Full attribute snapshot at one keyframe level.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyFrameData {
    pub max_hp: f64,
    pub atk: f64,
    pub def: f64,
    pub magic_resistance: f64,
    pub cost: f64,
    pub block_cnt: f64,
    pub move_speed: f64,
    pub attack_speed: f64,
    pub base_attack_time: f64,
    pub respawn_time: f64,
    pub hp_recovery_per_sec: f64,
    pub sp_recovery_per_sec: f64,
    pub max_deploy_count: f64,
    pub max_deck_stack_cnt: f64,
    pub taunt_level: f64,
    pub mass_level: f64,
    pub base_force_level: f64,
    pub stun_immune: bool,
    pub silence_immune: bool,
    pub sleep_immune: bool,
    pub frozen_immune: bool,
    pub levitate_immune: bool,
    pub disarmed_combat_immune: bool,
}

impl KeyFrameData {
    pub fn get(&self, key: AttributeKey) -> f64 {
        match key {
            AttributeKey::Atk => self.atk,
            AttributeKey::AttackSpeed => self.attack_speed,
            AttributeKey::BaseAttackTime => self.base_attack_time,
            AttributeKey::BaseForceLevel => self.base_force_level,
            AttributeKey::BlockCnt => self.block_cnt,
            AttributeKey::Cost => self.cost,
            AttributeKey::Def => self.def,
            AttributeKey::HpRecoveryPerSec => self.hp_recovery_per_sec,
            AttributeKey::MagicResistance => self.magic_resistance,
            AttributeKey::MassLevel => self.mass_level,
            AttributeKey::MaxDeckStackCnt => self.max_deck_stack_cnt,
            AttributeKey::MaxDeployCount => self.max_deploy_count,
            AttributeKey::MaxHp => self.max_hp,
            AttributeKey::MoveSpeed => self.move_speed,
            AttributeKey::RespawnTime => self.respawn_time,
            AttributeKey::SpRecoveryPerSec => self.sp_recovery_per_sec,
            AttributeKey::TauntLevel => self.taunt_level,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PotentialRank {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub buff: Option<PotentialBuff>,
}

impl PotentialRank {
    /// First attribute modifier of the rank's buff; ranks carry at most one.
    pub fn modifier(&self) -> Option<&AttributeModifier> {
        self.buff
            .as_ref()?
            .attributes
            .attribute_modifiers
            .as_ref()?
            .first()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PotentialBuff {
    pub attributes: BuffAttributes,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuffAttributes {
    #[serde(default)]
    pub attribute_modifiers: Option<Vec<AttributeModifier>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeModifier {
    pub attribute_type: RawAttributeType,
    pub value: f64,
}

/// Attribute type as found in the data: a numeric code or the game's name.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawAttributeType {
    Code(i64),
    Name(String),
}

impl std::fmt::Display for RawAttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{code}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// A talent (or the trait): a list of gated candidates.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Talent {
    #[serde(default)]
    pub candidates: Vec<TalentCandidate>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TalentCandidate {
    #[serde(default)]
    pub unlock_condition: UnlockCondition,
    #[serde(default)]
    pub required_potential_rank: u32,
    #[serde(default)]
    pub prefab_key: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub blackboard: Vec<BlackboardEntry>,
}

impl TalentCandidate {
    /// Candidates without a prefab key (or with a negative one) are trait entries.
    pub fn is_trait(&self) -> bool {
        match self.prefab_key.as_deref() {
            None | Some("") => true,
            Some(key) => key.parse::<i64>().is_ok_and(|number| number < 0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct UnlockCondition {
    #[serde(default)]
    pub phase: PhaseTier,
    #[serde(default)]
    pub level: u32,
}
