use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Attribute keys tracked through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeKey {
    Atk,
    AttackSpeed,
    BaseAttackTime,
    BaseForceLevel,
    BlockCnt,
    Cost,
    Def,
    HpRecoveryPerSec,
    MagicResistance,
    MassLevel,
    MaxDeckStackCnt,
    MaxDeployCount,
    MaxHp,
    MoveSpeed,
    RespawnTime,
    SpRecoveryPerSec,
    TauntLevel,
}

impl AttributeKey {
    pub const ALL: [AttributeKey; 17] = [
        Self::Atk,
        Self::AttackSpeed,
        Self::BaseAttackTime,
        Self::BaseForceLevel,
        Self::BlockCnt,
        Self::Cost,
        Self::Def,
        Self::HpRecoveryPerSec,
        Self::MagicResistance,
        Self::MassLevel,
        Self::MaxDeckStackCnt,
        Self::MaxDeployCount,
        Self::MaxHp,
        Self::MoveSpeed,
        Self::RespawnTime,
        Self::SpRecoveryPerSec,
        Self::TauntLevel,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Atk => "atk",
            Self::AttackSpeed => "attackSpeed",
            Self::BaseAttackTime => "baseAttackTime",
            Self::BaseForceLevel => "baseForceLevel",
            Self::BlockCnt => "blockCnt",
            Self::Cost => "cost",
            Self::Def => "def",
            Self::HpRecoveryPerSec => "hpRecoveryPerSec",
            Self::MagicResistance => "magicResistance",
            Self::MassLevel => "massLevel",
            Self::MaxDeckStackCnt => "maxDeckStackCnt",
            Self::MaxDeployCount => "maxDeployCount",
            Self::MaxHp => "maxHp",
            Self::MoveSpeed => "moveSpeed",
            Self::RespawnTime => "respawnTime",
            Self::SpRecoveryPerSec => "spRecoveryPerSec",
            Self::TauntLevel => "tauntLevel",
        }
    }

    /// Accepts keyframe names (`maxHp`) and module blackboard names (`max_hp`).
    pub fn from_name(name: &str) -> Option<Self> {
        let key = match name {
            "atk" => Self::Atk,
            "attackSpeed" | "attack_speed" => Self::AttackSpeed,
            "baseAttackTime" | "base_attack_time" => Self::BaseAttackTime,
            "baseForceLevel" | "base_force_level" => Self::BaseForceLevel,
            "blockCnt" | "block_cnt" => Self::BlockCnt,
            "cost" => Self::Cost,
            "def" => Self::Def,
            "hpRecoveryPerSec" | "hp_recovery_per_sec" => Self::HpRecoveryPerSec,
            "magicResistance" | "magic_resistance" => Self::MagicResistance,
            "massLevel" | "mass_level" => Self::MassLevel,
            "maxDeckStackCnt" | "max_deck_stack_cnt" => Self::MaxDeckStackCnt,
            "maxDeployCount" | "max_deploy_count" => Self::MaxDeployCount,
            "maxHp" | "max_hp" => Self::MaxHp,
            "moveSpeed" | "move_speed" => Self::MoveSpeed,
            "respawnTime" | "respawn_time" => Self::RespawnTime,
            "spRecoveryPerSec" | "sp_recovery_per_sec" => Self::SpRecoveryPerSec,
            "tauntLevel" | "taunt_level" => Self::TauntLevel,
            _ => return None,
        };
        Some(key)
    }

    /// `baseAttackTime` is a time-scale divisor and is never rounded.
    pub const fn is_rounded(self) -> bool {
        !matches!(self, Self::BaseAttackTime)
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an attribute delta came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeSource {
    Trust { favor_level: u32 },
    Potential { rank: usize },
    Module { equip_id: String, equip_level: u32 },
}

impl fmt::Display for ChangeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trust { favor_level } => write!(f, "trust Lv{favor_level}"),
            Self::Potential { rank } => write!(f, "potential rank {rank}"),
            Self::Module {
                equip_id,
                equip_level,
            } => write!(f, "module {equip_id} Lv{equip_level}"),
        }
    }
}

/// One traced attribute mutation, e.g. `module Lv2: atk 100 -> 150 (+50)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeChange {
    pub attribute: AttributeKey,
    pub from: f64,
    pub to: f64,
    pub delta: f64,
    pub source: ChangeSource,
}

impl fmt::Display for AttributeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {} -> {} ({:+})",
            self.source, self.attribute, self.from, self.to, self.delta
        )
    }
}

/// Effective attribute values. Every pipeline step consumes one of these
/// and returns the next.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes {
    values: BTreeMap<AttributeKey, f64>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: AttributeKey) -> f64 {
        self.values.get(&key).copied().unwrap_or(0.0)
    }

    pub fn with(mut self, key: AttributeKey, value: f64) -> Self {
        self.values.insert(key, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttributeKey, f64)> + '_ {
        self.values.iter().map(|(key, value)| (*key, *value))
    }

    /// Adds `delta` to `key`. Zero deltas change nothing and are not traced.
    pub fn add(
        mut self,
        key: AttributeKey,
        delta: f64,
        source: &ChangeSource,
        trace: &mut Vec<AttributeChange>,
    ) -> Self {
        if delta == 0.0 {
            return self;
        }
        let from = self.get(key);
        let to = from + delta;
        self.values.insert(key, to);

        let change = AttributeChange {
            attribute: key,
            from,
            to,
            delta,
            source: source.clone(),
        };
        tracing::debug!("{change}");
        trace.push(change);
        self
    }
}

impl FromIterator<(AttributeKey, f64)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (AttributeKey, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
