use crate::data::operator::{Operator, RawAttributeType};
use crate::stats::attributes::{AttributeChange, AttributeKey, Attributes, ChangeSource};
use crate::stats::error::StatsError;

/// Attribute a potential rank modifier can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PotentialAttribute {
    MaxHp,
    Atk,
    Def,
    MagicResistance,
    Cost,
    BlockCnt,
    MoveSpeed,
    AttackSpeed,
    RespawnTime,
}

impl PotentialAttribute {
    pub const fn key(self) -> AttributeKey {
        match self {
            Self::MaxHp => AttributeKey::MaxHp,
            Self::Atk => AttributeKey::Atk,
            Self::Def => AttributeKey::Def,
            Self::MagicResistance => AttributeKey::MagicResistance,
            Self::Cost => AttributeKey::Cost,
            Self::BlockCnt => AttributeKey::BlockCnt,
            Self::MoveSpeed => AttributeKey::MoveSpeed,
            Self::AttackSpeed => AttributeKey::AttackSpeed,
            Self::RespawnTime => AttributeKey::RespawnTime,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        let attribute = match code {
            0 => Self::MaxHp,
            1 => Self::Atk,
            2 => Self::Def,
            3 => Self::MagicResistance,
            4 => Self::Cost,
            5 => Self::BlockCnt,
            6 => Self::MoveSpeed,
            7 => Self::AttackSpeed,
            21 => Self::RespawnTime,
            _ => return None,
        };
        Some(attribute)
    }

    pub fn from_type_name(name: &str) -> Option<Self> {
        let attribute = match name {
            "MAX_HP" => Self::MaxHp,
            "ATK" => Self::Atk,
            "DEF" => Self::Def,
            "MAGIC_RESISTANCE" => Self::MagicResistance,
            "COST" => Self::Cost,
            "BLOCK_CNT" => Self::BlockCnt,
            "MOVE_SPEED" => Self::MoveSpeed,
            "ATTACK_SPEED" => Self::AttackSpeed,
            "RESPAWN_TIME" => Self::RespawnTime,
            _ => return None,
        };
        Some(attribute)
    }
}

impl TryFrom<&RawAttributeType> for PotentialAttribute {
    type Error = StatsError;

    fn try_from(raw: &RawAttributeType) -> Result<Self, Self::Error> {
        let decoded = match raw {
            RawAttributeType::Code(code) => Self::from_code(*code),
            RawAttributeType::Name(name) => name
                .parse::<i64>()
                .ok()
                .map_or_else(|| Self::from_type_name(name), Self::from_code),
        };
        decoded.ok_or_else(|| StatsError::UnknownAttributeType(raw.to_string()))
    }
}

/// Adds the flat modifiers of potential ranks `0..unlocked_rank`.
///
/// Ranks without a buff are skipped; only a rank's first modifier counts.
/// A modifier with an unmapped attribute type fails the whole call.
pub fn apply_potential(
    operator: &Operator,
    unlocked_rank: usize,
    attributes: Attributes,
    trace: &mut Vec<AttributeChange>,
) -> Result<Attributes, StatsError> {
    apply_potential_range(operator, 0, unlocked_rank, attributes, trace)
}

/// Same as [`apply_potential`] for ranks `from..to` only.
pub fn apply_potential_range(
    operator: &Operator,
    from: usize,
    to: usize,
    mut attributes: Attributes,
    trace: &mut Vec<AttributeChange>,
) -> Result<Attributes, StatsError> {
    let to = to.min(operator.potential_ranks.len());
    for index in from..to {
        let Some(modifier) = operator.potential_ranks[index].modifier() else {
            continue;
        };
        let attribute = PotentialAttribute::try_from(&modifier.attribute_type)?;
        let source = ChangeSource::Potential { rank: index + 1 };
        attributes = attributes.add(attribute.key(), modifier.value, &source, trace);
    }
    Ok(attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_codes_and_names_decode_alike() {
        for (code, name) in [(0, "MAX_HP"), (1, "ATK"), (7, "ATTACK_SPEED"), (21, "RESPAWN_TIME")] {
            let by_code = PotentialAttribute::try_from(&RawAttributeType::Code(code));
            let by_name = PotentialAttribute::try_from(&RawAttributeType::Name(name.to_string()));
            assert_eq!(by_code, by_name);
            assert!(by_code.is_ok());
        }
    }

    #[test]
    fn unmapped_codes_fail_loudly() {
        assert_eq!(
            PotentialAttribute::try_from(&RawAttributeType::Code(8)),
            Err(StatsError::UnknownAttributeType("8".to_string()))
        );
        assert!(PotentialAttribute::try_from(&RawAttributeType::Name("SP_RECOVERY".into())).is_err());
    }
}
