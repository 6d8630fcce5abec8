//! Module (equip) bonuses: flat attribute deltas plus the talent/trait
//! override blackboards a module phase carries.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::data::module::ModuleCandidate;
use crate::data::operator::Operator;
use crate::data::specs::{as_key_string, is_truthy, SpecsLookup};
use crate::stats::attributes::{AttributeChange, AttributeKey, Attributes, ChangeSource};
use crate::stats::blackboard::{resolve_blackboard, Blackboard};

pub const OVERRIDE_TALENT: &str = "override_talent";
pub const OVERRIDE_TRAIT: &str = "override_trait";
pub const REMOVE_KEYS: &str = "remove_keys";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquipSelection {
    pub equip_id: String,
    /// 1-based module level.
    pub equip_level: u32,
    pub potential_rank: u32,
}

/// Resolved module phase data, recorded in the buff list under the module id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EquipBlackboard {
    pub attr: Blackboard,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<BTreeMap<String, Blackboard>>,
    pub talent: Blackboard,
    #[serde(rename = "trait")]
    pub trait_: Blackboard,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_talent: Option<String>,
    pub override_trait: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove_keys: Vec<String>,
}

impl EquipBlackboard {
    /// Rewrites the resolved blackboard of an active candidate.
    ///
    /// A talent whose prefab key equals `override_talent` gets the module
    /// talent map; the trait gets the module trait map when `override_trait`
    /// is set. `remove_keys` are deleted from the candidate before merging.
    pub fn apply_overrides(
        &self,
        prefab_key: &str,
        is_trait: bool,
        mut blackboard: Blackboard,
    ) -> Blackboard {
        let talent_hit = self.override_talent.as_deref() == Some(prefab_key);
        let trait_hit = is_trait && self.override_trait;
        if !talent_hit && !trait_hit {
            return blackboard;
        }
        for key in &self.remove_keys {
            blackboard.remove(key);
        }
        if talent_hit {
            blackboard.merge(&self.talent);
        }
        if trait_hit {
            blackboard.merge(&self.trait_);
        }
        blackboard
    }
}

/// Highest-index candidate whose potential requirement is met.
fn select_module_candidate(
    candidates: &[ModuleCandidate],
    potential_rank: u32,
) -> Option<&ModuleCandidate> {
    candidates
        .iter()
        .rev()
        .find(|candidate| candidate.required_potential_rank <= potential_rank)
}

fn remove_keys_of(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(key)) if !key.is_empty() => vec![key],
        _ => Vec::new(),
    }
}

/// Applies the module selected by `selection`.
///
/// A module id the operator does not have, or a level with no phase, is a
/// no-op and yields `None`. Zero-valued attribute entries are skipped.
pub fn apply_equip(
    operator: &Operator,
    selection: &EquipSelection,
    specs: &dyn SpecsLookup,
    mut attributes: Attributes,
    trace: &mut Vec<AttributeChange>,
) -> (Attributes, Option<EquipBlackboard>) {
    let Some(phase) = operator
        .module(&selection.equip_id)
        .and_then(|module| module.phase(selection.equip_level))
    else {
        tracing::debug!(
            "module {} Lv{} not found on {}",
            selection.equip_id,
            selection.equip_level,
            operator.id()
        );
        return (attributes, None);
    };

    let mut equip = EquipBlackboard {
        attr: resolve_blackboard(&phase.attribute_blackboard),
        token: phase.token_attribute_blackboard.as_ref().map(|tokens| {
            tokens
                .iter()
                .map(|(token_id, entries)| (token_id.clone(), resolve_blackboard(entries)))
                .collect()
        }),
        ..EquipBlackboard::default()
    };

    for part in &phase.parts {
        if let Some(bundle) = &part.add_or_override_talent_data_bundle {
            if let Some(candidate) =
                select_module_candidate(bundle.candidates(), selection.potential_rank)
            {
                equip.talent.merge(&resolve_blackboard(&candidate.blackboard));
            }
        }
        if let Some(bundle) = &part.override_trait_data_bundle {
            if let Some(candidate) =
                select_module_candidate(bundle.candidates(), selection.potential_rank)
            {
                equip.trait_.merge(&resolve_blackboard(&candidate.blackboard));
            }
        }
    }

    let override_talent = specs
        .lookup(&selection.equip_id, OVERRIDE_TALENT)
        .as_ref()
        .and_then(as_key_string);
    if selection.equip_level > 1 {
        if let Some(override_talent) = override_talent {
            equip.override_trait = specs
                .lookup(&selection.equip_id, OVERRIDE_TRAIT)
                .as_ref()
                .is_some_and(is_truthy);
            equip.remove_keys = remove_keys_of(specs.lookup(&selection.equip_id, REMOVE_KEYS));
            equip.override_talent = Some(override_talent);
        }
    }

    let source = ChangeSource::Module {
        equip_id: selection.equip_id.clone(),
        equip_level: selection.equip_level,
    };
    for (name, value) in equip.attr.iter() {
        if value == 0.0 {
            continue;
        }
        match AttributeKey::from_name(name) {
            Some(key) => attributes = attributes.add(key, value, &source, trace),
            None => tracing::debug!("module {} attr '{name}' is not tracked", selection.equip_id),
        }
    }

    (attributes, Some(equip))
}
