//! Module (equip) records attached to an operator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::stats::blackboard::BlackboardEntry;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    #[serde(rename = "uniEquipId", alias = "equipId")]
    pub equip_id: String,
    #[serde(default, rename = "uniEquipName")]
    pub name: Option<String>,
    #[serde(default, rename = "typeName1")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub data: ModuleData,
}

impl Module {
    /// Module phase for a 1-based module level.
    pub fn phase(&self, equip_level: u32) -> Option<&ModulePhase> {
        let index = usize::try_from(equip_level.checked_sub(1)?).ok()?;
        self.data.phases.get(index)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModuleData {
    #[serde(default)]
    pub phases: Vec<ModulePhase>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModulePhase {
    #[serde(default)]
    pub equip_level: u32,
    #[serde(default)]
    pub attribute_blackboard: Vec<BlackboardEntry>,
    #[serde(default)]
    pub token_attribute_blackboard: Option<BTreeMap<String, Vec<BlackboardEntry>>>,
    #[serde(default)]
    pub parts: Vec<ModulePart>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModulePart {
    #[serde(default)]
    pub add_or_override_talent_data_bundle: Option<CandidateBundle>,
    #[serde(default)]
    pub override_trait_data_bundle: Option<CandidateBundle>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CandidateBundle {
    #[serde(default)]
    pub candidates: Option<Vec<ModuleCandidate>>,
}

impl CandidateBundle {
    pub fn candidates(&self) -> &[ModuleCandidate] {
        self.candidates.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleCandidate {
    #[serde(default)]
    pub required_potential_rank: u32,
    #[serde(default)]
    pub prefab_key: Option<String>,
    #[serde(default)]
    pub talent_index: Option<i32>,
    #[serde(default)]
    pub blackboard: Vec<BlackboardEntry>,
}
