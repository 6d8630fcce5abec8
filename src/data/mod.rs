pub mod loader;
pub mod module;
pub mod operator;
pub mod specs;
pub mod validate;

use thiserror::Error;

pub use loader::{DataStore, DEFAULT_OPERATORS_PATH};
pub use module::{CandidateBundle, Module, ModuleCandidate, ModuleData, ModulePart, ModulePhase};
pub use operator::{
    AttributeModifier, BuffAttributes, KeyFrame, KeyFrameData, Operator, Phase, PhaseTier,
    PotentialBuff, PotentialRank, Profession, Rarity, RawAttributeType, Talent, TalentCandidate,
    UnlockCondition,
};
pub use specs::{NoSpecs, SpecsLookup, SpecsTable, DEFAULT_SPECS_PATH};

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse '{path}': {message}")]
    Parse { path: String, message: String },
}
