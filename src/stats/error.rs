use thiserror::Error;

/// Failures of the attribute pipeline. Missing modules, module phases and
/// candidates are not errors; they contribute nothing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    /// Both keyframes sit at the same level, so the interpolation interval
    /// has zero width.
    #[error("malformed keyframe data for {attribute}: both keyframes are at level {level}")]
    MalformedKeyframeData { attribute: &'static str, level: u32 },

    #[error("keyframe sequence for {attribute} needs two points, found {found}")]
    MissingKeyframes { attribute: &'static str, found: usize },

    /// A potential rank modifier names an attribute type with no mapping.
    #[error("unknown potential attribute type '{0}'")]
    UnknownAttributeType(String),

    #[error("operator '{operator}' has no phase {phase_index}")]
    PhaseNotFound { operator: String, phase_index: usize },

    #[error("level {level} is outside the phase range 1..={max_level}")]
    LevelOutOfRange { level: u32, max_level: u32 },
}
