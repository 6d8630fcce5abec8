use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::data::loader::DataStore;
use crate::data::operator::{KeyFrame, Operator};
use crate::data::DataError;
use crate::stats::PotentialAttribute;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn count(&self, severity: ValidationSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == severity)
            .count()
    }
}

pub fn validate_operator_dataset(path: impl AsRef<Path>) -> Result<ValidationReport, DataError> {
    let store = DataStore::load(path)?;
    Ok(validate_store(&store))
}

/// Checks the records the attribute pipeline relies on: keyframe shape,
/// potential modifier types, and module phase numbering.
pub fn validate_store(store: &DataStore) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut seen_ids = HashSet::new();

    for (index, operator) in store.operators().iter().enumerate() {
        let context = format!("operator[{index}] id='{}'", operator.id());
        if operator.id().trim().is_empty() {
            report.push(ValidationSeverity::Error, &context, "missing non-empty 'id'");
        } else if !seen_ids.insert(operator.id()) {
            report.push(
                ValidationSeverity::Error,
                &context,
                format!("duplicate id '{}'", operator.id()),
            );
        }
        if operator.name.trim().is_empty() {
            report.push(ValidationSeverity::Error, &context, "missing non-empty 'name'");
        }

        validate_phases(&mut report, operator, &context);
        validate_potentials(&mut report, operator, &context);
        validate_modules(&mut report, operator, &context);
    }

    report
}

fn validate_frames(report: &mut ValidationReport, frames: &[KeyFrame], context: &str) {
    match frames {
        [low, high, ..] if low.level == high.level => report.push(
            ValidationSeverity::Error,
            context,
            format!("both keyframes are at level {}", low.level),
        ),
        [_, _] => {}
        [_, _, ..] => report.push(
            ValidationSeverity::Warning,
            context,
            format!("{} keyframes; only the first two are used", frames.len()),
        ),
        _ => report.push(
            ValidationSeverity::Error,
            context,
            format!("expected two keyframes, found {}", frames.len()),
        ),
    }
}

fn validate_phases(report: &mut ValidationReport, operator: &Operator, context: &str) {
    if operator.phases.is_empty() || operator.phases.len() > 3 {
        report.push(
            ValidationSeverity::Error,
            format!("{context}.phases"),
            format!("expected 1 to 3 phases, found {}", operator.phases.len()),
        );
    }
    for (phase_index, phase) in operator.phases.iter().enumerate() {
        let phase_context = format!("{context}.phases[{phase_index}]");
        validate_frames(report, &phase.attributes_key_frames, &phase_context);
        if let Some(last) = phase.attributes_key_frames.get(1) {
            if last.level != phase.max_level {
                report.push(
                    ValidationSeverity::Warning,
                    phase_context,
                    format!(
                        "max keyframe at level {} but maxLevel is {}",
                        last.level, phase.max_level
                    ),
                );
            }
        }
    }

    match operator.favor_key_frames.as_deref() {
        Some(frames) => validate_frames(report, frames, &format!("{context}.favorKeyFrames")),
        None => report.push(
            ValidationSeverity::Info,
            format!("{context}.favorKeyFrames"),
            "no trust curve; trust bonus is skipped",
        ),
    }
}

fn validate_potentials(report: &mut ValidationReport, operator: &Operator, context: &str) {
    for (rank, potential) in operator.potential_ranks.iter().enumerate() {
        let Some(modifier) = potential.modifier() else {
            continue;
        };
        if let Err(err) = PotentialAttribute::try_from(&modifier.attribute_type) {
            report.push(
                ValidationSeverity::Error,
                format!("{context}.potentialRanks[{rank}]"),
                err.to_string(),
            );
        }
    }
}

fn validate_modules(report: &mut ValidationReport, operator: &Operator, context: &str) {
    for module in &operator.modules {
        let module_context = format!("{context}.modules['{}']", module.equip_id);
        if module.data.phases.is_empty() {
            report.push(
                ValidationSeverity::Warning,
                module_context.clone(),
                "module has no phases",
            );
        }
        for (index, phase) in module.data.phases.iter().enumerate() {
            let expected = index as u32 + 1;
            if phase.equip_level != 0 && phase.equip_level != expected {
                report.push(
                    ValidationSeverity::Warning,
                    format!("{module_context}.phases[{index}]"),
                    format!("equipLevel {} stored at position {expected}", phase.equip_level),
                );
            }
        }
    }
}
