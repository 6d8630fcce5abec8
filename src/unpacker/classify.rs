use thiserror::Error;

use crate::unpacker::runner::JobOutput;

pub const ERROR_PATTERNS: [&str; 3] = ["Error:", "Exception:", "Failed to process"];
pub const ZERO_EXTRACTED: &str = "Total assets extracted: 0";
const EXTRACTED_PREFIX: &str = "Total assets extracted:";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnpackFailure {
    #[error("unpacker '{program}' not found; is it installed and on PATH?")]
    NotFound { program: String },
    #[error("failed to start unpacker '{program}': {message}")]
    Spawn { program: String, message: String },
    #[error("unpacker exited with {}: {detail}", exit_label(.code))]
    NonZeroExit { code: Option<i32>, detail: String },
    #[error("unpacker reported a failure: {line}")]
    ErrorReported { line: String },
    #[error("unpacker finished but no assets were extracted")]
    NothingExtracted,
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "a signal".to_string(),
    }
}

/// Count from the last `Total assets extracted: N` line, if any.
pub fn extracted_count(output: &JobOutput) -> Option<u64> {
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix(EXTRACTED_PREFIX))
        .filter_map(|count| count.trim().parse().ok())
        .last()
}

/// Decides whether a finished job succeeded. Exit status is checked first,
/// then an explicit zero-extracted summary, then error markers anywhere in
/// the output.
pub fn classify(output: &JobOutput) -> Result<String, UnpackFailure> {
    if !output.success() {
        let detail = output
            .stderr
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("no output")
            .trim()
            .to_string();
        return Err(UnpackFailure::NonZeroExit {
            code: output.exit_code,
            detail,
        });
    }
    if output.lines().any(|line| line.contains(ZERO_EXTRACTED)) {
        return Err(UnpackFailure::NothingExtracted);
    }
    if let Some(line) = output
        .lines()
        .find(|line| ERROR_PATTERNS.iter().any(|pattern| line.contains(pattern)))
    {
        return Err(UnpackFailure::ErrorReported {
            line: line.trim().to_string(),
        });
    }

    Ok(match extracted_count(output) {
        Some(count) => format!("{count} assets extracted"),
        None => "unpacker completed".to_string(),
    })
}
