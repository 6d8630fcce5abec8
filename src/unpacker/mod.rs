//! Drives the external asset unpacker script. The script is opaque: we
//! build its flags, run it through a [`JobRunner`], and classify the result.

pub mod classify;
pub mod options;
pub mod runner;

use std::io;
use std::path::PathBuf;

use serde::Serialize;
use uuid::Uuid;

pub use classify::{classify, extracted_count, UnpackFailure};
pub use options::{UnpackOptions, DEFAULT_DIRECTORIES};
pub use runner::{JobOutput, JobRunner, TokioProcessRunner};

/// Outcome of one unpack job. Failures are reported here, never raised.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnpackReport {
    pub job_id: String,
    pub success: bool,
    pub message: String,
    pub assets_extracted: Option<u64>,
    pub started_at: String,
    pub finished_at: String,
}

pub struct Unpacker<R> {
    runner: R,
    python: String,
    script: PathBuf,
}

impl<R: JobRunner> Unpacker<R> {
    pub fn new(runner: R, python: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            python: python.into(),
            script: script.into(),
        }
    }

    /// Full argument vector: the script path followed by its flags.
    pub fn command_args(&self, options: &UnpackOptions) -> Vec<String> {
        let mut args = vec![self.script.display().to_string()];
        args.extend(options.to_args());
        args
    }

    pub async fn run(&self, options: &UnpackOptions) -> UnpackReport {
        let job_id = Uuid::new_v4().to_string();
        let started_at = chrono::Utc::now().to_rfc3339();
        let args = self.command_args(options);
        tracing::info!(job_id = %job_id, "starting unpacker: {} {}", self.python, args.join(" "));

        let mut assets_extracted = None;
        let outcome = match self.runner.run(&self.python, &args).await {
            Ok(output) => {
                assets_extracted = extracted_count(&output);
                classify(&output)
            }
            Err(err) => Err(spawn_failure(&self.python, &err)),
        };

        let (success, message) = match outcome {
            Ok(message) => {
                tracing::info!(job_id = %job_id, "unpacker succeeded: {message}");
                (true, message)
            }
            Err(failure) => {
                tracing::warn!(job_id = %job_id, "unpacker failed: {failure}");
                (false, failure.to_string())
            }
        };

        UnpackReport {
            job_id,
            success,
            message,
            assets_extracted,
            started_at,
            finished_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

fn spawn_failure(program: &str, err: &io::Error) -> UnpackFailure {
    if err.kind() == io::ErrorKind::NotFound {
        UnpackFailure::NotFound {
            program: program.to_string(),
        }
    } else {
        UnpackFailure::Spawn {
            program: program.to_string(),
            message: err.to_string(),
        }
    }
}
