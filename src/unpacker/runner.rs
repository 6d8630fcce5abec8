//! Out-of-process job execution behind a trait, so the unpacker logic can
//! run against a fake in tests.

use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl JobOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines().chain(self.stderr.lines())
    }
}

#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Runs `program` to completion. Spawn failures are the only `Err`.
    async fn run(&self, program: &str, args: &[String]) -> io::Result<JobOutput>;
}

/// Runs jobs as child processes, streaming their output to the log as it
/// arrives. Jobs are never cancelled once spawned.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

async fn collect_lines<R>(stream: Option<R>, job: &'static str) -> io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return Ok(String::new());
    };
    let mut collected = String::new();
    let mut lines = BufReader::new(stream).lines();
    while let Some(line) = lines.next_line().await? {
        tracing::info!(target: "myrtle::unpacker", "[{job}] {line}");
        collected.push_str(&line);
        collected.push('\n');
    }
    Ok(collected)
}

#[async_trait]
impl JobRunner for TokioProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> io::Result<JobOutput> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = collect_lines(child.stdout.take(), "stdout");
        let stderr = collect_lines(child.stderr.take(), "stderr");
        let (stdout, stderr) = tokio::try_join!(stdout, stderr)?;
        let status = child.wait().await?;

        Ok(JobOutput {
            exit_code: status.code(),
            stdout,
            stderr,
        })
    }
}
