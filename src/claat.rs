use std::io::Write as _;
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::Context as _;
use regex::Regex;
use tokio::process::Command;

use crate::catalog::DocumentSpec;

static RATE_LIMIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)429|Too\s+Many\s+Requests").expect("Invalid rate limit regex")
});

/// Captured result of one export attempt.
#[derive(Debug, Clone, Default)]
pub struct ExportOutput {
    /// Exit code, `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExportOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }

    pub fn is_rate_limited(&self) -> bool {
        is_rate_limited(&self.combined())
    }
}

/// Whether tool output carries an HTTP 429 / "Too Many Requests" signature.
pub fn is_rate_limited(text: &str) -> bool {
    RATE_LIMIT_RE.is_match(text)
}

#[async_trait::async_trait]
pub trait ExportTool: Send + Sync {
    async fn export(&self, doc: &DocumentSpec) -> anyhow::Result<ExportOutput>;
}

#[derive(Debug, Clone)]
pub struct ClaatConfig {
    pub bin: String,
    /// Working directory; `-o` targets are relative to it.
    pub root: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ClaatCommand {
    config: ClaatConfig,
}

impl ClaatCommand {
    pub fn new(config: ClaatConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl ExportTool for ClaatCommand {
    async fn export(&self, doc: &DocumentSpec) -> anyhow::Result<ExportOutput> {
        tracing::info!(
            bin = %self.config.bin,
            id = %doc.external_id,
            out = %doc.output_dir,
            "claat export"
        );

        let output = Command::new(&self.config.bin)
            .args(["export", "-o", doc.output_dir.as_str(), doc.external_id.as_str()])
            .current_dir(&self.config.root)
            .output()
            .await
            .with_context(|| format!("run claat: {}", self.config.bin))?;

        let output = ExportOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        // Captured for rate limit detection, but the user still sees it.
        std::io::stdout()
            .write_all(output.stdout.as_bytes())
            .context("forward claat stdout")?;
        std::io::stderr()
            .write_all(output.stderr.as_bytes())
            .context("forward claat stderr")?;

        Ok(output)
    }
}
