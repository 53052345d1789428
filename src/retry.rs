use std::time::Duration;

use crate::catalog::DocumentSpec;
use crate::claat::ExportTool;
use crate::error::BuildError;

/// Bounded exponential back-off for rate limited exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
        }
    }
}

/// Retry state: the current attempt (1-based) and the delay to wait before
/// the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub attempt: u32,
    pub delay: Duration,
}

impl Backoff {
    pub fn start(policy: &RetryPolicy) -> Self {
        Self {
            attempt: 1,
            delay: policy.initial_delay.min(policy.max_delay),
        }
    }

    /// State after waiting `self.delay`, or `None` once the budget is spent.
    pub fn next(self, policy: &RetryPolicy) -> Option<Self> {
        if self.attempt >= policy.max_attempts {
            return None;
        }
        Some(Self {
            attempt: self.attempt + 1,
            delay: self.delay.saturating_mul(2).min(policy.max_delay),
        })
    }
}

/// Exports `doc`, retrying only while the tool reports rate limiting.
///
/// Any other failure, or a rate limit on the last attempt, is returned as a
/// [`BuildError`] carrying the tool's exit code.
pub async fn export_with_retry(
    tool: &dyn ExportTool,
    doc: &DocumentSpec,
    policy: &RetryPolicy,
) -> anyhow::Result<()> {
    let mut state = Backoff::start(policy);

    loop {
        tracing::info!(
            doc = %doc.name,
            attempt = state.attempt,
            max_attempts = policy.max_attempts,
            out = %doc.output_dir,
            "exporting"
        );

        let output = tool.export(doc).await?;
        if output.success() {
            return Ok(());
        }

        if !output.is_rate_limited() {
            return Err(BuildError::ExportFailed {
                doc: doc.name.clone(),
                code: output.code,
            }
            .into());
        }

        let Some(next) = state.next(policy) else {
            return Err(BuildError::RateLimitExhausted {
                doc: doc.name.clone(),
                attempts: state.attempt,
                code: output.code,
            }
            .into());
        };

        tracing::warn!(
            doc = %doc.name,
            wait_secs = state.delay.as_secs_f64(),
            "claat reported 429 Too Many Requests; retrying"
        );
        tokio::time::sleep(state.delay).await;
        state = next;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use tokio::time::Instant;

    use super::*;
    use crate::catalog::Catalog;
    use crate::claat::ExportOutput;
    use crate::error::exit_code_for;

    struct ScriptedTool {
        responses: Mutex<VecDeque<ExportOutput>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedTool {
        fn new(responses: Vec<ExportOutput>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().expect("calls mutex").clone()
        }
    }

    #[async_trait::async_trait]
    impl ExportTool for ScriptedTool {
        async fn export(&self, _doc: &DocumentSpec) -> anyhow::Result<ExportOutput> {
            self.calls.lock().expect("calls mutex").push(Instant::now());
            self.responses
                .lock()
                .expect("responses mutex")
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("no scripted response left"))
        }
    }

    fn ok() -> ExportOutput {
        ExportOutput {
            code: Some(0),
            stdout: "ok\n".to_owned(),
            stderr: String::new(),
        }
    }

    fn failed(code: i32, stderr: &str) -> ExportOutput {
        ExportOutput {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_owned(),
        }
    }

    fn doc() -> DocumentSpec {
        Catalog::builtin().documents()[0].clone()
    }

    fn gaps(times: &[Instant]) -> Vec<Duration> {
        times.windows(2).map(|w| w[1] - w[0]).collect()
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        let mut state = Backoff::start(&policy);
        let mut delays = vec![state.delay];
        while let Some(next) = state.next(&policy) {
            state = next;
            delays.push(state.delay);
        }

        assert_eq!(state.attempt, 5);
        assert_eq!(
            delays,
            [5, 10, 20, 40, 60].map(Duration::from_secs).to_vec()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn retries_rate_limited_export_with_growing_delay() -> anyhow::Result<()> {
        let tool = ScriptedTool::new(vec![
            failed(1, "googleapi: Error 429: Too Many Requests"),
            failed(1, "429"),
            ok(),
        ]);

        export_with_retry(&tool, &doc(), &RetryPolicy::default()).await?;

        let times = tool.call_times();
        assert_eq!(times.len(), 3);
        assert_eq!(
            gaps(&times),
            vec![Duration::from_secs(5), Duration::from_secs(10)]
        );
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn non_rate_limit_failure_is_not_retried() {
        let tool = ScriptedTool::new(vec![failed(3, "permission denied"), ok()]);

        let err = export_with_retry(&tool, &doc(), &RetryPolicy::default())
            .await
            .unwrap_err();

        assert_eq!(tool.call_times().len(), 1);
        assert_eq!(exit_code_for(&err), 3);
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::ExportFailed { code: Some(3), .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: 3,
            ..RetryPolicy::default()
        };
        let tool = ScriptedTool::new(vec![
            failed(2, "429"),
            failed(2, "429"),
            failed(2, "429"),
            ok(),
        ]);

        let err = export_with_retry(&tool, &doc(), &policy)
            .await
            .unwrap_err();

        let times = tool.call_times();
        assert_eq!(times.len(), 3);
        assert_eq!(
            gaps(&times),
            vec![Duration::from_secs(5), Duration::from_secs(10)]
        );
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::RateLimitExhausted { attempts: 3, .. })
        ));
        assert_eq!(exit_code_for(&err), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn spawn_errors_are_fatal() {
        let tool = ScriptedTool::new(Vec::new());
        let err = export_with_retry(&tool, &doc(), &RetryPolicy::default())
            .await
            .unwrap_err();
        assert_eq!(exit_code_for(&err), 1);
    }
}
