use std::path::PathBuf;

/// Failures that end a build with a specific exit code.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no valid document selected; enter ordinals or document ids, e.g. `1,3`")]
    EmptySelection,

    #[error("claat export failed for {doc} ({})", describe_code(.code))]
    ExportFailed { doc: String, code: Option<i32> },

    #[error("claat export for {doc} still rate limited after {attempts} attempts ({})", describe_code(.code))]
    RateLimitExhausted {
        doc: String,
        attempts: u32,
        code: Option<i32>,
    },

    #[error(
        "output directory not found: {}; claat wrote somewhere unexpected, pass an explicit -o target",
        .dir.display()
    )]
    MissingOutputDir { dir: PathBuf },

    #[error(
        "{} not found; check whether claat nested its output in a subdirectory",
        .path.display()
    )]
    MissingIndex { path: PathBuf },
}

impl BuildError {
    /// Process exit code for this failure. Export failures propagate the
    /// tool's own code when it is a usable non-zero value.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ExportFailed { code, .. } | Self::RateLimitExhausted { code, .. } => code
                .and_then(|code| u8::try_from(code).ok())
                .filter(|code| *code != 0)
                .unwrap_or(1),
            Self::EmptySelection | Self::MissingOutputDir { .. } | Self::MissingIndex { .. } => 1,
        }
    }
}

/// Exit code for an arbitrary error chain.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<BuildError>())
        .map_or(1, BuildError::exit_code)
}

fn describe_code(code: &Option<i32>) -> String {
    match *code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_owned(),
    }
}
