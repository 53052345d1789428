use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;

use crate::catalog::{Catalog, DocumentSpec};
use crate::claat::{ClaatCommand, ClaatConfig, ExportTool};
use crate::cli::{BuildArgs, FaviconArgs, ListArgs};
use crate::error::BuildError;
use crate::favicon::{self, FileOutcome};
use crate::retry::{RetryPolicy, export_with_retry};
use crate::selection::{self, ArgumentSource, PromptSource, SelectionSource};

/// Settings for a batch of exports, independent of where they came from.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub root: PathBuf,
    pub retry: RetryPolicy,
    pub doc_gap: Duration,
    pub validate: bool,
}

impl BuildPlan {
    pub fn from_args(args: &BuildArgs) -> Self {
        Self {
            root: PathBuf::from(&args.root),
            retry: RetryPolicy {
                max_attempts: args.max_attempts,
                initial_delay: Duration::from_millis(args.initial_backoff_ms),
                max_delay: Duration::from_millis(args.max_backoff_ms),
            },
            doc_gap: Duration::from_millis(args.doc_gap_ms),
            validate: !args.no_validate,
        }
    }
}

pub async fn run(args: BuildArgs) -> anyhow::Result<()> {
    let catalog = Catalog::load_or_builtin(args.catalog.as_deref().map(Path::new))
        .context("load catalog")?;
    let plan = BuildPlan::from_args(&args);

    // An empty argument counts as no argument and falls back to the prompt.
    let mut source: Box<dyn SelectionSource + Send> = match args.selection.clone() {
        Some(selection) if !selection.trim().is_empty() => Box::new(ArgumentSource(selection)),
        _ => Box::new(PromptSource),
    };
    let raw = source.read_selection(&catalog).await?;
    let selected = selection::resolve(&catalog, &raw);
    if selected.is_empty() {
        return Err(BuildError::EmptySelection.into());
    }
    tracing::info!(
        docs = ?selected.iter().map(|doc| doc.name.as_str()).collect::<Vec<_>>(),
        "resolved selection"
    );

    let tool = ClaatCommand::new(ClaatConfig {
        bin: args.claat.clone(),
        root: plan.root.clone(),
    });
    export_all(&tool, &selected, &plan).await?;

    tracing::info!("postbuild: ensuring favicon tags");
    normalize_favicons(&catalog, &plan.root)?;

    println!("Done.");
    Ok(())
}

/// Exports documents one after another, stopping at the first fatal failure.
pub async fn export_all(
    tool: &dyn ExportTool,
    docs: &[DocumentSpec],
    plan: &BuildPlan,
) -> anyhow::Result<()> {
    for (idx, doc) in docs.iter().enumerate() {
        if idx > 0 && !plan.doc_gap.is_zero() {
            tokio::time::sleep(plan.doc_gap).await;
        }

        export_with_retry(tool, doc, &plan.retry)
            .await
            .with_context(|| format!("export {}", doc.name))?;

        if plan.validate {
            crate::validate::validate_output_dir(&plan.root, doc)
                .with_context(|| format!("validate {}", doc.name))?;
        }
    }
    Ok(())
}

pub fn favicon(args: FaviconArgs) -> anyhow::Result<()> {
    let catalog = Catalog::load_or_builtin(args.catalog.as_deref().map(Path::new))
        .context("load catalog")?;
    normalize_favicons(&catalog, Path::new(&args.root))
}

pub fn list(args: ListArgs) -> anyhow::Result<()> {
    let catalog = Catalog::load_or_builtin(args.catalog.as_deref().map(Path::new))
        .context("load catalog")?;
    for doc in catalog.documents() {
        println!(
            "{}. {}: {} -> {}",
            doc.ordinal, doc.name, doc.external_id, doc.output_dir
        );
    }
    Ok(())
}

fn normalize_favicons(catalog: &Catalog, root: &Path) -> anyhow::Result<()> {
    let outcomes = favicon::normalize_files(&catalog.favicon_targets(root))
        .context("normalize favicons")?;
    let updated = outcomes
        .iter()
        .filter(|(_, outcome)| matches!(outcome, FileOutcome::Updated(_)))
        .count();
    tracing::info!(files = outcomes.len(), updated, "favicon pass finished");
    Ok(())
}
