use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub build: BuildArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Only run the favicon normalization pass.
    Favicon(FaviconArgs),
    /// Print the known documents.
    List(ListArgs),
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Documents to build: ordinals or document ids, e.g. `1,3`.
    /// Prompts on stdin when omitted.
    pub selection: Option<String>,

    /// Build root; claat output directories and `index.html` live here.
    #[arg(long, default_value = ".")]
    pub root: String,

    /// YAML catalog replacing the built-in document list.
    #[arg(long)]
    pub catalog: Option<String>,

    /// claat executable.
    #[arg(long, env = "CLAAT_BUILD_CLAAT_BIN", default_value = "claat")]
    pub claat: String,

    /// Export attempts per document while rate limited.
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: u32,

    /// First back-off delay after a 429; doubles on every retry.
    #[arg(long, default_value_t = 5000)]
    pub initial_backoff_ms: u64,

    /// Upper bound for the back-off delay.
    #[arg(long, default_value_t = 60000)]
    pub max_backoff_ms: u64,

    /// Pause between documents (politeness towards the export backend).
    #[arg(long, default_value_t = 1500)]
    pub doc_gap_ms: u64,

    /// Skip checking `<output_dir>/index.html` after each export.
    #[arg(long)]
    pub no_validate: bool,
}

#[derive(Debug, Args)]
pub struct FaviconArgs {
    /// Build root containing the generated HTML.
    #[arg(long, default_value = ".")]
    pub root: String,

    /// YAML catalog replacing the built-in document list.
    #[arg(long)]
    pub catalog: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// YAML catalog replacing the built-in document list.
    #[arg(long)]
    pub catalog: Option<String>,
}
