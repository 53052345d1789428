use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::from(claat_build::error::exit_code_for(&err));
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    claat_build::logging::init().context("init logging")?;

    let cli = claat_build::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        None => {
            claat_build::build::run(cli.build).await.context("build")?;
        }
        Some(claat_build::cli::Command::Favicon(args)) => {
            claat_build::build::favicon(args).context("favicon")?;
        }
        Some(claat_build::cli::Command::List(args)) => {
            claat_build::build::list(args).context("list")?;
        }
    }

    Ok(())
}
