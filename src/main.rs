// Entrypoint for the uploader binary.
// - Argument errors (including a `--file` that does not exist) are reported
//   by clap with usage, exiting with status 2.
// - Any failure after that is printed to stderr and exits with status 1.

use anyhow::{Context, Result};
use dataqueue_uploader::{cli::Cli, ui, UploadError, Uploader};
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout carries only the server response.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let cli = Cli::parse_checked();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let stage = e.downcast_ref::<UploadError>().and_then(UploadError::stage);
            tracing::debug!(stage = ?stage, error = ?e, "upload failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.into_config();
    let path = config.path.display().to_string();

    let uploader = Uploader::new(config).context("Failed to set up uploader")?;
    let body = uploader
        .run()
        .with_context(|| format!("Failed to upload {path}"))?;

    ui::print_response(&mut std::io::stdout().lock(), &body)
        .context("Failed to write response")?;
    Ok(())
}
