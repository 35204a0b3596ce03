mod cli;

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use ec2diff::app::{self, supported_attributes_text};
use ec2diff::output;
use ec2diff::providers;
use ec2diff::terraform::ParserRegistry;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            err.print()?;
            return Ok(if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            });
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if cli.list_attributes {
        let mut stdout = io::stdout().lock();
        stdout.write_all(supported_attributes_text().as_bytes())?;
        stdout.flush()?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = cli.run_config()?;
    let declared = app::load_declared(&config, &ParserRegistry::default())?;
    let fetcher = providers::get_fetcher("aws", &cli.fetch_config()).await?;

    let stdout = io::stdout().lock();
    let mut printer = output::printer(cli.output, stdout);
    let reports = app::execute(&config, declared, fetcher.as_ref(), printer.as_mut()).await?;
    tracing::info!(count = reports.len(), "drift detection complete");

    Ok(ExitCode::SUCCESS)
}
