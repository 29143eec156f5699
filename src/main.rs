use clap::Parser;
use microversion::cli::{run_cli, Cli};
use microversion::logging::{init_logging_with_config, LogConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // Logs go to stderr; stdout carries the command's JSON output.
    let _guard = init_logging_with_config(&LogConfig::from_env())?;
    run_cli(cli)
}
