use std::process::ExitCode;

use feedpocket::cli::{commands, parse_args, Invocation};
use feedpocket::config::Config;
use feedpocket::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match parse_args(std::env::args_os()) {
        Invocation::Run(cli) => cli,
        Invocation::Info(e) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Invocation::Usage(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    logging::init(cli.verbose);

    match run(cli.config, cli.dry_run).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config_path: std::path::PathBuf, dry_run: bool) -> anyhow::Result<()> {
    let config = Config::load(&config_path)?;
    commands::run(config, dry_run).await?;
    Ok(())
}
