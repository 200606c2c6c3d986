pub mod commands;

use std::path::PathBuf;

use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(name = "feedpocket")]
#[command(about = "Send new RSS/Atom items to Pocket", long_about = None)]
#[command(version, disable_version_flag = true)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Log debug output
    #[arg(long)]
    pub verbose: bool,

    /// Find new items without delivering them or updating snapshots
    #[arg(long)]
    pub dry_run: bool,

    /// Print version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    pub version: Option<bool>,
}

/// Result of parsing the command line.
#[derive(Debug)]
pub enum Invocation {
    Run(Cli),
    /// Help or version was requested; print and exit successfully.
    Info(clap::Error),
    /// Usage error; print and exit with status 1.
    Usage(clap::Error),
}

pub fn parse_args<I, T>(args: I) -> Invocation
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    use clap::error::ErrorKind;

    match Cli::try_parse_from(args) {
        Ok(cli) => Invocation::Run(cli),
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => Invocation::Info(e),
            _ => Invocation::Usage(e),
        },
    }
}
