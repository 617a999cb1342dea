use clap::Args;

use deskforge::cleanup::{self, CleanupOptions, CleanupResult};
use deskforge::config;
use deskforge::hosting::HostingClient;
use deskforge::logger::RunLogger;

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct CleanupArgs {
    /// Preview matches without deleting (configuration default)
    #[arg(long, conflicts_with = "no_dry_run")]
    dry_run: bool,

    /// Actually delete matched repositories
    #[arg(long)]
    no_dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,
}

pub fn run(args: CleanupArgs, global: &GlobalArgs) -> CmdResult<CleanupResult> {
    let config = config::load(&global.config_path)?;

    // CLI flags override the configured default.
    let dry_run = if args.no_dry_run {
        false
    } else if args.dry_run {
        true
    } else {
        config.cleanup.dry_run
    };

    let logger = RunLogger::create(&config.log_file)?;
    let hosting = HostingClient::new(&config.api_base, &config.github_token)?;

    let result = cleanup::run(
        &hosting,
        &config.cleanup,
        CleanupOptions {
            dry_run,
            assume_yes: args.yes,
        },
        &logger,
    )?;
    logger.flush();

    let exit_code = if result.summary.failed > 0 { 1 } else { 0 };
    Ok((result, exit_code))
}
