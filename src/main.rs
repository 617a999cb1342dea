use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{build, cleanup, GlobalArgs};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "deskforge")]
#[command(version = VERSION)]
#[command(about = "Build and publish customized remote-desktop client forks")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = deskforge::config::DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full build-and-publish pipeline
    Build(build::BuildArgs),
    /// Delete published repositories matching the configured patterns
    Cleanup(cleanup::CleanupArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let global = GlobalArgs {
        config_path: std::path::PathBuf::from(shellexpand::tilde(&cli.config).to_string()),
    };

    let (json_result, exit_code) = commands::run_json(cli.command, &global);
    output::print_json_result(json_result);

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
