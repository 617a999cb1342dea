use clap::Args;

use deskforge::config;
use deskforge::logger::RunLogger;
use deskforge::pipeline::{BuildPipeline, PipelineRun};

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct BuildArgs {
    /// Override the configured workspace root
    #[arg(long)]
    workspace: Option<String>,
}

pub fn run(args: BuildArgs, global: &GlobalArgs) -> CmdResult<PipelineRun> {
    let mut config = config::load(&global.config_path)?;
    if let Some(workspace) = args.workspace {
        config.workspace_root =
            std::path::PathBuf::from(shellexpand::tilde(&workspace).to_string());
    }

    let logger = RunLogger::create(&config.log_file)?;
    let pipeline = BuildPipeline::new(&config, &logger)?;

    match pipeline.run() {
        Ok(run) => {
            logger.flush();
            Ok((run, 0))
        }
        Err(e) => {
            logger.error("pipeline", format!("Run failed: {}", e));
            logger.flush();
            Err(e)
        }
    }
}
