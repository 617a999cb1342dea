use std::path::PathBuf;

use serde_json::Value;

pub mod build;
pub mod cleanup;

pub type CmdResult<T> = deskforge::Result<(T, i32)>;

pub(crate) struct GlobalArgs {
    pub config_path: PathBuf,
}

pub(crate) fn run_json(command: crate::Commands, global: &GlobalArgs) -> (deskforge::Result<Value>, i32) {
    match command {
        crate::Commands::Build(args) => {
            crate::output::map_cmd_result_to_json(build::run(args, global))
        }
        crate::Commands::Cleanup(args) => {
            crate::output::map_cmd_result_to_json(cleanup::run(args, global))
        }
    }
}
