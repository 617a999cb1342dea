mod primitives;
mod submodules;
mod tags;

pub use primitives::*;
pub use submodules::*;
pub use tags::*;

use std::process::Command;

fn execute_git(path: &str, args: &[&str]) -> std::io::Result<std::process::Output> {
    Command::new("git").args(args).current_dir(path).output()
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;
    use std::process::Command;

    pub fn git(path: &Path, args: &[&str]) {
        let output = Command::new("git")
            .args(args)
            .current_dir(path)
            .output()
            .expect("Failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    /// Initialize a repository with a configured identity and one commit.
    pub fn init_repo(path: &Path) {
        git(path, &["init"]);
        git(path, &["config", "user.email", "test@test.com"]);
        git(path, &["config", "user.name", "Test User"]);
        std::fs::write(path.join("README.md"), "seed").expect("Failed to write file");
        git(path, &["add", "."]);
        git(path, &["commit", "-m", "seed"]);
    }

    /// git blocks file-protocol submodule clones by default; tests that wire
    /// submodules between local fixtures opt back in. Repository-local config
    /// does not reach the spawned clone, so this goes through a global config
    /// file shared by the whole test process.
    pub fn enable_file_protocol() {
        static INIT: std::sync::Once = std::sync::Once::new();
        INIT.call_once(|| {
            let config_path = std::env::temp_dir().join("deskforge-test-gitconfig");
            let _ = std::fs::write(&config_path, "[protocol \"file\"]\n\tallow = always\n");
            std::env::set_var("GIT_CONFIG_GLOBAL", &config_path);
        });
    }
}
