// Git module: subprocess bridge and git-config helpers

mod bridge;

pub use bridge::{BridgeError, GitCli, VcsBridge};

/// Check whether the current directory is inside a git work tree
pub fn is_inside_work_tree() -> bool {
    git2::Repository::discover(".").is_ok_and(|repo| !repo.is_bare())
}
