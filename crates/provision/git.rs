//! Git operations that pin the runtime and jitutils checkouts to a known
//! state before anything gets built from them.

use std::path::Path;

use jitdiff_common::exec::ExternalCommand;
use jitdiff_config::{RepoConfig, SAFE_DEFAULT_BRANCH};
use tracing::info;

use crate::ProvisionError;

/// Clones the repository unless its directory already exists. Returns
/// whether a clone actually ran. An existing directory is trusted as-is.
pub fn ensure_cloned(url: &str, dir: &Path) -> Result<bool, ProvisionError> {
    if dir.exists() {
        info!(dir = %dir.display(), "directory already exists, skipping clone");
        return Ok(false);
    }
    info!(url, dir = %dir.display(), "cloning repository");
    ExternalCommand::new("git")
        .arg("clone")
        .arg(url)
        .arg_path(dir)
        .run()?;
    Ok(true)
}

/// Switches the checkout back to the safe default branch.
pub fn switch_to_default(dir: &Path) -> Result<(), ProvisionError> {
    git_in(dir).args(["checkout", SAFE_DEFAULT_BRANCH]).run()?;
    info!(branch = SAFE_DEFAULT_BRANCH, dir = %dir.display(), "switched to default branch");
    Ok(())
}

/// Forces a fresh local checkout of the repository's configured branch,
/// tracking `origin`. A no-op when no branch is configured.
///
/// Any stale local branch with the same name is deleted first, so the
/// checkout always reflects the remote tip. Local-only commits on that
/// branch do not survive.
pub fn checkout_remote_branch(repo: &RepoConfig) -> Result<(), ProvisionError> {
    let Some(branch) = repo.branch.as_deref() else {
        return Ok(());
    };
    // The default branch is the parking spot for deletions; it can only be
    // switched to, never recreated from the remote.
    if branch == SAFE_DEFAULT_BRANCH {
        return switch_to_default(&repo.dir);
    }
    delete_local_branch(&repo.dir, branch)?;
    git_in(&repo.dir).args(["fetch", "origin"]).run()?;
    git_in(&repo.dir)
        .args(["checkout", "-b", branch])
        .arg(format!("origin/{branch}"))
        .run()?;
    info!(branch, dir = %repo.dir.display(), "checked out remote branch");
    Ok(())
}

fn delete_local_branch(dir: &Path, branch: &str) -> Result<(), ProvisionError> {
    let listed = git_in(dir).args(["branch", "--list", branch]).capture()?;
    if !listed.stdout.contains(branch) {
        return Ok(());
    }
    // The branch may be checked out; park on the default branch first.
    git_in(dir).args(["checkout", SAFE_DEFAULT_BRANCH]).run()?;
    git_in(dir).args(["branch", "-D", branch]).run()?;
    info!(branch, "deleted stale local branch");
    Ok(())
}

fn git_in(dir: &Path) -> ExternalCommand {
    ExternalCommand::new("git").current_dir(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_cloned_skips_existing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let cloned = ensure_cloned("https://example.invalid/repo.git", tmp.path()).unwrap();
        assert!(!cloned);
    }

    #[test]
    fn checkout_without_branch_is_a_noop() {
        let repo = RepoConfig::new("https://example.invalid/repo.git", "does-not-exist");
        checkout_remote_branch(&repo).unwrap();
    }
}
