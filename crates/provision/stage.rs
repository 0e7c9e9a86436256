//! Staging of built Core_Root trees into the results directory under
//! distinct names, one per side of the comparison.

use std::{
    fs,
    path::{Path, PathBuf},
};

use jitdiff_common::fs::replace_dir;
use jitdiff_config::{BuildConfig, ResultsLayout, platform};
use tracing::info;

use crate::ProvisionError;

/// Copies the built Core_Root into the results layout under `name`,
/// replacing any previous copy of the same name. Returns the staged path.
pub fn stage_core_root(
    runtime_dir: &Path,
    build: &BuildConfig,
    layout: &ResultsLayout,
    name: &str,
) -> Result<PathBuf, ProvisionError> {
    let core_root = platform::core_root_dir(runtime_dir, build);
    if !core_root.is_dir() {
        return Err(ProvisionError::MissingArtifact(core_root));
    }
    fs::create_dir_all(layout.root())?;
    let staged = layout.staged_dir(name);
    info!(src = %core_root.display(), dst = %staged.display(), "staging Core_Root");
    replace_dir(&core_root, &staged).map_err(|source| ProvisionError::Stage {
        src: core_root,
        dst: staged.clone(),
        source,
    })?;
    Ok(staged)
}
