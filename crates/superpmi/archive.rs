//! Archiving of the SuperPMI working directory after a run.

use std::{ffi::OsStr, path::Path};

use jitdiff_common::fs::{clear_dir, move_dir_contents};
use jitdiff_config::{ResultsLayout, platform};
use tracing::info;

use crate::SuperpmiError;

// The collection cache is shared across runs and never archived.
const MCH_CACHE_DIR: &str = "mch";

/// Moves the replay artifacts of one run into the per-label archive
/// directory and empties the working directory. Returns how many entries
/// were archived.
pub fn archive_run(
    runtime_dir: &Path,
    layout: &ResultsLayout,
    label: &str,
) -> Result<usize, SuperpmiError> {
    let working = platform::spmi_working_dir(runtime_dir);
    if !working.is_dir() {
        info!(dir = %working.display(), "nothing to archive");
        return Ok(0);
    }
    let archive = layout.archive_dir(label);
    let archived = move_dir_contents(&working, &archive, &[OsStr::new(MCH_CACHE_DIR)])?;
    let discarded = clear_dir(&working)?;
    info!(archived, discarded, dst = %archive.display(), "archived replay artifacts");
    Ok(archived)
}
