use std::{io, path::PathBuf};

use jitdiff_common::exec::CommandError;

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("expected artifact is missing: {}", .0.display())]
    MissingArtifact(PathBuf),
    #[error("failed to stage {} into {}: {source}", .src.display(), .dst.display())]
    Stage {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}
