use std::{io, path::PathBuf};

use jitdiff_common::exec::CommandError;

#[derive(Debug, thiserror::Error)]
pub enum SuperpmiError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("staged JIT binary is missing: {}", .0.display())]
    MissingJit(PathBuf),
    #[error("superpmi driver script is missing: {}", .0.display())]
    MissingScript(PathBuf),
    #[error("asmdiffs finished without producing its report: {}", .0.display())]
    MissingReport(PathBuf),
    #[error(transparent)]
    Io(#[from] io::Error),
}
