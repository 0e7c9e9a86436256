//! Invocation of the external SuperPMI `asmdiffs` driver and archiving of
//! the working artifacts each run leaves behind.

mod error;

pub mod archive;
pub mod invoke;

pub use archive::archive_run;
pub use error::SuperpmiError;
pub use invoke::{AsmDiffsRequest, run_asmdiffs};
