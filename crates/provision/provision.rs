//! Provisioning of everything a measurement run depends on: cloned source
//! trees pinned to the right branches, built runtime artifacts, and staged
//! copies of the Core_Root layout.

mod error;

pub mod compile;
pub mod git;
pub mod stage;

pub use error::ProvisionError;
