//! Shared plumbing for the jitdiff tools: external command execution and
//! the filesystem staging helpers provisioning and measurement lean on.

pub mod exec;
pub mod fs;
