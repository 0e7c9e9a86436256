//! Invocation of `superpmi.py asmdiffs`, one run per diff configuration.

use std::{
    fs,
    path::{Path, PathBuf},
};

use jitdiff_common::{exec::ExternalCommand, fs::remove_dir_if_exists};
use jitdiff_config::{DiffConfig, JitOption, ResultsLayout, platform};
use tracing::info;

use crate::SuperpmiError;

/// One asmdiffs invocation: which staged JIT binaries to compare and under
/// which option set.
#[derive(Debug)]
pub struct AsmDiffsRequest<'a> {
    pub runtime_dir: &'a Path,
    pub layout: &'a ResultsLayout,
    pub base_name: &'a str,
    pub diff_name: &'a str,
    pub base_options: &'a [JitOption],
    pub config: &'a DiffConfig,
    pub filter: Option<&'a str>,
}

/// Runs `superpmi.py asmdiffs` for the request, blocking with inherited
/// stdio, and returns the path of the detail report it produced.
pub fn run_asmdiffs(request: &AsmDiffsRequest<'_>) -> Result<PathBuf, SuperpmiError> {
    // Leftovers from an earlier run would get mixed into this one.
    remove_dir_if_exists(&platform::spmi_working_dir(request.runtime_dir))?;

    // The spawned process changes its working directory into the runtime
    // tree, so everything passed on the command line must stay resolvable
    // from there.
    fs::create_dir_all(request.layout.root())?;
    let layout = ResultsLayout::new(request.layout.root().canonicalize()?);

    let base_jit = staged_jit(&layout, request.base_name)?;
    let diff_jit = staged_jit(&layout, request.diff_name)?;
    let label = request.config.label();
    let report = layout.report_path(&label);

    let script = platform::superpmi_script(request.runtime_dir);
    let script = script
        .canonicalize()
        .map_err(|_| SuperpmiError::MissingScript(script))?;

    info!(label = %label, report = %report.display(), "running superpmi asmdiffs");
    ExternalCommand::new("python")
        .args(asmdiffs_args(
            &script,
            &report,
            &base_jit,
            &diff_jit,
            request.base_options,
            &request.config.options,
            request.filter,
        ))
        .current_dir(request.runtime_dir)
        .run()?;

    if !report.is_file() {
        return Err(SuperpmiError::MissingReport(report));
    }
    Ok(report)
}

fn staged_jit(layout: &ResultsLayout, name: &str) -> Result<PathBuf, SuperpmiError> {
    let jit = layout.staged_dir(name).join(platform::jit_library_name());
    if jit.is_file() {
        Ok(jit)
    } else {
        Err(SuperpmiError::MissingJit(jit))
    }
}

// superpmi.py uses single-dash long flags; order follows its usage text.
fn asmdiffs_args(
    script: &Path,
    report: &Path,
    base_jit: &Path,
    diff_jit: &Path,
    base_options: &[JitOption],
    diff_options: &[JitOption],
    filter: Option<&str>,
) -> Vec<String> {
    let mut args = vec![
        script.display().to_string(),
        "asmdiffs".to_string(),
        "-details".to_string(),
        report.display().to_string(),
        "-base_jit_path".to_string(),
        base_jit.display().to_string(),
        "-diff_jit_path".to_string(),
        diff_jit.display().to_string(),
    ];
    for option in base_options {
        args.push("-base_jit_option".to_string());
        args.push(option.to_string());
    }
    for option in diff_options {
        args.push("-diff_jit_option".to_string());
        args.push(option.to_string());
    }
    if let Some(filter) = filter {
        args.push("-filter".to_string());
        args.push(filter.to_string());
    }
    args
}
