//! OS-dependent names of runtime build scripts and artifact locations.

use std::path::{Path, PathBuf};

use crate::BuildConfig;

/// File name of the JIT shared library produced by the runtime build.
pub fn jit_library_name() -> &'static str {
    if cfg!(windows) {
        "clrjit.dll"
    } else if cfg!(target_os = "macos") {
        "libclrjit.dylib"
    } else {
        "libclrjit.so"
    }
}

/// OS segment used in artifact directory names.
pub fn os_segment() -> &'static str {
    if cfg!(windows) {
        "windows"
    } else if cfg!(target_os = "macos") {
        "osx"
    } else {
        "linux"
    }
}

fn script_name(stem: &str) -> String {
    if cfg!(windows) {
        format!("{stem}.cmd")
    } else {
        format!("{stem}.sh")
    }
}

/// Top-level runtime build entry point.
pub fn build_script(runtime_dir: &Path) -> PathBuf {
    runtime_dir.join(script_name("build"))
}

/// Test tree build entry point, under `src/tests`.
pub fn test_build_script(runtime_dir: &Path) -> PathBuf {
    runtime_dir
        .join("src")
        .join("tests")
        .join(script_name("build"))
}

/// jitutils bootstrap entry point.
pub fn bootstrap_script(jitutils_dir: &Path) -> PathBuf {
    jitutils_dir.join(script_name("bootstrap"))
}

/// SuperPMI driver script shipped inside the runtime tree.
pub fn superpmi_script(runtime_dir: &Path) -> PathBuf {
    runtime_dir
        .join("src")
        .join("coreclr")
        .join("scripts")
        .join("superpmi.py")
}

/// Where the test layout build drops Core_Root for the given configuration.
pub fn core_root_dir(runtime_dir: &Path, build: &BuildConfig) -> PathBuf {
    runtime_dir
        .join("artifacts")
        .join("tests")
        .join("coreclr")
        .join(format!(
            "{}.{}.{}",
            os_segment(),
            build.arch,
            build.flavor.artifact_segment()
        ))
        .join("Tests")
        .join("Core_Root")
}

/// Scratch directory SuperPMI replays into; cleared before every run.
pub fn spmi_working_dir(runtime_dir: &Path) -> PathBuf {
    runtime_dir.join("artifacts").join("spmi")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_root_dir_encodes_build_configuration() {
        let build = BuildConfig::default();
        let dir = core_root_dir(Path::new("runtime"), &build);
        let rendered = dir.to_string_lossy().replace('\\', "/");
        assert!(rendered.starts_with("runtime/artifacts/tests/coreclr/"));
        assert!(rendered.contains(&format!("{}.x64.Checked", os_segment())));
        assert!(rendered.ends_with("Tests/Core_Root"));
    }

    #[test]
    fn scripts_live_in_expected_subtrees() {
        let runtime = Path::new("runtime");
        let rendered = superpmi_script(runtime).to_string_lossy().replace('\\', "/");
        assert_eq!(rendered, "runtime/src/coreclr/scripts/superpmi.py");
        assert!(
            test_build_script(runtime)
                .to_string_lossy()
                .replace('\\', "/")
                .starts_with("runtime/src/tests/build.")
        );
    }
}
