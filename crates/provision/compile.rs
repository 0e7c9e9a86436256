//! Drivers for the runtime build entry points and the jitutils bootstrap.

use std::path::{Path, PathBuf};

use jitdiff_common::exec::ExternalCommand;
use jitdiff_config::{BuildConfig, JitutilsConfig, platform};
use tracing::info;

use crate::{ProvisionError, git};

/// Builds the runtime and libraries in the configured flavor. Streams the
/// build output through and blocks until it finishes.
pub fn build_runtime(runtime_dir: &Path, build: &BuildConfig) -> Result<(), ProvisionError> {
    let script = resolve_script(platform::build_script(runtime_dir))?;
    info!(flavor = %build.flavor, "building runtime (clr+libs)");
    ExternalCommand::new(script)
        .arg("clr+libs")
        .arg("-c")
        .arg(build.flavor.artifact_segment())
        .current_dir(runtime_dir)
        .run()?;
    Ok(())
}

/// Generates the Core_Root test layout for the configured architecture and
/// flavor without building the tests themselves.
pub fn build_test_layout(runtime_dir: &Path, build: &BuildConfig) -> Result<(), ProvisionError> {
    let script = resolve_script(platform::test_build_script(runtime_dir))?;
    info!(arch = %build.arch, flavor = %build.flavor, "generating test layout");
    ExternalCommand::new(script)
        .arg(build.arch.as_str())
        .arg(build.flavor.to_string())
        .arg("generatelayoutonly")
        .current_dir(runtime_dir)
        .run()?;
    Ok(())
}

/// Clones jitutils when absent and runs its bootstrap script.
pub fn setup_jitutils(config: &JitutilsConfig) -> Result<(), ProvisionError> {
    git::ensure_cloned(&config.url, &config.dir)?;
    let script = resolve_script(platform::bootstrap_script(&config.dir))?;
    info!(dir = %config.dir.display(), "bootstrapping jitutils");
    ExternalCommand::new(script).current_dir(&config.dir).run()?;
    Ok(())
}

// Scripts get canonicalized so they still resolve once the spawned process
// switches its working directory into the repo.
fn resolve_script(script: PathBuf) -> Result<PathBuf, ProvisionError> {
    script
        .canonicalize()
        .map_err(|_| ProvisionError::MissingArtifact(script))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_script_is_reported_as_missing_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let err = build_runtime(tmp.path(), &BuildConfig::default()).unwrap_err();
        match err {
            ProvisionError::MissingArtifact(path) => {
                assert_eq!(path, platform::build_script(tmp.path()));
            }
            other => panic!("expected missing artifact, got {other:?}"),
        }
    }

    #[test]
    fn setup_jitutils_requires_the_bootstrap_script() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("jitutils");
        fs::create_dir_all(&dir).unwrap();
        let config = JitutilsConfig {
            url: "https://example.invalid/jitutils.git".to_string(),
            dir: dir.clone(),
        };
        let err = setup_jitutils(&config).unwrap_err();
        match err {
            ProvisionError::MissingArtifact(path) => {
                assert_eq!(path, platform::bootstrap_script(&dir));
            }
            other => panic!("expected missing artifact, got {other:?}"),
        }
    }

    #[test]
    fn resolve_script_returns_absolute_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("build.sh");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        let resolved = resolve_script(script).unwrap();
        assert!(resolved.is_absolute());
    }
}
