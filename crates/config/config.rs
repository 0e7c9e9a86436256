//! Configuration for a jitdiff run: which repositories get provisioned, how
//! the runtime is built, which JIT option sets are measured against each
//! other, and where the results land on disk.

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

pub mod platform;

pub const DEFAULT_RUNTIME_URL: &str = "https://github.com/dotnet/runtime.git";
pub const DEFAULT_RUNTIME_DIR: &str = "runtime";
pub const DEFAULT_JITUTILS_URL: &str = "https://github.com/dotnet/jitutils.git";
pub const DEFAULT_JITUTILS_DIR: &str = "jitutils";
pub const DEFAULT_RESULTS_DIR: &str = "runResults";
/// Directory name under the results root that staged base binaries get.
pub const DEFAULT_BASE_NAME: &str = "base";
/// Branch we park on while deleting a stale local copy of the target branch.
pub const SAFE_DEFAULT_BRANCH: &str = "main";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JIT option {0:?} is not of the form key=value")]
    MalformedOption(String),
    #[error("JIT option {0:?} has an empty key")]
    EmptyOptionKey(String),
    #[error("unknown build flavor {0:?} (expected checked, release or debug)")]
    UnknownFlavor(String),
}

/// A git repository the run depends on, and optionally the branch it must
/// be sitting on before anything is built from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    pub url: String,
    pub dir: PathBuf,
    pub branch: Option<String>,
}

impl RepoConfig {
    pub fn new(url: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            dir: dir.into(),
            branch: None,
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }
}

/// The companion jitutils toolset checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JitutilsConfig {
    pub url: String,
    pub dir: PathBuf,
}

impl Default for JitutilsConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_JITUTILS_URL.to_string(),
            dir: PathBuf::from(DEFAULT_JITUTILS_DIR),
        }
    }
}

/// Build flavor of the runtime artifacts, `Checked` being the usual one for
/// SuperPMI work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildFlavor {
    Checked,
    Release,
    Debug,
}

impl BuildFlavor {
    /// Capitalized form as it appears in artifact directory names.
    pub fn artifact_segment(&self) -> &'static str {
        match self {
            BuildFlavor::Checked => "Checked",
            BuildFlavor::Release => "Release",
            BuildFlavor::Debug => "Debug",
        }
    }
}

impl fmt::Display for BuildFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flavor = match self {
            BuildFlavor::Checked => "checked",
            BuildFlavor::Release => "release",
            BuildFlavor::Debug => "debug",
        };
        write!(f, "{flavor}")
    }
}

impl FromStr for BuildFlavor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "checked" => Ok(BuildFlavor::Checked),
            "release" => Ok(BuildFlavor::Release),
            "debug" => Ok(BuildFlavor::Debug),
            other => Err(ConfigError::UnknownFlavor(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    pub arch: String,
    pub flavor: BuildFlavor,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            arch: "x64".to_string(),
            flavor: BuildFlavor::Checked,
        }
    }
}

/// A single `key=value` JIT knob passed through to the JIT under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JitOption {
    pub key: String,
    pub value: String,
}

impl JitOption {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl FromStr for JitOption {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| ConfigError::MalformedOption(s.to_string()))?;
        if key.trim().is_empty() {
            return Err(ConfigError::EmptyOptionKey(s.to_string()));
        }
        Ok(Self::new(key.trim(), value.trim()))
    }
}

impl fmt::Display for JitOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// One measured configuration: the set of diff-side JIT options that
/// distinguishes this run from the others.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffConfig {
    pub options: Vec<JitOption>,
}

impl DiffConfig {
    pub fn new(options: Vec<JitOption>) -> Self {
        Self { options }
    }

    /// Filesystem-safe label derived from the option set. `=` collapses to
    /// `_` so the label can name report files and archive directories.
    pub fn label(&self) -> String {
        if self.options.is_empty() {
            return "default".to_string();
        }
        self.options
            .iter()
            .map(|option| format!("{}_{}", option.key, option.value))
            .collect::<Vec<_>>()
            .join("_")
    }
}

impl FromStr for DiffConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let options = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(JitOption::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(options))
    }
}

impl fmt::Display for DiffConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options = self
            .options
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "{options}")
    }
}

/// Everything the measurement phase needs beyond the provisioned trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasureConfig {
    /// JIT options applied to the base side of every comparison.
    pub base_options: Vec<JitOption>,
    /// One entry per diff run; each produces its own report.
    pub configs: Vec<DiffConfig>,
    /// Optional collection filter handed through to the replay.
    pub filter: Option<String>,
    /// Move replay artifacts aside after each run instead of deleting them.
    pub archive: bool,
}

/// Where staged binaries, reports, archives and charts live under a single
/// results root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsLayout {
    root: PathBuf,
}

impl ResultsLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory a staged copy of Core_Root lands in.
    pub fn staged_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Report file produced by the run with the given label.
    pub fn report_path(&self, label: &str) -> PathBuf {
        self.root.join(format!("diff_{label}.csv"))
    }

    /// Directory replay artifacts for the given label get archived into.
    pub fn archive_dir(&self, label: &str) -> PathBuf {
        self.root.join("archive").join(label)
    }
}
