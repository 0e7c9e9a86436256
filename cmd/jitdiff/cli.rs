use std::{
    fs::File,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, filter::Directive};

use jitdiff_config::{
    BuildConfig, BuildFlavor, DEFAULT_BASE_NAME, DEFAULT_JITUTILS_DIR, DEFAULT_JITUTILS_URL,
    DEFAULT_RESULTS_DIR, DEFAULT_RUNTIME_DIR, DEFAULT_RUNTIME_URL, DiffConfig, JitOption,
    JitutilsConfig, MeasureConfig, RepoConfig, ResultsLayout,
};
use jitdiff_provision::{compile, git, stage};
use jitdiff_report::{ChartOptions, default_metrics, load_report, merge_reports, render_metric_chart};
use jitdiff_superpmi::{AsmDiffsRequest, archive_run, run_asmdiffs};

pub const VERSION_STRING: &str = env!("CARGO_PKG_VERSION");

#[allow(clippy::upper_case_acronyms)]
#[derive(Parser)]
#[command(name="jitdiff", author, version=VERSION_STRING, about, long_about = None)]
pub struct CLI {
    #[clap(flatten)]
    pub opts: Options,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Parser)]
pub struct Options {
    #[arg(
        long = "log.level",
        default_value_t = Level::INFO,
        value_name = "LOG_LEVEL",
        help = "Possible values: info, debug, trace, warn, error",
        help_heading = "Logging options"
    )]
    pub log_level: Level,
}

pub fn start() -> eyre::Result<()> {
    let CLI { opts, command } = CLI::parse();
    init_tracing(&opts);
    command.run()
}

fn init_tracing(opts: &Options) {
    let log_filter = EnvFilter::builder()
        .with_default_directive(Directive::from(opts.log_level))
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(log_filter).init();
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Clone, build and stage one side of the comparison")]
    Provision {
        #[clap(
            long = "repo-url",
            env = "JITDIFF_REPO_URL",
            default_value = DEFAULT_RUNTIME_URL,
            value_name = "URL",
            help = "Runtime repository to clone"
        )]
        repo_url: String,
        #[clap(long = "repo-dir", default_value = DEFAULT_RUNTIME_DIR, value_name = "DIRECTORY")]
        repo_dir: PathBuf,
        #[clap(
            long = "branch",
            value_name = "BRANCH",
            help = "Remote branch to force-checkout before building"
        )]
        branch: Option<String>,
        #[clap(long = "jitutils-url", default_value = DEFAULT_JITUTILS_URL, value_name = "URL")]
        jitutils_url: String,
        #[clap(long = "jitutils-dir", default_value = DEFAULT_JITUTILS_DIR, value_name = "DIRECTORY")]
        jitutils_dir: PathBuf,
        #[clap(long = "results-dir", default_value = DEFAULT_RESULTS_DIR, value_name = "DIRECTORY")]
        results_dir: PathBuf,
        #[clap(long = "arch", default_value = "x64", value_name = "ARCH")]
        arch: String,
        #[clap(long = "build-flavor", default_value_t = BuildFlavor::Checked, value_name = "FLAVOR")]
        build_flavor: BuildFlavor,
        #[clap(
            long = "stage-name",
            default_value = DEFAULT_BASE_NAME,
            value_name = "NAME",
            help = "Name the staged Core_Root copy gets under the results directory"
        )]
        stage_name: String,
        #[clap(long = "skip-build", help = "Stage from existing artifacts without rebuilding")]
        skip_build: bool,
    },
    #[clap(about = "Run superpmi asmdiffs once per configuration")]
    Measure {
        #[clap(long = "repo-dir", default_value = DEFAULT_RUNTIME_DIR, value_name = "DIRECTORY")]
        repo_dir: PathBuf,
        #[clap(long = "results-dir", default_value = DEFAULT_RESULTS_DIR, value_name = "DIRECTORY")]
        results_dir: PathBuf,
        #[clap(long = "base-name", default_value = DEFAULT_BASE_NAME, value_name = "NAME")]
        base_name: String,
        #[clap(long = "diff-name", default_value = "diff", value_name = "NAME")]
        diff_name: String,
        #[clap(
            long = "config",
            value_name = "K=V[,K=V...]",
            help = "JIT options for one diff run; repeat the flag for several runs"
        )]
        configs: Vec<DiffConfig>,
        #[clap(
            long = "base-option",
            value_name = "K=V",
            help = "JIT option applied to the base side of every run"
        )]
        base_options: Vec<JitOption>,
        #[clap(
            long = "filter",
            value_name = "EXPRESSION",
            help = "Collection filter handed through to the replay"
        )]
        filter: Option<String>,
        #[clap(
            long = "archive",
            help = "Move replay artifacts into the archive instead of discarding them"
        )]
        archive: bool,
    },
    #[clap(about = "Join detail reports and render comparison charts")]
    Report {
        #[clap(required = true, value_name = "REPORT", help = "Detail report files to join")]
        reports: Vec<PathBuf>,
        #[clap(
            long = "labels",
            value_name = "LABELS",
            value_delimiter = ',',
            help = "Source labels, one per report; default is each file's stem"
        )]
        labels: Vec<String>,
        #[clap(
            long = "metrics",
            value_name = "COLUMNS",
            value_delimiter = ',',
            help = "Metric columns to chart; default is the instruction-count set"
        )]
        metrics: Vec<String>,
        #[clap(
            long = "out-dir",
            value_name = "DIRECTORY",
            help = "Chart output directory; default is the first report's directory"
        )]
        out_dir: Option<PathBuf>,
        #[clap(
            long = "merged-csv",
            value_name = "PATH",
            help = "Also write the joined table to this path"
        )]
        merged_csv: Option<PathBuf>,
        #[clap(long = "html", help = "Write interactive chart pages next to the PNGs")]
        html: bool,
        #[clap(long = "invert-axis", help = "Invert the value axis")]
        invert_axis: bool,
        #[clap(
            long = "caption",
            value_name = "TEXT",
            help = "Caption rendered under every chart title"
        )]
        caption: Option<String>,
    },
    #[clap(about = "Provision both sides, measure every configuration and chart the results")]
    Run {
        #[clap(
            long = "repo-url",
            env = "JITDIFF_REPO_URL",
            default_value = DEFAULT_RUNTIME_URL,
            value_name = "URL"
        )]
        repo_url: String,
        #[clap(long = "repo-dir", default_value = DEFAULT_RUNTIME_DIR, value_name = "DIRECTORY")]
        repo_dir: PathBuf,
        #[clap(
            long = "branch",
            value_name = "BRANCH",
            help = "Remote branch the diff side is built from"
        )]
        branch: String,
        #[clap(long = "jitutils-url", default_value = DEFAULT_JITUTILS_URL, value_name = "URL")]
        jitutils_url: String,
        #[clap(long = "jitutils-dir", default_value = DEFAULT_JITUTILS_DIR, value_name = "DIRECTORY")]
        jitutils_dir: PathBuf,
        #[clap(long = "results-dir", default_value = DEFAULT_RESULTS_DIR, value_name = "DIRECTORY")]
        results_dir: PathBuf,
        #[clap(long = "arch", default_value = "x64", value_name = "ARCH")]
        arch: String,
        #[clap(long = "build-flavor", default_value_t = BuildFlavor::Checked, value_name = "FLAVOR")]
        build_flavor: BuildFlavor,
        #[clap(long = "base-name", default_value = DEFAULT_BASE_NAME, value_name = "NAME")]
        base_name: String,
        #[clap(long = "diff-name", default_value = "diff", value_name = "NAME")]
        diff_name: String,
        #[clap(
            long = "config",
            value_name = "K=V[,K=V...]",
            help = "JIT options for one diff run; repeat the flag for several runs"
        )]
        configs: Vec<DiffConfig>,
        #[clap(long = "base-option", value_name = "K=V")]
        base_options: Vec<JitOption>,
        #[clap(long = "filter", value_name = "EXPRESSION")]
        filter: Option<String>,
        #[clap(long = "archive")]
        archive: bool,
        #[clap(long = "merged-csv", value_name = "PATH")]
        merged_csv: Option<PathBuf>,
        #[clap(long = "html")]
        html: bool,
        #[clap(long = "invert-axis")]
        invert_axis: bool,
        #[clap(long = "caption", value_name = "TEXT")]
        caption: Option<String>,
    },
}

impl Command {
    pub fn run(self) -> eyre::Result<()> {
        match self {
            Command::Provision {
                repo_url,
                repo_dir,
                branch,
                jitutils_url,
                jitutils_dir,
                results_dir,
                arch,
                build_flavor,
                stage_name,
                skip_build,
            } => {
                let repo = RepoConfig {
                    url: repo_url,
                    dir: repo_dir,
                    branch,
                };
                let jitutils = JitutilsConfig {
                    url: jitutils_url,
                    dir: jitutils_dir,
                };
                let build = BuildConfig {
                    arch,
                    flavor: build_flavor,
                };
                let layout = ResultsLayout::new(results_dir);

                git::ensure_cloned(&repo.url, &repo.dir)?;
                git::checkout_remote_branch(&repo)?;
                compile::setup_jitutils(&jitutils)?;
                if skip_build {
                    info!("skipping the runtime build, staging existing artifacts");
                } else {
                    compile::build_runtime(&repo.dir, &build)?;
                    compile::build_test_layout(&repo.dir, &build)?;
                }
                let staged = stage::stage_core_root(&repo.dir, &build, &layout, &stage_name)?;
                info!(staged = %staged.display(), "provisioning finished");
                Ok(())
            }
            Command::Measure {
                repo_dir,
                results_dir,
                base_name,
                diff_name,
                configs,
                base_options,
                filter,
                archive,
            } => {
                let layout = ResultsLayout::new(results_dir);
                let measure = MeasureConfig {
                    base_options,
                    configs,
                    filter,
                    archive,
                };
                let reports =
                    run_measurements(&repo_dir, &layout, &measure, &base_name, &diff_name)?;
                for report in &reports {
                    info!(report = %report.display(), "detail report ready");
                }
                Ok(())
            }
            Command::Report {
                reports,
                labels,
                metrics,
                out_dir,
                merged_csv,
                html,
                invert_axis,
                caption,
            } => {
                let metrics = if metrics.is_empty() {
                    default_metrics()
                } else {
                    metrics
                };
                let out_dir = out_dir.unwrap_or_else(|| default_out_dir(reports.first()));
                let options = ChartOptions {
                    out_dir,
                    html,
                    invert_axis,
                    caption,
                };
                merge_and_chart(&reports, &labels, &metrics, merged_csv.as_deref(), &options)
            }
            Command::Run {
                repo_url,
                repo_dir,
                branch,
                jitutils_url,
                jitutils_dir,
                results_dir,
                arch,
                build_flavor,
                base_name,
                diff_name,
                configs,
                base_options,
                filter,
                archive,
                merged_csv,
                html,
                invert_axis,
                caption,
            } => {
                let build = BuildConfig {
                    arch,
                    flavor: build_flavor,
                };
                let jitutils = JitutilsConfig {
                    url: jitutils_url,
                    dir: jitutils_dir,
                };
                let layout = ResultsLayout::new(results_dir.clone());

                git::ensure_cloned(&repo_url, &repo_dir)?;
                compile::setup_jitutils(&jitutils)?;

                // Base side tracks the default branch.
                git::switch_to_default(&repo_dir)?;
                compile::build_runtime(&repo_dir, &build)?;
                compile::build_test_layout(&repo_dir, &build)?;
                stage::stage_core_root(&repo_dir, &build, &layout, &base_name)?;

                // Diff side tracks the requested branch.
                let repo = RepoConfig::new(repo_url, repo_dir.clone()).with_branch(branch);
                git::checkout_remote_branch(&repo)?;
                compile::build_runtime(&repo_dir, &build)?;
                compile::build_test_layout(&repo_dir, &build)?;
                stage::stage_core_root(&repo_dir, &build, &layout, &diff_name)?;

                let measure = MeasureConfig {
                    base_options,
                    configs,
                    filter,
                    archive,
                };
                let report_paths =
                    run_measurements(&repo_dir, &layout, &measure, &base_name, &diff_name)?;

                let metrics = default_metrics();
                let options = ChartOptions {
                    out_dir: results_dir,
                    html,
                    invert_axis,
                    caption,
                };
                merge_and_chart(&report_paths, &[], &metrics, merged_csv.as_deref(), &options)
            }
        }
    }
}

/// One asmdiffs run per configuration, in the order given. Returns the
/// detail report paths.
fn run_measurements(
    runtime_dir: &Path,
    layout: &ResultsLayout,
    measure: &MeasureConfig,
    base_name: &str,
    diff_name: &str,
) -> eyre::Result<Vec<PathBuf>> {
    let configs = if measure.configs.is_empty() {
        info!("no configurations given, measuring the default one");
        vec![DiffConfig::default()]
    } else {
        measure.configs.clone()
    };
    let mut reports = Vec::with_capacity(configs.len());
    for config in &configs {
        let request = AsmDiffsRequest {
            runtime_dir,
            layout,
            base_name,
            diff_name,
            base_options: &measure.base_options,
            config,
            filter: measure.filter.as_deref(),
        };
        let report = run_asmdiffs(&request)?;
        if measure.archive {
            archive_run(runtime_dir, layout, &config.label())?;
        }
        reports.push(report);
    }
    Ok(reports)
}

fn merge_and_chart(
    report_paths: &[PathBuf],
    labels: &[String],
    metrics: &[String],
    merged_csv: Option<&Path>,
    options: &ChartOptions,
) -> eyre::Result<()> {
    if !labels.is_empty() && labels.len() != report_paths.len() {
        eyre::bail!(
            "{} labels given for {} reports",
            labels.len(),
            report_paths.len()
        );
    }
    let mut tables = Vec::with_capacity(report_paths.len());
    for (index, path) in report_paths.iter().enumerate() {
        let mut table = load_report(path, metrics)?;
        if let Some(label) = labels.get(index) {
            table.label = label.clone();
        }
        tables.push(table);
    }
    let merged = merge_reports(&tables, metrics)?;
    for dropped in &merged.dropped {
        if !dropped.collections.is_empty() {
            warn!(
                source = %dropped.label,
                dropped = dropped.collections.len(),
                "collections excluded from the join"
            );
        }
    }
    if merged.rows.is_empty() {
        warn!("no collection is present in every report; charts will be empty");
    }
    if let Some(path) = merged_csv {
        merged.write_csv(File::create(path)?)?;
        info!(merged = %path.display(), "wrote joined table");
    }
    for metric in metrics {
        let chart = render_metric_chart(&merged, metric, options)?;
        info!(metric = %metric, chart = %chart.display(), "chart ready");
    }
    Ok(())
}

fn default_out_dir(first_report: Option<&PathBuf>) -> PathBuf {
    match first_report.and_then(|path| path.parent()) {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
