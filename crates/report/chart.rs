//! Grouped bar charts, one per comparison metric, rendered with charming.

use std::{fs, path::PathBuf};

use charming::{
    Chart, HtmlRenderer, ImageFormat, ImageRenderer,
    component::{Axis, Grid, Legend, Title},
    element::{AxisLabel, AxisType, Label, LabelPosition},
    series::Bar,
};
use tracing::info;

use crate::{ReportError, merge::MergedReport};

const CHART_WIDTH: u32 = 1600;
const CHART_HEIGHT: u32 = 900;
const BAR_GAP: &str = "10%";

/// Rendering options shared by every metric chart of one report run.
#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub out_dir: PathBuf,
    /// Additionally write an interactive ECharts page next to the PNG.
    pub html: bool,
    pub invert_axis: bool,
    /// Caption under the title; the percentage metrics get a formula
    /// caption when none is given.
    pub caption: Option<String>,
}

/// Renders one grouped bar chart for `metric`: collections on the category
/// axis, one bar series per source. Returns the PNG path.
pub fn render_metric_chart(
    merged: &MergedReport,
    metric: &str,
    options: &ChartOptions,
) -> Result<PathBuf, ReportError> {
    let mut title = Title::new().text(metric);
    if let Some(caption) = options
        .caption
        .as_deref()
        .or_else(|| default_caption(metric))
    {
        title = title.subtext(caption);
    }
    let mut value_axis = Axis::new().type_(AxisType::Value);
    if options.invert_axis {
        value_axis = value_axis.inverse(true);
    }

    let mut chart = Chart::new()
        .title(title)
        .legend(Legend::new())
        .grid(Grid::new().contain_label(true))
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .data(merged.collections())
                .axis_label(AxisLabel::new().rotate(45.0)),
        )
        .y_axis(value_axis);
    for (label, points) in merged.series(metric) {
        chart = chart.series(
            Bar::new()
                .name(label)
                .bar_gap(BAR_GAP)
                .label(Label::new().show(true).position(LabelPosition::Top))
                .data(points),
        );
    }

    fs::create_dir_all(&options.out_dir)?;
    let path = options.out_dir.join(chart_file_name(metric));
    let mut renderer = ImageRenderer::new(CHART_WIDTH, CHART_HEIGHT);
    renderer.save_format(ImageFormat::Png, &chart, &path)?;
    info!(metric, chart = %path.display(), "rendered metric chart");

    if options.html {
        let html_path = path.with_extension("html");
        let mut html_renderer = HtmlRenderer::new(metric, CHART_WIDTH.into(), CHART_HEIGHT.into());
        html_renderer.save(&chart, &html_path)?;
        info!(metric, chart = %html_path.display(), "rendered interactive chart");
    }
    Ok(path)
}

// The percentage metrics share one formula; it reads better spelled out
// under the title than buried in the column name.
fn default_caption(metric: &str) -> Option<&'static str> {
    metric.contains("(%)").then_some("(diff - base) / base * 100")
}

/// File name for a metric chart: lowercased, `%` spelled out, every other
/// non-alphanumeric run collapsed to `_`.
fn chart_file_name(metric: &str) -> String {
    let spelled = metric.replace('%', "pct");
    let mut slug = String::with_capacity(spelled.len());
    let mut pending_separator = false;
    for ch in spelled.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            slug.push(ch.to_ascii_lowercase());
            pending_separator = false;
        } else {
            pending_separator = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("metric");
    }
    format!("{slug}.png")
}
