//! Loading, joining and charting of the detail reports produced by
//! `superpmi.py asmdiffs`.

mod error;

pub mod chart;
pub mod load;
pub mod merge;
pub mod model;

pub use chart::{ChartOptions, render_metric_chart};
pub use error::ReportError;
pub use load::load_report;
pub use merge::{DroppedRows, MergedReport, MergedRow, merge_reports};
pub use model::{MetricValue, ReportRow, ReportTable, default_metrics};
