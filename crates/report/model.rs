//! Data model for asmdiffs detail reports.

use std::{collections::HashMap, fmt, path::PathBuf};

use regex::Regex;

/// Join-key column every detail report carries.
pub const COLLECTION_COLUMN: &str = "Collection";

/// Signed instruction-count delta, diff minus base.
pub const INSTRUCTION_COUNT_DIFFERENCE: &str = "Instruction Count Difference";
/// Relative delta. Upstream leaves it undefined when the base count is zero;
/// whatever it wrote is passed through verbatim.
pub const INSTRUCTION_COUNT_DIFFERENCE_PCT: &str = "Instruction Count Difference (%)";
/// Relative delta with zero-diff methods already excluded upstream.
pub const INSTRUCTION_COUNT_DIFFERENCE_PCT_NONZERO: &str =
    "Instruction Count Difference (%) (Ignoring Zero Diffs)";

/// The metric columns charted by default, in chart order.
pub fn default_metrics() -> Vec<String> {
    vec![
        INSTRUCTION_COUNT_DIFFERENCE.to_string(),
        INSTRUCTION_COUNT_DIFFERENCE_PCT.to_string(),
        INSTRUCTION_COUNT_DIFFERENCE_PCT_NONZERO.to_string(),
    ]
}

/// One report cell. Numbers keep their parsed form; anything else rides
/// along as text.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl MetricValue {
    pub fn parse(cell: &str) -> Self {
        let trimmed = cell.trim();
        if let Ok(value) = trimmed.parse::<i64>() {
            MetricValue::Integer(value)
        } else if let Ok(value) = trimmed.parse::<f64>() {
            MetricValue::Float(value)
        } else {
            MetricValue::Text(cell.to_string())
        }
    }

    /// Numeric view for charting; text cells have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Integer(value) => Some(*value as f64),
            MetricValue::Float(value) => Some(*value),
            MetricValue::Text(_) => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Integer(value) => write!(f, "{value}"),
            MetricValue::Float(value) => write!(f, "{value}"),
            MetricValue::Text(value) => write!(f, "{value}"),
        }
    }
}

/// One report row, keyed by the normalized collection name.
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub collection: String,
    pub raw_collection: String,
    pub values: HashMap<String, MetricValue>,
}

/// One loaded detail report. `label` tags the source through the merge and
/// defaults to the report's file stem.
#[derive(Debug, Clone)]
pub struct ReportTable {
    pub path: PathBuf,
    pub label: String,
    pub columns: Vec<String>,
    pub rows: Vec<ReportRow>,
}

// Collection names come in as `<name>.<platform tags>.mch`.
const PLATFORM_COLLECTION_SUFFIX: &str = ".windows.x64.checked.mch";

lazy_static::lazy_static! {
    static ref TRAILING_EXTENSION: Regex = Regex::new(r"\.[A-Za-z0-9_]+$").unwrap();
}

/// Normalizes a collection name into the join key: drops the platform
/// suffix when present, then one trailing dot-extension.
///
/// `benchmarks.run.windows.x64.checked.mch` normalizes to `benchmarks`,
/// plain `foo.mch` to `foo`.
pub fn normalize_collection(raw: &str) -> String {
    let stripped = raw.strip_suffix(PLATFORM_COLLECTION_SUFFIX).unwrap_or(raw);
    TRAILING_EXTENSION.replace(stripped, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_platform_suffix_then_one_extension() {
        assert_eq!(
            normalize_collection("benchmarks.run.windows.x64.checked.mch"),
            "benchmarks"
        );
        assert_eq!(
            normalize_collection("libraries_tests.run.windows.x64.checked.mch"),
            "libraries_tests"
        );
    }

    #[test]
    fn normalize_strips_single_extension() {
        assert_eq!(normalize_collection("foo.mch"), "foo");
        assert_eq!(normalize_collection("System.Text.Json.mch"), "System.Text.Json");
    }

    #[test]
    fn normalize_leaves_plain_names_alone() {
        assert_eq!(normalize_collection("benchmarks"), "benchmarks");
        assert_eq!(normalize_collection(""), "");
    }

    #[test]
    fn metric_value_parses_by_narrowest_type() {
        assert_eq!(MetricValue::parse("42"), MetricValue::Integer(42));
        assert_eq!(MetricValue::parse("-7"), MetricValue::Integer(-7));
        assert_eq!(MetricValue::parse("0.25"), MetricValue::Float(0.25));
        assert_eq!(
            MetricValue::parse("n/a"),
            MetricValue::Text("n/a".to_string())
        );
    }

    #[test]
    fn metric_value_float_view() {
        assert_eq!(MetricValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(MetricValue::Float(0.5).as_f64(), Some(0.5));
        assert_eq!(MetricValue::Text("x".to_string()).as_f64(), None);
    }
}
