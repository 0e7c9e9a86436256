//! Inner join of detail reports on the normalized collection key.

use std::{
    collections::{HashMap, HashSet},
    io::Write,
};

use crate::{
    ReportError,
    model::{COLLECTION_COLUMN, MetricValue, ReportRow, ReportTable},
};

/// Collections a source lost to the join.
#[derive(Debug, Clone)]
pub struct DroppedRows {
    pub label: String,
    pub collections: Vec<String>,
}

/// One joined row. `values` is source-major, metric-minor, aligned with
/// [`MergedReport::sources`] and [`MergedReport::metrics`].
#[derive(Debug, Clone)]
pub struct MergedRow {
    pub collection: String,
    pub values: Vec<Vec<MetricValue>>,
}

#[derive(Debug, Clone)]
pub struct MergedReport {
    pub sources: Vec<String>,
    pub metrics: Vec<String>,
    pub rows: Vec<MergedRow>,
    pub dropped: Vec<DroppedRows>,
}

/// Joins the tables on normalized collection, keeping only collections all
/// of them share. Row order follows the first table. Collections that fall
/// out of the join are reported per source, not silently dropped.
pub fn merge_reports(
    tables: &[ReportTable],
    metrics: &[String],
) -> Result<MergedReport, ReportError> {
    let Some(first) = tables.first() else {
        return Err(ReportError::NoReports);
    };

    let indices: Vec<HashMap<&str, &ReportRow>> = tables
        .iter()
        .map(|table| {
            table
                .rows
                .iter()
                .map(|row| (row.collection.as_str(), row))
                .collect()
        })
        .collect();

    let common: Vec<&str> = first
        .rows
        .iter()
        .map(|row| row.collection.as_str())
        .filter(|key| indices.iter().all(|index| index.contains_key(key)))
        .collect();
    let common_set: HashSet<&str> = common.iter().copied().collect();

    let mut rows = Vec::with_capacity(common.len());
    for key in &common {
        let mut values = Vec::with_capacity(tables.len());
        for index in &indices {
            let Some(row) = index.get(key) else {
                continue;
            };
            values.push(
                metrics
                    .iter()
                    .map(|metric| {
                        row.values
                            .get(metric)
                            .cloned()
                            .unwrap_or_else(|| MetricValue::Text(String::new()))
                    })
                    .collect(),
            );
        }
        rows.push(MergedRow {
            collection: (*key).to_string(),
            values,
        });
    }

    let dropped = tables
        .iter()
        .map(|table| DroppedRows {
            label: table.label.clone(),
            collections: table
                .rows
                .iter()
                .map(|row| row.collection.clone())
                .filter(|collection| !common_set.contains(collection.as_str()))
                .collect(),
        })
        .collect();

    Ok(MergedReport {
        sources: tables.iter().map(|table| table.label.clone()).collect(),
        metrics: metrics.to_vec(),
        rows,
        dropped,
    })
}

impl MergedReport {
    /// Output header: `Collection`, then each source's metric columns. The
    /// first source keeps the original column names, later ones get an
    /// `_<index>` suffix.
    pub fn header(&self) -> Vec<String> {
        let mut header = vec![COLLECTION_COLUMN.to_string()];
        for (index, _) in self.sources.iter().enumerate() {
            for metric in &self.metrics {
                if index == 0 {
                    header.push(metric.clone());
                } else {
                    header.push(format!("{metric}_{index}"));
                }
            }
        }
        header
    }

    /// Writes the joined table as CSV.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ReportError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(self.header())?;
        for row in &self.rows {
            let mut record = vec![row.collection.clone()];
            for source_values in &row.values {
                for value in source_values {
                    record.push(value.to_string());
                }
            }
            csv_writer.write_record(&record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// The joined collection names, in row order.
    pub fn collections(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.collection.clone()).collect()
    }

    /// Per-source numeric series for one metric, aligned with `rows`.
    /// Non-numeric cells chart as zero.
    pub fn series(&self, metric: &str) -> Vec<(String, Vec<f64>)> {
        let Some(metric_index) = self.metrics.iter().position(|name| name == metric) else {
            return Vec::new();
        };
        self.sources
            .iter()
            .enumerate()
            .map(|(source_index, label)| {
                let points = self
                    .rows
                    .iter()
                    .map(|row| {
                        row.values
                            .get(source_index)
                            .and_then(|values| values.get(metric_index))
                            .and_then(MetricValue::as_f64)
                            .unwrap_or(0.0)
                    })
                    .collect();
                (label.clone(), points)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::INSTRUCTION_COUNT_DIFFERENCE;
    use std::path::PathBuf;

    fn table(label: &str, rows: &[(&str, i64)]) -> ReportTable {
        let rows = rows
            .iter()
            .map(|(raw, diff)| {
                let mut values = HashMap::new();
                values.insert(
                    INSTRUCTION_COUNT_DIFFERENCE.to_string(),
                    MetricValue::Integer(*diff),
                );
                ReportRow {
                    collection: crate::model::normalize_collection(raw),
                    raw_collection: raw.to_string(),
                    values,
                }
            })
            .collect();
        ReportTable {
            path: PathBuf::from(format!("{label}.csv")),
            label: label.to_string(),
            columns: vec![
                COLLECTION_COLUMN.to_string(),
                INSTRUCTION_COUNT_DIFFERENCE.to_string(),
            ],
            rows,
        }
    }

    fn metrics() -> Vec<String> {
        vec![INSTRUCTION_COUNT_DIFFERENCE.to_string()]
    }

    #[test]
    fn joins_on_normalized_collection() {
        let left = table("left", &[("foo.mch", 10)]);
        let right = table("right", &[("foo.mch", 20)]);
        let merged = merge_reports(&[left, right], &metrics()).unwrap();

        assert_eq!(merged.rows.len(), 1);
        let row = &merged.rows[0];
        assert_eq!(row.collection, "foo");
        assert_eq!(row.values[0][0], MetricValue::Integer(10));
        assert_eq!(row.values[1][0], MetricValue::Integer(20));
    }

    #[test]
    fn header_suffixes_sources_after_the_first() {
        let left = table("left", &[("foo.mch", 1)]);
        let middle = table("middle", &[("foo.mch", 2)]);
        let right = table("right", &[("foo.mch", 3)]);
        let merged = merge_reports(&[left, middle, right], &metrics()).unwrap();

        assert_eq!(
            merged.header(),
            vec![
                "Collection",
                "Instruction Count Difference",
                "Instruction Count Difference_1",
                "Instruction Count Difference_2",
            ]
        );
    }

    #[test]
    fn inner_join_drops_and_reports_missing_collections() {
        let left = table("left", &[("shared.mch", 1), ("only_left.mch", 2)]);
        let right = table("right", &[("shared.mch", 3), ("only_right.mch", 4)]);
        let merged = merge_reports(&[left, right], &metrics()).unwrap();

        assert_eq!(merged.rows.len(), 1);
        assert_eq!(merged.rows[0].collection, "shared");
        assert_eq!(merged.dropped[0].label, "left");
        assert_eq!(merged.dropped[0].collections, vec!["only_left"]);
        assert_eq!(merged.dropped[1].collections, vec!["only_right"]);
    }

    #[test]
    fn row_order_follows_the_first_table() {
        let left = table("left", &[("b.mch", 1), ("a.mch", 2), ("c.mch", 3)]);
        let right = table("right", &[("a.mch", 4), ("c.mch", 5), ("b.mch", 6)]);
        let merged = merge_reports(&[left, right], &metrics()).unwrap();

        assert_eq!(merged.collections(), vec!["b", "a", "c"]);
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = merge_reports(&[], &metrics()).unwrap_err();
        assert!(matches!(err, ReportError::NoReports));
    }

    #[test]
    fn zero_common_collections_is_legal() {
        let left = table("left", &[("a.mch", 1)]);
        let right = table("right", &[("b.mch", 2)]);
        let merged = merge_reports(&[left, right], &metrics()).unwrap();
        assert!(merged.rows.is_empty());
        assert_eq!(merged.dropped[0].collections, vec!["a"]);
    }

    #[test]
    fn merged_csv_matches_header_layout() {
        let left = table("left", &[("foo.mch", 10)]);
        let right = table("right", &[("foo.mch", 20)]);
        let merged = merge_reports(&[left, right], &metrics()).unwrap();

        let mut buffer = Vec::new();
        merged.write_csv(&mut buffer).unwrap();
        let written = String::from_utf8(buffer).unwrap();
        let mut lines = written.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Collection,Instruction Count Difference,Instruction Count Difference_1"
        );
        assert_eq!(lines.next().unwrap(), "foo,10,20");
    }

    #[test]
    fn series_are_aligned_per_source() {
        let left = table("left", &[("a.mch", 1), ("b.mch", 2)]);
        let right = table("right", &[("a.mch", 3), ("b.mch", 4)]);
        let merged = merge_reports(&[left, right], &metrics()).unwrap();

        let series = merged.series(INSTRUCTION_COUNT_DIFFERENCE);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0], ("left".to_string(), vec![1.0, 2.0]));
        assert_eq!(series[1], ("right".to_string(), vec![3.0, 4.0]));
        assert!(merged.series("Unknown Metric").is_empty());
    }
}
