//! Report loading. Delimited text goes through the `csv` crate, structured
//! documents through `serde_json`; both feed the same row model.

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
};

use serde_json::Value;
use tracing::debug;

use crate::{
    ReportError,
    model::{COLLECTION_COLUMN, MetricValue, ReportRow, ReportTable, normalize_collection},
};

type RawRow = (String, HashMap<String, MetricValue>);

/// Loads one detail report. The `Collection` column plus every column in
/// `required_columns` must be present, checked before any row is parsed.
pub fn load_report(path: &Path, required_columns: &[String]) -> Result<ReportTable, ReportError> {
    if !path.is_file() {
        return Err(ReportError::MissingReport(path.to_path_buf()));
    }
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let (columns, raw_rows) = if is_json {
        parse_json(path, required_columns)?
    } else {
        parse_delimited(path, required_columns)?
    };
    let rows = build_rows(path, raw_rows)?;
    debug!(path = %path.display(), rows = rows.len(), "loaded report");
    Ok(ReportTable {
        path: path.to_path_buf(),
        label: file_stem(path),
        columns,
        rows,
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn check_columns(
    path: &Path,
    columns: &[String],
    required_columns: &[String],
) -> Result<(), ReportError> {
    let mut needed = vec![COLLECTION_COLUMN.to_string()];
    needed.extend_from_slice(required_columns);
    for column in needed {
        if !columns.iter().any(|present| *present == column) {
            return Err(ReportError::MissingColumn {
                path: path.to_path_buf(),
                column,
            });
        }
    }
    Ok(())
}

fn parse_delimited(
    path: &Path,
    required_columns: &[String],
) -> Result<(Vec<String>, Vec<RawRow>), ReportError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    check_columns(path, &columns, required_columns)?;
    let collection_index = columns
        .iter()
        .position(|column| column == COLLECTION_COLUMN)
        .ok_or_else(|| ReportError::MissingColumn {
            path: path.to_path_buf(),
            column: COLLECTION_COLUMN.to_string(),
        })?;

    let mut raw_rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let raw = record.get(collection_index).unwrap_or_default().to_string();
        if raw.is_empty() {
            continue;
        }
        let mut values = HashMap::new();
        for (index, column) in columns.iter().enumerate() {
            if index == collection_index {
                continue;
            }
            if let Some(cell) = record.get(index) {
                values.insert(column.clone(), MetricValue::parse(cell));
            }
        }
        raw_rows.push((raw, values));
    }
    Ok((columns, raw_rows))
}

fn parse_json(
    path: &Path,
    required_columns: &[String],
) -> Result<(Vec<String>, Vec<RawRow>), ReportError> {
    let text = fs::read_to_string(path)?;
    let document: Value = serde_json::from_str(&text)?;
    let records = match document {
        Value::Array(records) => records,
        Value::Object(map) => {
            let mut lists = map.into_iter().filter_map(|(_, value)| match value {
                Value::Array(records) => Some(records),
                _ => None,
            });
            let Some(records) = lists.next() else {
                return Err(malformed(path, "document contains no record list"));
            };
            if lists.next().is_some() {
                return Err(malformed(path, "document contains more than one record list"));
            }
            records
        }
        _ => return Err(malformed(path, "root must be a record list")),
    };

    let mut columns = Vec::new();
    let mut raw_rows = Vec::new();
    for record in &records {
        let Value::Object(fields) = record else {
            return Err(malformed(path, "record is not an object"));
        };
        if columns.is_empty() {
            columns = fields.keys().cloned().collect();
            check_columns(path, &columns, required_columns)?;
        }
        let raw = match fields.get(COLLECTION_COLUMN) {
            Some(Value::String(name)) => name.clone(),
            Some(other) => other.to_string(),
            None => return Err(malformed(path, "record has no Collection field")),
        };
        let values = fields
            .iter()
            .filter(|(key, _)| key.as_str() != COLLECTION_COLUMN)
            .map(|(key, value)| (key.clone(), metric_from_json(value)))
            .collect();
        raw_rows.push((raw, values));
    }
    // An empty document still has to carry the columns somewhere.
    if columns.is_empty() {
        check_columns(path, &columns, required_columns)?;
    }
    Ok((columns, raw_rows))
}

fn metric_from_json(value: &Value) -> MetricValue {
    match value {
        Value::Number(number) => match number.as_i64() {
            Some(int) => MetricValue::Integer(int),
            None => MetricValue::Float(number.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(text) => MetricValue::parse(text),
        other => MetricValue::Text(other.to_string()),
    }
}

fn malformed(path: &Path, detail: &str) -> ReportError {
    ReportError::MalformedReport {
        path: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

fn build_rows(path: &Path, raw_rows: Vec<RawRow>) -> Result<Vec<ReportRow>, ReportError> {
    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(raw_rows.len());
    for (raw, values) in raw_rows {
        let collection = normalize_collection(&raw);
        if !seen.insert(collection.clone()) {
            return Err(ReportError::DuplicateCollection {
                path: path.to_path_buf(),
                collection,
            });
        }
        rows.push(ReportRow {
            collection,
            raw_collection: raw,
            values,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::INSTRUCTION_COUNT_DIFFERENCE;
    use std::io::Write;

    fn write_report(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn required() -> Vec<String> {
        vec![INSTRUCTION_COUNT_DIFFERENCE.to_string()]
    }

    #[test]
    fn loads_csv_reports_with_normalized_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_report(
            tmp.path(),
            "diff_base.csv",
            "Collection,Instruction Count Difference,Instruction Count Difference (%)\n\
             benchmarks.run.windows.x64.checked.mch,120,0.5\n\
             libraries_tests.run.windows.x64.checked.mch,-30,-0.1\n",
        );
        let table = load_report(&path, &required()).unwrap();
        assert_eq!(table.label, "diff_base");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].collection, "benchmarks");
        assert_eq!(table.rows[0].raw_collection, "benchmarks.run.windows.x64.checked.mch");
        assert_eq!(
            table.rows[0].values[INSTRUCTION_COUNT_DIFFERENCE],
            MetricValue::Integer(120)
        );
        assert_eq!(
            table.rows[1].values["Instruction Count Difference (%)"],
            MetricValue::Float(-0.1)
        );
    }

    #[test]
    fn missing_file_is_reported_by_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nope.csv");
        let err = load_report(&path, &required()).unwrap_err();
        match err {
            ReportError::MissingReport(missing) => assert_eq!(missing, path),
            other => panic!("expected missing report, got {other:?}"),
        }
    }

    #[test]
    fn missing_required_column_fails_before_rows_parse() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_report(
            tmp.path(),
            "bad.csv",
            "Collection,Some Other Column\nfoo.mch,this-cell-is-not-even-numeric\n",
        );
        let err = load_report(&path, &required()).unwrap_err();
        match err {
            ReportError::MissingColumn { column, .. } => {
                assert_eq!(column, INSTRUCTION_COUNT_DIFFERENCE);
            }
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_normalized_collection_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_report(
            tmp.path(),
            "dup.csv",
            "Collection,Instruction Count Difference\nfoo.mch,1\nfoo.windows.x64.checked.mch,2\n",
        );
        let err = load_report(&path, &required()).unwrap_err();
        match err {
            ReportError::DuplicateCollection { collection, .. } => {
                assert_eq!(collection, "foo");
            }
            other => panic!("expected duplicate collection, got {other:?}"),
        }
    }

    #[test]
    fn zero_base_percentages_pass_through_verbatim() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_report(
            tmp.path(),
            "zero.csv",
            "Collection,Instruction Count Difference,Instruction Count Difference (%),Instruction Count Difference (%) (Ignoring Zero Diffs)\n\
             foo.mch,5,inf,0.2\n",
        );
        let table = load_report(&path, &required()).unwrap();
        let row = &table.rows[0];
        assert_eq!(
            row.values["Instruction Count Difference (%)"],
            MetricValue::Float(f64::INFINITY)
        );
        assert_eq!(
            row.values["Instruction Count Difference (%) (Ignoring Zero Diffs)"],
            MetricValue::Float(0.2)
        );
    }

    #[test]
    fn loads_json_array_documents() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_report(
            tmp.path(),
            "report.json",
            r#"[
                {"Collection": "foo.mch", "Instruction Count Difference": 10},
                {"Collection": "bar.mch", "Instruction Count Difference": -4.5}
            ]"#,
        );
        let table = load_report(&path, &required()).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(
            table.rows[0].values[INSTRUCTION_COUNT_DIFFERENCE],
            MetricValue::Integer(10)
        );
        assert_eq!(
            table.rows[1].values[INSTRUCTION_COUNT_DIFFERENCE],
            MetricValue::Float(-4.5)
        );
    }

    #[test]
    fn loads_json_documents_with_one_nested_record_list() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_report(
            tmp.path(),
            "wrapped.json",
            r#"{"generated": "2025-01-01", "rows": [
                {"Collection": "foo.mch", "Instruction Count Difference": 1}
            ]}"#,
        );
        let table = load_report(&path, &required()).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].collection, "foo");
    }

    #[test]
    fn json_documents_without_a_record_list_are_malformed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_report(tmp.path(), "scalar.json", r#"{"count": 3}"#);
        let err = load_report(&path, &required()).unwrap_err();
        assert!(matches!(err, ReportError::MalformedReport { .. }));
    }
}
