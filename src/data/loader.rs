//! Transaction CSV loading and column extraction

use crate::error::{FraudError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Load a transaction table from a CSV file with a header row.
///
/// Every column is cast to `Float64`; a value that cannot be parsed as a
/// number, or an empty cell, is reported as a data error rather than
/// silently filled.
pub fn load_transactions(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(FraudError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("input file not found: {}", path.display()),
        )));
    }

    let raw = CsvReadOptions::default()
        .with_infer_schema_length(Some(1000))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let df = to_numeric(&raw)?;
    info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "Loaded transactions"
    );
    Ok(df)
}

/// Cast every column to `Float64`, rejecting cells that do not survive the cast
pub fn to_numeric(df: &DataFrame) -> Result<DataFrame> {
    let columns = df
        .get_columns()
        .iter()
        .map(|col| {
            let cast = col.cast(&DataType::Float64)?;
            if cast.null_count() > 0 {
                return Err(FraudError::Data(format!(
                    "column {} has {} missing or non-numeric values",
                    col.name(),
                    cast.null_count()
                )));
            }
            Ok(cast)
        })
        .collect::<Result<Vec<Column>>>()?;

    Ok(DataFrame::new(columns)?)
}

/// Check that every required column is present
pub fn validate_schema(df: &DataFrame, required: &[String]) -> Result<()> {
    let present = column_names(df);
    for col in required {
        if !present.iter().any(|p| p == col) {
            return Err(FraudError::MissingColumn(col.clone()));
        }
    }
    debug!(required = ?required, "Schema validated");
    Ok(())
}

/// Column names in file order
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

/// Values of one numeric column
pub fn column_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| FraudError::MissingColumn(name.to_string()))?;
    let cast = column.cast(&DataType::Float64)?;
    let values = cast
        .f64()?
        .into_iter()
        .map(|v| {
            v.ok_or_else(|| FraudError::Data(format!("column {} contains missing values", name)))
        })
        .collect::<Result<Vec<f64>>>()?;
    Ok(values)
}

/// Binary label vector; anything other than 0 or 1 is rejected
pub fn label_vector(df: &DataFrame, label: &str) -> Result<Array1<i64>> {
    let values = column_values(df, label)?;
    let labels = values
        .into_iter()
        .map(|v| {
            if v == 0.0 {
                Ok(0)
            } else if v == 1.0 {
                Ok(1)
            } else {
                Err(FraudError::InvalidLabel {
                    column: label.to_string(),
                    value: v.to_string(),
                })
            }
        })
        .collect::<Result<Vec<i64>>>()?;
    Ok(Array1::from_vec(labels))
}

/// Per-class row counts of the label column, in ascending label order
pub fn class_value_counts(df: &DataFrame, label: &str) -> Result<BTreeMap<i64, usize>> {
    let labels = label_vector(df, label)?;
    let mut counts = BTreeMap::new();
    for &class in labels.iter() {
        *counts.entry(class).or_insert(0) += 1;
    }
    Ok(counts)
}

/// Extract named columns into a row-major matrix
pub fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data = col_names
        .iter()
        .map(|name| column_values(df, name))
        .collect::<Result<Vec<Vec<f64>>>>()?;

    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_data[c][r]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_preserves_rows_and_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "tx.csv",
            "Time,V1,Amount,Class\n0,1.5,10,0\n1,-0.5,20,0\n2,0.25,30,1\n",
        );

        let df = load_transactions(&path).unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(column_names(&df), vec!["Time", "V1", "Amount", "Class"]);
        assert_eq!(column_values(&df, "Amount").unwrap(), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_transactions("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, FraudError::Io(_)));
    }

    #[test]
    fn test_non_numeric_cell_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "bad.csv", "Time,Amount,Class\n0,ten,0\n1,20,1\n");
        let err = load_transactions(&path).unwrap_err();
        assert!(matches!(err, FraudError::Data(_)));
    }

    #[test]
    fn test_validate_schema_reports_missing_column() {
        let df = df!("Time" => &[0.0], "Amount" => &[1.0]).unwrap();
        let err = validate_schema(&df, &["Amount".to_string(), "Class".to_string()]).unwrap_err();
        assert!(matches!(err, FraudError::MissingColumn(ref c) if c == "Class"));
    }

    #[test]
    fn test_class_value_counts() {
        let df = df!("Class" => &[0.0, 0.0, 1.0, 0.0]).unwrap();
        let counts = class_value_counts(&df, "Class").unwrap();
        assert_eq!(counts.get(&0), Some(&3));
        assert_eq!(counts.get(&1), Some(&1));
    }

    #[test]
    fn test_invalid_label_rejected() {
        let df = df!("Class" => &[0.0, 2.0]).unwrap();
        let err = label_vector(&df, "Class").unwrap_err();
        assert!(matches!(err, FraudError::InvalidLabel { .. }));
    }

    #[test]
    fn test_columns_to_array2_is_row_major() {
        let df = df!("a" => &[1.0, 2.0], "b" => &[3.0, 4.0]).unwrap();
        let x = columns_to_array2(&df, &["b".to_string(), "a".to_string()]).unwrap();
        assert_eq!(x.shape(), &[2, 2]);
        assert_eq!(x[[0, 0]], 3.0);
        assert_eq!(x[[1, 1]], 2.0);
    }
}
