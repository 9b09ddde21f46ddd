//! Min-max feature scaling over DataFrame columns

use crate::error::{FraudError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameters learned for one column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnRange {
    pub min: f64,
    /// `max - min`, or 1.0 for a constant column
    pub range: f64,
}

/// Min-max scaler: `(x - min) / (max - min)`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    params: BTreeMap<String, ColumnRange>,
}

impl MinMaxScaler {
    /// Create a new, unfitted scaler
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn min and range of each named column
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| FraudError::MissingColumn(col_name.to_string()))?;
            let params = Self::compute_params(column.as_materialized_series())?;
            self.params.insert(col_name.to_string(), params);
        }
        Ok(self)
    }

    /// Scale the fitted columns, leaving all others untouched
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.apply(df, |v, p| (v - p.min) / p.range)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Map scaled values back to the original units
    pub fn inverse_transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.apply(df, |v, p| v * p.range + p.min)
    }

    /// Learned parameters for a column
    pub fn range_of(&self, column: &str) -> Option<ColumnRange> {
        self.params.get(column).copied()
    }

    pub fn is_fitted(&self) -> bool {
        !self.params.is_empty()
    }

    fn apply(&self, df: &DataFrame, f: impl Fn(f64, &ColumnRange) -> f64) -> Result<DataFrame> {
        if !self.is_fitted() {
            return Err(FraudError::ModelNotFitted);
        }

        // Build every replacement column before touching the frame
        let replacements = self
            .params
            .iter()
            .map(|(col_name, params)| {
                let column = df
                    .column(col_name)
                    .map_err(|_| FraudError::MissingColumn(col_name.clone()))?;
                let series = column.as_materialized_series();
                let ca = series.cast(&DataType::Float64)?;
                let mapped: Float64Chunked = ca
                    .f64()?
                    .into_iter()
                    .map(|opt| opt.map(|v| f(v, params)))
                    .collect();
                Ok(mapped.with_name(series.name().clone()).into_series())
            })
            .collect::<Result<Vec<Series>>>()?;

        let mut result = df.clone();
        for series in replacements {
            result.with_column(series)?;
        }
        Ok(result)
    }

    fn compute_params(series: &Series) -> Result<ColumnRange> {
        let cast = series.cast(&DataType::Float64)?;
        let ca = cast.f64()?;
        let min = ca
            .min()
            .ok_or_else(|| FraudError::Data(format!("column {} is empty", series.name())))?;
        let max = ca.max().unwrap_or(min);
        let range = max - min;
        Ok(ColumnRange {
            min,
            range: if range == 0.0 { 1.0 } else { range },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minmax_bounds() {
        let df = df!("a" => &[5.0, 1.0, 3.0, 9.0], "b" => &[1.0, 2.0, 3.0, 4.0]).unwrap();

        let mut scaler = MinMaxScaler::new();
        let result = scaler.fit_transform(&df, &["a"]).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        assert!((col.min().unwrap() - 0.0).abs() < 1e-12);
        assert!((col.max().unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(col.get(2), Some(0.25));

        // untouched column
        let b = result.column("b").unwrap().f64().unwrap();
        assert_eq!(b.get(3), Some(4.0));
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let df = df!("a" => &[7.0, 7.0, 7.0]).unwrap();
        let mut scaler = MinMaxScaler::new();
        let result = scaler.fit_transform(&df, &["a"]).unwrap();
        let col = result.column("a").unwrap().f64().unwrap();
        assert!(col.into_iter().all(|v| v == Some(0.0)));
    }

    #[test]
    fn test_inverse_transform() {
        let df = df!("a" => &[10.0, 20.0, 35.0]).unwrap();
        let mut scaler = MinMaxScaler::new();
        let scaled = scaler.fit_transform(&df, &["a"]).unwrap();
        let restored = scaler.inverse_transform(&scaled).unwrap();

        let original = df.column("a").unwrap().f64().unwrap();
        let back = restored.column("a").unwrap().f64().unwrap();
        for (o, r) in original.into_iter().zip(back.into_iter()) {
            assert!((o.unwrap() - r.unwrap()).abs() < 1e-10);
        }
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let df = df!("a" => &[1.0]).unwrap();
        let scaler = MinMaxScaler::new();
        assert!(matches!(scaler.transform(&df), Err(FraudError::ModelNotFitted)));
    }
}
