//! Minimal column-oriented table of named `f64` columns
//!
//! Missing values are stored as `NaN`. Rows containing any non-finite value
//! are treated as incomplete by [`DataFrame::drop_missing`].

use crate::errors::{StatsError, StatsResult};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFrame {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl DataFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`DataFrame::insert_column`]
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> StatsResult<Self> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    /// Append a column. All columns must share one length and have distinct names.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> StatsResult<()> {
        let name = name.into();
        if self.names.iter().any(|n| *n == name) {
            return Err(StatsError::DuplicateColumn(name));
        }
        if let Some(first) = self.columns.first() {
            if first.len() != values.len() {
                return Err(StatsError::LengthMismatch {
                    column: name,
                    len: values.len(),
                    expected: first.len(),
                });
            }
        }
        self.names.push(name);
        self.columns.push(values);
        Ok(())
    }

    /// Append a column of ones named `name`
    pub fn add_constant(&mut self, name: impl Into<String>) -> StatsResult<()> {
        let n = self.n_rows();
        self.insert_column(name, vec![1.0; n])
    }

    pub fn column(&self, name: &str) -> StatsResult<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
            .ok_or_else(|| StatsError::MissingColumn(name.to_string()))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// New frame holding only `names`, in that order. Repeated names are kept once.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> StatsResult<DataFrame> {
        let mut out = DataFrame::new();
        for name in names {
            let name = name.as_ref();
            if out.has_column(name) {
                continue;
            }
            out.insert_column(name, self.column(name)?.to_vec())?;
        }
        Ok(out)
    }

    /// Listwise deletion: drop every row with a NaN or infinite value in any column
    pub fn drop_missing(&self) -> DataFrame {
        let keep: Vec<usize> = (0..self.n_rows())
            .filter(|&i| self.columns.iter().all(|col| col[i].is_finite()))
            .collect();

        DataFrame {
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|col| keep.iter().map(|&i| col[i]).collect())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        DataFrame::new()
            .with_column("y", vec![1.0, f64::NAN, 3.0, 4.0])
            .unwrap()
            .with_column("x", vec![0.5, 1.5, f64::INFINITY, 3.5])
            .unwrap()
            .with_column("w", vec![f64::NAN, 1.0, 1.0, 1.0])
            .unwrap()
    }

    #[test]
    fn test_select_then_drop_only_considers_selected_columns() {
        let df = frame().select(&["y", "x"]).unwrap().drop_missing();
        assert_eq!(df.n_rows(), 2);
        assert_eq!(df.column("y").unwrap(), &[1.0, 4.0]);
        assert_eq!(df.column("x").unwrap(), &[0.5, 3.5]);
    }

    #[test]
    fn test_drop_missing_all_columns() {
        let df = frame().drop_missing();
        assert_eq!(df.n_rows(), 1);
        assert_eq!(df.column("w").unwrap(), &[1.0]);
    }

    #[test]
    fn test_select_dedupes_and_orders() {
        let df = frame().select(&["x", "y", "x"]).unwrap();
        assert_eq!(df.column_names(), &["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_missing_column() {
        let result = frame().select(&["nope"]);
        assert!(matches!(result, Err(StatsError::MissingColumn(name)) if name == "nope"));
    }

    #[test]
    fn test_insert_rejects_bad_columns() {
        let mut df = frame();
        assert!(matches!(
            df.insert_column("y", vec![0.0; 4]),
            Err(StatsError::DuplicateColumn(_))
        ));
        assert!(matches!(
            df.insert_column("z", vec![0.0; 3]),
            Err(StatsError::LengthMismatch { len: 3, expected: 4, .. })
        ));
    }

    #[test]
    fn test_add_constant() {
        let mut df = frame();
        df.add_constant("const").unwrap();
        assert_eq!(df.n_columns(), 4);
        assert_eq!(df.column("const").unwrap(), &[1.0; 4]);
    }
}
