use std::collections::HashSet;

use ndarray::Array2;
use serde_json::{Map, Value};

use crate::{MlError, Result};

/// A tabular collection of named columns built from JSON row objects.
///
/// Columns are ordered by first appearance across the rows. Cells keep their
/// raw JSON value; numeric conversion happens only when a matrix is extracted,
/// so shape checks (like required columns) can run before any cell is parsed.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Map<String, Value>>,
}

impl Frame {
    /// Creates a new `Frame` from row records.
    ///
    /// # Args
    /// * `rows` - One JSON object per row.
    ///
    /// # Returns
    /// A `Frame` whose column set is the union of every row's keys.
    pub fn from_records(rows: Vec<Map<String, Value>>) -> Self {
        let mut seen = HashSet::new();
        let mut columns: Vec<String> = Vec::new();

        for row in &rows {
            for key in row.keys() {
                if seen.insert(key.as_str()) {
                    columns.push(key.clone());
                }
            }
        }

        Self { columns, rows }
    }

    /// Returns the column names in frame order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the amount of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Returns the subset of `names` that is not a column of this frame.
    pub fn missing_columns<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        names
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| !self.has_column(name))
            .map(str::to_string)
            .collect()
    }

    /// Returns every column not listed in `excluded`, in frame order.
    pub fn columns_except<S: AsRef<str>>(&self, excluded: &[S]) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| !excluded.iter().any(|e| e.as_ref() == c.as_str()))
            .cloned()
            .collect()
    }

    /// Extracts the given columns as a `rows × columns` numeric matrix.
    ///
    /// # Args
    /// * `names` - The columns to extract, in output order.
    ///
    /// # Returns
    /// The matrix, or an `MlError` if a cell is missing, null or not numeric.
    pub fn to_matrix<S: AsRef<str>>(&self, names: &[S]) -> Result<Array2<f64>> {
        let mut data = Vec::with_capacity(self.rows.len() * names.len());

        for (i, row) in self.rows.iter().enumerate() {
            for name in names {
                let name = name.as_ref();
                data.push(cell_to_f64(row.get(name), name, i)?);
            }
        }

        Ok(Array2::from_shape_vec((self.rows.len(), names.len()), data)?)
    }
}

/// Converts a single cell into a number.
fn cell_to_f64(cell: Option<&Value>, column: &str, row: usize) -> Result<f64> {
    let non_numeric = || MlError::NonNumeric {
        column: column.to_string(),
        row,
    };

    match cell {
        None | Some(Value::Null) => Err(MlError::MissingValue {
            column: column.to_string(),
            row,
        }),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(non_numeric),
        Some(Value::Bool(b)) => Ok(if *b { 1.0 } else { 0.0 }),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(non_numeric),
        Some(_) => Err(non_numeric()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn records(value: Value) -> Vec<Map<String, Value>> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn columns_follow_first_appearance() {
        let frame = Frame::from_records(records(json!([
            { "b": 1, "a": 2 },
            { "c": 3, "a": 4 },
        ])));

        assert_eq!(frame.columns(), ["b", "a", "c"]);
        assert_eq!(frame.len(), 2);
    }

    #[test]
    fn wide_rows_keep_each_column_once() {
        let rows = (0..200)
            .map(|i| {
                (0..50)
                    .map(|j| (format!("c{}", (i + j) % 60), json!(j)))
                    .collect::<Map<String, Value>>()
            })
            .collect();
        let frame = Frame::from_records(rows);

        assert_eq!(frame.columns().len(), 60);
        assert_eq!(frame.columns()[0], "c0");
        assert_eq!(frame.columns()[50], "c50");
        assert_eq!(frame.len(), 200);
    }

    #[test]
    fn missing_and_remaining_columns() {
        let frame = Frame::from_records(records(json!([{ "x": 1, "y": 2 }])));

        assert_eq!(frame.missing_columns(&["y", "z"]), vec!["z".to_string()]);
        assert_eq!(frame.columns_except(&["y"]), vec!["x".to_string()]);
    }

    #[test]
    fn to_matrix_converts_cells() {
        let frame = Frame::from_records(records(json!([
            { "x": 1.5, "y": true },
            { "x": "2.5", "y": false },
        ])));

        let m = frame.to_matrix(&["y", "x"]).unwrap();
        assert_eq!(m.shape(), &[2, 2]);
        assert_eq!(m[[0, 0]], 1.0);
        assert_eq!(m[[0, 1]], 1.5);
        assert_eq!(m[[1, 0]], 0.0);
        assert_eq!(m[[1, 1]], 2.5);
    }

    #[test]
    fn to_matrix_reports_bad_cells() {
        let frame = Frame::from_records(records(json!([
            { "x": 1 },
            { "x": null },
        ])));
        assert_eq!(
            frame.to_matrix(&["x"]).unwrap_err(),
            MlError::MissingValue {
                column: "x".into(),
                row: 1
            }
        );

        let frame = Frame::from_records(records(json!([{ "x": "abc" }])));
        assert_eq!(
            frame.to_matrix(&["x"]).unwrap_err(),
            MlError::NonNumeric {
                column: "x".into(),
                row: 0
            }
        );
    }

    #[test]
    fn empty_frame_has_no_columns() {
        let frame = Frame::from_records(Vec::new());
        assert!(frame.is_empty());
        assert!(frame.columns().is_empty());
        assert_eq!(frame.to_matrix::<&str>(&[]).unwrap().shape(), &[0, 0]);
    }
}
