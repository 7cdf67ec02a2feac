use crate::error::{DstError, Result};

// ---------------------------------------------------------------------------
// Table – the parsed particle file
// ---------------------------------------------------------------------------

/// Named numeric columns, one row per particle.
///
/// Columns keep the order of the file header and always have the same
/// length, so row `i` of every column describes the same particle.
#[derive(Debug, Clone, Default)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl Table {
    /// Build a table from `(name, values)` pairs.
    ///
    /// Fails when the columns do not all have the same length.
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Vec<f64>)>) -> Result<Self> {
        let mut table = Table::default();
        for (name, values) in columns {
            let name = name.into();
            if let Some(first) = table.columns.first() {
                if first.len() != values.len() {
                    return Err(DstError::Parse {
                        line: 0,
                        message: format!(
                            "column '{name}' has {} rows, expected {}",
                            values.len(),
                            first.len()
                        ),
                    });
                }
            }
            table.names.push(name);
            table.columns.push(values);
        }
        Ok(table)
    }

    /// Column names, in file order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Values of the named column.
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
            .ok_or_else(|| DstError::MissingColumn(name.to_string()))
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_lookup_by_name() {
        let table = Table::from_columns(vec![
            ("x(mm)", vec![1.0, 2.0]),
            ("x'(mrad)", vec![3.0, 4.0]),
        ])
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("x'(mrad)").unwrap(), &[3.0, 4.0]);
        assert_eq!(table.column_names(), &["x(mm)", "x'(mrad)"]);
    }

    #[test]
    fn missing_column_is_named_in_error() {
        let table = Table::from_columns(vec![("x(mm)", vec![1.0])]).unwrap();
        let err = table.column("Energy(MeV)").unwrap_err();
        assert!(matches!(err, DstError::MissingColumn(ref c) if c == "Energy(MeV)"));
    }

    #[test]
    fn ragged_columns_are_rejected() {
        let result = Table::from_columns(vec![("a", vec![1.0, 2.0]), ("b", vec![1.0])]);
        assert!(result.is_err());
    }
}
