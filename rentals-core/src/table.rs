//! In-memory tabular data.
//!
//! A [`Table`] owns a fixed column schema and an ordered list of rows. Every
//! row has exactly one [`Value`] per column; the constructors reject ragged
//! input so downstream code can index by column position.

use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

use crate::{Value, ValueKind};

/// Errors raised when building or querying a [`Table`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// The same column name appears twice in the header.
    #[error("column {name:?} appears more than once")]
    DuplicateColumn {
        /// Repeated column name.
        name: String,
    },
    /// A row does not have one value per column.
    #[error("row {row} has {found} values but the table has {expected} columns")]
    RowWidth {
        /// Zero-based row position.
        row: usize,
        /// Number of columns in the schema.
        expected: usize,
        /// Number of values supplied.
        found: usize,
    },
    /// A column needed by an operation is absent.
    #[error("required column {name:?} is missing")]
    MissingColumn {
        /// Name of the absent column.
        name: String,
    },
}

/// An ordered collection of rows with a fixed column schema.
///
/// # Examples
///
/// ```
/// use rentals_core::{Table, Value};
///
/// # fn main() -> Result<(), rentals_core::TableError> {
/// let mut table = Table::new(vec!["name".into(), "price".into()])?;
/// table.push_row(vec![Value::from("Loft"), Value::Number(120.0)])?;
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.value(0, "price"), Some(&Value::Number(120.0)));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given columns.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::DuplicateColumn`] when a column name repeats.
    pub fn new(columns: Vec<String>) -> Result<Self, TableError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(TableError::DuplicateColumn { name: name.clone() });
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Create a table and populate it with `rows`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] for duplicate columns or a row of the wrong width.
    pub fn from_rows<I>(columns: Vec<String>, rows: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = Vec<Value>>,
    {
        let mut table = Self::new(columns)?;
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Create an empty table sharing this table's schema.
    #[must_use]
    pub fn empty_like(&self) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: Vec::new(),
        }
    }

    /// Append a row; it must have one value per column.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::RowWidth`] when `row` does not match the schema.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Column names in schema order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in table order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[Value]> + '_ {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Report whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `name` in the schema.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Position of `name` in the schema, or [`TableError::MissingColumn`].
    ///
    /// # Errors
    ///
    /// Returns [`TableError::MissingColumn`] when `name` is not in the schema.
    pub fn require_column(&self, name: &str) -> Result<usize, TableError> {
        self.column_index(name)
            .ok_or_else(|| TableError::MissingColumn {
                name: name.to_owned(),
            })
    }

    /// Value at `row` in column `name`.
    #[must_use]
    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        let column = self.column_index(name)?;
        self.rows.get(row)?.get(column)
    }

    /// Iterate over one column's values in row order.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::MissingColumn`] when `name` is not in the schema.
    pub fn column_values(
        &self,
        name: &str,
    ) -> Result<impl Iterator<Item = &Value> + '_, TableError> {
        let column = self.require_column(name)?;
        Ok(self.rows.iter().filter_map(move |row| row.get(column)))
    }

    /// Keep only the rows for which `keep` returns `true`.
    ///
    /// Relative row order is preserved.
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[Value]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }

    /// Replace every value in column `name` with `convert(value)`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::MissingColumn`] when `name` is not in the schema.
    pub fn map_column<F>(&mut self, name: &str, mut convert: F) -> Result<(), TableError>
    where
        F: FnMut(&Value) -> Value,
    {
        let column = self.require_column(name)?;
        for cell in self.rows.iter_mut().filter_map(|row| row.get_mut(column)) {
            *cell = convert(cell);
        }
        Ok(())
    }

    /// Describe every column: non-null count and dominant value kind.
    #[must_use]
    pub fn summary(&self) -> Vec<ColumnSummary> {
        self.columns
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let mut kinds: BTreeMap<ValueKind, usize> = BTreeMap::new();
                for value in self.rows.iter().filter_map(|row| row.get(index)) {
                    if !value.is_null() {
                        *kinds.entry(value.kind()).or_default() += 1;
                    }
                }
                let non_null = kinds.values().sum();
                let kind = kinds
                    .into_iter()
                    .max_by_key(|(_, count)| *count)
                    .map(|(kind, _)| kind);
                ColumnSummary {
                    name: name.clone(),
                    non_null,
                    kind,
                }
            })
            .collect()
    }
}

/// Per-column statistics returned by [`Table::summary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSummary {
    /// Column name.
    pub name: String,
    /// Number of non-null cells.
    pub non_null: usize,
    /// Most common non-null kind, or `None` when the column is all null.
    pub kind: Option<ValueKind>,
}
