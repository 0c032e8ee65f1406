//! Mocked result sets.

use std::sync::Arc;

use crate::error::TypeError;
use crate::value::SqlValue;

/// A result set: column names and the rows returned for them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rows {
    columns: Arc<[String]>,
    rows: Vec<Vec<SqlValue>>,
}

impl Rows {
    /// Create an empty result set with the given columns.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::ColumnCount`] if the row width differs from the
    /// number of columns.
    pub fn add_row(&mut self, values: Vec<SqlValue>) -> Result<(), TypeError> {
        if values.len() != self.columns.len() {
            return Err(TypeError::ColumnCount {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }
        self.rows.push(values);
        Ok(())
    }

    /// Append a row, builder style.
    ///
    /// # Errors
    ///
    /// Same as [`Rows::add_row`].
    pub fn with_row(mut self, values: Vec<SqlValue>) -> Result<Self, TypeError> {
        self.add_row(values)?;
        Ok(self)
    }

    /// Column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check whether there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get a row by index.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<Row> {
        self.rows.get(idx).map(|values| Row {
            columns: Arc::clone(&self.columns),
            values: values.clone(),
        })
    }

    /// The first row, if any.
    #[must_use]
    pub fn first(&self) -> Option<Row> {
        self.get(0)
    }

    /// Iterate over the rows.
    pub fn iter(&self) -> impl Iterator<Item = Row> + '_ {
        self.rows.iter().map(|values| Row {
            columns: Arc::clone(&self.columns),
            values: values.clone(),
        })
    }
}

/// A single row of a [`Rows`] result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Get a value by column index.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&SqlValue> {
        self.values.get(idx)
    }

    /// Get a value by column name.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value by column name, failing on unknown columns.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::UnknownColumn`] if no column has this name.
    pub fn try_get_by_name(&self, name: &str) -> Result<&SqlValue, TypeError> {
        self.get_by_name(name)
            .ok_or_else(|| TypeError::UnknownColumn(name.to_owned()))
    }

    /// Column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Row values, in column order.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether the row has no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
