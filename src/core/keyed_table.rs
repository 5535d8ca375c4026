//! KeyedTable: key table dipasangkan row-wise dengan value table

use std::fmt;

use super::{Table, Value};
use crate::error::ModelError;

#[derive(Debug, Clone, PartialEq)]
pub struct KeyedTable {
    keys: Table,
    values: Table,
}

impl KeyedTable {
    pub fn new(keys: Table, values: Table) -> Result<Self, ModelError> {
        let (k, v) = (keys.rows_count(), values.rows_count());
        if k == 0 || v == 0 || k != v {
            return Err(ModelError::KeyedTableRows { keys: k, values: v });
        }
        Ok(Self { keys, values })
    }

    /// Partisi `columns` menjadi key columns dan value columns,
    /// urutan relatif di tiap partisi dipertahankan.
    pub fn from_columns(
        columns: Vec<String>,
        key_columns: &[&str],
        data: Vec<Value>,
    ) -> Result<Self, ModelError> {
        if columns.is_empty() || data.is_empty() {
            return Err(ModelError::EmptyTable);
        }
        if columns.len() != data.len() {
            return Err(ModelError::ColumnCountMismatch {
                columns: columns.len(),
                data: data.len(),
            });
        }
        if key_columns.is_empty() {
            return Err(ModelError::UnknownKeyColumn(String::new()));
        }
        if let Some(missing) = key_columns.iter().find(|k| !columns.iter().any(|c| c == *k)) {
            return Err(ModelError::UnknownKeyColumn(missing.to_string()));
        }

        let mut key_part = (Vec::new(), Vec::new());
        let mut value_part = (Vec::new(), Vec::new());
        for (name, column) in columns.into_iter().zip(data) {
            let part = if key_columns.contains(&name.as_str()) {
                &mut key_part
            } else {
                &mut value_part
            };
            part.0.push(name);
            part.1.push(column);
        }

        Self::new(
            Table::new(key_part.0, key_part.1)?,
            Table::new(value_part.0, value_part.1)?,
        )
    }

    #[inline]
    pub fn keys(&self) -> &Table {
        &self.keys
    }

    #[inline]
    pub fn values(&self) -> &Table {
        &self.values
    }

    #[inline]
    pub fn rows_count(&self) -> usize {
        self.keys.rows_count()
    }

    /// `(key row, value row)` sebagai general lists
    pub fn iter(&self) -> impl Iterator<Item = (Value, Value)> + '_ {
        self.keys
            .rows()
            .zip(self.values.rows())
            .map(|(k, v)| (Value::List(k.to_vec()), Value::List(v.to_vec())))
    }

    pub fn into_parts(self) -> (Table, Table) {
        (self.keys, self.values)
    }
}

impl fmt::Display for KeyedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.keys.rows().zip(self.values.rows()) {
            writeln!(f, "{key}| {value}")?;
        }
        Ok(())
    }
}
