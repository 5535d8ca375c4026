//! Dictionary: keys array dipasangkan dengan values array atau values table

use std::fmt;

use super::{Table, Value};
use crate::error::ModelError;

#[derive(Debug, Clone, PartialEq)]
pub struct Dictionary {
    keys: Value,
    values: Value,
}

impl Dictionary {
    /// `values` boleh array (parallel) atau `Value::Table` (satu row per key).
    /// Cardinality harus sama dan lebih dari nol.
    pub fn new(keys: Value, values: Value) -> Result<Self, ModelError> {
        if !keys.is_array() {
            return Err(ModelError::DictionaryKeys);
        }
        if !values.is_array() && !matches!(values, Value::Table(_)) {
            return Err(ModelError::DictionaryValues);
        }

        let keys_len = keys.len().unwrap_or(0);
        let values_len = values.len().unwrap_or(0);
        if keys_len == 0 || values_len == 0 {
            return Err(ModelError::EmptyDictionary);
        }
        if keys_len != values_len {
            return Err(ModelError::DictionaryLength {
                keys: keys_len,
                values: values_len,
            });
        }

        Ok(Self { keys, values })
    }

    #[inline]
    pub fn keys(&self) -> &Value {
        &self.keys
    }

    #[inline]
    pub fn values(&self) -> &Value {
        &self.values
    }

    /// Values table, jika dictionary ini dibangun di atas table
    pub fn values_table(&self) -> Option<&Table> {
        self.values.as_table()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len().unwrap_or(0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value untuk key ke-`index`; row table dikembalikan sebagai general list
    pub fn value_at(&self, index: usize) -> Option<Value> {
        match &self.values {
            Value::Table(t) => t.row(index).map(|row| Value::List(row.to_vec())),
            values => values.element(index),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Value, Value)> + '_ {
        (0..self.len()).filter_map(|i| Some((self.keys.element(i)?, self.value_at(i)?)))
    }

    pub fn into_parts(self) -> (Value, Value) {
        (self.keys, self.values)
    }
}

impl fmt::Display for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.iter() {
            writeln!(f, "{key}| {value}")?;
        }
        Ok(())
    }
}
