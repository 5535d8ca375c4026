//! Table: column names + satu array per column
//!
//! Row adalah read-only projection (index-based). Mutasi cell hanya lewat
//! `Table::set`, tidak pernah lewat handle row.

use std::fmt;

use super::Value;
use crate::error::ModelError;

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    data: Vec<Value>,
    rows: usize,
}

impl Table {
    /// Validasi: minimal satu column, jumlah nama == jumlah data column,
    /// setiap column berupa array dengan panjang sama.
    pub fn new(columns: Vec<String>, data: Vec<Value>) -> Result<Self, ModelError> {
        if columns.is_empty() || data.is_empty() {
            return Err(ModelError::EmptyTable);
        }
        if columns.len() != data.len() {
            return Err(ModelError::ColumnCountMismatch {
                columns: columns.len(),
                data: data.len(),
            });
        }

        let mut rows = None;
        for (name, column) in columns.iter().zip(&data) {
            if !column.is_array() {
                return Err(ModelError::NonArrayColumn(name.clone()));
            }
            let len = column.len().unwrap_or(0);
            match rows {
                None => rows = Some(len),
                Some(expected) if expected != len => {
                    return Err(ModelError::RowCountMismatch {
                        column: name.clone(),
                        expected,
                        actual: len,
                    });
                }
                Some(_) => {}
            }
        }

        Ok(Self {
            columns,
            data,
            rows: rows.unwrap_or(0),
        })
    }

    /// Shortcut untuk `(name, column)` pairs
    pub fn from_pairs<S: Into<String>>(
        pairs: impl IntoIterator<Item = (S, Value)>,
    ) -> Result<Self, ModelError> {
        let (columns, data) = pairs
            .into_iter()
            .map(|(name, column)| (name.into(), column))
            .unzip();
        Self::new(columns, data)
    }

    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[inline]
    pub fn data(&self) -> &[Value] {
        &self.data
    }

    #[inline]
    pub fn columns_count(&self) -> usize {
        self.columns.len()
    }

    /// Panjang column pertama
    #[inline]
    pub fn rows_count(&self) -> usize {
        self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<&Value> {
        self.column_index(name).map(|i| &self.data[i])
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        (index < self.rows).then_some(Row { table: self, index })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.rows).map(move |index| Row { table: self, index })
    }

    /// Tulis satu cell. Value harus cocok dengan element type column.
    pub fn set(&mut self, column: usize, row: usize, value: Value) -> Result<(), ModelError> {
        if column >= self.data.len() || row >= self.rows {
            return Err(ModelError::CellOutOfBounds { column, row });
        }
        let rendered = value.to_string();
        if self.data[column].set_element(row, value) {
            Ok(())
        } else {
            Err(ModelError::CellType {
                column: self.columns[column].clone(),
                value: rendered,
            })
        }
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Value>) {
        (self.columns, self.data)
    }

    /// Text view dengan header, separator dan maksimal `max_rows` rows.
    /// Setiap column left-aligned selebar isi terpanjang + 1.
    pub fn render(&self, max_rows: usize) -> String {
        let shown = self.rows.min(max_rows);
        let mut cells: Vec<Vec<String>> = Vec::with_capacity(shown + 1);
        cells.push(self.columns.clone());
        for row in self.rows().take(shown) {
            cells.push(row.to_vec().iter().map(render_cell).collect());
        }

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count() + 1).collect();
        for line in &cells[1..] {
            for (width, cell) in widths.iter_mut().zip(line) {
                *width = (*width).max(cell.chars().count() + 1);
            }
        }

        let mut out = String::new();
        for (i, line) in cells.iter().enumerate() {
            for (cell, width) in line.iter().zip(&widths) {
                out.push_str(&format!("{cell:<width$}"));
            }
            out.truncate(out.trim_end().len());
            out.push('\n');
            if i == 0 {
                out.push_str(&"-".repeat(widths.iter().sum()));
                out.push('\n');
            }
        }
        if shown < self.rows {
            out.push_str("..\n");
        }
        out
    }
}

/// Cell rendering: symbol tanpa backtick, sisanya Display biasa
fn render_cell(value: &Value) -> String {
    match value {
        Value::Symbol(s) => s.clone(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(usize::MAX))
    }
}

/// Read-only view atas satu row
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Row<'a> {
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.columns_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell di column ke-`column`
    pub fn get(&self, column: usize) -> Option<Value> {
        self.table.data.get(column)?.element(self.index)
    }

    pub fn get_by_name(&self, name: &str) -> Option<Value> {
        self.get(self.table.column_index(name)?)
    }

    pub fn to_vec(&self) -> Vec<Value> {
        (0..self.len()).filter_map(|c| self.get(c)).collect()
    }
}

impl fmt::Display for Row<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cell) in self.to_vec().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{cell}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Date;

    fn sample() -> Table {
        Table::new(
            vec!["pos".into(), "dates".into()],
            vec![
                Value::symbols(["d1", "d2", "d3"]),
                Value::DateList(vec![Date::new(366), Date::new(121), Date::NULL]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_rows_and_columns() {
        let t = sample();
        assert_eq!(t.rows_count(), 3);
        assert_eq!(t.columns_count(), 2);
        assert_eq!(t.column_index("dates"), Some(1));
        let row = t.row(2).unwrap();
        assert_eq!(row.get(0), Some(Value::symbol("d3")));
        assert_eq!(row.get_by_name("dates").unwrap().to_string(), "0Nd");
        assert!(t.row(3).is_none());
        assert_eq!(t.rows().count(), 3);
    }

    #[test]
    fn test_invalid_tables() {
        assert_eq!(Table::new(vec![], vec![]), Err(ModelError::EmptyTable));
        assert!(matches!(
            Table::new(vec!["a".into(), "b".into()], vec![Value::LongList(vec![1])]),
            Err(ModelError::ColumnCountMismatch { columns: 2, data: 1 })
        ));
        assert_eq!(
            Table::new(vec!["a".into()], vec![Value::Long(1)]),
            Err(ModelError::NonArrayColumn("a".into()))
        );
        assert!(matches!(
            Table::new(
                vec!["a".into(), "b".into()],
                vec![Value::LongList(vec![1, 2]), Value::LongList(vec![1])]
            ),
            Err(ModelError::RowCountMismatch { .. })
        ));
    }

    #[test]
    fn test_set_cell() {
        let mut t = sample();
        t.set(1, 2, Value::Date(Date::new(0))).unwrap();
        assert_eq!(t.row(2).unwrap().get(1), Some(Value::Date(Date::new(0))));
        assert!(t.set(1, 0, Value::Long(1)).is_err());
        assert!(matches!(t.set(0, 9, Value::symbol("x")), Err(ModelError::CellOutOfBounds { .. })));
    }

    #[test]
    fn test_render() {
        let text = sample().render(2);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "pos dates");
        assert_eq!(lines[1], "-".repeat(15));
        assert_eq!(lines[2], "d1  2001.01.01");
        assert_eq!(lines.last(), Some(&".."));
    }
}
