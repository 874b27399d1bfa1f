// Column-oriented view over provider rows.
//
// A `Table` keeps the provider's column names and its rows of JSON scalars
// as-is, so seasons with extra or missing fields still line up after
// concatenation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("duplicate column `{0}`")]
    DuplicateColumn(String),
}

/// Named columns plus rows of cells. Every row has one cell per column; the
/// row index is implicit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// Unchecked wire form; decoding goes through [`Table::new`].
#[derive(Deserialize)]
struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl TryFrom<RawTable> for Table {
    type Error = TableError;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        Table::new(raw.columns, raw.rows)
    }
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, TableError> {
        for (i, name) in columns.iter().enumerate() {
            if columns[..i].contains(name) {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
        }
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != columns.len() {
                return Err(TableError::RowWidth {
                    row,
                    found: cells.len(),
                    expected: columns.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |cells| Row {
            columns: &self.columns,
            cells,
        })
    }

    /// Lower-case every column name. Fails if two names collide once folded.
    pub fn lowercase_columns(self) -> Result<Self, TableError> {
        let columns = self.columns.iter().map(|c| c.to_lowercase()).collect();
        Self::new(columns, self.rows)
    }

    /// Set `name` to `value` on every row, appending the column if absent.
    pub fn with_constant_column(mut self, name: &str, value: Value) -> Self {
        match self.column_index(name) {
            Some(idx) => {
                for row in &mut self.rows {
                    row[idx] = value.clone();
                }
            }
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(value.clone());
                }
            }
        }
        self
    }

    /// Row-wise concatenation. Columns are unioned in first-seen order and
    /// cells missing from a source table are filled with null.
    pub fn concat(tables: Vec<Table>) -> Table {
        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for name in &table.columns {
                if !columns.contains(name) {
                    columns.push(name.clone());
                }
            }
        }

        let total: usize = tables.iter().map(Table::len).sum();
        let mut rows = Vec::with_capacity(total);
        for table in tables {
            let mapping: Vec<Option<usize>> =
                columns.iter().map(|c| table.column_index(c)).collect();
            for cells in table.rows {
                rows.push(
                    mapping
                        .iter()
                        .map(|idx| idx.map_or(Value::Null, |i| cells[i].clone()))
                        .collect(),
                );
            }
        }

        Table { columns, rows }
    }
}

/// Borrowed view of one row with lookups by column name.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    cells: &'a [Value],
}

impl<'a> Row<'a> {
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        let idx = self.columns.iter().position(|c| c == name)?;
        self.cells.get(idx)
    }

    /// Numeric cell value. Null, text and non-finite values read as `None`.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_f64().filter(|v| v.is_finite())
    }

    pub fn text(&self, name: &str) -> Option<&'a str> {
        self.get(name)?.as_str()
    }

    pub fn cells(&self) -> &'a [Value] {
        self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn new_rejects_ragged_rows() {
        let err = Table::new(cols(&["a", "b"]), vec![vec![json!(1), json!(2)], vec![json!(3)]])
            .unwrap_err();
        assert_eq!(
            err,
            TableError::RowWidth {
                row: 1,
                found: 1,
                expected: 2
            }
        );
    }

    #[test]
    fn deserialize_checks_row_width() {
        let err = serde_json::from_str::<Table>(r#"{"columns":["team_name","gp"],"rows":[["A"]]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("row 0 has 1 cells, expected 2"), "{err}");

        assert!(serde_json::from_str::<Table>(r#"{"columns":["a","a"],"rows":[]}"#).is_err());
    }

    #[test]
    fn serde_round_trip_keeps_table() {
        let table = Table::new(cols(&["a", "b"]), vec![vec![json!(1), json!("x")]]).unwrap();
        let text = serde_json::to_string(&table).unwrap();
        assert_eq!(serde_json::from_str::<Table>(&text).unwrap(), table);
    }

    #[test]
    fn new_rejects_duplicate_columns() {
        let err = Table::new(cols(&["a", "a"]), vec![]).unwrap_err();
        assert_eq!(err, TableError::DuplicateColumn("a".into()));
    }

    #[test]
    fn lowercase_columns_keeps_cells() {
        let table = Table::new(
            cols(&["TEAM_NAME", "GP"]),
            vec![vec![json!("Boston Celtics"), json!(82)]],
        )
        .unwrap()
        .lowercase_columns()
        .unwrap();

        assert_eq!(table.columns(), &["team_name".to_string(), "gp".to_string()]);
        let row = table.rows().next().unwrap();
        assert_eq!(row.text("team_name"), Some("Boston Celtics"));
        assert_eq!(row.number("gp"), Some(82.0));
    }

    #[test]
    fn lowercase_columns_detects_collisions() {
        let table = Table::new(cols(&["GP", "gp"]), vec![]).unwrap();
        assert!(table.lowercase_columns().is_err());
    }

    #[test]
    fn with_constant_column_appends_or_overwrites() {
        let table = Table::new(cols(&["pts"]), vec![vec![json!(1)], vec![json!(2)]])
            .unwrap()
            .with_constant_column("season", json!("2023-24"));
        assert_eq!(table.columns().last().unwrap(), "season");
        assert!(table.rows().all(|r| r.text("season") == Some("2023-24")));

        let table = table.with_constant_column("season", json!("2022-23"));
        assert_eq!(table.columns().len(), 2);
        assert!(table.rows().all(|r| r.text("season") == Some("2022-23")));
    }

    #[test]
    fn concat_unions_columns_and_fills_nulls() {
        let a = Table::new(cols(&["team_name", "pts"]), vec![vec![json!("A"), json!(10)]]).unwrap();
        let b = Table::new(
            cols(&["team_name", "fg3a"]),
            vec![vec![json!("B"), json!(5)], vec![json!("C"), json!(6)]],
        )
        .unwrap();

        let combined = Table::concat(vec![a, b]);
        assert_eq!(combined.columns(), &cols(&["team_name", "pts", "fg3a"])[..]);
        assert_eq!(combined.len(), 3);

        let rows: Vec<Row<'_>> = combined.rows().collect();
        assert_eq!(rows[0].number("fg3a"), None);
        assert_eq!(rows[1].get("pts"), Some(&Value::Null));
        assert_eq!(rows[2].number("fg3a"), Some(6.0));
    }

    #[test]
    fn concat_of_nothing_is_empty() {
        let combined = Table::concat(vec![]);
        assert!(combined.is_empty());
        assert!(combined.columns().is_empty());
    }

    #[test]
    fn number_ignores_text_and_missing() {
        let table = Table::new(
            cols(&["gp", "note"]),
            vec![vec![json!("82"), json!(null)]],
        )
        .unwrap();
        let row = table.rows().next().unwrap();
        assert_eq!(row.number("gp"), None);
        assert_eq!(row.number("note"), None);
        assert_eq!(row.number("absent"), None);
    }
}
