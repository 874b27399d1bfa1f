// CSV export of a table: header row of column names, one line per row, no
// index column.

use std::io::Write;

use serde_json::Value;
use thiserror::Error;

use crate::table::Table;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush CSV output: {0}")]
    Io(#[from] std::io::Error),
}

/// Write `table` as CSV into `writer`.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(table.columns())?;
    for row in table.rows() {
        wtr.write_record(row.cells().iter().map(cell_text))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Serialize `table` to an in-memory CSV document.
pub fn to_csv_bytes(table: &Table) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    write_csv(table, &mut buf)?;
    Ok(buf)
}

/// Text form of one cell: strings unquoted, null as an empty field.
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Table {
        Table::new(
            ["team_name", "gp", "pts", "fg3_pct", "season"]
                .map(String::from)
                .to_vec(),
            vec![
                vec![json!("Boston Celtics"), json!(82), json!(9887), json!(0.388), json!("2023-24")],
                vec![json!("Team, With Comma"), json!(82), Value::Null, json!(0.35), json!("2023-24")],
                vec![json!("Denver Nuggets"), json!(82), json!(9550), json!(0.369), json!("2022-23")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn header_is_column_names_without_index() {
        let csv = String::from_utf8(to_csv_bytes(&sample()).unwrap()).unwrap();
        let header = csv.lines().next().unwrap();
        assert_eq!(header, "team_name,gp,pts,fg3_pct,season");
    }

    #[test]
    fn reparse_keeps_rows_and_columns() {
        let table = sample();
        let bytes = to_csv_bytes(&table).unwrap();

        let mut rdr = csv::Reader::from_reader(bytes.as_slice());
        let headers: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, table.columns());

        let records: Vec<csv::StringRecord> = rdr.records().map(Result::unwrap).collect();
        assert_eq!(records.len(), table.len());
        assert!(records.iter().all(|r| r.len() == table.columns().len()));

        assert_eq!(&records[1][0], "Team, With Comma");
        assert_eq!(&records[1][2], "");
        assert_eq!(records[0][3].parse::<f64>().unwrap(), 0.388);
    }

    #[test]
    fn empty_table_writes_header_only() {
        let table = Table::new(vec!["a".into(), "b".into()], vec![]).unwrap();
        let csv = String::from_utf8(to_csv_bytes(&table).unwrap()).unwrap();
        assert_eq!(csv, "a,b\n");
    }
}
