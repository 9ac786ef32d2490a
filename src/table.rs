//! Row-oriented query results.
//!
//! A [`Table`] is the materialized form of one panel query: ordered columns
//! plus rows of scalar [`Value`]s. Tables are scoped to a single render pass
//! and discarded after display.

use chrono::NaiveDate;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::session::protocol::ExecuteQueryResponse;

/// A scalar cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Null,
}

impl Value {
    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Decode a JSON cell using the column's declared database type.
    ///
    /// DATE/TIMESTAMP columns arrive as strings; the date portion is kept.
    pub fn from_json(cell: &serde_json::Value, data_type: &str) -> Value {
        match cell {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Int(i64::from(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => {
                let upper = data_type.to_ascii_uppercase();
                if upper.starts_with("DATE") || upper.starts_with("TIMESTAMP") {
                    let date_part = s.get(..10).unwrap_or(s);
                    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
                        Ok(d) => Value::Date(d),
                        Err(_) => Value::Str(s.clone()),
                    }
                } else {
                    Value::Str(s.clone())
                }
            }
            other => Value::Str(other.to_string()),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{}", s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Null => write!(f, ""),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Str(s) => serializer.serialize_str(s),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Date(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            Value::Null => serializer.serialize_none(),
        }
    }
}

/// A result column: name plus the database's declared type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub data_type: String,
}

/// A row-oriented result table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build a table from column definitions and rows.
    ///
    /// Rows shorter than the column list are padded with NULLs; longer rows
    /// are truncated.
    pub fn new(columns: Vec<Column>, mut rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        for row in &mut rows {
            row.resize(width, Value::Null);
        }
        Self { columns, rows }
    }

    /// Materialize a worker query response.
    pub fn from_response(response: &ExecuteQueryResponse) -> Self {
        let columns: Vec<Column> = response
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                data_type: c.data_type.clone(),
            })
            .collect();

        let rows = response
            .rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(i, col)| {
                        row.get(i)
                            .map(|cell| Value::from_json(cell, &col.data_type))
                            .unwrap_or(Value::Null)
                    })
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Cell lookup by row index and column name.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// The single scalar of an aggregate query: first column of the first
    /// row. `None` for an empty result.
    pub fn scalar(&self) -> Option<&Value> {
        self.rows.first()?.first()
    }

    /// Numeric view of [`Table::scalar`]. A NULL aggregate (SUM/AVG over
    /// zero rows) and an empty result both read as `None`.
    pub fn scalar_f64(&self) -> Option<f64> {
        self.scalar()?.as_f64()
    }
}

// Serialized row-oriented: an array of {column: value} records, the shape
// chart consumers expect.
impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Record<'a> {
            columns: &'a [Column],
            row: &'a [Value],
        }

        impl Serialize for Record<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.columns.len()))?;
                for (col, value) in self.columns.iter().zip(self.row) {
                    map.serialize_entry(&col.name, value)?;
                }
                map.end()
            }
        }

        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&Record {
                columns: &self.columns,
                row,
            })?;
        }
        seq.end()
    }
}

/// Fixed-point formatting with thousands separators: `4.75` -> `"4.75"`,
/// `1234567.5` with 2 decimals -> `"1,234,567.50"`.
pub fn format_number(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value);
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::protocol::QueryResultColumn;

    fn response(
        columns: Vec<(&str, &str)>,
        rows: Vec<Vec<serde_json::Value>>,
    ) -> ExecuteQueryResponse {
        ExecuteQueryResponse {
            row_count: rows.len() as i64,
            columns: columns
                .into_iter()
                .map(|(name, data_type)| QueryResultColumn {
                    name: name.to_string(),
                    data_type: data_type.to_string(),
                })
                .collect(),
            rows,
        }
    }

    #[test]
    fn test_from_response_decodes_types() {
        let resp = response(
            vec![
                ("WAREHOUSE_NAME", "TEXT"),
                ("USAGE_DATE", "DATE"),
                ("TOTAL_CREDITS_USED", "FLOAT"),
            ],
            vec![vec![
                serde_json::json!("ADHOC_WH"),
                serde_json::json!("2024-01-05"),
                serde_json::json!(3.5),
            ]],
        );

        let table = Table::from_response(&resp);
        assert_eq!(table.row_count(), 1);
        assert_eq!(
            table.cell(0, "WAREHOUSE_NAME"),
            Some(&Value::Str("ADHOC_WH".into()))
        );
        assert_eq!(
            table.cell(0, "USAGE_DATE"),
            Some(&Value::Date(
                NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
            ))
        );
        assert_eq!(table.cell(0, "TOTAL_CREDITS_USED"), Some(&Value::Float(3.5)));
    }

    #[test]
    fn test_timestamp_keeps_date_portion() {
        let v = Value::from_json(
            &serde_json::json!("2024-01-05T12:34:56Z"),
            "TIMESTAMP_LTZ",
        );
        assert_eq!(
            v,
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
        );
    }

    #[test]
    fn test_scalar_access() {
        let resp = response(vec![("CREDITS", "FLOAT")], vec![vec![serde_json::json!(4.75)]]);
        let table = Table::from_response(&resp);
        assert_eq!(table.scalar_f64(), Some(4.75));

        let empty = Table::from_response(&response(vec![("CREDITS", "FLOAT")], vec![]));
        assert_eq!(empty.scalar_f64(), None);

        let null = Table::from_response(&response(
            vec![("CREDITS", "FLOAT")],
            vec![vec![serde_json::Value::Null]],
        ));
        assert_eq!(null.scalar_f64(), None);
    }

    #[test]
    fn test_short_rows_padded() {
        let resp = response(
            vec![("A", "TEXT"), ("B", "TEXT")],
            vec![vec![serde_json::json!("x")]],
        );
        let table = Table::from_response(&resp);
        assert_eq!(table.cell(0, "B"), Some(&Value::Null));
    }

    #[test]
    fn test_row_oriented_serialization() {
        let resp = response(
            vec![("NAME", "TEXT"), ("N", "NUMBER")],
            vec![vec![serde_json::json!("a"), serde_json::json!(1)]],
        );
        let table = Table::from_response(&resp);
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json, serde_json::json!([{"NAME": "a", "N": 1}]));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(4.75, 2), "4.75");
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_number(1234567.5, 2), "1,234,567.50");
        assert_eq!(format_number(-1234.5, 3), "-1,234.500");
        assert_eq!(format_number(999.0, 0), "999");
        assert_eq!(format_number(1000.0, 0), "1,000");
    }
}
