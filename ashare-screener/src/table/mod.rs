//! Schema-tolerant tabular data.
//!
//! Data sources hand us rows keyed by Chinese column names whose presence and
//! spelling drift between sources and over time. Everything here treats the
//! column set as data, not as a fixed struct:
//!
//! - [`Cell`] is the raw value of one column in one row
//! - [`StockRecord`] is one row
//! - [`Dataset`] is an ordered set of rows plus the union of their columns
//! - [`columns`] resolves semantic fields through alias lists
//! - [`normalize`] turns any cell into a number or "missing"

pub mod columns;
pub mod normalize;

pub use columns::{resolve, Field, ResolvedColumns};
pub use normalize::{parse_number, to_number};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Cell
// ============================================================================

/// Raw cell value as delivered by a data source.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    /// Numeric value (may still be NaN or infinite; see `normalize`)
    Number(f64),
    /// Textual value, possibly with units, separators or a no-data sentinel
    Text(String),
    /// Null or absent
    #[default]
    Missing,
}

static MISSING: Cell = Cell::Missing;

impl Cell {
    /// Whether the cell holds no value at all.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Render the cell as display text; `Missing` renders as "".
    pub fn as_text(&self) -> String {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
            Self::Missing => String::new(),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Missing, Into::into)
    }
}

impl From<serde_json::Value> for Cell {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Missing,
            Value::Number(n) => n.as_f64().map_or(Self::Missing, Self::Number),
            Value::String(s) => Self::Text(s),
            other => Self::Text(other.to_string()),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            Self::Number(_) | Self::Missing => serializer.serialize_none(),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

// ============================================================================
// Stock Record
// ============================================================================

/// One row of a dataset: column name → raw cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockRecord {
    cells: BTreeMap<String, Cell>,
}

impl StockRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Cell>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Cell>) {
        self.cells.insert(column.into(), value.into());
    }

    /// Cell for `column`; absent columns read as `Missing`.
    pub fn get(&self, column: &str) -> &Cell {
        self.cells.get(column).unwrap_or(&MISSING)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    /// Exchange code (`代码`), or "" when absent.
    pub fn code(&self) -> String {
        self.get(Field::Code.aliases()[0]).as_text()
    }

    fn without(&self, column: &str) -> Self {
        let mut cells = self.cells.clone();
        cells.remove(column);
        Self { cells }
    }
}

impl<K: Into<String>, V: Into<Cell>> FromIterator<(K, V)> for StockRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

// ============================================================================
// Dataset
// ============================================================================

/// Ordered rows sharing a (source-defined) column set.
///
/// A dataset is never modified in place by the pipeline: filtering produces a
/// new derived dataset and leaves the loaded one intact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<StockRecord>,
}

impl Dataset {
    /// Create a dataset with an explicit column list.
    pub fn new(columns: Vec<String>, rows: Vec<StockRecord>) -> Self {
        Self { columns, rows }
    }

    /// Create a dataset whose columns are the union of the rows' columns,
    /// in first-seen order.
    pub fn from_records(rows: Vec<StockRecord>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for column in row.columns() {
                if !columns.iter().any(|c| c == column) {
                    columns.push(column.to_string());
                }
            }
        }
        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn rows(&self) -> &[StockRecord] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<StockRecord> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Derived dataset with the rows matching `predicate`; columns are kept.
    pub fn filter_rows(&self, mut predicate: impl FnMut(&StockRecord) -> bool) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| predicate(r)).cloned().collect(),
        }
    }

    /// Derived dataset restricted to the given exchange codes.
    pub fn retain_codes(&self, codes: &[String]) -> Self {
        self.filter_rows(|row| {
            let code = row.code();
            codes.iter().any(|c| *c == code)
        })
    }

    /// Derived dataset with one column dropped from the schema and every row.
    pub fn without_column(&self, column: &str) -> Self {
        Self {
            columns: self.columns.iter().filter(|c| *c != column).cloned().collect(),
            rows: self.rows.iter().map(|r| r.without(column)).collect(),
        }
    }
}

impl<'de> Deserialize<'de> for Dataset {
    /// A dataset deserializes from a JSON array of row objects.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<StockRecord>::deserialize(deserializer).map(Self::from_records)
    }
}

impl Serialize for Dataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.rows.serialize(serializer)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_from_json() {
        assert_eq!(Cell::from(json!(null)), Cell::Missing);
        assert_eq!(Cell::from(json!(1.5)), Cell::Number(1.5));
        assert_eq!(Cell::from(json!("-")), Cell::Text("-".into()));
        assert_eq!(Cell::from(json!(true)), Cell::Text("true".into()));
    }

    #[test]
    fn test_cell_as_text() {
        assert_eq!(Cell::Number(600519.0).as_text(), "600519");
        assert_eq!(Cell::Number(12.34).as_text(), "12.34");
        assert_eq!(Cell::Text("贵州茅台".into()).as_text(), "贵州茅台");
        assert_eq!(Cell::Missing.as_text(), "");
    }

    #[test]
    fn test_record_absent_column_is_missing() {
        let record = StockRecord::new().with("代码", "600519");
        assert!(record.get("市盈率-动态").is_missing());
        assert_eq!(record.code(), "600519");
    }

    #[test]
    fn test_dataset_from_json_rows() {
        let dataset: Dataset = serde_json::from_value(json!([
            {"代码": "600519", "名称": "贵州茅台", "市盈率-动态": 28.5},
            {"代码": "000001", "市净率": "-"}
        ]))
        .unwrap();

        assert_eq!(dataset.len(), 2);
        assert!(dataset.has_column("市净率"));
        assert!(dataset.has_column("名称"));
        assert_eq!(dataset.rows()[1].get("名称"), &Cell::Missing);
    }

    #[test]
    fn test_filter_rows_leaves_source_intact() {
        let dataset = Dataset::from_records(vec![
            StockRecord::new().with("代码", "A"),
            StockRecord::new().with("代码", "B"),
        ]);
        let only_b = dataset.filter_rows(|r| r.code() == "B");

        assert_eq!(only_b.len(), 1);
        assert_eq!(dataset.len(), 2);
        assert_eq!(only_b.columns(), dataset.columns());
    }

    #[test]
    fn test_retain_codes_and_without_column() {
        let dataset = Dataset::from_records(vec![
            StockRecord::new().with("代码", "600000").with("市净率", 0.6),
            StockRecord::new().with("代码", "000002").with("市净率", 1.1),
        ]);

        let kept = dataset.retain_codes(&["000002".to_string()]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept.rows()[0].code(), "000002");

        let dropped = dataset.without_column("市净率");
        assert!(!dropped.has_column("市净率"));
        assert!(!dropped.rows()[0].contains("市净率"));
    }
}
