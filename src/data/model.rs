use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// Value – a single cell of a tabular data file
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value, guessed from delimited text.
/// Using `BTreeMap` / `BTreeSet` downstream so `Value` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl Value {
    /// Try to interpret the value as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) if v.is_finite() => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Normalised form used when matching two files on a shared key.
    ///
    /// `None` means the key is missing and matches nothing. Integral floats
    /// collapse to integers so that `6` and `6.0` join.
    pub fn join_key(&self) -> Option<Value> {
        match self {
            Value::Null => None,
            Value::Float(v) if !v.is_finite() => None,
            Value::Float(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
                Some(Value::Integer(*v as i64))
            }
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(Value::String(s.trim().to_string())),
            other => Some(other.clone()),
        }
    }

    /// Loose "== 1" test used for the 0/1 indicator columns.
    pub fn is_flag_set(&self) -> bool {
        match self {
            Value::Integer(i) => *i == 1,
            Value::Float(v) => *v == 1.0,
            Value::Bool(b) => *b,
            Value::String(s) => s.trim() == "1",
            Value::Null => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of a data file
// ---------------------------------------------------------------------------

/// One row: a job posting, a per-region aggregate or a derived bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for derived rows and fixtures.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Missing fields read as `Null`.
    pub fn value(&self, field: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.fields.get(field).unwrap_or(&NULL)
    }

    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_string(), value);
    }
}

// ---------------------------------------------------------------------------
// Table – a complete loaded data file
// ---------------------------------------------------------------------------

/// A parsed data file with pre-computed column indices.
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// All rows.
    pub records: Vec<Record>,
    /// Column names in header order, followed by any derived columns.
    pub column_names: Vec<String>,
    /// For each column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<Value>>,
}

impl Table {
    /// Build column indices from loaded records, keeping `header` order.
    pub fn from_records(header: Vec<String>, records: Vec<Record>) -> Self {
        let mut column_names = header;
        let mut unique_values: BTreeMap<String, BTreeSet<Value>> = BTreeMap::new();

        for rec in &records {
            for (col, val) in &rec.fields {
                if !column_names.contains(col) {
                    column_names.push(col.clone());
                }
                unique_values
                    .entry(col.clone())
                    .or_default()
                    .insert(val.clone());
            }
        }
        Table {
            records,
            column_names,
            unique_values,
        }
    }

    /// Rebuild a table from transformed records, keeping this table's header.
    pub fn derive(&self, records: Vec<Record>) -> Self {
        Self::from_records(self.column_names.clone(), records)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_names.iter().any(|c| c == name)
    }

    /// Numeric values of a column, skipping nulls and non-numbers.
    pub fn numeric_column(&self, field: &str) -> Vec<f64> {
        self.records
            .iter()
            .filter_map(|r| r.get_f64(field))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_key_collapses_integral_floats() {
        assert_eq!(Value::Float(6.0).join_key(), Some(Value::Integer(6)));
        assert_eq!(Value::Integer(6).join_key(), Some(Value::Integer(6)));
        assert_eq!(Value::Float(6.5).join_key(), Some(Value::Float(6.5)));
        assert_eq!(Value::Null.join_key(), None);
        assert_eq!(Value::String("  ".into()).join_key(), None);
    }

    #[test]
    fn flag_set_accepts_loose_ones() {
        assert!(Value::Integer(1).is_flag_set());
        assert!(Value::Float(1.0).is_flag_set());
        assert!(Value::String("1".into()).is_flag_set());
        assert!(Value::Bool(true).is_flag_set());
        assert!(!Value::Integer(0).is_flag_set());
        assert!(!Value::Null.is_flag_set());
    }

    #[test]
    fn table_tracks_unique_values_and_derived_columns() {
        let records = vec![
            Record::new().with("industry", "Tech").with("n", 1i64),
            Record::new().with("industry", "Finance").with("n", 2i64),
            Record::new().with("industry", "Tech").with("extra", 0.5),
        ];
        let table = Table::from_records(vec!["industry".into(), "n".into()], records);

        assert_eq!(table.len(), 3);
        assert_eq!(table.column_names, vec!["industry", "n", "extra"]);
        assert_eq!(table.unique_values["industry"].len(), 2);
        assert_eq!(table.numeric_column("n"), vec![1.0, 2.0]);
        assert_eq!(table.records[2].value("n"), &Value::Null);
    }
}
