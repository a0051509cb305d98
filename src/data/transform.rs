use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use super::model::{Record, Table, Value};
use super::TransformError;
use crate::selection::{EmptyPolicy, SelectionState};

// ---------------------------------------------------------------------------
// Transform stages
// ---------------------------------------------------------------------------

/// One pure step of a data pipeline: a table in, a new table out.
pub trait Transform {
    fn name(&self) -> &'static str;
    fn apply(&self, input: &Table) -> Result<Table, TransformError>;
}

/// An ordered list of stages applied one after the other.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Transform>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, stage: impl Transform + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn apply(&self, input: &Table) -> Result<Table, TransformError> {
        let mut table = input.clone();
        for stage in &self.stages {
            table = stage.apply(&table)?;
            log::debug!("{} -> {} rows", stage.name(), table.len());
        }
        Ok(table)
    }
}

// ---------------------------------------------------------------------------
// Lookup (left join on a shared key)
// ---------------------------------------------------------------------------

/// Copy `fields` from a secondary table into each row whose `key` matches
/// the secondary table's `from_key`.  Rows without a match are kept with the
/// copied fields set to `Null`.
pub struct Lookup {
    key: String,
    fields: Vec<String>,
    index: HashMap<Value, Record>,
}

impl Lookup {
    pub fn new(key: &str, from: &Table, from_key: &str, fields: &[&str]) -> Result<Self, TransformError> {
        for field in std::iter::once(&from_key).chain(fields) {
            if !from.has_column(field) {
                return Err(TransformError::MissingField {
                    field: field.to_string(),
                    table: "lookup source",
                });
            }
        }

        let mut index = HashMap::with_capacity(from.len());
        let mut unkeyed = 0usize;
        let mut duplicates = 0usize;
        for rec in &from.records {
            let Some(k) = rec.value(from_key).join_key() else {
                unkeyed += 1;
                continue;
            };
            // first row wins on duplicate keys
            match index.entry(k) {
                Entry::Occupied(_) => duplicates += 1,
                Entry::Vacant(slot) => {
                    slot.insert(rec.clone());
                }
            }
        }
        if unkeyed > 0 {
            log::warn!("lookup on '{from_key}': {unkeyed} source rows without a key");
        }
        if duplicates > 0 {
            log::debug!("lookup on '{from_key}': {duplicates} duplicate keys ignored");
        }

        Ok(Self {
            key: key.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            index,
        })
    }
}

impl Transform for Lookup {
    fn name(&self) -> &'static str {
        "lookup"
    }

    fn apply(&self, input: &Table) -> Result<Table, TransformError> {
        let mut unmatched = 0usize;
        let records = input
            .records
            .iter()
            .map(|rec| {
                let mut out = rec.clone();
                let found = rec.value(&self.key).join_key().and_then(|k| self.index.get(&k));
                if found.is_none() {
                    unmatched += 1;
                }
                for field in &self.fields {
                    let v = found.map(|src| src.value(field).clone()).unwrap_or(Value::Null);
                    out.set(field, v);
                }
                out
            })
            .collect();
        if unmatched > 0 {
            log::warn!("lookup on '{}': {unmatched} rows had no match", self.key);
        }

        let mut header = input.column_names.clone();
        header.extend(self.fields.iter().filter(|f| !input.has_column(f)).cloned());
        Ok(Table::from_records(header, records))
    }
}

// ---------------------------------------------------------------------------
// Calculate
// ---------------------------------------------------------------------------

/// Add a derived field computed from each row.
pub struct Calculate {
    as_field: String,
    func: Box<dyn Fn(&Record) -> Value>,
}

impl Calculate {
    pub fn new(as_field: &str, func: impl Fn(&Record) -> Value + 'static) -> Self {
        Self {
            as_field: as_field.to_string(),
            func: Box::new(func),
        }
    }
}

impl Transform for Calculate {
    fn name(&self) -> &'static str {
        "calculate"
    }

    fn apply(&self, input: &Table) -> Result<Table, TransformError> {
        let records = input
            .records
            .iter()
            .map(|rec| {
                let mut out = rec.clone();
                out.set(&self.as_field, (self.func)(rec));
                out
            })
            .collect();
        Ok(input.derive(records))
    }
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Keep only the rows passing a predicate.
#[derive(Debug, Clone)]
pub enum Filter {
    /// `min <= field <= max`; nulls and non-numbers fail.
    Range { field: String, min: f64, max: f64 },
    /// Membership in a selection, with the consumer's idle policy.
    Selection {
        state: SelectionState,
        empty: EmptyPolicy,
    },
}

impl Filter {
    pub fn range(field: &str, min: f64, max: f64) -> Self {
        Filter::Range {
            field: field.to_string(),
            min,
            max,
        }
    }

    pub fn test(&self, record: &Record) -> bool {
        match self {
            Filter::Range { field, min, max } => record
                .get_f64(field)
                .is_some_and(|v| v >= *min && v <= *max),
            Filter::Selection { state, empty } => state.test(record, *empty),
        }
    }

    /// Indices of rows passing the filter.
    pub fn indices(&self, table: &Table) -> Vec<usize> {
        table
            .records
            .iter()
            .enumerate()
            .filter(|(_, rec)| self.test(rec))
            .map(|(i, _)| i)
            .collect()
    }
}

impl Transform for Filter {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn apply(&self, input: &Table) -> Result<Table, TransformError> {
        let records = input
            .records
            .iter()
            .filter(|rec| self.test(rec))
            .cloned()
            .collect();
        Ok(input.derive(records))
    }
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum AggregateOp {
    /// Number of rows in the group, written to `count`.
    Count,
    /// Mean of a numeric field (nulls skipped), written to `mean_<field>`.
    Mean(String),
}

impl AggregateOp {
    pub fn output_name(&self) -> String {
        match self {
            AggregateOp::Count => "count".to_string(),
            AggregateOp::Mean(field) => format!("mean_{field}"),
        }
    }
}

/// Group rows and summarise each group.  Output is sorted by `count`
/// descending, ties broken by group values ascending.
pub struct Aggregate {
    groupby: Vec<String>,
    ops: Vec<AggregateOp>,
}

impl Aggregate {
    pub fn new(groupby: &[&str], ops: Vec<AggregateOp>) -> Self {
        Self {
            groupby: groupby.iter().map(|g| g.to_string()).collect(),
            ops,
        }
    }
}

struct GroupAcc {
    count: usize,
    sums: Vec<(f64, usize)>,
}

impl Transform for Aggregate {
    fn name(&self) -> &'static str {
        "aggregate"
    }

    fn apply(&self, input: &Table) -> Result<Table, TransformError> {
        for field in &self.groupby {
            if !input.is_empty() && !input.has_column(field) {
                return Err(TransformError::MissingField {
                    field: field.clone(),
                    table: "aggregate input",
                });
            }
        }

        let mut groups: BTreeMap<Vec<Value>, GroupAcc> = BTreeMap::new();
        for rec in &input.records {
            let key: Vec<Value> = self.groupby.iter().map(|g| rec.value(g).clone()).collect();
            let acc = groups.entry(key).or_insert_with(|| GroupAcc {
                count: 0,
                sums: vec![(0.0, 0); self.ops.len()],
            });
            acc.count += 1;
            for (op, sum) in self.ops.iter().zip(acc.sums.iter_mut()) {
                if let AggregateOp::Mean(field) = op {
                    if let Some(v) = rec.get_f64(field) {
                        sum.0 += v;
                        sum.1 += 1;
                    }
                }
            }
        }

        let mut rows: Vec<(usize, Record)> = groups
            .into_iter()
            .map(|(key, acc)| {
                let mut out = Record::new();
                for (field, value) in self.groupby.iter().zip(key) {
                    out.set(field, value);
                }
                for (op, (sum, n)) in self.ops.iter().zip(acc.sums) {
                    let value = match op {
                        AggregateOp::Count => Value::Integer(acc.count as i64),
                        AggregateOp::Mean(_) if n > 0 => Value::Float(sum / n as f64),
                        AggregateOp::Mean(_) => Value::Null,
                    };
                    out.set(&op.output_name(), value);
                }
                (acc.count, out)
            })
            .collect();
        // BTreeMap order already sorts groups ascending; stable sort keeps it for ties.
        rows.sort_by(|a, b| b.0.cmp(&a.0));

        let mut header = self.groupby.clone();
        header.extend(self.ops.iter().map(AggregateOp::output_name));
        Ok(Table::from_records(
            header,
            rows.into_iter().map(|(_, r)| r).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_csv;
    use crate::selection::Brush;

    fn posts() -> Table {
        read_csv(
            "id,fips_int,industry,salary\n\
             1,6,Tech,120000\n\
             2,6,Finance,100000\n\
             3,36,Tech,140000\n\
             4,6,Tech,\n\
             5,,Health,90000\n"
                .as_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn lookup_keeps_unmatched_rows() {
        let points = read_csv("id,x,y\n1,0.1,0.2\n2,0.3,0.4\n99,0.5,0.6\n,0.7,0.8\n".as_bytes()).unwrap();
        let full = read_csv("id,salary_mid_scaled\n1,0.04\n2.0,0.06\n".as_bytes()).unwrap();

        let lookup = Lookup::new("id", &full, "id", &["salary_mid_scaled"]).unwrap();
        let out = lookup.apply(&points).unwrap();

        assert_eq!(out.len(), 4);
        assert_eq!(out.records[0].value("salary_mid_scaled"), &Value::Float(0.04));
        assert_eq!(out.records[1].value("salary_mid_scaled"), &Value::Float(0.06));
        assert!(out.records[2].value("salary_mid_scaled").is_null());
        assert!(out.records[3].value("salary_mid_scaled").is_null());
        assert!(out.has_column("salary_mid_scaled"));
    }

    #[test]
    fn lookup_rejects_unknown_source_field() {
        let full = read_csv("id,salary_mid_scaled\n1,0.04\n".as_bytes()).unwrap();
        let err = Lookup::new("id", &full, "id", &["post_age_scaled"]).err().unwrap();
        assert!(matches!(err, TransformError::MissingField { .. }));
    }

    #[test]
    fn range_filter_drops_nulls() {
        let out = Filter::range("salary", 95_000.0, 130_000.0).apply(&posts()).unwrap();
        let ids: Vec<_> = out.records.iter().map(|r| r.value("id").clone()).collect();
        assert_eq!(ids, vec![Value::Integer(1), Value::Integer(2)]);
    }

    #[test]
    fn selection_filter_honours_idle_policy() {
        let table = posts();
        let none = Filter::Selection {
            state: SelectionState::Empty,
            empty: EmptyPolicy::None,
        };
        let all = Filter::Selection {
            state: SelectionState::Empty,
            empty: EmptyPolicy::All,
        };
        assert!(none.indices(&table).is_empty());
        assert_eq!(all.indices(&table).len(), table.len());

        let picked = Filter::Selection {
            state: SelectionState::Point {
                field: "fips_int".into(),
                value: Value::Integer(6),
            },
            empty: EmptyPolicy::None,
        };
        assert_eq!(picked.indices(&table), vec![0, 1, 3]);
    }

    #[test]
    fn interval_filter_uses_brush() {
        let table = read_csv("umap_x,umap_y\n0,0\n1,1\n2,2\n".as_bytes()).unwrap();
        let f = Filter::Selection {
            state: SelectionState::Interval(Brush::new("umap_x", "umap_y", (0.5, 2.0), (0.5, 2.0))),
            empty: EmptyPolicy::All,
        };
        assert_eq!(f.indices(&table), vec![1, 2]);
    }

    #[test]
    fn aggregate_counts_and_means() {
        let out = Aggregate::new(
            &["industry"],
            vec![AggregateOp::Count, AggregateOp::Mean("salary".into())],
        )
        .apply(&posts())
        .unwrap();

        assert_eq!(out.column_names, vec!["industry", "count", "mean_salary"]);
        let first = &out.records[0];
        assert_eq!(first.value("industry"), &Value::from("Tech"));
        assert_eq!(first.value("count"), &Value::Integer(3));
        // the Tech row with no salary is skipped by the mean
        assert_eq!(first.value("mean_salary"), &Value::Float(130_000.0));

        // ties: Finance before Health
        assert_eq!(out.records[1].value("industry"), &Value::from("Finance"));
        assert_eq!(out.records[2].value("industry"), &Value::from("Health"));
    }

    #[test]
    fn pipeline_runs_stages_in_order() {
        let pipeline = Pipeline::new()
            .then(Filter::range("salary", 0.0, 1.0e9))
            .then(Calculate::new("band", |r| {
                let high = r.get_f64("salary").is_some_and(|s| s >= 110_000.0);
                Value::from(if high { "high" } else { "low" })
            }))
            .then(Aggregate::new(&["band"], vec![AggregateOp::Count]));

        let out = pipeline.apply(&posts()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.records[0].value("count"), &Value::Integer(2));
    }
}
