use std::cell::RefCell;
use std::rc::Rc;

use eframe::egui::Color32;

use crate::color::SequentialScale;
use crate::data::model::{Record, Table, Value};
use crate::data::transform::{Aggregate, AggregateOp, Filter, Transform};
use crate::data::TransformError;
use crate::selection::{EmptyPolicy, Selection, SelectionState};

pub const REGION_KEY: &str = "fips_int";
const REGION_NAME: &str = "state";
const MEDIAN_SALARY: &str = "median_salary";
const N_JOBS: &str = "n_jobs";
pub const INDUSTRY: &str = "industry";

// ---------------------------------------------------------------------------
// Primary view: per-region aggregates (choropleth)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RegionAggregate {
    pub id: Value,
    pub name: String,
    pub median_salary: Option<f64>,
    pub n_jobs: Option<i64>,
}

/// Regions coloured by median salary on the blues ramp.
#[derive(Debug, Clone)]
pub struct RegionMap {
    pub regions: Vec<RegionAggregate>,
    scale: SequentialScale,
}

impl RegionMap {
    /// Rows without a usable region code are skipped.
    pub fn from_table(table: &Table) -> Result<Self, TransformError> {
        if !table.has_column(REGION_KEY) {
            return Err(TransformError::MissingField {
                field: REGION_KEY.into(),
                table: "region aggregates",
            });
        }

        let mut regions = Vec::with_capacity(table.len());
        for rec in &table.records {
            let Some(id) = rec.value(REGION_KEY).join_key() else {
                log::warn!("region aggregate without a {REGION_KEY}: {:?}", rec.fields);
                continue;
            };
            regions.push(RegionAggregate {
                name: match rec.value(REGION_NAME) {
                    Value::Null => id.to_string(),
                    v => v.to_string(),
                },
                id,
                median_salary: rec.get_f64(MEDIAN_SALARY),
                n_jobs: job_count(rec.value(N_JOBS)),
            });
        }
        regions.sort_by(|a, b| a.name.cmp(&b.name));

        let scale = SequentialScale::blues_over(regions.iter().filter_map(|r| r.median_salary));
        Ok(Self { regions, scale })
    }

    pub fn find(&self, id: &Value) -> Option<&RegionAggregate> {
        let key = id.join_key()?;
        self.regions.iter().find(|r| r.id == key)
    }

    /// Regions with no median salary are drawn in light gray.
    pub fn color_of(&self, region: &RegionAggregate) -> Color32 {
        match region.median_salary {
            Some(v) => self.scale.color_for(v),
            None => crate::color::LIGHT_GRAY,
        }
    }
}

// ---------------------------------------------------------------------------
// Secondary view: label counts of the detail rows in the selected region
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCount {
    pub label: Value,
    pub count: usize,
}

/// Detail rows filtered by the region selection, counted per label.
#[derive(Debug)]
pub struct IndustryBreakdown {
    detail: Table,
    empty: EmptyPolicy,
    visible: Vec<usize>,
    counts: Vec<CategoryCount>,
}

impl IndustryBreakdown {
    pub fn new(detail: Table, empty: EmptyPolicy) -> Result<Self, TransformError> {
        for field in [REGION_KEY, INDUSTRY] {
            if !detail.has_column(field) {
                return Err(TransformError::MissingField {
                    field: field.into(),
                    table: "job postings",
                });
            }
        }
        let mut view = Self {
            detail,
            empty,
            visible: Vec::new(),
            counts: Vec::new(),
        };
        view.recompute(&SelectionState::Empty);
        Ok(view)
    }

    /// Rebuild the visible rows and counts from scratch.
    pub fn recompute(&mut self, state: &SelectionState) {
        let filter = Filter::Selection {
            state: state.clone(),
            empty: self.empty,
        };
        self.visible = filter.indices(&self.detail);

        let rows = self.visible_rows();
        let grouped = Aggregate::new(&[INDUSTRY], vec![AggregateOp::Count])
            .apply(&self.detail.derive(rows))
            .unwrap_or_else(|e| {
                log::error!("counting industries: {e}");
                Table::default()
            });
        self.counts = grouped
            .records
            .iter()
            .map(|r| CategoryCount {
                label: r.value(INDUSTRY).clone(),
                count: r.get_f64("count").unwrap_or(0.0) as usize,
            })
            .collect();
        log::debug!(
            "industry breakdown: {} rows, {} industries",
            self.visible.len(),
            self.counts.len()
        );
    }

    pub fn visible_rows(&self) -> Vec<Record> {
        self.visible
            .iter()
            .map(|&i| self.detail.records[i].clone())
            .collect()
    }

    pub fn counts(&self) -> &[CategoryCount] {
        &self.counts
    }
}

/// Job counts written as floats (`12.0`) are rounded; negative or
/// non-finite counts are treated as missing.
fn job_count(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(n) if *n >= 0 => Some(*n),
        Value::Float(n) if n.is_finite() && *n >= 0.0 => Some(n.round() as i64),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// The linked pair
// ---------------------------------------------------------------------------

/// Clicking a region on the map filters the industry chart to that region.
pub struct LinkedRegionPair {
    map: RegionMap,
    selection: Selection,
    breakdown: Rc<RefCell<IndustryBreakdown>>,
}

impl LinkedRegionPair {
    pub fn new(aggregates: &Table, detail: Table, empty: EmptyPolicy) -> Result<Self, TransformError> {
        let map = RegionMap::from_table(aggregates)?;
        let breakdown = Rc::new(RefCell::new(IndustryBreakdown::new(detail, empty)?));

        let mut selection = Selection::new("state_select");
        let subscriber = Rc::clone(&breakdown);
        selection.subscribe(move |state| subscriber.borrow_mut().recompute(state));

        Ok(Self {
            map,
            selection,
            breakdown,
        })
    }

    pub fn map(&self) -> &RegionMap {
        &self.map
    }

    /// Select a region; selecting the current region again clears it.
    pub fn select(&mut self, region_id: Value) {
        self.selection.select(REGION_KEY, region_id);
    }

    pub fn clear(&mut self) {
        self.selection.clear();
    }

    /// Currently selected region code, if any.
    pub fn selected(&self) -> Option<&Value> {
        match self.selection.state() {
            SelectionState::Point { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn visible_secondary_rows(&self) -> Vec<Record> {
        self.breakdown.borrow().visible_rows()
    }

    /// Count per industry in the selected region, largest first.
    pub fn industry_counts(&self) -> Vec<CategoryCount> {
        self.breakdown.borrow().counts().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_csv;

    fn aggregates() -> Table {
        read_csv(
            "fips_int,state,median_salary,n_jobs\n\
             6,California,150000,3\n\
             36,New York,140000,2\n\
             48,Texas,120000,0\n\
             ,Nowhere,1,1\n"
                .as_bytes(),
        )
        .unwrap()
    }

    fn posts() -> Table {
        read_csv(
            "id,fips_int,industry\n\
             1,6,Tech\n\
             2,6,Finance\n\
             3,6,Tech\n\
             4,36,Finance\n\
             5,36.0,Media\n\
             6,,Tech\n"
                .as_bytes(),
        )
        .unwrap()
    }

    fn pair() -> LinkedRegionPair {
        LinkedRegionPair::new(&aggregates(), posts(), EmptyPolicy::None).unwrap()
    }

    fn ids(rows: &[Record]) -> Vec<i64> {
        rows.iter()
            .filter_map(|r| match r.value("id") {
                Value::Integer(i) => Some(*i),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn map_skips_rows_without_region_code() {
        let map = RegionMap::from_table(&aggregates()).unwrap();
        assert_eq!(map.regions.len(), 3);
        assert_eq!(map.find(&Value::Float(36.0)).unwrap().name, "New York");
        assert!(map.find(&Value::Integer(99)).is_none());
    }

    #[test]
    fn map_colors_richer_states_darker() {
        let map = RegionMap::from_table(&aggregates()).unwrap();
        let ca = map.find(&Value::Integer(6)).unwrap();
        let tx = map.find(&Value::Integer(48)).unwrap();
        assert!(map.color_of(ca).r() < map.color_of(tx).r());
    }

    #[test]
    fn nothing_visible_until_a_region_is_picked() {
        let pair = pair();
        assert!(pair.visible_secondary_rows().is_empty());
        assert!(pair.industry_counts().is_empty());
    }

    #[test]
    fn selecting_each_region_filters_exactly() {
        let detail = posts();
        let mut pair = pair();
        let regions = pair.map().regions.clone();
        for region in &regions {
            pair.select(region.id.clone());
            let expected: Vec<Record> = detail
                .records
                .iter()
                .filter(|r| r.value(REGION_KEY).join_key() == Some(region.id.clone()))
                .cloned()
                .collect();
            assert_eq!(pair.visible_secondary_rows(), expected, "region {}", region.name);
            pair.clear();
        }
    }

    #[test]
    fn counts_are_sorted_descending() {
        let mut pair = pair();
        pair.select(Value::Integer(6));
        let counts = pair.industry_counts();
        assert_eq!(
            counts,
            vec![
                CategoryCount { label: Value::from("Tech"), count: 2 },
                CategoryCount { label: Value::from("Finance"), count: 1 },
            ]
        );
        assert_eq!(ids(&pair.visible_secondary_rows()), vec![1, 2, 3]);
    }

    #[test]
    fn counts_do_not_depend_on_selection_history() {
        let mut a = pair();
        a.select(Value::Integer(6));
        a.select(Value::Integer(36));

        let mut b = pair();
        b.select(Value::Integer(36));

        assert_eq!(a.industry_counts(), b.industry_counts());
        assert_eq!(ids(&a.visible_secondary_rows()), vec![4, 5]);
    }

    #[test]
    fn reclick_toggles_back_to_empty() {
        let mut pair = pair();
        pair.select(Value::Integer(6));
        assert_eq!(pair.selected(), Some(&Value::Integer(6)));
        pair.select(Value::Integer(6));
        assert!(pair.selected().is_none());
        assert!(pair.visible_secondary_rows().is_empty());
    }

    #[test]
    fn float_region_code_highlights_integer_tile() {
        let mut pair = pair();
        pair.select(Value::Float(6.0));
        let ca = pair.map().find(&Value::Integer(6)).unwrap().id.clone();
        assert_eq!(pair.selected(), Some(&ca));
        assert_eq!(ids(&pair.visible_secondary_rows()), vec![1, 2, 3]);
    }

    #[test]
    fn float_job_counts_are_rounded() {
        let table = read_csv(
            "fips_int,state,median_salary,n_jobs
             6,California,150000,2.7
             36,New York,140000,-1
             48,Texas,120000,
"
                .as_bytes(),
        )
        .unwrap();
        let map = RegionMap::from_table(&table).unwrap();
        assert_eq!(map.find(&Value::Integer(6)).unwrap().n_jobs, Some(3));
        assert_eq!(map.find(&Value::Integer(36)).unwrap().n_jobs, None);
        assert_eq!(map.find(&Value::Integer(48)).unwrap().n_jobs, None);
    }

    #[test]
    fn clear_after_selection_shows_nothing() {
        let mut pair = pair();
        pair.select(Value::Integer(36));
        assert!(!pair.visible_secondary_rows().is_empty());
        pair.clear();
        assert!(pair.visible_secondary_rows().is_empty());
    }

    #[test]
    fn unknown_region_yields_empty_result() {
        let mut pair = pair();
        pair.select(Value::Integer(99));
        assert!(pair.visible_secondary_rows().is_empty());
        assert!(pair.industry_counts().is_empty());
    }

    #[test]
    fn show_all_policy_is_configurable() {
        let pair = LinkedRegionPair::new(&aggregates(), posts(), EmptyPolicy::All).unwrap();
        assert_eq!(pair.visible_secondary_rows().len(), 6);
    }

    #[test]
    fn detail_without_industry_is_rejected() {
        let detail = read_csv("id,fips_int\n1,6\n".as_bytes()).unwrap();
        assert!(LinkedRegionPair::new(&aggregates(), detail, EmptyPolicy::None).is_err());
    }
}
