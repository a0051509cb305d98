use std::cell::RefCell;
use std::rc::Rc;

use eframe::egui::Color32;

use crate::color::{CategoricalScale, Scheme};
use crate::data::model::{Record, Table};
use crate::data::TransformError;
use crate::selection::{Brush, EmptyPolicy, Selection, SelectionState};
use crate::views::charts::format_currency;

pub const UMAP_X: &str = "umap_x";
pub const UMAP_Y: &str = "umap_y";
pub const EXPERIENCE_LEVEL: &str = "experience_level";

/// Per-point "in the brush" flags, recomputed on every brush change.
#[derive(Debug)]
struct BrushMask {
    empty: EmptyPolicy,
    flags: Vec<bool>,
}

impl BrushMask {
    fn recompute(&mut self, table: &Table, state: &SelectionState) {
        self.flags = table
            .records
            .iter()
            .map(|rec| state.test(rec, self.empty))
            .collect();
    }
}

/// Scatterplot whose colour encoding is conditioned on a rectangular brush.
/// Points inside the brush (or every point, while no brush is drawn and the
/// idle policy is `All`) get their category colour; the rest get `fallback`.
pub struct BrushScatter {
    table: Rc<Table>,
    pub scale: CategoricalScale,
    pub fallback: Color32,
    empty: EmptyPolicy,
    selection: Selection,
    mask: Rc<RefCell<BrushMask>>,
}

impl BrushScatter {
    pub fn new(
        table: Table,
        scheme: Scheme,
        fallback: Color32,
        empty: EmptyPolicy,
    ) -> Result<Self, TransformError> {
        for field in [UMAP_X, UMAP_Y, EXPERIENCE_LEVEL] {
            if !table.has_column(field) {
                return Err(TransformError::MissingField {
                    field: field.into(),
                    table: "UMAP projection",
                });
            }
        }

        let domain = table
            .unique_values
            .get(EXPERIENCE_LEVEL)
            .cloned()
            .unwrap_or_default();
        let scale = CategoricalScale::new(EXPERIENCE_LEVEL, &domain, scheme);

        let table = Rc::new(table);
        let mut mask = BrushMask {
            empty,
            flags: Vec::new(),
        };
        mask.recompute(&table, &SelectionState::Empty);
        let mask = Rc::new(RefCell::new(mask));

        let mut selection = Selection::new("brush");
        let (t, m) = (Rc::clone(&table), Rc::clone(&mask));
        selection.subscribe(move |state| m.borrow_mut().recompute(&t, state));

        Ok(Self {
            table,
            scale,
            fallback,
            empty,
            selection,
            mask,
        })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn brush(&self) -> Option<&Brush> {
        match self.selection.state() {
            SelectionState::Interval(brush) => Some(brush),
            _ => None,
        }
    }

    /// Set the active rectangle from two corners in data coordinates.
    pub fn set_brush(&mut self, x_range: (f64, f64), y_range: (f64, f64)) {
        self.selection
            .set_interval(Brush::new(UMAP_X, UMAP_Y, x_range, y_range));
    }

    pub fn clear_brush(&mut self) {
        self.selection.clear();
    }

    /// Colour of an arbitrary record under the current brush.
    pub fn color_of(&self, record: &Record) -> Color32 {
        if self.selection.state().test(record, self.empty) {
            self.scale.color_for(record.value(EXPERIENCE_LEVEL))
        } else {
            self.fallback
        }
    }

    /// Colour of the `i`-th point, from the cached mask.
    pub fn color_at(&self, i: usize) -> Color32 {
        let highlighted = self.mask.borrow().flags.get(i).copied().unwrap_or(false);
        if highlighted {
            self.scale
                .color_for(self.table.records[i].value(EXPERIENCE_LEVEL))
        } else {
            self.fallback
        }
    }

    /// Indices of the points inside the active brush.  Empty when no brush
    /// is drawn, whatever the idle policy.
    pub fn brushed_indices(&self) -> Vec<usize> {
        let Some(brush) = self.brush() else {
            return Vec::new();
        };
        self.table
            .records
            .iter()
            .enumerate()
            .filter(|(_, rec)| brush.contains(rec))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Hover text for one UMAP point.
pub fn tooltip(record: &Record) -> String {
    let text = |field: &str| {
        let v = record.value(field);
        if v.is_null() {
            "–".to_string()
        } else {
            v.to_string()
        }
    };
    let salary = record
        .get_f64("salary")
        .map(format_currency)
        .unwrap_or_else(|| "–".into());
    let engagement = record
        .get_f64("engagement_rate")
        .map(|v| format!("{v:.1}"))
        .unwrap_or_else(|| "–".into());
    format!(
        "Job Title: {}\nSalary: {salary}\nExperience: {}\nWork Type: {}\nState: {}\nEngagement %: {engagement}",
        text("title"),
        text(EXPERIENCE_LEVEL),
        text("work_type"),
        text("state"),
    )
}
