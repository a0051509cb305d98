use serde::{Deserialize, Serialize};

use crate::data::model::{Record, Value};

// ---------------------------------------------------------------------------
// Selection state
// ---------------------------------------------------------------------------

/// What a consuming view shows while its selection is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyPolicy {
    /// Nothing passes until something is selected.
    None,
    /// Everything passes until something is selected.
    All,
}

/// Rectangular region over two numeric fields, bounds inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    pub x_field: String,
    pub y_field: String,
    pub x: (f64, f64),
    pub y: (f64, f64),
}

impl Brush {
    /// Build a brush from two drag corners in any order.
    pub fn new(x_field: &str, y_field: &str, x: (f64, f64), y: (f64, f64)) -> Self {
        Self {
            x_field: x_field.to_string(),
            y_field: y_field.to_string(),
            x: (x.0.min(x.1), x.0.max(x.1)),
            y: (y.0.min(y.1), y.0.max(y.1)),
        }
    }

    /// Zero width or zero height.
    pub fn is_degenerate(&self) -> bool {
        self.x.0 >= self.x.1 || self.y.0 >= self.y.1
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        !self.is_degenerate()
            && x >= self.x.0
            && x <= self.x.1
            && y >= self.y.0
            && y <= self.y.1
    }

    /// Records with a missing or non-numeric coordinate are outside.
    pub fn contains(&self, record: &Record) -> bool {
        match (record.get_f64(&self.x_field), record.get_f64(&self.y_field)) {
            (Some(x), Some(y)) => self.contains_point(x, y),
            _ => false,
        }
    }
}

/// Current value of a selection parameter.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SelectionState {
    #[default]
    Empty,
    /// A single clicked item, matched on `field`.
    Point { field: String, value: Value },
    /// A dragged rectangle.
    Interval(Brush),
}

impl SelectionState {
    pub fn is_empty(&self) -> bool {
        matches!(self, SelectionState::Empty)
    }

    /// Does `record` pass this selection under the given idle policy?
    pub fn test(&self, record: &Record, policy: EmptyPolicy) -> bool {
        match self {
            SelectionState::Empty => policy == EmptyPolicy::All,
            SelectionState::Point { field, value } => {
                match (record.value(field).join_key(), value.join_key()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            SelectionState::Interval(brush) => brush.contains(record),
        }
    }
}

// ---------------------------------------------------------------------------
// Observable selection parameter
// ---------------------------------------------------------------------------

/// Handle returned by [`Selection::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&SelectionState)>;

/// A named selection shared by linked views.
///
/// Views that depend on it register a listener; every state change calls
/// every listener synchronously with the new state.
pub struct Selection {
    name: String,
    state: SelectionState,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl std::fmt::Debug for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selection")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Selection {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: SelectionState::Empty,
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Register a listener. It is not called for the current state.
    pub fn subscribe(&mut self, listener: impl FnMut(&SelectionState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Single-item selection: picking the item that is already selected
    /// clears the selection instead.
    /// The value is stored in its join-key form, so `6.0` and `6` select
    /// the same item.
    pub fn select(&mut self, field: &str, value: Value) {
        let value = value.join_key().unwrap_or(Value::Null);
        let already = matches!(
            &self.state,
            SelectionState::Point { field: f, value: v } if f == field && *v == value
        );
        if already {
            self.clear();
        } else {
            self.set(SelectionState::Point {
                field: field.to_string(),
                value,
            });
        }
    }

    pub fn set_interval(&mut self, brush: Brush) {
        self.set(SelectionState::Interval(brush));
    }

    pub fn clear(&mut self) {
        if !self.state.is_empty() {
            self.set(SelectionState::Empty);
        }
    }

    fn set(&mut self, state: SelectionState) {
        if self.state == state {
            return;
        }
        log::debug!("selection '{}' -> {:?}", self.name, state);
        self.state = state;
        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn point(x: f64, y: f64) -> Record {
        Record::new().with("umap_x", x).with("umap_y", y)
    }

    #[test]
    fn idle_policies_differ() {
        let rec = Record::new().with("fips_int", 6i64);
        assert!(!SelectionState::Empty.test(&rec, EmptyPolicy::None));
        assert!(SelectionState::Empty.test(&rec, EmptyPolicy::All));
    }

    #[test]
    fn point_selection_matches_on_join_key() {
        let state = SelectionState::Point {
            field: "fips_int".into(),
            value: Value::Integer(6),
        };
        assert!(state.test(&Record::new().with("fips_int", 6.0), EmptyPolicy::None));
        assert!(!state.test(&Record::new().with("fips_int", 36i64), EmptyPolicy::None));
        assert!(!state.test(&Record::new(), EmptyPolicy::All));
    }

    #[test]
    fn reselecting_toggles_off() {
        let mut sel = Selection::new("state_select");
        sel.select("fips_int", Value::Integer(6));
        assert!(!sel.state().is_empty());
        sel.select("fips_int", Value::Float(6.0));
        assert!(sel.state().is_empty());
    }

    #[test]
    fn selected_value_is_stored_as_join_key() {
        let mut sel = Selection::new("state_select");
        sel.select("fips_int", Value::Float(6.0));
        assert_eq!(
            sel.state(),
            &SelectionState::Point {
                field: "fips_int".into(),
                value: Value::Integer(6),
            }
        );

        sel.select("fips_int", Value::String(" CA ".into()));
        assert_eq!(
            sel.state(),
            &SelectionState::Point {
                field: "fips_int".into(),
                value: Value::String("CA".into()),
            }
        );
    }

    #[test]
    fn listeners_see_every_change() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut sel = Selection::new("brush");
        let sink = Rc::clone(&seen);
        let id = sel.subscribe(move |s| sink.borrow_mut().push(s.is_empty()));

        sel.set_interval(Brush::new("umap_x", "umap_y", (0.0, 1.0), (0.0, 1.0)));
        sel.clear();
        // no-op clear does not notify
        sel.clear();
        assert_eq!(*seen.borrow(), vec![false, true]);

        assert!(sel.unsubscribe(id));
        sel.set_interval(Brush::new("umap_x", "umap_y", (0.0, 2.0), (0.0, 1.0)));
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn brush_corners_are_normalised() {
        let brush = Brush::new("umap_x", "umap_y", (3.0, 1.0), (5.0, -1.0));
        assert_eq!(brush.x, (1.0, 3.0));
        assert_eq!(brush.y, (-1.0, 5.0));
        assert!(brush.contains(&point(2.0, 0.0)));
        assert!(brush.contains(&point(3.0, 5.0)));
        assert!(!brush.contains(&point(3.1, 0.0)));
    }

    #[test]
    fn degenerate_brush_matches_nothing() {
        let brush = Brush::new("umap_x", "umap_y", (1.0, 1.0), (0.0, 4.0));
        assert!(brush.is_degenerate());
        assert!(!brush.contains(&point(1.0, 2.0)));
    }

    #[test]
    fn brush_skips_records_without_coordinates() {
        let brush = Brush::new("umap_x", "umap_y", (0.0, 1.0), (0.0, 1.0));
        assert!(!brush.contains(&Record::new().with("umap_x", 0.5)));
    }
}
