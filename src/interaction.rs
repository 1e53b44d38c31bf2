//! Interaction state machine
//!
//! Owns the hovered/selected/highlighted node sets and the drag flag. The
//! states are independent but coupled by invariants: highlighting clears the
//! selection and vice versa, and neighbor sets are recomputed before the
//! owning index changes so they are never stale. All mutation goes through
//! the typed methods here; the render loop only reads.

use crate::graph::data::Graph;

/// Enter/leave notifications derived from a hover change.
///
/// "Entered" is emitted when the previous hover was empty and the new one is
/// not; "left" when the new hover is empty. A direct move from one node to
/// another changes the hover index without either notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverChange {
    Entered(usize),
    Left(usize),
    Moved(usize),
    None,
}

/// Result of a click resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionChange {
    pub selected: Option<usize>,
    /// True when this click replaced an active highlight set.
    pub cleared_highlight: bool,
}

/// Hover, selection and highlight state with one-hop neighbor sets.
#[derive(Debug, Default)]
pub struct InteractionState {
    hovered: Option<usize>,
    selected: Option<usize>,
    hover_neighbors: Vec<usize>,
    selected_neighbors: Vec<usize>,
    highlighted: Vec<usize>,
    dragging: bool,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn hover_neighbors(&self) -> &[usize] {
        &self.hover_neighbors
    }

    pub fn selected_neighbors(&self) -> &[usize] {
        &self.selected_neighbors
    }

    pub fn highlighted(&self) -> &[usize] {
        &self.highlighted
    }

    pub fn dragging(&self) -> bool {
        self.dragging
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    /// True while any emphasis state is active; the base pass dims
    /// non-relevant primitives only in that case.
    pub fn emphasis_active(&self) -> bool {
        self.hovered.is_some() || self.selected.is_some() || !self.highlighted.is_empty()
    }

    /// Applies a raycast result to the hover state.
    ///
    /// The neighbor set for the new hover target is computed before the
    /// index is updated. Returns the derived enter/leave notification;
    /// an unchanged target reports [`HoverChange::None`] so no duplicate
    /// "entered" notifications can occur.
    pub fn set_hovered(&mut self, hit: Option<usize>, graph: &Graph) -> HoverChange {
        if hit == self.hovered {
            return HoverChange::None;
        }
        let previous = self.hovered;
        self.hover_neighbors = match hit {
            Some(index) => graph.neighbors(index).to_vec(),
            None => Vec::new(),
        };
        self.hovered = hit;
        match (previous, hit) {
            (None, Some(index)) => HoverChange::Entered(index),
            (Some(index), None) => HoverChange::Left(index),
            (Some(_), Some(index)) => HoverChange::Moved(index),
            (None, None) => HoverChange::None,
        }
    }

    /// Applies a raycast result to the selection. Selecting a node clears
    /// any active highlight set; a miss clears the selection.
    pub fn select(&mut self, hit: Option<usize>, graph: &Graph) -> SelectionChange {
        let cleared_highlight = hit.is_some() && !self.highlighted.is_empty();
        match hit {
            Some(index) => {
                self.selected_neighbors = graph.neighbors(index).to_vec();
                self.selected = Some(index);
                self.highlighted.clear();
            }
            None => {
                self.selected = None;
                self.selected_neighbors.clear();
            }
        }
        SelectionChange {
            selected: self.selected,
            cleared_highlight,
        }
    }

    /// Installs an externally supplied highlight set, clearing the selection.
    pub fn highlight(&mut self, indices: Vec<usize>) {
        self.selected = None;
        self.selected_neighbors.clear();
        self.highlighted = indices;
    }

    /// Drops all emphasis state; used on dataset reload.
    pub fn clear(&mut self) {
        self.hovered = None;
        self.selected = None;
        self.hover_neighbors.clear();
        self.selected_neighbors.clear();
        self.highlighted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::data::NetworkData;

    fn triangle() -> Graph {
        let data: NetworkData = serde_json::from_str(
            r#"{
                "nodes": [
                    {"id": "a", "x": 0, "y": 0},
                    {"id": "b", "x": 1, "y": 0},
                    {"id": "c", "x": 0, "y": 1}
                ],
                "edges": [
                    {"source": "a", "target": "b"},
                    {"source": "b", "target": "c"}
                ]
            }"#,
        )
        .unwrap();
        Graph::build(data, true).unwrap()
    }

    #[test]
    fn test_enter_leave_pairing() {
        let graph = triangle();
        let mut state = InteractionState::new();
        // Cursor lands on a, then empty space, then b.
        assert_eq!(state.set_hovered(Some(0), &graph), HoverChange::Entered(0));
        assert_eq!(state.set_hovered(Some(0), &graph), HoverChange::None);
        assert_eq!(state.set_hovered(None, &graph), HoverChange::Left(0));
        assert_eq!(state.set_hovered(Some(1), &graph), HoverChange::Entered(1));
    }

    #[test]
    fn test_hover_neighbors_precede_index_change() {
        let graph = triangle();
        let mut state = InteractionState::new();
        state.set_hovered(Some(1), &graph);
        assert_eq!(state.hovered(), Some(1));
        let mut neighbors = state.hover_neighbors().to_vec();
        neighbors.sort_unstable();
        assert_eq!(neighbors, vec![0, 2]);
        state.set_hovered(None, &graph);
        assert!(state.hover_neighbors().is_empty());
    }

    #[test]
    fn test_selection_clears_highlight() {
        let graph = triangle();
        let mut state = InteractionState::new();
        state.highlight(vec![0, 2]);
        assert_eq!(state.highlighted(), &[0, 2]);
        let change = state.select(Some(1), &graph);
        assert!(change.cleared_highlight);
        assert_eq!(change.selected, Some(1));
        assert!(state.highlighted().is_empty());
    }

    #[test]
    fn test_highlight_clears_selection() {
        let graph = triangle();
        let mut state = InteractionState::new();
        state.select(Some(1), &graph);
        assert_eq!(state.selected(), Some(1));
        state.highlight(vec![0]);
        assert_eq!(state.selected(), None);
        assert!(state.selected_neighbors().is_empty());
        assert_eq!(state.highlighted(), &[0]);
    }

    #[test]
    fn test_click_miss_clears_selection() {
        let graph = triangle();
        let mut state = InteractionState::new();
        state.select(Some(0), &graph);
        let change = state.select(None, &graph);
        assert_eq!(change.selected, None);
        assert!(!change.cleared_highlight);
        assert!(state.selected_neighbors().is_empty());
    }

    #[test]
    fn test_emphasis_active() {
        let graph = triangle();
        let mut state = InteractionState::new();
        assert!(!state.emphasis_active());
        state.set_hovered(Some(0), &graph);
        assert!(state.emphasis_active());
        state.set_hovered(None, &graph);
        state.highlight(vec![1]);
        assert!(state.emphasis_active());
        state.clear();
        assert!(!state.emphasis_active());
    }
}
