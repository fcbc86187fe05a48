//! Pointer handling, focus state and graph filters.
//!
//! The controller never owns simulation state. Drags write through
//! [`SimState::begin_drag`]/[`SimState::drag_to`], which is what makes the
//! physics step leave the grabbed node alone.

mod details;
mod filter;
mod highlight;
mod hit;

use std::collections::HashSet;

use eframe::egui::{Pos2, Vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use tracing::debug;

use crate::graph::FlowGraph;
use crate::sim::SimState;
use crate::viewport::Transform;

pub use details::{ConnectedEdge, DetailPayload};
pub use filter::{FilterSet, is_external_edge};
pub use highlight::{DIMMED_EDGE, DIMMED_NODE, Highlight, SEARCH_MISS};
pub use hit::{EDGE_HIT_TOLERANCE, distance_to_segment, edge_at, node_at};

/// Pointer travel (screen pixels) below which a press counts as a click.
const CLICK_SLOP: f32 = 4.0;

#[derive(Clone, Debug)]
struct Grab {
    id: String,
    offset: Vec2,
}

#[derive(Clone, Debug)]
struct Press {
    origin: Pos2,
    node: Option<String>,
}

#[derive(Debug, Default)]
pub struct InteractionController {
    hovered_node: Option<String>,
    hovered_edge: Option<String>,
    selected: Option<String>,
    grab: Option<Grab>,
    press: Option<Press>,
    filters: FilterSet,
    search: String,
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl InteractionController {
    pub fn hovered_node(&self) -> Option<&str> {
        self.hovered_node.as_deref()
    }

    pub fn hovered_edge(&self) -> Option<&str> {
        self.hovered_edge.as_deref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select(&mut self, id: Option<String>) {
        if self.selected != id {
            debug!(selected = ?id, "selection changed");
        }
        self.selected = id;
    }

    pub fn is_dragging(&self) -> bool {
        self.grab.is_some()
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Returns whether the filters changed and the graph must be refiltered.
    pub fn set_filters(&mut self, filters: FilterSet) -> bool {
        if self.filters == filters {
            return false;
        }
        self.filters = filters;
        true
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
    }

    /// Ids whose label or id fuzzy-match the search query, or `None` when no
    /// search is active.
    pub fn search_matches(&self, graph: &FlowGraph) -> Option<HashSet<String>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        let matcher = SkimMatcherV2::default();
        Some(
            graph
                .nodes
                .iter()
                .filter(|node| {
                    fuzzy_match_score(&matcher, &node.label, query).is_some()
                        || fuzzy_match_score(&matcher, &node.id, query).is_some()
                })
                .map(|node| node.id.clone())
                .collect(),
        )
    }

    pub fn highlight(&self, graph: &FlowGraph) -> Highlight {
        Highlight::new(
            graph,
            self.hovered_node.as_deref(),
            self.hovered_edge.as_deref(),
            self.selected.as_deref(),
            self.search_matches(graph),
        )
    }

    /// Recomputes hover from the pointer. While dragging, the grabbed node
    /// stays hovered.
    pub fn hover(
        &mut self,
        graph: &FlowGraph,
        state: &SimState,
        transform: &Transform,
        pointer: Option<Pos2>,
    ) {
        if let Some(grab) = &self.grab {
            self.hovered_node = Some(grab.id.clone());
            self.hovered_edge = None;
            return;
        }

        let Some(pointer) = pointer else {
            self.hovered_node = None;
            self.hovered_edge = None;
            return;
        };
        self.hovered_node = node_at(graph, state, transform, pointer);
        self.hovered_edge = match self.hovered_node {
            Some(_) => None,
            None => edge_at(graph, state, transform, pointer),
        };
    }

    /// Starts a press. Over a movable node this also starts a drag; pinned
    /// nodes are selectable but never grabbed. Returns whether a drag began.
    pub fn pointer_down(
        &mut self,
        graph: &FlowGraph,
        state: &mut SimState,
        transform: &Transform,
        pointer: Pos2,
    ) -> bool {
        let node = node_at(graph, state, transform, pointer);
        self.press = Some(Press {
            origin: pointer,
            node: node.clone(),
        });

        let Some(id) = node else {
            return false;
        };
        let Some(pos) = state.get(&id).map(|sim| sim.pos) else {
            return false;
        };
        if !state.begin_drag(&id) {
            return false;
        }

        let offset = transform.to_sim(pointer) - pos;
        debug!(node = %id, "drag started");
        self.grab = Some(Grab { id, offset });
        true
    }

    /// Moves the grabbed node under the pointer. Returns whether a node moved.
    pub fn pointer_move(&mut self, state: &mut SimState, transform: &Transform, pointer: Pos2) -> bool {
        let Some(grab) = &self.grab else {
            return false;
        };
        if !state.is_dragged(&grab.id) {
            self.grab = None;
            return false;
        }
        state.drag_to(transform.to_sim(pointer) - grab.offset)
    }

    /// Releases any drag. A press that barely moved is a click: it selects
    /// the node under it, or clears the selection on empty canvas.
    pub fn pointer_up(&mut self, state: &mut SimState, pointer: Pos2) {
        if self.grab.take().is_some()
            && let Some(id) = state.end_drag()
        {
            debug!(node = %id, "drag released");
        }

        if let Some(press) = self.press.take()
            && (pointer - press.origin).length() <= CLICK_SLOP
        {
            self.select(press.node);
        }
    }

    pub fn pointer_left(&mut self) {
        if self.grab.is_none() {
            self.hovered_node = None;
            self.hovered_edge = None;
        }
    }

    /// Drops hover targets that left the graph and a grab the reconciler
    /// cancelled. The selection survives so it reattaches if the node returns.
    pub fn sync(&mut self, graph: &FlowGraph, state: &SimState) {
        if self
            .hovered_node
            .as_deref()
            .is_some_and(|id| graph.node(id).is_none())
        {
            self.hovered_node = None;
        }
        if self
            .hovered_edge
            .as_deref()
            .is_some_and(|id| graph.edge(id).is_none())
        {
            self.hovered_edge = None;
        }
        if self
            .grab
            .as_ref()
            .is_some_and(|grab| !state.is_dragged(&grab.id))
        {
            self.grab = None;
        }
    }

    pub fn detail(&self, graph: &FlowGraph) -> Option<DetailPayload> {
        self.selected
            .as_deref()
            .and_then(|id| DetailPayload::for_node(graph, id))
    }
}
