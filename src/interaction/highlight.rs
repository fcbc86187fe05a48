use std::collections::HashSet;

use crate::graph::{Edge, FlowGraph};

pub const DIMMED_NODE: f32 = 0.28;
pub const DIMMED_EDGE: f32 = 0.12;
pub const SEARCH_MISS: f32 = 0.4;

/// Opacity multipliers for one frame. Display only; nothing here reaches
/// the simulation.
#[derive(Clone, Debug, Default)]
pub struct Highlight {
    focus_nodes: Option<HashSet<String>>,
    focus_edges: Option<HashSet<String>>,
    search_matches: Option<HashSet<String>>,
}

impl Highlight {
    /// A hovered node wins over a hovered edge, which wins over the
    /// selection.
    pub fn new(
        graph: &FlowGraph,
        hovered_node: Option<&str>,
        hovered_edge: Option<&str>,
        selected: Option<&str>,
        search_matches: Option<HashSet<String>>,
    ) -> Self {
        let hovered_edge = hovered_edge.and_then(|id| graph.edge(id));
        let (focus_nodes, focus_edges) = match (hovered_node, hovered_edge, selected) {
            (Some(id), _, _) => neighbourhood(graph, id),
            (None, Some(edge), _) => edge_focus(edge),
            (None, None, Some(id)) => neighbourhood(graph, id),
            (None, None, None) => (None, None),
        };

        Self {
            focus_nodes,
            focus_edges,
            search_matches,
        }
    }

    pub fn is_focused(&self) -> bool {
        self.focus_nodes.is_some()
    }

    pub fn node_opacity(&self, id: &str) -> f32 {
        let focus = match &self.focus_nodes {
            Some(nodes) if !nodes.contains(id) => DIMMED_NODE,
            _ => 1.0,
        };
        let search = match &self.search_matches {
            Some(matches) if !matches.contains(id) => SEARCH_MISS,
            _ => 1.0,
        };
        focus * search
    }

    pub fn edge_opacity(&self, edge: &Edge) -> f32 {
        match &self.focus_edges {
            Some(edges) if !edges.contains(&edge.id) => DIMMED_EDGE,
            _ => 1.0,
        }
    }

    pub fn is_search_match(&self, id: &str) -> bool {
        self.search_matches
            .as_ref()
            .is_some_and(|matches| matches.contains(id))
    }
}

fn neighbourhood(
    graph: &FlowGraph,
    id: &str,
) -> (Option<HashSet<String>>, Option<HashSet<String>>) {
    if graph.node(id).is_none() {
        return (None, None);
    }

    let mut nodes = HashSet::from([id.to_owned()]);
    let mut edges = HashSet::new();
    for edge in graph.edges_touching(id) {
        nodes.insert(edge.from.clone());
        nodes.insert(edge.to.clone());
        edges.insert(edge.id.clone());
    }
    (Some(nodes), Some(edges))
}

fn edge_focus(edge: &Edge) -> (Option<HashSet<String>>, Option<HashSet<String>>) {
    (
        Some(HashSet::from([edge.from.clone(), edge.to.clone()])),
        Some(HashSet::from([edge.id.clone()])),
    )
}
