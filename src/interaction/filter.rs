use std::collections::{BTreeSet, HashSet};

use crate::graph::{Edge, EdgeKind, EdgeOutcome, FlowGraph, INTERNET_ID, NodeKind, WAN_ID};

/// Set-membership filters applied to a built graph before the reconciler,
/// the physics step or the renderer see it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterSet {
    pub hidden_outcomes: BTreeSet<EdgeOutcome>,
    pub external_only: bool,
}

impl FilterSet {
    pub fn is_active(&self) -> bool {
        self.external_only || !self.hidden_outcomes.is_empty()
    }

    pub fn shows_outcome(&self, outcome: EdgeOutcome) -> bool {
        !self.hidden_outcomes.contains(&outcome)
    }

    /// Flips visibility of one outcome; returns the new visibility.
    pub fn toggle_outcome(&mut self, outcome: EdgeOutcome) -> bool {
        if !self.hidden_outcomes.remove(&outcome) {
            self.hidden_outcomes.insert(outcome);
            return false;
        }
        true
    }

    pub fn apply(&self, graph: &FlowGraph) -> FlowGraph {
        if !self.is_active() {
            return graph.clone();
        }

        let edges = graph
            .edges
            .iter()
            .filter(|edge| self.shows_outcome(edge.outcome))
            .filter(|edge| !self.external_only || is_external_edge(graph, edge))
            .cloned()
            .collect::<Vec<_>>();

        let connected = edges
            .iter()
            .flat_map(|edge| [edge.from.as_str(), edge.to.as_str()])
            .collect::<HashSet<_>>();
        let nodes = graph
            .nodes
            .iter()
            .filter(|node| node.pinned || connected.contains(node.id.as_str()))
            .cloned()
            .collect::<Vec<_>>();

        FlowGraph { nodes, edges }
    }
}

fn is_external_kind(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::ExternalEndpoint | NodeKind::ExternalService | NodeKind::AiProvider
    )
}

/// Egress edges and edges touching the internet sink or an external node.
pub fn is_external_edge(graph: &FlowGraph, edge: &Edge) -> bool {
    if edge.kind == EdgeKind::Egress || edge.touches(INTERNET_ID) || edge.touches(WAN_ID) {
        return true;
    }
    [edge.from.as_str(), edge.to.as_str()]
        .into_iter()
        .filter_map(|id| graph.node(id))
        .any(|node| is_external_kind(node.kind))
}
