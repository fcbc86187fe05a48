use eframe::egui::Pos2;

use crate::graph::FlowGraph;
use crate::sim::SimState;
use crate::viewport::Transform;

/// Pointer tolerance around an edge's centre line, in screen pixels.
pub const EDGE_HIT_TOLERANCE: f32 = 6.0;

/// Topmost node whose footprint contains the pointer. Later nodes are drawn
/// on top, so the search runs back to front.
pub fn node_at(
    graph: &FlowGraph,
    state: &SimState,
    transform: &Transform,
    pointer: Pos2,
) -> Option<String> {
    graph.nodes.iter().rev().find_map(|node| {
        let sim = state.get(&node.id)?;
        transform
            .rect_to_screen(sim.pos, sim.size)
            .contains(pointer)
            .then(|| node.id.clone())
    })
}

/// Closest edge within [`EDGE_HIT_TOLERANCE`] of the pointer. Edges with a
/// missing endpoint are ignored.
pub fn edge_at(
    graph: &FlowGraph,
    state: &SimState,
    transform: &Transform,
    pointer: Pos2,
) -> Option<String> {
    graph
        .edges
        .iter()
        .filter_map(|edge| {
            let from = state.get(&edge.from)?;
            let to = state.get(&edge.to)?;
            let start = transform.to_screen(from.center());
            let end = transform.to_screen(to.center());
            let distance = distance_to_segment(pointer, start, end);
            (distance <= EDGE_HIT_TOLERANCE).then_some((edge.id.as_str(), distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id.to_owned())
}

pub fn distance_to_segment(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return (point - start).length();
    }
    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    let closest = start + segment * t;
    (point - closest).length()
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;
    use crate::config::LayoutConfig;
    use crate::graph::{Edge, EdgeKind, LogicalNode, NodeKind};
    use crate::sim::reconcile;

    fn fixture() -> (FlowGraph, SimState) {
        let graph = FlowGraph {
            nodes: vec![
                LogicalNode::new("a", NodeKind::Service, "a").pinned_at(vec2(100.0, 100.0)),
                LogicalNode::new("b", NodeKind::Service, "b").pinned_at(vec2(500.0, 100.0)),
                LogicalNode::new("c", NodeKind::Service, "c").pinned_at(vec2(150.0, 110.0)),
            ],
            edges: vec![Edge::new("a", "b", EdgeKind::ToolCall)],
        };
        let mut state = SimState::new(&LayoutConfig::default());
        reconcile(&mut state, &graph.nodes);
        (graph, state)
    }

    #[test]
    fn segment_distance_handles_endpoints_and_degenerate_segments() {
        let start = pos2(0.0, 0.0);
        let end = pos2(10.0, 0.0);
        assert_eq!(distance_to_segment(pos2(5.0, 3.0), start, end), 3.0);
        assert_eq!(distance_to_segment(pos2(14.0, 3.0), start, end), 5.0);
        assert_eq!(distance_to_segment(pos2(3.0, 4.0), start, start), 5.0);
    }

    #[test]
    fn overlapping_nodes_resolve_to_the_topmost() {
        let (graph, state) = fixture();
        let transform = Transform::default();
        assert_eq!(
            node_at(&graph, &state, &transform, pos2(160.0, 120.0)),
            Some("c".to_owned())
        );
        assert_eq!(
            node_at(&graph, &state, &transform, pos2(110.0, 105.0)),
            Some("a".to_owned())
        );
        assert_eq!(node_at(&graph, &state, &transform, pos2(5.0, 5.0)), None);
    }

    #[test]
    fn edges_are_hit_near_their_centre_line() {
        let (graph, state) = fixture();
        let transform = Transform::default();
        let line_y = state.get("a").expect("a").center().y;
        assert!(edge_at(&graph, &state, &transform, pos2(350.0, line_y + 4.0)).is_some());
        assert!(edge_at(&graph, &state, &transform, pos2(350.0, line_y + 20.0)).is_none());
    }
}
