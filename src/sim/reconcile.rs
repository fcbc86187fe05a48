use std::collections::HashSet;

use eframe::egui::{Vec2, vec2};
use tracing::debug;

use super::{SimNode, SimState};
use crate::graph::LogicalNode;
use crate::util::stable_pair;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub kept: usize,
    pub added: usize,
    /// New nodes placed from the eviction cache instead of their anchor.
    pub restored: usize,
    pub evicted: usize,
}

impl ReconcileReport {
    pub fn changed_membership(&self) -> bool {
        self.added > 0 || self.evicted > 0
    }
}

/// Merges a fresh node list into the persistent state without disturbing
/// nodes that survive the refresh.
pub fn reconcile(state: &mut SimState, nodes: &[LogicalNode]) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    let incoming = nodes
        .iter()
        .map(|node| node.id.as_str())
        .collect::<HashSet<_>>();

    let stale = state
        .nodes
        .keys()
        .filter(|id| !incoming.contains(id.as_str()))
        .cloned()
        .collect::<Vec<_>>();
    for id in stale {
        if let Some(node) = state.nodes.remove(&id) {
            if state.dragged.as_deref() == Some(id.as_str()) {
                state.dragged = None;
            }
            state.position_cache.insert(id, node.pos);
            report.evicted += 1;
        }
    }

    for logical in nodes {
        let fixed = logical.pinned;
        let mass = state.mass_for(logical.size, fixed);

        if let Some(node) = state.nodes.get_mut(&logical.id) {
            node.size = logical.size;
            node.mass = mass;
            node.fixed = fixed;
            if fixed {
                if let Some(anchor) = logical.anchor {
                    node.pos = anchor;
                }
                node.vel = Vec2::ZERO;
                if state.dragged.as_deref() == Some(logical.id.as_str()) {
                    state.dragged = None;
                }
            }
            report.kept += 1;
            continue;
        }

        let pos = if fixed {
            logical
                .anchor
                .unwrap_or_else(|| state.bounds.center() - logical.size * 0.5)
        } else if let Some(cached) = state.position_cache.remove(&logical.id) {
            report.restored += 1;
            cached
        } else {
            seed_position(state, logical)
        };

        state.nodes.insert(
            logical.id.clone(),
            SimNode {
                pos,
                vel: Vec2::ZERO,
                size: logical.size,
                mass,
                fixed,
            },
        );
        report.added += 1;
    }

    if report.changed_membership() {
        debug!(
            kept = report.kept,
            added = report.added,
            restored = report.restored,
            evicted = report.evicted,
            "reconciled simulation nodes"
        );
    }
    report
}

/// Anchor (or bounds centre) plus a small per-id offset so new nodes sharing
/// a seed do not overlap exactly.
fn seed_position(state: &SimState, logical: &LogicalNode) -> Vec2 {
    let base = logical
        .anchor
        .unwrap_or_else(|| state.bounds.center() - logical.size * 0.5);
    let (jx, jy) = stable_pair(&logical.id);
    let jittered = base + vec2(jx, jy) * state.jitter;
    state.bounds.clamp(jittered, logical.size)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::config::LayoutConfig;
    use crate::graph::NodeKind;

    fn node(id: &str, x: f32, y: f32) -> LogicalNode {
        LogicalNode::new(id, NodeKind::Service, id).with_anchor(vec2(x, y))
    }

    fn snapshot(state: &SimState) -> Vec<(String, SimNode)> {
        state
            .iter()
            .map(|(id, node)| (id.clone(), *node))
            .collect()
    }

    #[test]
    fn new_nodes_seed_near_their_anchor() {
        let config = LayoutConfig::default();
        let mut state = SimState::new(&config);
        let report = reconcile(&mut state, &[node("a", 300.0, 200.0)]);
        assert_eq!(report.added, 1);

        let sim = state.get("a").expect("a exists");
        assert!((sim.pos.x - 300.0).abs() <= config.jitter);
        assert!((sim.pos.y - 200.0).abs() <= config.jitter);
        assert_eq!(sim.vel, Vec2::ZERO);
        assert_eq!(sim.mass, sim.size.x * sim.size.y / config.physics.mass_divisor);
    }

    #[test]
    fn pinned_nodes_start_and_stay_at_anchor() {
        let mut state = SimState::new(&LayoutConfig::default());
        let hub = LogicalNode::new("hub", NodeKind::Proxy, "hub").pinned_at(vec2(425.0, 232.0));
        reconcile(&mut state, std::slice::from_ref(&hub));
        assert_eq!(state.get("hub").map(|node| node.pos), Some(vec2(425.0, 232.0)));

        if let Some(sim) = state.get_mut("hub") {
            sim.pos = vec2(1.0, 1.0);
            sim.vel = vec2(3.0, 3.0);
        }
        let moved = hub.clone().pinned_at(vec2(430.0, 240.0));
        reconcile(&mut state, &[moved]);
        let sim = state.get("hub").expect("hub exists");
        assert_eq!(sim.pos, vec2(430.0, 240.0));
        assert_eq!(sim.vel, Vec2::ZERO);
        assert!(sim.mass.is_infinite());
    }

    #[test]
    fn surviving_nodes_keep_position_and_velocity() {
        let mut state = SimState::new(&LayoutConfig::default());
        reconcile(&mut state, &[node("a", 300.0, 200.0)]);
        if let Some(sim) = state.get_mut("a") {
            sim.pos = vec2(612.0, 144.0);
            sim.vel = vec2(1.5, -0.5);
        }

        reconcile(&mut state, &[node("a", 10.0, 10.0), node("b", 50.0, 50.0)]);
        let sim = state.get("a").expect("a exists");
        assert_eq!(sim.pos, vec2(612.0, 144.0));
        assert_eq!(sim.vel, vec2(1.5, -0.5));
    }

    #[test]
    fn vanished_nodes_resume_from_cache() {
        let mut state = SimState::new(&LayoutConfig::default());
        reconcile(&mut state, &[node("a", 300.0, 200.0), node("b", 500.0, 200.0)]);
        if let Some(sim) = state.get_mut("a") {
            sim.pos = vec2(100.0, 100.0);
        }

        let report = reconcile(&mut state, &[node("b", 500.0, 200.0)]);
        assert_eq!(report.evicted, 1);
        assert!(state.get("a").is_none());
        assert_eq!(state.cached_position("a"), Some(vec2(100.0, 100.0)));

        let report = reconcile(&mut state, &[node("a", 300.0, 200.0), node("b", 500.0, 200.0)]);
        assert_eq!(report.restored, 1);
        assert_eq!(state.get("a").map(|node| node.pos), Some(vec2(100.0, 100.0)));
    }

    #[test]
    fn evicting_the_dragged_node_ends_the_drag() {
        let mut state = SimState::new(&LayoutConfig::default());
        reconcile(&mut state, &[node("a", 300.0, 200.0)]);
        assert!(state.begin_drag("a"));
        reconcile(&mut state, &[]);
        assert_eq!(state.dragged(), None);
    }

    fn layout_nodes() -> impl Strategy<Value = Vec<LogicalNode>> {
        prop::collection::btree_map(
            "[a-e]{1,2}",
            (20.0f32..900.0, 20.0f32..460.0, any::<bool>()),
            0..10,
        )
        .prop_map(|entries| {
            entries
                .into_iter()
                .map(|(id, (x, y, pinned))| {
                    let node = LogicalNode::new(id.clone(), NodeKind::Service, id);
                    if pinned {
                        node.pinned_at(vec2(x, y))
                    } else {
                        node.with_anchor(vec2(x, y))
                    }
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn reconcile_is_idempotent(first in layout_nodes(), second in layout_nodes()) {
            let mut state = SimState::new(&LayoutConfig::default());
            reconcile(&mut state, &first);
            reconcile(&mut state, &second);
            let once = snapshot(&state);

            let report = reconcile(&mut state, &second);
            prop_assert_eq!(report.added, 0);
            prop_assert_eq!(report.evicted, 0);
            prop_assert_eq!(snapshot(&state), once);
        }

        #[test]
        fn reappearing_nodes_resume_where_they_left(
            nodes in layout_nodes(),
            dx in -200.0f32..200.0,
            dy in -120.0f32..120.0,
        ) {
            let mut state = SimState::new(&LayoutConfig::default());
            reconcile(&mut state, &nodes);

            let mut last = Vec::new();
            for logical in nodes.iter().filter(|node| !node.pinned) {
                if let Some(sim) = state.get_mut(&logical.id) {
                    sim.pos += vec2(dx, dy);
                    last.push((logical.id.clone(), sim.pos));
                }
            }

            reconcile(&mut state, &[]);
            prop_assert!(state.is_empty());
            reconcile(&mut state, &nodes);

            for (id, pos) in last {
                let sim = state.get(&id).expect("node restored");
                prop_assert!((sim.pos - pos).length() < 1e-4);
            }
        }
    }
}
