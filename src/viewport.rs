use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};

use crate::graph::LogicalNode;
use crate::sim::SimState;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl ViewBox {
    pub fn contains(&self, min: Vec2, max: Vec2) -> bool {
        min.x >= self.x && min.y >= self.y && max.x <= self.x + self.w && max.y <= self.y + self.h
    }
}

/// Clamps degenerate container sizes before any division by them.
pub fn viable_container(container: Rect, min_size: f32) -> Rect {
    let size = vec2(
        container.width().max(min_size),
        container.height().max(min_size),
    );
    Rect::from_min_size(container.min, size)
}

/// Extent of the visible nodes' footprints padded by `margin`, or the
/// container itself when nothing is visible.
pub fn compute_view_box(
    state: &SimState,
    nodes: &[LogicalNode],
    container: Vec2,
    margin: f32,
) -> ViewBox {
    let mut min = vec2(f32::INFINITY, f32::INFINITY);
    let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);

    for node in nodes {
        let Some(sim) = state.get(&node.id) else {
            continue;
        };
        let end = sim.pos + sim.size;
        min.x = min.x.min(sim.pos.x);
        min.y = min.y.min(sim.pos.y);
        max.x = max.x.max(end.x);
        max.y = max.y.max(end.y);
    }

    if !min.x.is_finite() || !min.y.is_finite() || !max.x.is_finite() || !max.y.is_finite() {
        return ViewBox {
            x: 0.0,
            y: 0.0,
            w: container.x,
            h: container.y,
        };
    }

    ViewBox {
        x: min.x - margin,
        y: min.y - margin,
        w: (max.x - min.x + margin * 2.0).max(1.0),
        h: (max.y - min.y + margin * 2.0).max(1.0),
    }
}

/// Uniform scale plus translation from simulation space to screen pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub scale: f32,
    /// Screen position of the simulation origin.
    pub origin: Pos2,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            origin: Pos2::ZERO,
        }
    }
}

impl Transform {
    /// Fits `view_box` inside `container`, centred on both axes.
    pub fn fit(view_box: ViewBox, container: Rect) -> Self {
        let width = view_box.w.max(f32::EPSILON);
        let height = view_box.h.max(f32::EPSILON);
        let scale = (container.width() / width)
            .min(container.height() / height)
            .max(f32::EPSILON);

        let slack = vec2(
            container.width() - width * scale,
            container.height() - height * scale,
        );
        let origin = container.min + slack * 0.5 - vec2(view_box.x, view_box.y) * scale;
        Self { scale, origin }
    }

    pub fn to_screen(&self, sim: Vec2) -> Pos2 {
        self.origin + sim * self.scale
    }

    pub fn to_sim(&self, screen: Pos2) -> Vec2 {
        (screen - self.origin) / self.scale
    }

    pub fn rect_to_screen(&self, pos: Vec2, size: Vec2) -> Rect {
        Rect::from_min_size(self.to_screen(pos), size * self.scale)
    }
}

/// Container tracking plus the per-frame fit transform.
#[derive(Clone, Debug)]
pub struct Viewport {
    container: Rect,
    min_container: f32,
    view_margin: f32,
    view_box: ViewBox,
    transform: Transform,
}

impl Viewport {
    pub fn new(min_container: f32, view_margin: f32) -> Self {
        let container = Rect::from_min_size(pos2(0.0, 0.0), vec2(min_container, min_container));
        Self {
            container,
            min_container,
            view_margin,
            view_box: ViewBox {
                x: 0.0,
                y: 0.0,
                w: container.width(),
                h: container.height(),
            },
            transform: Transform::default(),
        }
    }

    /// Applies a resize notification; returns whether the container changed.
    pub fn resize(&mut self, container: Rect) -> bool {
        let container = viable_container(container, self.min_container);
        if container == self.container {
            return false;
        }
        self.container = container;
        true
    }

    pub fn container(&self) -> Rect {
        self.container
    }

    pub fn view_box(&self) -> ViewBox {
        self.view_box
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Recomputes the view box and transform from live positions.
    pub fn update(&mut self, state: &SimState, nodes: &[LogicalNode]) -> Transform {
        self.view_box = compute_view_box(state, nodes, self.container.size(), self.view_margin);
        self.transform = Transform::fit(self.view_box, self.container);
        self.transform
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::config::LayoutConfig;
    use crate::graph::NodeKind;
    use crate::sim::reconcile;

    #[test]
    fn empty_graph_falls_back_to_the_container() {
        let state = SimState::new(&LayoutConfig::default());
        let view_box = compute_view_box(&state, &[], vec2(640.0, 480.0), 24.0);
        assert_eq!(
            view_box,
            ViewBox {
                x: 0.0,
                y: 0.0,
                w: 640.0,
                h: 480.0
            }
        );
    }

    #[test]
    fn transform_round_trips_pointer_positions() {
        let view_box = ViewBox {
            x: 100.0,
            y: 50.0,
            w: 800.0,
            h: 400.0,
        };
        let container = Rect::from_min_size(pos2(20.0, 40.0), vec2(1200.0, 900.0));
        let transform = Transform::fit(view_box, container);
        assert!((transform.scale - 1.5).abs() < 1e-6);

        let corner = transform.to_screen(vec2(100.0, 50.0));
        assert!((corner.x - 20.0).abs() < 1e-3);
        assert!((corner.y - (40.0 + 150.0)).abs() < 1e-3);

        let pointer = pos2(611.0, 377.0);
        let back = transform.to_screen(transform.to_sim(pointer));
        assert!((back - pointer).length() < 1e-3);
    }

    #[test]
    fn degenerate_containers_are_clamped() {
        let rect = viable_container(Rect::from_min_size(pos2(5.0, 5.0), vec2(0.0, 0.0)), 64.0);
        assert_eq!(rect.size(), vec2(64.0, 64.0));

        let mut viewport = Viewport::new(64.0, 24.0);
        assert!(viewport.resize(Rect::from_min_size(pos2(0.0, 0.0), vec2(0.0, 300.0))));
        assert_eq!(viewport.container().width(), 64.0);
        assert!(!viewport.resize(Rect::from_min_size(pos2(0.0, 0.0), vec2(10.0, 300.0))));

        let state = SimState::new(&LayoutConfig::default());
        let transform = viewport.update(&state, &[]);
        assert!(transform.scale.is_finite() && transform.scale > 0.0);
    }

    proptest! {
        #[test]
        fn view_box_contains_every_footprint(
            points in prop::collection::vec((0.0f32..1000.0, 0.0f32..520.0), 1..12),
            margin in 0.0f32..40.0,
        ) {
            let mut state = SimState::new(&LayoutConfig::default());
            let nodes = points
                .iter()
                .enumerate()
                .map(|(index, &(x, y))| {
                    let id = format!("n{index}");
                    LogicalNode::new(id.clone(), NodeKind::Service, id).with_anchor(vec2(x, y))
                })
                .collect::<Vec<_>>();
            reconcile(&mut state, &nodes);

            let view_box = compute_view_box(&state, &nodes, vec2(800.0, 600.0), margin);
            for node in &nodes {
                let sim = state.get(&node.id).expect("reconciled");
                prop_assert!(view_box.contains(sim.pos, sim.pos + sim.size));
            }
        }
    }
}
