//! Persistent physics state for the dataflow graph.
//!
//! [`SimState`] outlives every [`crate::graph::FlowGraph`]: the reconciler maps
//! each fresh build onto it by id, the physics step advances it once per frame
//! and the interaction layer writes it directly while a node is dragged.

mod physics;
mod reconcile;
mod scheduler;

use std::collections::{BTreeMap, HashMap};

use eframe::egui::{Vec2, vec2};

use crate::config::LayoutConfig;

pub use physics::step;
pub use reconcile::{ReconcileReport, reconcile};
pub use scheduler::{FrameLoop, FrameObserver, FrameTick, LoopState, NOMINAL_FRAME_MS};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimNode {
    /// Top-left corner of the footprint.
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    /// Infinite for fixed nodes.
    pub mass: f32,
    pub fixed: bool,
}

impl SimNode {
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }
}

/// Simulation-space rectangle nodes are kept inside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl Bounds {
    pub fn center(&self) -> Vec2 {
        vec2(self.width * 0.5, self.height * 0.5)
    }

    /// Clamps a top-left position so the footprint stays inside the margins.
    pub fn clamp(&self, pos: Vec2, size: Vec2) -> Vec2 {
        let max_x = (self.width - self.margin - size.x).max(self.margin);
        let max_y = (self.height - self.margin - size.y).max(self.margin);
        vec2(pos.x.clamp(self.margin, max_x), pos.y.clamp(self.margin, max_y))
    }
}

pub struct SimState {
    nodes: BTreeMap<String, SimNode>,
    position_cache: HashMap<String, Vec2>,
    dragged: Option<String>,
    bounds: Bounds,
    jitter: f32,
    mass_divisor: f32,
}

impl SimState {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            nodes: BTreeMap::new(),
            position_cache: HashMap::new(),
            dragged: None,
            bounds: Bounds {
                width: config.base_width,
                height: config.base_height,
                margin: config.margin,
            },
            jitter: config.jitter,
            mass_divisor: config.physics.mass_divisor,
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SimNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut SimNode> {
        self.nodes.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SimNode)> {
        self.nodes.iter()
    }

    pub fn cached_position(&self, id: &str) -> Option<Vec2> {
        self.position_cache.get(id).copied()
    }

    pub fn dragged(&self) -> Option<&str> {
        self.dragged.as_deref()
    }

    pub fn is_dragged(&self, id: &str) -> bool {
        self.dragged.as_deref() == Some(id)
    }

    /// Marks `id` as externally positioned. Fixed or unknown nodes are refused.
    pub fn begin_drag(&mut self, id: &str) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        if node.fixed {
            return false;
        }
        node.vel = Vec2::ZERO;
        self.dragged = Some(id.to_owned());
        true
    }

    /// Moves the dragged node, keeping it inside the bounds.
    pub fn drag_to(&mut self, pos: Vec2) -> bool {
        let bounds = self.bounds;
        let Some(id) = self.dragged.as_deref() else {
            return false;
        };
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        node.pos = bounds.clamp(pos, node.size);
        node.vel = Vec2::ZERO;
        true
    }

    pub fn end_drag(&mut self) -> Option<String> {
        self.dragged.take()
    }

    fn mass_for(&self, size: Vec2, fixed: bool) -> f32 {
        if fixed {
            f32::INFINITY
        } else {
            (size.x * size.y / self.mass_divisor).max(f32::EPSILON)
        }
    }
}
