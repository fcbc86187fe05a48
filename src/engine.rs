//! The long-lived layout engine behind one graph view.

use std::sync::Arc;
use std::time::Instant;

use eframe::egui::{Pos2, Rect, Vec2};
use tracing::{debug, info};

use crate::config::LayoutConfig;
use crate::graph::FlowGraph;
use crate::interaction::{DetailPayload, FilterSet, InteractionController};
use crate::scene::{RenderScene, SceneFocus, build_scene};
use crate::sim::{FrameLoop, FrameObserver, LoopState, ReconcileReport, SimState, reconcile, step};
use crate::viewport::{Transform, Viewport};

pub struct FlowEngine {
    config: LayoutConfig,
    state: SimState,
    frame_loop: FrameLoop,
    viewport: Viewport,
    controller: InteractionController,
    source: Arc<FlowGraph>,
    visible: FlowGraph,
    moving: bool,
}

impl FlowEngine {
    pub fn new(config: LayoutConfig) -> Self {
        let mut frame_loop = FrameLoop::new(config.max_dt_ms);
        frame_loop.stop();
        Self {
            state: SimState::new(&config),
            viewport: Viewport::new(config.min_container, config.view_margin),
            frame_loop,
            controller: InteractionController::default(),
            source: Arc::new(FlowGraph::default()),
            visible: FlowGraph::default(),
            moving: false,
            config,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn state(&self) -> &SimState {
        &self.state
    }

    /// The graph after filters, as simulated and drawn.
    pub fn graph(&self) -> &FlowGraph {
        &self.visible
    }

    pub fn source_graph(&self) -> &FlowGraph {
        &self.source
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn loop_state(&self) -> LoopState {
        self.frame_loop.state()
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn transform(&self) -> Transform {
        self.viewport.transform()
    }

    pub fn container(&self) -> Rect {
        self.viewport.container()
    }

    /// Takes a fresh builder output. Surviving nodes keep their positions.
    pub fn set_graph(&mut self, graph: Arc<FlowGraph>) -> ReconcileReport {
        self.source = graph;
        self.refilter()
    }

    fn refilter(&mut self) -> ReconcileReport {
        self.visible = self.controller.filters().apply(&self.source);
        let report = reconcile(&mut self.state, &self.visible.nodes);
        self.controller.sync(&self.visible, &self.state);

        if self.visible.nodes.is_empty() {
            if self.frame_loop.state() != LoopState::Stopped {
                debug!("graph is empty, stopping the frame loop");
            }
            self.frame_loop.stop();
            self.moving = false;
        } else if self.frame_loop.state() == LoopState::Stopped {
            self.frame_loop.start();
        }
        self.viewport.update(&self.state, &self.visible.nodes);
        report
    }

    pub fn set_filters(&mut self, filters: FilterSet) -> bool {
        if !self.controller.set_filters(filters) {
            return false;
        }
        self.refilter();
        true
    }

    pub fn set_search(&mut self, query: &str) {
        self.controller.set_search(query);
    }

    pub fn select(&mut self, id: Option<String>) {
        self.controller.select(id);
    }

    /// Resize notification from the host. Returns whether the container
    /// actually changed.
    pub fn set_container(&mut self, container: Rect) -> bool {
        if !self.viewport.resize(container) {
            return false;
        }
        self.viewport.update(&self.state, &self.visible.nodes);
        true
    }

    /// Runs at most one physics step, notifies `observer` when it did, and
    /// reprojects. Returns whether a frame was produced.
    pub fn tick(&mut self, now: Instant, observer: &mut dyn FrameObserver) -> bool {
        let ran = match self.frame_loop.advance(now) {
            Some(tick) => {
                self.moving = step(
                    &mut self.state,
                    &self.visible.edges,
                    &self.config.physics,
                    tick.dt_frames(),
                );
                observer.on_frame(&tick);
                true
            }
            None => false,
        };
        self.viewport.update(&self.state, &self.visible.nodes);
        ran
    }

    pub fn is_stabilized(&self) -> bool {
        self.frame_loop.state() == LoopState::Paused
    }

    pub fn stabilize(&mut self) {
        self.frame_loop.pause();
        self.moving = false;
    }

    pub fn resume(&mut self) {
        self.frame_loop.resume();
    }

    /// Puts every movable node back on its anchor at rest and restarts the
    /// loop.
    pub fn reset(&mut self) {
        let bounds = self.state.bounds();
        for node in &self.visible.nodes {
            if node.pinned || self.state.is_dragged(&node.id) {
                continue;
            }
            let Some(sim) = self.state.get_mut(&node.id) else {
                continue;
            };
            let anchor = node
                .anchor
                .unwrap_or_else(|| bounds.center() - node.size * 0.5);
            sim.pos = bounds.clamp(anchor, sim.size);
            sim.vel = Vec2::ZERO;
        }
        info!(nodes = self.visible.nodes.len(), "layout reset");

        if !self.visible.nodes.is_empty() {
            self.frame_loop.start();
        }
        self.viewport.update(&self.state, &self.visible.nodes);
    }

    /// Tears the loop down for good; only new data restarts it.
    pub fn stop(&mut self) {
        self.frame_loop.stop();
        self.moving = false;
    }

    pub fn hover(&mut self, pointer: Option<Pos2>) {
        let transform = self.viewport.transform();
        self.controller
            .hover(&self.visible, &self.state, &transform, pointer);
    }

    pub fn pointer_down(&mut self, pointer: Pos2) -> bool {
        let transform = self.viewport.transform();
        self.controller
            .pointer_down(&self.visible, &mut self.state, &transform, pointer)
    }

    pub fn pointer_move(&mut self, pointer: Pos2) -> bool {
        let transform = self.viewport.transform();
        self.controller
            .pointer_move(&mut self.state, &transform, pointer)
    }

    pub fn pointer_up(&mut self, pointer: Pos2) {
        self.controller.pointer_up(&mut self.state, pointer);
    }

    pub fn pointer_left(&mut self) {
        self.controller.pointer_left();
    }

    pub fn scene(&self) -> RenderScene {
        let highlight = self.controller.highlight(&self.visible);
        let focus = SceneFocus {
            highlight: &highlight,
            selected: self.controller.selected(),
            hovered_node: self.controller.hovered_node(),
            hovered_edge: self.controller.hovered_edge(),
        };
        build_scene(&self.visible, &self.state, self.viewport.transform(), &focus)
    }

    pub fn detail(&self) -> Option<DetailPayload> {
        self.controller.detail(&self.visible)
    }
}
