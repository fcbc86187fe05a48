//! Screen-space drawing list handed to the presentation layer.

use eframe::egui::{Color32, Pos2, Rect};

use crate::graph::{Edge, EdgeOutcome, FlowGraph, Health, NodeKind};
use crate::interaction::Highlight;
use crate::sim::SimState;
use crate::util::{format_bytes, format_rate};
use crate::viewport::Transform;

const MIN_STROKE: f32 = 1.2;
const MAX_STROKE: f32 = 6.0;

#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub rect: Rect,
    pub fill: Color32,
    pub border: Color32,
    pub opacity: f32,
    pub pinned: bool,
    pub selected: bool,
    pub hovered: bool,
    pub search_match: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneEdge {
    pub id: String,
    pub from: Pos2,
    pub to: Pos2,
    pub color: Color32,
    pub width: f32,
    pub opacity: f32,
    pub label: String,
    pub hovered: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderScene {
    pub nodes: Vec<SceneNode>,
    pub edges: Vec<SceneEdge>,
    pub transform: Transform,
}

impl RenderScene {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&SceneNode> {
        self.nodes.iter().find(|node| node.id == id)
    }
}

pub struct SceneFocus<'a> {
    pub highlight: &'a Highlight,
    pub selected: Option<&'a str>,
    pub hovered_node: Option<&'a str>,
    pub hovered_edge: Option<&'a str>,
}

pub fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;
    let mix = |a: u8, b: u8| ((a as f32 * inverse) + (b as f32 * amount)) as u8;

    Color32::from_rgba_unmultiplied(
        mix(base.r(), overlay.r()),
        mix(base.g(), overlay.g()),
        mix(base.b(), overlay.b()),
        mix(base.a(), overlay.a()),
    )
}

/// Fades a colour's alpha by `opacity` without touching its hue.
pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    Color32::from_rgba_unmultiplied(r, g, b, (a as f32 * opacity.clamp(0.0, 1.0)) as u8)
}

pub fn kind_color(kind: NodeKind) -> Color32 {
    match kind {
        NodeKind::Proxy | NodeKind::Firewall => Color32::from_rgb(64, 112, 196),
        NodeKind::Service | NodeKind::SourceHost => Color32::from_rgb(52, 78, 102),
        NodeKind::Datastore => Color32::from_rgb(70, 96, 74),
        NodeKind::SecurityGate => Color32::from_rgb(132, 92, 40),
        NodeKind::ExternalEndpoint | NodeKind::ExternalService => Color32::from_rgb(108, 64, 96),
        NodeKind::Agent => Color32::from_rgb(58, 106, 112),
        NodeKind::AiProvider => Color32::from_rgb(92, 72, 140),
        NodeKind::ObservabilitySink | NodeKind::PolicyRegistry => Color32::from_rgb(72, 78, 88),
    }
}

pub fn health_color(health: Health) -> Color32 {
    match health {
        Health::Healthy => Color32::from_rgb(110, 190, 130),
        Health::Warning => Color32::from_rgb(230, 180, 70),
        Health::Critical => Color32::from_rgb(228, 86, 78),
    }
}

pub fn outcome_color(outcome: EdgeOutcome) -> Color32 {
    match outcome {
        EdgeOutcome::Ok => Color32::from_rgb(120, 150, 180),
        EdgeOutcome::Error => Color32::from_rgb(228, 120, 80),
        EdgeOutcome::Escalated => Color32::from_rgb(226, 190, 72),
        EdgeOutcome::Blocked => Color32::from_rgb(220, 70, 70),
    }
}

fn normalize_log(value: f64, min: f64, max: f64) -> f32 {
    let min = min.max(1.0);
    let max = max.max(min);
    let value = value.max(1.0);

    let denominator = max.ln() - min.ln();
    if denominator.abs() < f64::EPSILON {
        return 0.5;
    }

    ((value.ln() - min.ln()) / denominator).clamp(0.0, 1.0) as f32
}

/// Log-scaled stroke width for `volume` relative to the visible range.
pub fn stroke_width(volume: f64, min: f64, max: f64) -> f32 {
    if volume <= 0.0 {
        return MIN_STROKE;
    }
    MIN_STROKE + normalize_log(volume, min, max) * (MAX_STROKE - MIN_STROKE)
}

fn edge_label(edge: &Edge) -> String {
    match edge.bytes_per_hour {
        Some(bytes) if bytes > 0.0 => format!("{}/h", format_bytes(bytes.round() as u64)),
        _ => format_rate(edge.volume_per_hour),
    }
}

/// Projects the current simulation state through `transform`. Edges whose
/// endpoints have no simulation node yet are left out.
pub fn build_scene(
    graph: &FlowGraph,
    state: &SimState,
    transform: Transform,
    focus: &SceneFocus<'_>,
) -> RenderScene {
    let (min_volume, max_volume) = graph
        .edges
        .iter()
        .map(|edge| edge.volume_per_hour)
        .fold((f64::INFINITY, 0.0f64), |(min, max), volume| {
            (min.min(volume), max.max(volume))
        });

    let edges = graph
        .edges
        .iter()
        .filter_map(|edge| {
            let from = state.get(&edge.from)?;
            let to = state.get(&edge.to)?;
            Some(SceneEdge {
                id: edge.id.clone(),
                from: transform.to_screen(from.center()),
                to: transform.to_screen(to.center()),
                color: outcome_color(edge.outcome),
                width: stroke_width(edge.volume_per_hour, min_volume, max_volume),
                opacity: focus.highlight.edge_opacity(edge),
                label: edge_label(edge),
                hovered: focus.hovered_edge == Some(edge.id.as_str()),
            })
        })
        .collect();

    let nodes = graph
        .nodes
        .iter()
        .filter_map(|node| {
            let sim = state.get(&node.id)?;
            let selected = focus.selected == Some(node.id.as_str());
            let hovered = focus.hovered_node == Some(node.id.as_str());
            let base = kind_color(node.kind);
            let fill = if selected || hovered {
                blend_color(base, Color32::WHITE, 0.18)
            } else {
                base
            };
            Some(SceneNode {
                id: node.id.clone(),
                label: node.label.clone(),
                kind: node.kind,
                rect: transform.rect_to_screen(sim.pos, sim.size),
                fill,
                border: health_color(node.health),
                opacity: focus.highlight.node_opacity(&node.id),
                pinned: node.pinned,
                selected,
                hovered,
                search_match: focus.highlight.is_search_match(&node.id),
            })
        })
        .collect();

    RenderScene {
        nodes,
        edges,
        transform,
    }
}
