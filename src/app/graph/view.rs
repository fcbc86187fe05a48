use std::time::Instant;

use eframe::egui::{
    self, Align2, Color32, Context, FontId, Painter, Pos2, Rect, Sense, Stroke, StrokeKind, Ui,
    vec2,
};

use mcp_flowgraph::scene::{RenderScene, SceneEdge, SceneNode, blend_color, with_opacity};
use mcp_flowgraph::sim::{FrameObserver, FrameTick};
use mcp_flowgraph::util::format_rate;
use mcp_flowgraph::viewport::Transform;

use super::super::ViewModel;

const GRID_STEP: f32 = 50.0;
const NODE_ROUNDING: f32 = 6.0;

struct Repaint<'a>(&'a Context);

impl FrameObserver for Repaint<'_> {
    fn on_frame(&mut self, _tick: &FrameTick) {
        self.0.request_repaint();
    }
}

fn draw_background(painter: &Painter, rect: Rect, transform: &Transform) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (GRID_STEP * transform.scale).max(12.0);
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = rect.left() + (transform.origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (transform.origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

fn draw_edge(painter: &Painter, edge: &SceneEdge, show_label: bool) {
    let width = if edge.hovered { edge.width + 1.5 } else { edge.width };
    let color = with_opacity(edge.color, edge.opacity);
    painter.line_segment([edge.from, edge.to], Stroke::new(width, color));

    let direction = edge.to - edge.from;
    let length = direction.length();
    if length > 1.0 {
        let unit = direction / length;
        let normal = vec2(-unit.y, unit.x);
        let tip = edge.from + direction * 0.55;
        let size = 5.0 + width;
        painter.add(egui::Shape::convex_polygon(
            vec![
                tip + unit * size,
                tip - unit * size * 0.6 + normal * size * 0.6,
                tip - unit * size * 0.6 - normal * size * 0.6,
            ],
            color,
            Stroke::NONE,
        ));
    }

    if show_label {
        painter.text(
            edge.from + (edge.to - edge.from) * 0.5 + vec2(0.0, -10.0),
            Align2::CENTER_BOTTOM,
            edge.label.as_str(),
            FontId::proportional(11.0),
            with_opacity(Color32::from_gray(220), edge.opacity),
        );
    }
}

fn draw_node(painter: &Painter, node: &SceneNode, scale: f32) {
    let fill = if node.search_match {
        blend_color(node.fill, Color32::from_rgb(103, 196, 255), 0.45)
    } else {
        node.fill
    };
    let rounding = NODE_ROUNDING * scale.clamp(0.5, 1.5);
    painter.rect_filled(node.rect, rounding, with_opacity(fill, node.opacity));

    let border_width = if node.selected {
        3.0
    } else if node.hovered {
        2.2
    } else {
        1.4
    };
    let border = if node.selected {
        Color32::from_rgb(245, 206, 93)
    } else {
        node.border
    };
    painter.rect_stroke(
        node.rect,
        rounding,
        Stroke::new(border_width, with_opacity(border, node.opacity)),
        StrokeKind::Inside,
    );

    if node.pinned {
        painter.circle_filled(
            node.rect.right_top() + vec2(-6.0, 6.0),
            2.5,
            with_opacity(Color32::from_gray(210), node.opacity),
        );
    }

    let font_size = (13.0 * scale).clamp(8.0, 16.0);
    painter.text(
        node.rect.center() - vec2(0.0, font_size * 0.35),
        Align2::CENTER_CENTER,
        node.label.as_str(),
        FontId::proportional(font_size),
        with_opacity(Color32::from_gray(238), node.opacity),
    );
    painter.text(
        node.rect.center() + vec2(0.0, font_size * 0.7),
        Align2::CENTER_CENTER,
        node.kind.label(),
        FontId::proportional((font_size * 0.75).max(7.0)),
        with_opacity(Color32::from_gray(170), node.opacity),
    );
}

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        if self.graph_dirty {
            self.rebuild_graph();
        }

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.engine.set_container(rect);
        self.handle_graph_pointer(ui, rect, &response);
        self.engine.tick(Instant::now(), &mut Repaint(ui.ctx()));

        let scene = self.engine.scene();
        draw_background(&painter, rect, &scene.transform);

        if scene.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No events in the selected window.",
                FontId::proportional(15.0),
                Color32::from_gray(200),
            );
            return;
        }

        self.paint_scene(&painter, &scene);
        self.paint_hover_summary(&painter, rect);
    }

    fn paint_scene(&self, painter: &Painter, scene: &RenderScene) {
        let focused = self.engine.controller().hovered_node().is_some()
            || self.engine.controller().hovered_edge().is_some()
            || self.engine.controller().selected().is_some();

        for edge in &scene.edges {
            let show_label = edge.hovered || (focused && edge.opacity >= 1.0);
            draw_edge(painter, edge, show_label);
        }
        for node in &scene.nodes {
            draw_node(painter, node, scene.transform.scale);
        }
    }

    fn paint_hover_summary(&self, painter: &Painter, rect: Rect) {
        let graph = self.engine.graph();
        let controller = self.engine.controller();

        let text = if let Some(node) = controller.hovered_node().and_then(|id| graph.node(id)) {
            let calls = node
                .metric("calls")
                .map_or_else(String::new, |calls| format!("  |  calls {calls:.0}"));
            format!("{}  |  {}  |  {}{calls}", node.label, node.kind.label(), node.health.label())
        } else if let Some(edge) = controller.hovered_edge().and_then(|id| graph.edge(id)) {
            format!(
                "{} -> {}  |  {}  |  {}  |  {}",
                edge.from,
                edge.to,
                edge.kind.label(),
                edge.outcome.label(),
                format_rate(edge.volume_per_hour)
            )
        } else {
            return;
        };

        painter.text(
            rect.left_top() + vec2(10.0, 10.0),
            Align2::LEFT_TOP,
            text,
            FontId::proportional(13.0),
            Color32::from_gray(240),
        );
    }
}
