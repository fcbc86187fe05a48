use eframe::egui::{self, RichText, Ui};

use mcp_flowgraph::events::format_timestamp;
use mcp_flowgraph::graph::EdgeSample;
use mcp_flowgraph::interaction::ConnectedEdge;
use mcp_flowgraph::scene::{health_color, outcome_color};
use mcp_flowgraph::util::{format_bytes, format_rate};

use super::super::ViewModel;

fn sample_line(sample: &EdgeSample) -> String {
    let mut line = sample
        .timestamp_ms
        .map_or_else(|| "no time".to_owned(), format_timestamp);
    line.push_str(&format!("  {}", sample.status.label()));
    if let Some(duration) = sample.duration_ms {
        line.push_str(&format!("  {duration:.0} ms"));
    }
    if let Some(bytes) = sample.bytes {
        line.push_str(&format!("  {}", format_bytes(bytes)));
    }
    if let Some(detail) = &sample.detail {
        line.push_str(&format!("  {detail}"));
    }
    line
}

fn draw_connected(ui: &mut Ui, heading: &str, arrow: &str, edges: &[ConnectedEdge]) {
    ui.label(RichText::new(heading).strong());
    if edges.is_empty() {
        ui.small("none");
        return;
    }

    for connected in edges {
        let edge = &connected.edge;
        ui.horizontal_wrapped(|ui| {
            ui.label(format!("{arrow} {}", connected.peer_label));
            ui.label(RichText::new(edge.outcome.label()).color(outcome_color(edge.outcome)));
            ui.small(edge.kind.label());
            ui.small(format_rate(edge.volume_per_hour));
            if let Some(bytes) = edge.bytes_per_hour {
                ui.small(format!("{}/h", format_bytes(bytes.round() as u64)));
            }
            if let Some(protocol) = &edge.protocol {
                ui.small(protocol.as_str());
            }
        });
        if !edge.recent_samples.is_empty() {
            egui::CollapsingHeader::new(format!("recent ({})", edge.recent_samples.len()))
                .id_salt(("samples", edge.id.as_str()))
                .show(ui, |ui| {
                    for sample in &edge.recent_samples {
                        ui.small(sample_line(sample));
                    }
                });
        }
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        if self.engine.controller().selected().is_none() {
            ui.label("Click a node in the graph or a search match.");
            return;
        }

        let Some(detail) = self.engine.detail() else {
            ui.label("The selected node is not part of the current graph.");
            if ui.button("Clear selection").clicked() {
                self.engine.select(None);
            }
            return;
        };

        let node = &detail.node;
        ui.label(RichText::new(node.label.as_str()).strong());
        ui.small(node.id.as_str());
        ui.horizontal(|ui| {
            ui.label(node.kind.label());
            ui.label(RichText::new(node.health.label()).color(health_color(node.health)));
            if node.pinned {
                ui.small("pinned");
            }
        });
        if let Some(classification) = &node.classification {
            ui.label(format!("classification: {classification}"));
        }

        ui.separator();
        ui.label(RichText::new("Metrics").strong());
        if node.metrics.is_empty() {
            ui.small("none");
        } else {
            egui::Grid::new("node_metrics")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui| {
                    for (key, value) in &node.metrics {
                        ui.label(key.as_str());
                        ui.label(value.to_string());
                        ui.end_row();
                    }
                });
        }
        ui.small(format!(
            "combined edge volume: {}",
            format_rate(detail.total_volume_per_hour())
        ));

        ui.separator();
        egui::ScrollArea::vertical()
            .id_salt("detail_edges")
            .show(ui, |ui| {
                draw_connected(ui, "Incoming", "<-", &detail.incoming);
                ui.add_space(6.0);
                draw_connected(ui, "Outgoing", "->", &detail.outgoing);
            });

        ui.separator();
        if ui.button("Clear selection").clicked() {
            self.engine.select(None);
        }
    }
}
