use eframe::egui::{self, RichText, Ui};

use mcp_flowgraph::events::{WindowPreset, format_timestamp};
use mcp_flowgraph::graph::EdgeOutcome;
use mcp_flowgraph::scene::outcome_color;

use super::super::ViewModel;

const MAX_LISTED_MATCHES: usize = 24;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search nodes")
            .on_hover_text("Fuzzy-highlight matching nodes without changing the layout.");
        if ui.text_edit_singleline(&mut self.search).changed() {
            self.engine.set_search(&self.search);
        }
        self.draw_search_matches(ui);

        ui.separator();
        ui.label(RichText::new("Outcomes").strong());
        let mut filters = self.filters.clone();
        ui.horizontal_wrapped(|ui| {
            for outcome in EdgeOutcome::ALL {
                let mut shown = filters.shows_outcome(outcome);
                let label = RichText::new(outcome.label()).color(outcome_color(outcome));
                if ui
                    .checkbox(&mut shown, label)
                    .on_hover_text("Hide edges with this outcome and nodes left without edges.")
                    .changed()
                {
                    filters.toggle_outcome(outcome);
                }
            }
        });
        ui.checkbox(&mut filters.external_only, "External edges only")
            .on_hover_text("Keep only egress edges and edges touching external endpoints.");
        if self.engine.set_filters(filters.clone()) {
            self.filters = filters;
        }

        ui.separator();
        ui.label(RichText::new("Time window").strong());
        let mut preset = self.preset;
        ui.horizontal(|ui| {
            for option in WindowPreset::ALL {
                ui.selectable_value(&mut preset, option, option.label());
            }
        });
        if preset != self.preset {
            self.preset = preset;
            self.graph_dirty = true;
        }
        let window = self.current_window();
        ui.small(format!(
            "{} to {}",
            window.start.map_or_else(|| "earliest".to_owned(), format_timestamp),
            window.end.map_or_else(|| "latest".to_owned(), format_timestamp),
        ));

        ui.separator();
        ui.label(RichText::new("Layout").strong());
        ui.horizontal(|ui| {
            let stabilized = self.engine.is_stabilized();
            let label = if stabilized { "Resume" } else { "Stabilize" };
            if ui
                .button(label)
                .on_hover_text("Pause or resume the physics step. Dragging keeps working.")
                .clicked()
            {
                if stabilized {
                    self.engine.resume();
                } else {
                    self.engine.stabilize();
                }
            }
            if ui
                .button("Reset layout")
                .on_hover_text("Move every unpinned node back to its seed position.")
                .clicked()
            {
                self.engine.reset();
            }
        });
        if ui
            .checkbox(&mut self.options.infrastructure, "Show policy, audit and gate nodes")
            .changed()
        {
            self.graph_dirty = true;
        }
    }

    fn draw_search_matches(&mut self, ui: &mut Ui) {
        let Some(matches) = self.engine.controller().search_matches(self.engine.graph()) else {
            return;
        };
        if matches.is_empty() {
            ui.small("No matching nodes.");
            return;
        }

        let mut picked = None;
        egui::ScrollArea::vertical()
            .id_salt("search_matches")
            .max_height(160.0)
            .show(ui, |ui| {
                let selected = self.engine.controller().selected();
                for node in self
                    .engine
                    .graph()
                    .nodes
                    .iter()
                    .filter(|node| matches.contains(&node.id))
                    .take(MAX_LISTED_MATCHES)
                {
                    let is_selected = selected == Some(node.id.as_str());
                    if ui.selectable_label(is_selected, node.label.as_str()).clicked() {
                        picked = Some(node.id.clone());
                    }
                }
            });

        if picked.is_some() {
            self.engine.select(picked);
        }
    }
}
