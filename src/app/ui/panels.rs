use eframe::egui::{self, Align, Context, Layout};

use mcp_flowgraph::engine::FlowEngine;
use mcp_flowgraph::events::{Domain, EventLog, WindowPreset};
use mcp_flowgraph::graph::{BuildCache, BuildOptions};
use mcp_flowgraph::interaction::FilterSet;
use mcp_flowgraph::sim::LoopState;

use super::super::{Launch, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(log: EventLog, launch: &Launch) -> Self {
        let mut model = Self {
            domain: launch.domain.unwrap_or(log.domain),
            log,
            events: Vec::new(),
            events_revision: 0,
            base_window: launch.window,
            preset: WindowPreset::All,
            options: BuildOptions::from_layout(&launch.config),
            build_cache: BuildCache::default(),
            engine: FlowEngine::new(launch.config.clone()),
            filters: FilterSet::default(),
            search: String::new(),
            graph_dirty: true,
        };
        model.refresh_events();
        model
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        launch: &Launch,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        if self.graph_dirty {
            self.rebuild_graph();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("mcp-flowgraph");
                    ui.separator();
                    ui.label(format!("export: {}", launch.events_path.display()));
                    ui.label(format!("events: {}", self.log.events.len()));
                    if self.log.sessions > 0 {
                        ui.label(format!("sessions: {}", self.log.sessions));
                    }
                    if self.log.skipped > 0 {
                        ui.label(format!("skipped: {}", self.log.skipped))
                            .on_hover_text("Malformed records ignored while loading.");
                    }
                    ui.separator();

                    let mut domain = self.domain;
                    ui.selectable_value(&mut domain, Domain::Agent, "Agent")
                        .on_hover_text("Tool calls routed through the proxy.");
                    ui.selectable_value(&mut domain, Domain::Network, "Network")
                        .on_hover_text("Network flows seen by the firewall.");
                    self.set_domain(domain);

                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload export"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if is_loading {
                        ui.spinner();
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.loop_status_text());
                        let graph = self.engine.graph();
                        ui.label(format!(
                            "visible: {} nodes, {} edges",
                            graph.nodes.len(),
                            graph.edges.len()
                        ));
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));
    }

    fn loop_status_text(&self) -> &'static str {
        match self.engine.loop_state() {
            LoopState::Running if self.engine.is_moving() => "layout: settling",
            LoopState::Running => "layout: at rest",
            LoopState::Paused => "layout: stabilized",
            LoopState::Stopped => "layout: idle",
        }
    }
}
