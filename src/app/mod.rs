use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::Context as _;
use eframe::egui::{self, Context};
use tracing::{info, warn};

use mcp_flowgraph::LayoutConfig;
use mcp_flowgraph::engine::FlowEngine;
use mcp_flowgraph::events::{
    Domain, EventLog, FlowEvent, TimeWindow, WindowPreset, load_event_log,
};
use mcp_flowgraph::graph::{BuildCache, BuildOptions};
use mcp_flowgraph::interaction::FilterSet;

mod graph;
mod ui;

type LoadResult = Result<EventLog, String>;

/// Startup settings resolved from the command line.
#[derive(Clone, Debug)]
pub struct Launch {
    pub events_path: PathBuf,
    /// `None` follows whatever the export contains.
    pub domain: Option<Domain>,
    pub window: TimeWindow,
    pub config: LayoutConfig,
}

pub struct FlowGraphApp {
    launch: Launch,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    log: EventLog,
    /// The log's events for the active domain.
    events: Vec<FlowEvent>,
    events_revision: u64,
    domain: Domain,
    base_window: TimeWindow,
    preset: WindowPreset,
    options: BuildOptions,
    build_cache: BuildCache,
    engine: FlowEngine,
    filters: FilterSet,
    search: String,
    graph_dirty: bool,
}

impl FlowGraphApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, launch: Launch) -> Self {
        let state = Self::start_load(launch.events_path.clone());
        Self {
            launch,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(path: PathBuf) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_event_log(&path)
                .with_context(|| format!("loading events from {}", path.display()))
                .map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(path: PathBuf) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(path),
        }
    }
}

impl eframe::App for FlowGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(log)) => {
                        transition = Some(AppState::Ready(Box::new(ViewModel::new(log, &self.launch))));
                    }
                    Ok(Err(error)) => {
                        warn!(%error, "event export failed to load");
                        transition = Some(AppState::Error(error));
                    }
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading event export...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the event export");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.launch.events_path.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.launch, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    info!(path = %self.launch.events_path.display(), "reloading event export");
                    self.reload_rx = Some(Self::spawn_load(self.launch.events_path.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        // The engine survives a reload so node positions carry over.
                        Ok(Ok(log)) => model.replace_log(log, self.launch.domain),
                        Ok(Err(error)) => {
                            warn!(%error, "reload failed");
                            transition = Some(AppState::Error(error));
                        }
                        Err(TryRecvError::Empty) => {
                            ctx.request_repaint();
                            self.reload_rx = Some(rx);
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(AppState::Error("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            if let AppState::Ready(model) = &mut self.state {
                model.engine.stop();
            }
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
