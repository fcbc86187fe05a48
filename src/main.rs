mod app;

use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use mcp_flowgraph::LayoutConfig;
use mcp_flowgraph::events::{Domain, TimeWindow, parse_timestamp};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DomainArg {
    Agent,
    Network,
    Auto,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Session or flow export (JSON).
    #[arg(long)]
    events: PathBuf,

    #[arg(long, value_enum, default_value_t = DomainArg::Auto)]
    domain: DomainArg,

    /// Optional JSON file overriding layout and physics constants.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ignore events before this RFC 3339 timestamp.
    #[arg(long)]
    since: Option<String>,

    /// Ignore events after this RFC 3339 timestamp.
    #[arg(long)]
    until: Option<String>,
}

fn parse_bound(flag: &str, raw: Option<&str>) -> anyhow::Result<Option<i64>> {
    raw.map(|raw| parse_timestamp(raw).ok_or_else(|| anyhow!("--{flag}: cannot parse {raw:?}")))
        .transpose()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mcp_flowgraph=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => LayoutConfig::load(path)
            .with_context(|| format!("loading layout config {}", path.display()))?,
        None => LayoutConfig::default(),
    };
    let window = TimeWindow {
        start: parse_bound("since", args.since.as_deref())?,
        end: parse_bound("until", args.until.as_deref())?,
    };
    let domain = match args.domain {
        DomainArg::Agent => Some(Domain::Agent),
        DomainArg::Network => Some(Domain::Network),
        DomainArg::Auto => None,
    };

    let launch = app::Launch {
        events_path: args.events,
        domain,
        window,
        config,
    };
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 900.0]),
        ..Default::default()
    };

    eframe::run_native(
        "mcp-flowgraph",
        options,
        Box::new(move |cc| Ok(Box::new(app::FlowGraphApp::new(cc, launch)))),
    )
    .map_err(|error| anyhow!("failed to start the window: {error}"))
}
