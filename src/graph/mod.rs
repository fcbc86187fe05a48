//! Logical dataflow graphs built from recorded tool calls and network flows.
//!
//! A [`FlowGraph`] is recreated wholesale on every build; nothing in it is
//! long-lived. Positions that must survive refreshes live in
//! [`crate::sim::SimState`].

mod build;
mod cache;
mod classify;

use std::collections::BTreeMap;
use std::fmt;

use eframe::egui::{Vec2, vec2};

use crate::events::CallStatus;

pub use build::{BuildOptions, build, build_with};
pub use cache::BuildCache;
pub use classify::{classify_host, classify_tool, is_internal_host};

pub const PROXY_ID: &str = "proxy";
pub const FIREWALL_ID: &str = "firewall";
pub const INTERNET_ID: &str = "internet";
/// Egress sink of the network domain; kept apart from the agent one.
pub const WAN_ID: &str = "wan";
pub const POLICY_ID: &str = "policy";
pub const AUDIT_ID: &str = "audit";
pub const GATE_ID: &str = "gate";

pub const MAX_RECENT_SAMPLES: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Proxy,
    Service,
    Datastore,
    SecurityGate,
    ExternalEndpoint,
    Agent,
    ObservabilitySink,
    PolicyRegistry,
    SourceHost,
    Firewall,
    AiProvider,
    ExternalService,
}

impl NodeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Proxy => "proxy",
            Self::Service => "service",
            Self::Datastore => "datastore",
            Self::SecurityGate => "security gate",
            Self::ExternalEndpoint => "external endpoint",
            Self::Agent => "agent",
            Self::ObservabilitySink => "observability sink",
            Self::PolicyRegistry => "policy registry",
            Self::SourceHost => "source host",
            Self::Firewall => "firewall",
            Self::AiProvider => "AI provider",
            Self::ExternalService => "external service",
        }
    }

    /// Footprint (width, height) in simulation units.
    pub fn footprint(self) -> Vec2 {
        match self {
            Self::Proxy | Self::Firewall => vec2(150.0, 56.0),
            Self::Agent | Self::AiProvider | Self::ExternalEndpoint | Self::ExternalService => {
                vec2(140.0, 44.0)
            }
            Self::Service | Self::Datastore | Self::SourceHost => vec2(130.0, 44.0),
            Self::SecurityGate => vec2(120.0, 44.0),
            Self::ObservabilitySink | Self::PolicyRegistry => vec2(130.0, 40.0),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Health {
    #[default]
    Healthy,
    Warning,
    Critical,
}

impl Health {
    pub fn label(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{value:.0}")
            }
            Self::Number(value) => write!(f, "{value:.3}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<usize> for MetricValue {
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

impl From<u64> for MetricValue {
    fn from(value: u64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<String> for MetricValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LogicalNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    /// Top-left seed position in simulation space.
    pub anchor: Option<Vec2>,
    pub pinned: bool,
    pub health: Health,
    pub metrics: BTreeMap<String, MetricValue>,
    pub classification: Option<String>,
    pub size: Vec2,
}

impl LogicalNode {
    pub fn new(id: impl Into<String>, kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            anchor: None,
            pinned: false,
            health: Health::Healthy,
            metrics: BTreeMap::new(),
            classification: None,
            size: kind.footprint(),
        }
    }

    pub fn with_anchor(mut self, anchor: Vec2) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn pinned_at(mut self, anchor: Vec2) -> Self {
        self.anchor = Some(anchor);
        self.pinned = true;
        self
    }

    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).and_then(MetricValue::as_f64)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    ToolCall,
    Egress,
    Authz,
    PolicyPush,
    Events,
    Audit,
}

impl EdgeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::ToolCall => "tool_call",
            Self::Egress => "egress",
            Self::Authz => "authz",
            Self::PolicyPush => "policy_push",
            Self::Events => "events",
            Self::Audit => "audit",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EdgeOutcome {
    #[default]
    Ok,
    Error,
    Escalated,
    Blocked,
}

impl EdgeOutcome {
    pub const ALL: [Self; 4] = [Self::Ok, Self::Error, Self::Escalated, Self::Blocked];

    pub fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
            Self::Escalated => "escalated",
            Self::Blocked => "blocked",
        }
    }

    /// Most severe status in a group decides the edge outcome.
    pub fn from_statuses(statuses: impl IntoIterator<Item = CallStatus>) -> Self {
        statuses
            .into_iter()
            .map(|status| match status {
                CallStatus::Blocked => Self::Blocked,
                CallStatus::Escalated => Self::Escalated,
                CallStatus::Error => Self::Error,
                CallStatus::Ok | CallStatus::Pending | CallStatus::Unknown => Self::Ok,
            })
            .max()
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeSample {
    pub timestamp_ms: Option<i64>,
    pub status: CallStatus,
    pub duration_ms: Option<f64>,
    pub bytes: Option<u64>,
    pub detail: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub id: String,
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
    pub volume_per_hour: f64,
    pub bytes_per_hour: Option<f64>,
    pub outcome: EdgeOutcome,
    pub protocol: Option<String>,
    pub recent_samples: Vec<EdgeSample>,
}

impl Edge {
    pub fn new(from: &str, to: &str, kind: EdgeKind) -> Self {
        Self {
            id: format!("{from}->{to}:{}", kind.label()),
            from: from.to_owned(),
            to: to.to_owned(),
            kind,
            volume_per_hour: 0.0,
            bytes_per_hour: None,
            outcome: EdgeOutcome::Ok,
            protocol: None,
            recent_samples: Vec::new(),
        }
    }

    pub fn touches(&self, id: &str) -> bool {
        self.from == id || self.to == id
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlowGraph {
    pub nodes: Vec<LogicalNode>,
    pub edges: Vec<Edge>,
}

impl FlowGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&LogicalNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.id == id)
    }

    pub fn edges_touching<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.touches(id))
    }
}
