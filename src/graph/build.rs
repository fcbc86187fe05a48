use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{Vec2, vec2};
use tracing::debug;

use super::classify::{classify_host, classify_tool, tool_server};
use super::{
    AUDIT_ID, Edge, EdgeKind, EdgeOutcome, EdgeSample, FIREWALL_ID, FlowGraph, GATE_ID, Health,
    INTERNET_ID, LogicalNode, MAX_RECENT_SAMPLES, MetricValue, NodeKind, POLICY_ID, PROXY_ID, WAN_ID,
};
use crate::config::LayoutConfig;
use crate::events::{CallStatus, FlowEvent, NetworkFlowEvent, TimeWindow, ToolCallEvent};
use crate::util::{p95, short_tool_name};

const MS_PER_HOUR: f64 = 3_600_000.0;
const SLOW_P95_MS: f64 = 2_000.0;
const CRITICAL_ERROR_RATE: f64 = 0.25;
const EDGE_INSET: f32 = 24.0;
const RESERVED_IDS: [&str; 7] = [
    PROXY_ID,
    FIREWALL_ID,
    INTERNET_ID,
    WAN_ID,
    POLICY_ID,
    AUDIT_ID,
    GATE_ID,
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildOptions {
    pub base_width: f32,
    pub base_height: f32,
    /// Adds the policy registry, audit sink and security gate around the proxy.
    pub infrastructure: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            base_width: 1000.0,
            base_height: 520.0,
            infrastructure: true,
        }
    }
}

impl BuildOptions {
    pub fn from_layout(config: &LayoutConfig) -> Self {
        Self {
            base_width: config.base_width,
            base_height: config.base_height,
            ..Self::default()
        }
    }

    fn region(&self) -> Region {
        Region {
            min: Vec2::ZERO,
            size: vec2(self.base_width, self.base_height),
        }
    }

    /// Left half for the agent subgraph, right half for the network one.
    fn split_regions(&self) -> (Region, Region) {
        let size = vec2(self.base_width * 0.5, self.base_height);
        (
            Region {
                min: Vec2::ZERO,
                size,
            },
            Region {
                min: vec2(size.x, 0.0),
                size,
            },
        )
    }
}

/// The slice of simulation space one domain's subgraph is seeded in.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Region {
    min: Vec2,
    size: Vec2,
}

impl Region {
    fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }

    fn centered_at(&self, center: Vec2, size: Vec2) -> Vec2 {
        center - size * 0.5
    }

    fn ring_anchor(&self, index: usize, count: usize, size: Vec2) -> Vec2 {
        let angle = (index as f32 / count.max(1) as f32) * TAU - FRAC_PI_2;
        let radius = vec2(self.size.x * 0.34, self.size.y * 0.36);
        let center = self.center() + vec2(angle.cos() * radius.x, angle.sin() * radius.y);
        self.centered_at(center, size)
    }

    fn sink_anchor(&self, size: Vec2) -> Vec2 {
        vec2(
            self.min.x + self.size.x - EDGE_INSET - size.x,
            self.min.y + (self.size.y - size.y) * 0.5,
        )
    }
}

#[derive(Default)]
struct GroupStats {
    count: usize,
    errors: usize,
    blocked: usize,
    escalated: usize,
    durations: Vec<f64>,
    bytes: Option<u64>,
    statuses: Vec<CallStatus>,
    samples: Vec<EdgeSample>,
    ports: BTreeSet<u16>,
    protocols: BTreeSet<String>,
}

impl GroupStats {
    fn record(&mut self, sample: EdgeSample, duration_ms: Option<f64>) {
        self.count += 1;
        match sample.status {
            CallStatus::Error => self.errors += 1,
            CallStatus::Blocked => self.blocked += 1,
            CallStatus::Escalated => self.escalated += 1,
            CallStatus::Ok | CallStatus::Pending | CallStatus::Unknown => {}
        }
        if let Some(duration) = duration_ms {
            self.durations.push(duration);
        }
        if let Some(bytes) = sample.bytes {
            self.bytes = Some(self.bytes.unwrap_or(0).saturating_add(bytes));
        }
        self.statuses.push(sample.status);
        self.samples.push(sample);
    }

    fn error_rate(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.errors as f64 / self.count as f64
        }
    }

    fn p95(&self) -> Option<f64> {
        p95(&self.durations)
    }

    fn health(&self) -> Health {
        let error_rate = self.error_rate();
        if self.blocked > 0 || error_rate >= CRITICAL_ERROR_RATE {
            Health::Critical
        } else if error_rate > 0.0
            || self.escalated > 0
            || self.p95().is_some_and(|p95| p95 > SLOW_P95_MS)
        {
            Health::Warning
        } else {
            Health::Healthy
        }
    }

    fn outcome(&self) -> EdgeOutcome {
        EdgeOutcome::from_statuses(self.statuses.iter().copied())
    }

    fn recent_samples(&self) -> Vec<EdgeSample> {
        let mut samples = self.samples.clone();
        samples.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        samples.truncate(MAX_RECENT_SAMPLES);
        samples
    }

    fn common_metrics(&self, span_hours: f64) -> BTreeMap<String, MetricValue> {
        let mut metrics = BTreeMap::new();
        metrics.insert("errors".to_owned(), self.errors.into());
        metrics.insert("blocked".to_owned(), self.blocked.into());
        metrics.insert("escalated".to_owned(), self.escalated.into());
        metrics.insert("error_rate".to_owned(), self.error_rate().into());
        metrics.insert(
            "volume_per_hour".to_owned(),
            (self.count as f64 / span_hours).into(),
        );
        if let Some(p95) = self.p95() {
            metrics.insert("p95_ms".to_owned(), p95.into());
        }
        metrics
    }
}

/// Hours covered by the timed events, floored at one hour.
fn span_hours(timestamps: impl Iterator<Item = Option<i64>>) -> f64 {
    let (min, max) = timestamps
        .flatten()
        .fold((i64::MAX, i64::MIN), |(min, max), timestamp| {
            (min.min(timestamp), max.max(timestamp))
        });
    if min > max {
        return 1.0;
    }
    ((max - min) as f64 / MS_PER_HOUR).max(1.0)
}

pub fn build(events: &[FlowEvent], window: TimeWindow) -> FlowGraph {
    build_with(events, window, &BuildOptions::default())
}

pub fn build_with(events: &[FlowEvent], window: TimeWindow, options: &BuildOptions) -> FlowGraph {
    let mut calls = Vec::new();
    let mut flows = Vec::new();
    for event in events
        .iter()
        .filter(|event| window.contains(event.timestamp_ms()))
    {
        match event {
            FlowEvent::ToolCall(call) => calls.push(call),
            FlowEvent::NetworkFlow(flow) => flows.push(flow),
        }
    }

    let (agent_region, network_region) = if calls.is_empty() || flows.is_empty() {
        (options.region(), options.region())
    } else {
        options.split_regions()
    };

    let mut graph = FlowGraph::default();
    if !calls.is_empty() {
        merge_graph(&mut graph, build_agent_graph(&calls, options, agent_region));
    }
    if !flows.is_empty() {
        merge_graph(&mut graph, build_network_graph(&flows, network_region));
    }

    debug!(
        events = events.len(),
        tool_calls = calls.len(),
        flows = flows.len(),
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "built flow graph"
    );
    graph
}

fn merge_graph(into: &mut FlowGraph, other: FlowGraph) {
    let mut node_ids = into
        .nodes
        .iter()
        .map(|node| node.id.clone())
        .collect::<HashSet<_>>();
    for node in other.nodes {
        if node_ids.insert(node.id.clone()) {
            into.nodes.push(node);
        }
    }

    let mut edge_ids = into
        .edges
        .iter()
        .map(|edge| edge.id.clone())
        .collect::<HashSet<_>>();
    for edge in other.edges {
        if edge_ids.insert(edge.id.clone()) {
            into.edges.push(edge);
        }
    }
}

fn tool_node_id(name: &str) -> String {
    if RESERVED_IDS.contains(&name) {
        format!("tool:{name}")
    } else {
        name.to_owned()
    }
}

fn build_agent_graph(
    calls: &[&ToolCallEvent],
    options: &BuildOptions,
    region: Region,
) -> FlowGraph {
    let span = span_hours(calls.iter().map(|call| call.timestamp_ms));

    let mut groups: BTreeMap<&str, GroupStats> = BTreeMap::new();
    for call in calls {
        groups.entry(call.tool_name.as_str()).or_default().record(
            EdgeSample {
                timestamp_ms: call.timestamp_ms,
                status: call.status,
                duration_ms: call.duration_ms,
                bytes: None,
                detail: call.session_id.clone(),
            },
            call.duration_ms,
        );
    }

    let mut nodes = Vec::with_capacity(groups.len() + 5);
    let mut edges = Vec::with_capacity(groups.len() * 2 + 3);
    let mut worst = Health::Healthy;
    let mut errors = 0usize;
    let mut flagged = GroupStats::default();
    let mut needs_internet = false;

    let count = groups.len();
    for (index, (tool_name, stats)) in groups.iter().enumerate() {
        let (kind, egress) = classify_tool(tool_name);
        let id = tool_node_id(tool_name);
        let health = stats.health();
        worst = worst.max(health);
        errors += stats.errors;

        let mut node = LogicalNode::new(id.clone(), kind, short_tool_name(tool_name));
        node.anchor = Some(region.ring_anchor(index, count, node.size));
        node.health = health;
        node.classification = Some(tool_server(tool_name).to_owned());
        node.metrics = stats.common_metrics(span);
        node.metrics.insert("calls".to_owned(), stats.count.into());
        node.metrics
            .insert("server".to_owned(), tool_server(tool_name).into());
        nodes.push(node);

        let mut edge = Edge::new(PROXY_ID, &id, EdgeKind::ToolCall);
        edge.volume_per_hour = stats.count as f64 / span;
        edge.outcome = stats.outcome();
        edge.recent_samples = stats.recent_samples();

        if egress {
            needs_internet = true;
            let mut egress_edge = Edge::new(&id, INTERNET_ID, EdgeKind::Egress);
            egress_edge.volume_per_hour = edge.volume_per_hour;
            egress_edge.outcome = edge.outcome;
            egress_edge.recent_samples = edge.recent_samples.clone();
            edges.push(edge);
            edges.push(egress_edge);
        } else {
            edges.push(edge);
        }

        for sample in &stats.samples {
            if matches!(sample.status, CallStatus::Blocked | CallStatus::Escalated) {
                flagged.record(sample.clone(), sample.duration_ms);
            }
        }
    }

    let mut hub = LogicalNode::new(PROXY_ID, NodeKind::Proxy, "MCP proxy");
    let hub_anchor = region.centered_at(region.center(), hub.size);
    hub = hub.pinned_at(hub_anchor);
    hub.health = worst;
    hub.metrics.insert("calls".to_owned(), calls.len().into());
    hub.metrics.insert("tools".to_owned(), count.into());
    hub.metrics.insert(
        "error_rate".to_owned(),
        (errors as f64 / calls.len() as f64).into(),
    );
    hub.metrics.insert(
        "volume_per_hour".to_owned(),
        (calls.len() as f64 / span).into(),
    );
    nodes.insert(0, hub);

    if needs_internet {
        let mut sink = LogicalNode::new(INTERNET_ID, NodeKind::ExternalEndpoint, "internet");
        let anchor = region.sink_anchor(sink.size);
        sink = sink.pinned_at(anchor);
        sink.classification = Some("egress".to_owned());
        nodes.push(sink);
    }

    if options.infrastructure {
        add_infrastructure(&mut nodes, &mut edges, region, calls.len(), span, &flagged);
    }

    FlowGraph { nodes, edges }
}

fn add_infrastructure(
    nodes: &mut Vec<LogicalNode>,
    edges: &mut Vec<Edge>,
    region: Region,
    total_calls: usize,
    span: f64,
    flagged: &GroupStats,
) {
    let mut policy = LogicalNode::new(POLICY_ID, NodeKind::PolicyRegistry, "permissions");
    policy = policy.pinned_at(region.min + vec2(EDGE_INSET, EDGE_INSET));
    policy.classification = Some("policy".to_owned());
    nodes.push(policy);
    edges.push(Edge::new(POLICY_ID, PROXY_ID, EdgeKind::PolicyPush));

    let mut audit = LogicalNode::new(AUDIT_ID, NodeKind::ObservabilitySink, "audit log");
    let audit_size = audit.size;
    audit = audit.pinned_at(vec2(
        region.min.x + EDGE_INSET,
        region.min.y + region.size.y - EDGE_INSET - audit_size.y,
    ));
    audit
        .metrics
        .insert("events".to_owned(), total_calls.into());
    nodes.push(audit);
    let mut audit_edge = Edge::new(PROXY_ID, AUDIT_ID, EdgeKind::Audit);
    audit_edge.volume_per_hour = total_calls as f64 / span;
    edges.push(audit_edge);

    if flagged.count == 0 {
        return;
    }

    let mut gate = LogicalNode::new(GATE_ID, NodeKind::SecurityGate, "security gate");
    let gate_center = region.center() - vec2(0.0, region.size.y * 0.22);
    gate.anchor = Some(region.centered_at(gate_center, gate.size));
    gate.health = flagged.health();
    gate.metrics.insert("blocked".to_owned(), flagged.blocked.into());
    gate.metrics
        .insert("escalated".to_owned(), flagged.escalated.into());
    nodes.push(gate);

    let mut authz = Edge::new(PROXY_ID, GATE_ID, EdgeKind::Authz);
    authz.volume_per_hour = flagged.count as f64 / span;
    authz.outcome = flagged.outcome();
    authz.recent_samples = flagged.recent_samples();
    edges.push(authz);
}

fn build_network_graph(flows: &[&NetworkFlowEvent], region: Region) -> FlowGraph {
    let span = span_hours(flows.iter().map(|flow| flow.timestamp_ms));

    let mut groups: BTreeMap<(&str, &str), GroupStats> = BTreeMap::new();
    for flow in flows {
        let stats = groups
            .entry((flow.src_host.as_str(), flow.dst_host.as_str()))
            .or_default();
        stats.record(
            EdgeSample {
                timestamp_ms: flow.timestamp_ms,
                status: flow.status,
                duration_ms: flow.duration_ms,
                bytes: flow.bytes,
                detail: flow.dst_port.map(|port| format!("port {port}")),
            },
            flow.duration_ms,
        );
        if let Some(port) = flow.dst_port {
            stats.ports.insert(port);
        }
        if let Some(protocol) = &flow.protocol {
            stats.protocols.insert(protocol.to_ascii_lowercase());
        }
    }

    let mut nodes = Vec::with_capacity(groups.len() + 2);
    let mut edges = Vec::with_capacity(groups.len() * 2);
    let mut worst = Health::Healthy;
    let mut total_bytes = 0u64;
    let mut needs_internet = false;

    let count = groups.len();
    for (index, ((src, dst), stats)) in groups.iter().enumerate() {
        let kind = classify_host(dst);
        let external = matches!(kind, NodeKind::AiProvider | NodeKind::ExternalService);
        let id = format!("{src}->{dst}");
        let health = stats.health();
        worst = worst.max(health);
        total_bytes = total_bytes.saturating_add(stats.bytes.unwrap_or(0));

        let mut node = LogicalNode::new(id.clone(), kind, format!("{src} → {dst}"));
        node.anchor = Some(region.ring_anchor(index, count, node.size));
        node.health = health;
        node.classification = Some(if external { "external" } else { "internal" }.to_owned());
        node.metrics = stats.common_metrics(span);
        node.metrics.insert("flows".to_owned(), stats.count.into());
        node.metrics
            .insert("bytes".to_owned(), stats.bytes.unwrap_or(0).into());
        node.metrics
            .insert("ports".to_owned(), stats.ports.len().into());
        if !stats.protocols.is_empty() {
            node.metrics.insert(
                "protocols".to_owned(),
                stats
                    .protocols
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(",")
                    .into(),
            );
        }
        nodes.push(node);

        let kind = if external {
            EdgeKind::Egress
        } else {
            EdgeKind::Events
        };
        let mut edge = Edge::new(FIREWALL_ID, &id, kind);
        edge.volume_per_hour = stats.count as f64 / span;
        edge.bytes_per_hour = stats.bytes.map(|bytes| bytes as f64 / span);
        edge.outcome = stats.outcome();
        edge.protocol = stats.protocols.iter().next().cloned();
        edge.recent_samples = stats.recent_samples();

        if external {
            needs_internet = true;
            let mut egress = Edge::new(&id, WAN_ID, EdgeKind::Egress);
            egress.volume_per_hour = edge.volume_per_hour;
            egress.bytes_per_hour = edge.bytes_per_hour;
            egress.outcome = edge.outcome;
            egress.protocol = edge.protocol.clone();
            edges.push(edge);
            edges.push(egress);
        } else {
            edges.push(edge);
        }
    }

    let mut hub = LogicalNode::new(FIREWALL_ID, NodeKind::Firewall, "firewall");
    let hub_anchor = region.centered_at(region.center(), hub.size);
    hub = hub.pinned_at(hub_anchor);
    hub.health = worst;
    hub.metrics.insert("flows".to_owned(), flows.len().into());
    hub.metrics.insert("pairs".to_owned(), count.into());
    hub.metrics.insert("bytes".to_owned(), total_bytes.into());
    nodes.insert(0, hub);

    if needs_internet {
        let mut sink = LogicalNode::new(WAN_ID, NodeKind::ExternalService, "internet");
        let anchor = region.sink_anchor(sink.size);
        sink = sink.pinned_at(anchor);
        sink.classification = Some("egress".to_owned());
        nodes.push(sink);
    }

    FlowGraph { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: i64 = 60_000;
    const T0: i64 = 1_735_689_600_000;

    fn call(tool: &str, minute: i64, duration: f64, status: CallStatus) -> FlowEvent {
        FlowEvent::ToolCall(ToolCallEvent {
            id: None,
            session_id: Some("s1".to_owned()),
            tool_name: tool.to_owned(),
            timestamp_ms: Some(T0 + minute * MINUTE),
            duration_ms: Some(duration),
            status,
        })
    }

    fn flow(src: &str, dst: &str, minute: i64, bytes: u64, status: CallStatus) -> FlowEvent {
        FlowEvent::NetworkFlow(NetworkFlowEvent {
            src_host: src.to_owned(),
            dst_host: dst.to_owned(),
            dst_port: Some(443),
            protocol: Some("HTTPS".to_owned()),
            bytes: Some(bytes),
            timestamp_ms: Some(T0 + minute * MINUTE),
            duration_ms: None,
            status,
        })
    }

    fn bare() -> BuildOptions {
        BuildOptions {
            infrastructure: false,
            ..BuildOptions::default()
        }
    }

    #[test]
    fn zero_events_build_an_empty_graph() {
        let graph = build(&[], TimeWindow::UNBOUNDED);
        assert!(graph.nodes.is_empty());
        assert!(graph.edges.is_empty());

        let events = [call("search", 0, 10.0, CallStatus::Ok)];
        let graph = build(&events, TimeWindow::since(T0 + MINUTE));
        assert!(graph.is_empty());
    }

    #[test]
    fn volume_is_normalized_per_hour() {
        let mut events = (0..10)
            .map(|index| call("search", index * 12, 5.0, CallStatus::Ok))
            .collect::<Vec<_>>();
        events.push(call("other", 120, 5.0, CallStatus::Ok));

        let graph = build_with(&events, TimeWindow::UNBOUNDED, &bare());
        let edge = graph
            .edges
            .iter()
            .find(|edge| edge.to == "search")
            .expect("edge to search");
        assert!((edge.volume_per_hour - 5.0).abs() < 1e-9);
    }

    #[test]
    fn short_spans_are_floored_to_one_hour() {
        let events = [
            call("search", 0, 5.0, CallStatus::Ok),
            call("search", 1, 5.0, CallStatus::Ok),
        ];
        let graph = build_with(&events, TimeWindow::UNBOUNDED, &bare());
        assert_eq!(graph.edges[0].volume_per_hour, 2.0);
    }

    #[test]
    fn untimed_events_count_but_do_not_stretch_the_span() {
        let mut untimed = call("search", 0, 5.0, CallStatus::Error);
        if let FlowEvent::ToolCall(call) = &mut untimed {
            call.timestamp_ms = None;
        }
        let events = [call("search", 0, 5.0, CallStatus::Ok), untimed];

        let graph = build_with(&events, TimeWindow::since(T0), &bare());
        let node = graph.node("search").expect("search node");
        assert_eq!(node.metric("calls"), Some(2.0));
        assert_eq!(node.metric("error_rate"), Some(0.5));
        assert_eq!(node.health, Health::Critical);
    }

    #[test]
    fn missing_durations_leave_p95_absent() {
        let mut event = call("search", 0, 0.0, CallStatus::Ok);
        if let FlowEvent::ToolCall(call) = &mut event {
            call.duration_ms = None;
        }
        let graph = build_with(&[event], TimeWindow::UNBOUNDED, &bare());
        let node = graph.node("search").expect("search node");
        assert!(!node.metrics.contains_key("p95_ms"));
    }

    #[test]
    fn egress_tools_get_a_second_edge_to_the_internet_sink() {
        let events = [call("fetch_url", 0, 30.0, CallStatus::Ok)];
        let graph = build_with(&events, TimeWindow::UNBOUNDED, &bare());

        let sink = graph.node(INTERNET_ID).expect("internet sink");
        assert!(sink.pinned);
        assert!(
            graph
                .edges
                .iter()
                .any(|edge| edge.from == "fetch_url" && edge.to == INTERNET_ID)
        );
        assert_eq!(graph.edges.len(), 2);
    }

    #[test]
    fn hub_is_pinned_at_the_centre() {
        let events = [call("search", 0, 5.0, CallStatus::Ok)];
        let graph = build_with(&events, TimeWindow::UNBOUNDED, &bare());
        let hub = graph.node(PROXY_ID).expect("proxy hub");
        assert!(hub.pinned);
        let anchor = hub.anchor.expect("hub anchor");
        assert_eq!(anchor + hub.size * 0.5, vec2(500.0, 260.0));
    }

    #[test]
    fn flagged_calls_route_through_the_security_gate() {
        let events = [
            call("sqlite_delete", 0, 5.0, CallStatus::Blocked),
            call("filesystem_write", 1, 5.0, CallStatus::Escalated),
            call("filesystem_read", 2, 5.0, CallStatus::Ok),
        ];
        let graph = build(&events, TimeWindow::UNBOUNDED);

        let gate = graph.node(GATE_ID).expect("gate");
        assert_eq!(gate.metric("blocked"), Some(1.0));
        assert_eq!(gate.metric("escalated"), Some(1.0));
        let authz = graph
            .edges
            .iter()
            .find(|edge| edge.kind == EdgeKind::Authz)
            .expect("authz edge");
        assert_eq!(authz.outcome, EdgeOutcome::Blocked);
        assert!(graph.node(POLICY_ID).is_some_and(|node| node.pinned));
        assert!(graph.node(AUDIT_ID).is_some_and(|node| node.pinned));
    }

    #[test]
    fn tools_named_like_hubs_do_not_collide() {
        let events = [call("proxy", 0, 5.0, CallStatus::Ok)];
        let graph = build_with(&events, TimeWindow::UNBOUNDED, &bare());
        assert!(graph.node("tool:proxy").is_some());
        assert_eq!(
            graph.nodes.iter().filter(|node| node.id == PROXY_ID).count(),
            1
        );
    }

    #[test]
    fn recent_samples_are_bounded_and_newest_first() {
        let events = (0..10)
            .map(|minute| call("search", minute, 5.0, CallStatus::Ok))
            .collect::<Vec<_>>();
        let graph = build_with(&events, TimeWindow::UNBOUNDED, &bare());
        let samples = &graph.edges[0].recent_samples;
        assert_eq!(samples.len(), MAX_RECENT_SAMPLES);
        assert_eq!(samples[0].timestamp_ms, Some(T0 + 9 * MINUTE));
    }

    #[test]
    fn network_pairs_aggregate_bytes_and_route_external_traffic() {
        let events = [
            flow("laptop", "api.openai.com", 0, 1_000, CallStatus::Ok),
            flow("laptop", "api.openai.com", 120, 3_000, CallStatus::Blocked),
            flow("laptop", "10.0.0.5", 60, 500, CallStatus::Ok),
        ];
        let graph = build(&events, TimeWindow::UNBOUNDED);

        let pair = graph.node("laptop->api.openai.com").expect("pair node");
        assert_eq!(pair.kind, NodeKind::AiProvider);
        assert_eq!(pair.metric("bytes"), Some(4_000.0));
        assert_eq!(pair.metric("flows"), Some(2.0));
        assert_eq!(pair.health, Health::Critical);

        let hub_edge = graph
            .edges
            .iter()
            .find(|edge| edge.from == FIREWALL_ID && edge.to == pair.id)
            .expect("firewall edge");
        assert_eq!(hub_edge.kind, EdgeKind::Egress);
        assert_eq!(hub_edge.outcome, EdgeOutcome::Blocked);
        assert_eq!(hub_edge.bytes_per_hour, Some(2_000.0));
        assert_eq!(hub_edge.protocol.as_deref(), Some("https"));

        let internal = graph
            .edges
            .iter()
            .find(|edge| edge.to == "laptop->10.0.0.5")
            .expect("internal edge");
        assert_eq!(internal.kind, EdgeKind::Events);
        assert_eq!(
            graph
                .edges
                .iter()
                .filter(|edge| edge.to == WAN_ID)
                .count(),
            1
        );
        assert_eq!(graph.node(WAN_ID).map(|sink| sink.kind), Some(NodeKind::ExternalService));
    }

    #[test]
    fn mixed_domains_get_separate_halves_and_sinks() {
        let events = [
            call("fetch_url", 0, 30.0, CallStatus::Ok),
            flow("laptop", "api.openai.com", 0, 1_000, CallStatus::Ok),
        ];
        let graph = build(&events, TimeWindow::UNBOUNDED);

        let proxy = graph.node(PROXY_ID).expect("proxy hub");
        let firewall = graph.node(FIREWALL_ID).expect("firewall hub");
        let proxy_center = proxy.anchor.expect("proxy anchor") + proxy.size * 0.5;
        let firewall_center = firewall.anchor.expect("firewall anchor") + firewall.size * 0.5;
        assert_eq!(proxy_center, vec2(250.0, 260.0));
        assert_eq!(firewall_center, vec2(750.0, 260.0));

        let agent_sink = graph.node(INTERNET_ID).expect("agent sink");
        let network_sink = graph.node(WAN_ID).expect("network sink");
        assert_eq!(agent_sink.kind, NodeKind::ExternalEndpoint);
        assert_eq!(network_sink.kind, NodeKind::ExternalService);
        assert_ne!(agent_sink.anchor, network_sink.anchor);
        assert!(
            graph
                .edges
                .iter()
                .any(|edge| edge.from == "laptop->api.openai.com" && edge.to == WAN_ID)
        );

        for edge in &graph.edges {
            assert!(graph.node(&edge.from).is_some(), "{} has no source", edge.id);
            assert!(graph.node(&edge.to).is_some(), "{} has no target", edge.id);
        }
    }
}
