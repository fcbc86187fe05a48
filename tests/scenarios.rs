use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::egui::{Rect, pos2, vec2};

use mcp_flowgraph::LayoutConfig;
use mcp_flowgraph::engine::FlowEngine;
use mcp_flowgraph::events::{
    CallStatus, FlowEvent, NetworkFlowEvent, TimeWindow, ToolCallEvent, load_event_log,
};
use mcp_flowgraph::graph::{FIREWALL_ID, LogicalNode, NodeKind, PROXY_ID, build};
use mcp_flowgraph::sim::{FrameObserver, FrameTick, LoopState, SimState, reconcile};
use mcp_flowgraph::util::p95;

const MINUTE: i64 = 60_000;
const T0: i64 = 1_735_689_600_000;

fn call(tool: &str, minute: i64, duration_ms: f64, status: CallStatus) -> FlowEvent {
    FlowEvent::ToolCall(ToolCallEvent {
        id: None,
        session_id: Some("s1".to_owned()),
        tool_name: tool.to_owned(),
        timestamp_ms: Some(T0 + minute * MINUTE),
        duration_ms: Some(duration_ms),
        status,
    })
}

fn search_events() -> Vec<FlowEvent> {
    vec![
        call("search", 0, 100.0, CallStatus::Ok),
        call("search", 30, 200.0, CallStatus::Ok),
        call("search", 60, 300.0, CallStatus::Ok),
    ]
}

#[test]
fn scenario_a_aggregates_a_single_tool() {
    let graph = build(&search_events(), TimeWindow::UNBOUNDED);

    let search = graph.node("search").expect("search node");
    assert_eq!(search.metric("calls"), Some(3.0));
    // Index floor(0.95 * (3 - 1)) = 1 of [100, 200, 300].
    assert_eq!(search.metric("p95_ms"), Some(200.0));
    assert_eq!(search.metric("error_rate"), Some(0.0));

    let edges = graph
        .edges
        .iter()
        .filter(|edge| edge.from == PROXY_ID && edge.to == "search")
        .collect::<Vec<_>>();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].volume_per_hour, 3.0);
}

#[test]
fn scenario_b_window_start_excludes_earlier_events() {
    let window = TimeWindow::since(T0 + 31 * MINUTE);
    let graph = build(&search_events(), window);
    let search = graph.node("search").expect("search node");
    assert_eq!(search.metric("calls"), Some(1.0));
}

#[test]
fn scenario_c_reintroduced_nodes_hit_the_position_cache() {
    let mut state = SimState::new(&LayoutConfig::default());
    let a = LogicalNode::new("A", NodeKind::Service, "A").with_anchor(vec2(400.0, 300.0));
    let b = LogicalNode::new("B", NodeKind::Service, "B").with_anchor(vec2(600.0, 300.0));

    reconcile(&mut state, &[a.clone(), b.clone()]);
    if let Some(node) = state.get_mut("A") {
        node.pos = vec2(100.0, 100.0);
    }

    reconcile(&mut state, std::slice::from_ref(&b));
    assert!(state.get("A").is_none());

    reconcile(&mut state, &[a, b]);
    assert_eq!(state.get("A").map(|node| node.pos), Some(vec2(100.0, 100.0)));
}

#[test]
fn volume_per_hour_uses_the_event_span() {
    let events = (0..10)
        .map(|index| call("search", index * 120 / 9, 10.0, CallStatus::Ok))
        .collect::<Vec<_>>();
    let graph = build(&events, TimeWindow::UNBOUNDED);
    let edge = graph
        .edges
        .iter()
        .find(|edge| edge.to == "search")
        .expect("hub edge");
    assert!((edge.volume_per_hour - 5.0).abs() < 1e-9);

    let empty = build(&[], TimeWindow::UNBOUNDED);
    assert!(empty.nodes.is_empty());
    assert!(empty.edges.is_empty());

    let outside = build(&events, TimeWindow::since(T0 + 10_000 * MINUTE));
    assert!(outside.is_empty());
}

#[test]
fn p95_uses_the_lower_nearest_rank() {
    assert_eq!(p95(&[10.0, 20.0, 30.0, 40.0, 50.0]), Some(40.0));
    assert_eq!(p95(&[50.0, 10.0, 40.0, 30.0, 20.0]), Some(40.0));
    assert_eq!(p95(&[]), None);
}

#[test]
fn network_flows_build_around_the_firewall() {
    let flow = |dst: &str, bytes: u64| {
        FlowEvent::NetworkFlow(NetworkFlowEvent {
            src_host: "laptop".to_owned(),
            dst_host: dst.to_owned(),
            dst_port: Some(443),
            protocol: Some("https".to_owned()),
            bytes: Some(bytes),
            timestamp_ms: Some(T0),
            duration_ms: Some(20.0),
            status: CallStatus::Ok,
        })
    };
    let graph = build(
        &[flow("api.openai.com", 1_000), flow("db.internal", 500)],
        TimeWindow::UNBOUNDED,
    );

    let firewall = graph.node(FIREWALL_ID).expect("firewall hub");
    assert!(firewall.pinned);
    assert_eq!(
        graph
            .edges
            .iter()
            .filter(|edge| edge.from == FIREWALL_ID)
            .count(),
        2
    );
}

#[derive(Default)]
struct CountFrames(usize);

impl FrameObserver for CountFrames {
    fn on_frame(&mut self, _tick: &FrameTick) {
        self.0 += 1;
    }
}

#[test]
fn engine_keeps_positions_across_refreshes() {
    let mut engine = FlowEngine::new(LayoutConfig::default());
    engine.set_container(Rect::from_min_size(pos2(0.0, 0.0), vec2(1280.0, 720.0)));
    engine.set_graph(Arc::new(build(&search_events(), TimeWindow::UNBOUNDED)));

    let start = Instant::now();
    let mut frames = CountFrames::default();
    for frame in 0..60u64 {
        engine.tick(start + Duration::from_millis(frame * 16), &mut frames);
    }
    assert_eq!(frames.0, 60);
    let settled = engine.state().get("search").map(|node| node.pos);

    let mut more = search_events();
    more.push(call("fetch_url", 45, 80.0, CallStatus::Blocked));
    let report = engine.set_graph(Arc::new(build(&more, TimeWindow::UNBOUNDED)));
    assert!(report.added >= 2);
    assert_eq!(engine.state().get("search").map(|node| node.pos), settled);

    let scene = engine.scene();
    assert_eq!(scene.nodes.len(), engine.graph().nodes.len());
    let view = engine.container();
    for node in &scene.nodes {
        assert!(view.expand(1.0).contains_rect(node.rect), "{} is off screen", node.id);
    }

    engine.set_graph(Arc::new(build(&[], TimeWindow::UNBOUNDED)));
    assert_eq!(engine.loop_state(), LoopState::Stopped);
}

#[test]
fn loads_a_session_export_from_disk() {
    let path = std::env::temp_dir().join(format!("mcp-flowgraph-{}.json", std::process::id()));
    fs::write(
        &path,
        r#"[{"session_id": "s1", "tool_calls": [
            {"id": "1", "tool_name": "search", "timestamp": "2025-01-01T00:00:00", "duration_ms": 100, "status": "ok"},
            {"id": "2", "tool_name": "search", "timestamp": "2025-01-01T00:30:00", "duration_ms": 200, "status": "error"}
        ]}]"#,
    )
    .expect("write fixture");

    let log = load_event_log(&path).expect("export loads");
    let _ = fs::remove_file(&path);
    assert_eq!(log.events.len(), 2);

    let graph = build(&log.events, TimeWindow::UNBOUNDED);
    let search = graph.node("search").expect("search node");
    assert_eq!(search.metric("error_rate"), Some(0.5));
    assert!(graph.node(PROXY_ID).is_some_and(|hub| hub.pinned));

    let missing = std::env::temp_dir().join("mcp-flowgraph-does-not-exist.json");
    assert!(load_event_log(&missing).is_err());
}
