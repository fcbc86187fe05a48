use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::{CallStatus, Domain, FlowEvent, NetworkFlowEvent, ToolCallEvent, parse_timestamp};
use crate::error::{FlowGraphError, Result};

/// Numbers below this are epoch seconds (it is year 5138 in seconds).
const EPOCH_MS_THRESHOLD: f64 = 1e11;

#[derive(Clone, Debug)]
pub struct EventLog {
    pub domain: Domain,
    pub events: Vec<FlowEvent>,
    pub sessions: usize,
    pub skipped: usize,
}

#[derive(Clone, Debug, Deserialize)]
struct RawToolCall {
    #[serde(default)]
    id: Option<String>,
    #[serde(alias = "name")]
    tool_name: String,
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default)]
    duration_ms: Option<Value>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
struct RawFlow {
    #[serde(alias = "source", alias = "src")]
    src_host: String,
    #[serde(alias = "destination", alias = "dst")]
    dst_host: String,
    #[serde(default, alias = "port")]
    dst_port: Option<u16>,
    #[serde(default)]
    protocol: Option<String>,
    #[serde(default)]
    bytes: Option<u64>,
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default)]
    duration_ms: Option<Value>,
    #[serde(default, alias = "verdict")]
    status: Option<String>,
}

impl EventLog {
    pub fn newest_timestamp_ms(&self) -> Option<i64> {
        self.events.iter().filter_map(FlowEvent::timestamp_ms).max()
    }
}

pub fn load_event_log(path: &Path) -> Result<EventLog> {
    let raw = fs::read_to_string(path).map_err(|source| FlowGraphError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: Value = serde_json::from_str(&raw).map_err(|source| FlowGraphError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let log = parse_event_log(&parsed).map_err(|error| match error {
        FlowGraphError::UnrecognizedShape(reason) => FlowGraphError::UnrecognizedExport {
            path: path.to_path_buf(),
            reason,
        },
        other => other,
    })?;
    info!(
        path = %path.display(),
        domain = log.domain.label(),
        events = log.events.len(),
        sessions = log.sessions,
        skipped = log.skipped,
        "loaded event export"
    );
    Ok(log)
}

fn unrecognized(reason: &str) -> FlowGraphError {
    FlowGraphError::UnrecognizedShape(reason.to_owned())
}

/// Accepts a session list, `{"sessions": [...]}`, a single session, a bare
/// tool call list, `{"flows": [...]}` or a bare flow list.
pub fn parse_event_log(value: &Value) -> Result<EventLog> {
    match value {
        Value::Array(items) => parse_array(items),
        Value::Object(object) => {
            if let Some(sessions) = object.get("sessions") {
                let items = sessions
                    .as_array()
                    .ok_or_else(|| unrecognized("\"sessions\" is not an array"))?;
                return Ok(parse_sessions(items));
            }
            if let Some(flows) = object.get("flows") {
                let items = flows
                    .as_array()
                    .ok_or_else(|| unrecognized("\"flows\" is not an array"))?;
                return Ok(parse_flows(items));
            }
            if object.contains_key("tool_calls") {
                return Ok(parse_sessions(std::slice::from_ref(value)));
            }
            Err(unrecognized("expected \"sessions\", \"flows\" or \"tool_calls\""))
        }
        _ => Err(unrecognized("top-level JSON must be an array or an object")),
    }
}

fn parse_array(items: &[Value]) -> Result<EventLog> {
    let Some(first) = items.iter().find_map(Value::as_object) else {
        return if items.is_empty() {
            Ok(EventLog {
                domain: Domain::Agent,
                events: Vec::new(),
                sessions: 0,
                skipped: 0,
            })
        } else {
            Err(unrecognized("array entries are not objects"))
        };
    };

    if first.contains_key("tool_calls") {
        Ok(parse_sessions(items))
    } else if first.contains_key("tool_name") || first.contains_key("name") {
        let mut log = EventLog {
            domain: Domain::Agent,
            events: Vec::with_capacity(items.len()),
            sessions: 0,
            skipped: 0,
        };
        push_tool_calls(&mut log, None, items);
        Ok(log)
    } else if ["src_host", "source", "src"]
        .iter()
        .any(|key| first.contains_key(*key))
    {
        Ok(parse_flows(items))
    } else {
        Err(unrecognized("array entries are neither sessions, tool calls nor flows"))
    }
}

fn parse_sessions(items: &[Value]) -> EventLog {
    let mut log = EventLog {
        domain: Domain::Agent,
        events: Vec::new(),
        sessions: 0,
        skipped: 0,
    };

    for item in items {
        let Some(session) = item.as_object() else {
            warn!("skipping non-object session entry");
            log.skipped += 1;
            continue;
        };
        let session_id = session
            .get("session_id")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let calls = session
            .get("tool_calls")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        log.sessions += 1;
        push_tool_calls(&mut log, session_id.as_deref(), calls);
    }

    log
}

fn push_tool_calls(log: &mut EventLog, session_id: Option<&str>, calls: &[Value]) {
    for value in calls {
        let raw = match RawToolCall::deserialize(value) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(session = session_id.unwrap_or("-"), %error, "skipping malformed tool call");
                log.skipped += 1;
                continue;
            }
        };

        let timestamp_ms = timestamp_or_warn(raw.timestamp.as_ref());
        log.events.push(FlowEvent::ToolCall(ToolCallEvent {
            id: raw.id,
            session_id: session_id.map(str::to_owned),
            tool_name: raw.tool_name,
            timestamp_ms,
            duration_ms: duration_or_warn(raw.duration_ms.as_ref()),
            status: raw
                .status
                .as_deref()
                .map(CallStatus::parse)
                .unwrap_or_default(),
        }));
    }
}

fn parse_flows(items: &[Value]) -> EventLog {
    let mut log = EventLog {
        domain: Domain::Network,
        events: Vec::with_capacity(items.len()),
        sessions: 0,
        skipped: 0,
    };

    for value in items {
        let raw = match RawFlow::deserialize(value) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(%error, "skipping malformed flow record");
                log.skipped += 1;
                continue;
            }
        };

        let timestamp_ms = timestamp_or_warn(raw.timestamp.as_ref());
        log.events.push(FlowEvent::NetworkFlow(NetworkFlowEvent {
            src_host: raw.src_host,
            dst_host: raw.dst_host,
            dst_port: raw.dst_port,
            protocol: raw.protocol,
            bytes: raw.bytes,
            timestamp_ms,
            duration_ms: duration_or_warn(raw.duration_ms.as_ref()),
            status: raw
                .status
                .as_deref()
                .map(CallStatus::parse)
                .unwrap_or_default(),
        }));
    }

    log
}

/// Strings go through [`parse_timestamp`]; numbers are epoch seconds, or
/// epoch milliseconds once they are too large to be seconds.
fn timestamp_or_warn(raw: Option<&Value>) -> Option<i64> {
    let raw = raw?;
    let parsed = match raw {
        Value::Null => return None,
        Value::String(text) => parse_timestamp(text),
        Value::Number(number) => number.as_f64().and_then(epoch_to_ms),
        _ => None,
    };
    if parsed.is_none() {
        warn!(timestamp = %raw, "unparseable timestamp; event carries no time info");
    }
    parsed
}

fn epoch_to_ms(epoch: f64) -> Option<i64> {
    if !epoch.is_finite() {
        return None;
    }
    let millis = if epoch.abs() < EPOCH_MS_THRESHOLD {
        epoch * 1_000.0
    } else {
        epoch
    };
    Some(millis.round() as i64)
}

fn duration_or_warn(raw: Option<&Value>) -> Option<f64> {
    let raw = raw?;
    let parsed = match raw {
        Value::Null => return None,
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|duration| duration.is_finite());
    if parsed.is_none() {
        warn!(duration_ms = %raw, "unusable duration; event carries no latency");
    }
    parsed
}
