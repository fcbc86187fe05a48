mod load;

use chrono::{DateTime, NaiveDateTime, Utc};

pub use load::{EventLog, load_event_log, parse_event_log};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Domain {
    Agent,
    Network,
}

impl Domain {
    pub fn label(self) -> &'static str {
        match self {
            Self::Agent => "agent dataflow",
            Self::Network => "network dataflow",
        }
    }
}

/// Outcome of a recorded call or flow, in the proxy's status vocabulary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CallStatus {
    Ok,
    Error,
    Blocked,
    /// Held for approval and then allowed through.
    Escalated,
    Pending,
    #[default]
    Unknown,
}

impl CallStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ok" | "success" | "allowed" | "allow" | "completed" => Self::Ok,
            "error" | "failed" | "failure" | "timeout" => Self::Error,
            "blocked" | "denied" | "deny" | "rejected" | "dropped" => Self::Blocked,
            "escalated" | "approved" | "approval_required" => Self::Escalated,
            "pending" | "running" | "in_progress" => Self::Pending,
            _ => Self::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
            Self::Blocked => "blocked",
            Self::Escalated => "escalated",
            Self::Pending => "pending",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ToolCallEvent {
    pub id: Option<String>,
    pub session_id: Option<String>,
    pub tool_name: String,
    /// Epoch milliseconds; `None` when the record carried no usable timestamp.
    pub timestamp_ms: Option<i64>,
    pub duration_ms: Option<f64>,
    pub status: CallStatus,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NetworkFlowEvent {
    pub src_host: String,
    pub dst_host: String,
    pub dst_port: Option<u16>,
    pub protocol: Option<String>,
    pub bytes: Option<u64>,
    pub timestamp_ms: Option<i64>,
    pub duration_ms: Option<f64>,
    pub status: CallStatus,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FlowEvent {
    ToolCall(ToolCallEvent),
    NetworkFlow(NetworkFlowEvent),
}

impl FlowEvent {
    pub fn domain(&self) -> Domain {
        match self {
            Self::ToolCall(_) => Domain::Agent,
            Self::NetworkFlow(_) => Domain::Network,
        }
    }

    pub fn timestamp_ms(&self) -> Option<i64> {
        match self {
            Self::ToolCall(call) => call.timestamp_ms,
            Self::NetworkFlow(flow) => flow.timestamp_ms,
        }
    }
}

/// Inclusive time window in epoch milliseconds. A missing bound is unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl TimeWindow {
    pub const UNBOUNDED: Self = Self {
        start: None,
        end: None,
    };

    pub fn since(start: i64) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// Events without time information are never provably outside a window.
    pub fn contains(&self, timestamp_ms: Option<i64>) -> bool {
        let Some(timestamp) = timestamp_ms else {
            return true;
        };
        self.start.is_none_or(|start| timestamp >= start)
            && self.end.is_none_or(|end| timestamp <= end)
    }
}

/// Relative windows offered by the dashboard, measured back from the newest
/// event rather than the wall clock so old exports stay viewable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WindowPreset {
    #[default]
    All,
    LastHour,
    LastDay,
    LastWeek,
}

impl WindowPreset {
    pub const ALL: [Self; 4] = [Self::All, Self::LastHour, Self::LastDay, Self::LastWeek];

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::LastHour => "1h",
            Self::LastDay => "24h",
            Self::LastWeek => "7d",
        }
    }

    fn span_ms(self) -> Option<i64> {
        match self {
            Self::All => None,
            Self::LastHour => Some(3_600_000),
            Self::LastDay => Some(24 * 3_600_000),
            Self::LastWeek => Some(7 * 24 * 3_600_000),
        }
    }

    /// Narrows `base` to this preset ending at `newest_ms`. The later of the
    /// two starts wins; `base.end` is kept.
    pub fn window(self, base: TimeWindow, newest_ms: Option<i64>) -> TimeWindow {
        let (Some(span), Some(newest)) = (self.span_ms(), newest_ms) else {
            return base;
        };
        let start = newest.saturating_sub(span);
        TimeWindow {
            start: Some(base.start.map_or(start, |existing| existing.max(start))),
            end: base.end,
        }
    }
}

/// Parses RFC 3339 timestamps and the naive ISO-8601 form the proxy writes
/// (`2025-01-01T12:00:00.123456`, read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.timestamp_millis());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc().timestamp_millis())
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}
