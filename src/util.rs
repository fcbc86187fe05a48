use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    let mut value = bytes as f64;
    let mut unit = 0usize;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}

pub fn format_rate(per_hour: f64) -> String {
    if per_hour >= 100.0 {
        format!("{per_hour:.0}/h")
    } else if per_hour >= 10.0 {
        format!("{per_hour:.1}/h")
    } else {
        format!("{per_hour:.2}/h")
    }
}

/// Function name of a tracked agent step, named `agent.<fn>` or `agent_<fn>`.
pub fn agent_function(name: &str) -> Option<&str> {
    name.strip_prefix("agent.")
        .or_else(|| name.strip_prefix("agent_"))
        .filter(|rest| !rest.is_empty())
}

/// Tool names arrive as `server_tool` or `agent.fn`; the part after the first
/// separator is what the graph labels show.
pub fn short_tool_name(name: &str) -> &str {
    if let Some(rest) = agent_function(name) {
        return rest;
    }
    name.split_once('_').map(|(_, rest)| rest).unwrap_or(name)
}

/// Deterministic pseudo-random pair in `[-1, 1]` derived from an id.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

/// 95th percentile using the lower nearest-rank index `floor(0.95 * (n - 1))`.
pub fn p95(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let index = (0.95 * (sorted.len() - 1) as f64).floor() as usize;
    sorted.get(index).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p95_uses_floor_index() {
        assert_eq!(p95(&[10.0, 20.0, 30.0, 40.0, 50.0]), Some(40.0));
        assert_eq!(p95(&[50.0, 10.0, 40.0, 30.0, 20.0]), Some(40.0));
        assert_eq!(p95(&[7.0]), Some(7.0));
        assert_eq!(p95(&[]), None);
    }

    #[test]
    fn stable_pair_is_deterministic_and_bounded() {
        let first = stable_pair("search");
        assert_eq!(first, stable_pair("search"));
        assert!((-1.0..=1.0).contains(&first.0));
        assert!((-1.0..=1.0).contains(&first.1));
    }

    #[test]
    fn short_tool_name_strips_server_prefix() {
        assert_eq!(short_tool_name("filesystem_read_file"), "read_file");
        assert_eq!(short_tool_name("agent.search"), "search");
        assert_eq!(short_tool_name("agent_plan_trip"), "plan_trip");
        assert_eq!(short_tool_name("search"), "search");
    }

    #[test]
    fn format_bytes_scales_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KiB");
    }
}
