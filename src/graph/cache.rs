use std::sync::Arc;

use super::{BuildOptions, FlowGraph, build_with};
use crate::events::{FlowEvent, TimeWindow};

#[derive(Clone, Copy, Debug, PartialEq)]
struct BuildKey {
    revision: u64,
    window: TimeWindow,
    options: BuildOptions,
}

/// Memoizes the last build. Callers bump `revision` whenever the event slice
/// they pass is replaced.
#[derive(Default)]
pub struct BuildCache {
    key: Option<BuildKey>,
    graph: Arc<FlowGraph>,
}

impl BuildCache {
    /// Returns the graph for these inputs and whether it was rebuilt.
    pub fn get_or_build(
        &mut self,
        revision: u64,
        events: &[FlowEvent],
        window: TimeWindow,
        options: &BuildOptions,
    ) -> (Arc<FlowGraph>, bool) {
        let key = BuildKey {
            revision,
            window,
            options: *options,
        };
        if self.key == Some(key) {
            return (Arc::clone(&self.graph), false);
        }

        self.graph = Arc::new(build_with(events, window, options));
        self.key = Some(key);
        (Arc::clone(&self.graph), true)
    }
}
