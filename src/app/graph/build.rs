use tracing::debug;

use mcp_flowgraph::events::{Domain, EventLog, TimeWindow};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn current_window(&self) -> TimeWindow {
        self.preset
            .window(self.base_window, self.log.newest_timestamp_ms())
    }

    pub(in crate::app) fn set_domain(&mut self, domain: Domain) {
        if self.domain == domain {
            return;
        }
        self.domain = domain;
        self.refresh_events();
    }

    /// Swaps in a freshly loaded export while keeping the engine, so nodes
    /// present before and after the reload stay where they are.
    pub(in crate::app) fn replace_log(&mut self, log: EventLog, pinned_domain: Option<Domain>) {
        self.domain = pinned_domain.unwrap_or(log.domain);
        self.log = log;
        self.refresh_events();
    }

    pub(in crate::app) fn refresh_events(&mut self) {
        let domain = self.domain;
        self.events = self
            .log
            .events
            .iter()
            .filter(|event| event.domain() == domain)
            .cloned()
            .collect();
        self.events_revision += 1;
        self.graph_dirty = true;
    }

    pub(in crate::app) fn rebuild_graph(&mut self) {
        let window = self.current_window();
        let (graph, rebuilt) = self.build_cache.get_or_build(
            self.events_revision,
            &self.events,
            window,
            &self.options,
        );
        self.graph_dirty = false;
        if !rebuilt {
            return;
        }

        let report = self.engine.set_graph(graph);
        debug!(
            domain = self.domain.label(),
            events = self.events.len(),
            nodes = self.engine.graph().nodes.len(),
            added = report.added,
            evicted = report.evicted,
            "graph rebuilt"
        );
    }
}
