use crate::graph::{Edge, FlowGraph, LogicalNode};

#[derive(Clone, Debug, PartialEq)]
pub struct ConnectedEdge {
    pub edge: Edge,
    /// Label of the node on the other end.
    pub peer_label: String,
}

/// Everything the side panel shows for the selected node.
#[derive(Clone, Debug, PartialEq)]
pub struct DetailPayload {
    pub node: LogicalNode,
    pub incoming: Vec<ConnectedEdge>,
    pub outgoing: Vec<ConnectedEdge>,
}

impl DetailPayload {
    pub fn for_node(graph: &FlowGraph, id: &str) -> Option<Self> {
        let node = graph.node(id)?.clone();
        let peer = |peer_id: &str| {
            graph
                .node(peer_id)
                .map_or_else(|| peer_id.to_owned(), |peer| peer.label.clone())
        };

        let mut incoming = Vec::new();
        let mut outgoing = Vec::new();
        for edge in graph.edges_touching(id) {
            if edge.to == id {
                incoming.push(ConnectedEdge {
                    edge: edge.clone(),
                    peer_label: peer(&edge.from),
                });
            }
            if edge.from == id {
                outgoing.push(ConnectedEdge {
                    edge: edge.clone(),
                    peer_label: peer(&edge.to),
                });
            }
        }

        Some(Self {
            node,
            incoming,
            outgoing,
        })
    }

    pub fn total_volume_per_hour(&self) -> f64 {
        self.incoming
            .iter()
            .chain(&self.outgoing)
            .map(|connected| connected.edge.volume_per_hour)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeKind, NodeKind};

    #[test]
    fn payload_splits_edges_by_direction() {
        let mut inbound = Edge::new("proxy", "fetch", EdgeKind::ToolCall);
        inbound.volume_per_hour = 4.0;
        let mut outbound = Edge::new("fetch", "internet", EdgeKind::Egress);
        outbound.volume_per_hour = 2.0;
        let graph = FlowGraph {
            nodes: vec![
                LogicalNode::new("proxy", NodeKind::Proxy, "MCP proxy"),
                LogicalNode::new("fetch", NodeKind::ExternalEndpoint, "fetch"),
                LogicalNode::new("internet", NodeKind::ExternalService, "Internet"),
            ],
            edges: vec![inbound, outbound],
        };

        let payload = DetailPayload::for_node(&graph, "fetch").expect("fetch exists");
        assert_eq!(payload.incoming.len(), 1);
        assert_eq!(payload.incoming[0].peer_label, "MCP proxy");
        assert_eq!(payload.outgoing[0].peer_label, "Internet");
        assert_eq!(payload.total_volume_per_hour(), 6.0);
        assert!(DetailPayload::for_node(&graph, "missing").is_none());
    }
}
