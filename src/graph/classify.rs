use super::NodeKind;
use crate::util::agent_function;

const DATASTORE_HINTS: [&str; 8] = [
    "sqlite", "postgres", "mysql", "database", "db_", "redis", "query", "sql",
];

const EGRESS_HINTS: [&str; 10] = [
    "fetch", "http", "web", "browser", "slack", "email", "send", "webhook", "post_", "upload",
];

const AI_PROVIDER_HOSTS: [&str; 10] = [
    "openai.com",
    "anthropic.com",
    "generativelanguage.googleapis.com",
    "mistral.ai",
    "cohere.ai",
    "cohere.com",
    "groq.com",
    "huggingface.co",
    "together.xyz",
    "perplexity.ai",
];

/// Node kind and egress flag for a tool, from its name alone.
pub fn classify_tool(name: &str) -> (NodeKind, bool) {
    if agent_function(name).is_some() {
        return (NodeKind::Agent, false);
    }

    let lower = name.to_ascii_lowercase();
    if EGRESS_HINTS.iter().any(|hint| lower.contains(hint)) {
        (NodeKind::ExternalEndpoint, true)
    } else if DATASTORE_HINTS.iter().any(|hint| lower.contains(hint)) {
        (NodeKind::Datastore, false)
    } else {
        (NodeKind::Service, false)
    }
}

/// Server a tool belongs to: the `agent` namespace or the prefix before `_`.
pub(super) fn tool_server(name: &str) -> &str {
    if agent_function(name).is_some() {
        return "agent";
    }
    name.split_once('_').map(|(server, _)| server).unwrap_or(name)
}

pub fn is_internal_host(host: &str) -> bool {
    let host = host.trim().to_ascii_lowercase();
    let host = host.split(':').next().unwrap_or_default();

    if host.is_empty() || host == "localhost" || !host.contains('.') {
        return true;
    }
    if host.ends_with(".local") || host.ends_with(".internal") || host.ends_with(".lan") {
        return true;
    }

    let octets = host
        .split('.')
        .map(|part| part.parse::<u8>())
        .collect::<Result<Vec<_>, _>>();
    match octets.as_deref() {
        Ok([127, ..]) | Ok([10, ..]) | Ok([192, 168, ..]) => true,
        Ok([172, second, ..]) => (16..=31).contains(second),
        _ => false,
    }
}

/// Kind of the node representing traffic towards `dst_host`.
pub fn classify_host(dst_host: &str) -> NodeKind {
    let lower = dst_host.to_ascii_lowercase();
    if AI_PROVIDER_HOSTS
        .iter()
        .any(|provider| lower == *provider || lower.ends_with(&format!(".{provider}")))
    {
        NodeKind::AiProvider
    } else if is_internal_host(&lower) {
        NodeKind::SourceHost
    } else {
        NodeKind::ExternalService
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tools_classify_by_name() {
        assert_eq!(classify_tool("agent.plan"), (NodeKind::Agent, false));
        assert_eq!(
            classify_tool("sqlite_create_record"),
            (NodeKind::Datastore, false)
        );
        assert_eq!(
            classify_tool("fetch_url"),
            (NodeKind::ExternalEndpoint, true)
        );
        assert_eq!(
            classify_tool("filesystem_read_file"),
            (NodeKind::Service, false)
        );
        assert_eq!(tool_server("filesystem_read_file"), "filesystem");
        assert_eq!(tool_server("agent.plan"), "agent");
    }

    #[test]
    fn tracked_agent_functions_accept_both_prefixes() {
        assert_eq!(classify_tool("agent_fetch_docs"), (NodeKind::Agent, false));
        assert_eq!(tool_server("agent_fetch_docs"), "agent");
        assert_eq!(classify_tool("agent_"), (NodeKind::Service, false));
    }

    #[test]
    fn hosts_classify_by_network() {
        assert!(is_internal_host("10.0.0.4"));
        assert!(is_internal_host("172.20.1.1"));
        assert!(!is_internal_host("172.40.1.1"));
        assert!(is_internal_host("db.internal"));
        assert!(is_internal_host("laptop"));
        assert_eq!(classify_host("api.openai.com"), NodeKind::AiProvider);
        assert_eq!(classify_host("api.anthropic.com"), NodeKind::AiProvider);
        assert_eq!(classify_host("github.com"), NodeKind::ExternalService);
        assert_eq!(classify_host("192.168.1.20"), NodeKind::SourceHost);
    }
}
