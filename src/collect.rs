//! Hierarchical collector.
//!
//! Flattens the issue tree below a root key into an ordered sequence of
//! [`FlatNode`]s by pre-order depth-first traversal: visit the node, then
//! its children in stored index order. Each node's fetch and resolution
//! complete before the next sibling or child is requested — fetch order is
//! exactly traversal order, with zero fetch parallelism.
//!
//! The index stays read-only throughout; every node owns its resolved body
//! and related keys. A visited set guards against cyclic parent/child data,
//! which trackers do occasionally serve.

use std::collections::HashSet;

use crate::fetcher::IssueFetcher;
use crate::models::{FetchedIssue, FlatNode, IssueIndex};
use crate::progress::{CompileProgressEvent, CompileProgressReporter};
use crate::resolve;

/// Collect the flattened pre-order sequence rooted at `root_key`.
///
/// A root key absent from the index yields an empty sequence — the caller
/// decides whether that is worth reporting. A fetch failure for one node
/// degrades that node's body to the placeholder and empties its attachment
/// and relation sets; its children are still traversed. Nothing here is
/// fatal.
pub async fn collect(
    root_key: &str,
    index: &IssueIndex,
    fetcher: &dyn IssueFetcher,
    base_host: &str,
    related_link_type: &str,
    progress: &dyn CompileProgressReporter,
) -> Vec<FlatNode> {
    let mut nodes = Vec::new();

    if !index.contains(root_key) {
        return nodes;
    }

    let mut visited: HashSet<String> = HashSet::new();
    // Explicit stack, pre-order: pop, visit, push children reversed so the
    // first stored child is fetched next.
    let mut stack: Vec<(String, usize)> = vec![(root_key.to_string(), 0)];

    while let Some((key, depth)) = stack.pop() {
        if !visited.insert(key.clone()) {
            eprintln!("Warning: cycle in hierarchy at {}, skipping revisit", key);
            continue;
        }

        let fetched = match fetcher.fetch(&key).await {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Warning: failed to fetch {}: {}", key, e);
                FetchedIssue::default()
            }
        };

        let body = resolve::resolve_body(&fetched.rendered_body, &fetched.attachments, base_host);
        let related = resolve::related_keys(&fetched.links, related_link_type);

        nodes.push(FlatNode {
            key: key.clone(),
            depth,
            number: String::new(),
            body,
            related,
        });

        progress.report(CompileProgressEvent::Visited {
            key: key.clone(),
            depth,
            n: nodes.len() as u64,
        });

        for child in index.children_of(&key).iter().rev() {
            stack.push((child.clone(), depth + 1));
        }
    }

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IssueLink, IssueRecord};
    use crate::progress::NoProgress;
    use crate::resolve::MISSING_BODY_PLACEHOLDER;
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;

    const HOST: &str = "https://jira.example.com";

    fn record(key: &str, parent: Option<&str>) -> IssueRecord {
        IssueRecord {
            key: key.to_string(),
            summary: format!("Summary of {}", key),
            issue_type: "Story".to_string(),
            status: "Open".to_string(),
            icon_url: String::new(),
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
            parent_key: parent.map(String::from),
        }
    }

    fn index_from(records: Vec<IssueRecord>) -> IssueIndex {
        let mut index = IssueIndex::new();
        for r in records {
            index.insert(r);
        }
        index
    }

    /// Stub fetcher: canned bodies per key, optional failure keys, records
    /// the order of fetch calls.
    struct StubFetcher {
        bodies: HashMap<String, String>,
        links: HashMap<String, Vec<IssueLink>>,
        fail: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl StubFetcher {
        fn new() -> Self {
            Self {
                bodies: HashMap::new(),
                links: HashMap::new(),
                fail: HashSet::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn with_body(mut self, key: &str, body: &str) -> Self {
            self.bodies.insert(key.to_string(), body.to_string());
            self
        }

        fn failing_on(mut self, key: &str) -> Self {
            self.fail.insert(key.to_string());
            self
        }
    }

    #[async_trait]
    impl IssueFetcher for StubFetcher {
        async fn fetch(&self, key: &str) -> Result<FetchedIssue> {
            self.calls.lock().unwrap().push(key.to_string());
            if self.fail.contains(key) {
                anyhow::bail!("stub failure for {}", key);
            }
            Ok(FetchedIssue {
                rendered_body: self
                    .bodies
                    .get(key)
                    .cloned()
                    .unwrap_or_else(|| format!("<p>{}</p>", key)),
                attachments: HashMap::new(),
                links: self.links.get(key).cloned().unwrap_or_default(),
            })
        }
    }

    fn scenario_a_index() -> IssueIndex {
        // R -> C1, C2; C1 -> C1a. Insertion order fixes child order.
        index_from(vec![
            record("R", None),
            record("C1", Some("R")),
            record("C1a", Some("C1")),
            record("C2", Some("R")),
        ])
    }

    #[tokio::test]
    async fn test_preorder_traversal_order_and_depth() {
        let index = scenario_a_index();
        let fetcher = StubFetcher::new();
        let nodes = collect("R", &index, &fetcher, HOST, "Relates", &NoProgress).await;

        let keys: Vec<&str> = nodes.iter().map(|n| n.key.as_str()).collect();
        assert_eq!(keys, vec!["R", "C1", "C1a", "C2"]);
        let depths: Vec<usize> = nodes.iter().map(|n| n.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 1]);
    }

    #[tokio::test]
    async fn test_fetch_order_is_traversal_order() {
        let index = scenario_a_index();
        let fetcher = StubFetcher::new();
        collect("R", &index, &fetcher, HOST, "Relates", &NoProgress).await;
        assert_eq!(
            *fetcher.calls.lock().unwrap(),
            vec!["R", "C1", "C1a", "C2"]
        );
    }

    #[tokio::test]
    async fn test_missing_root_yields_empty_sequence() {
        let index = scenario_a_index();
        let fetcher = StubFetcher::new();
        let nodes = collect("NOPE-1", &index, &fetcher, HOST, "Relates", &NoProgress).await;
        assert!(nodes.is_empty());
        assert!(fetcher.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_fetch_degrades_to_placeholder_children_still_visited() {
        // Scenario E: C1's fetch fails; C1a must still be rendered normally.
        let index = scenario_a_index();
        let fetcher = StubFetcher::new()
            .with_body("C1a", "<p>grandchild</p>")
            .failing_on("C1");
        let nodes = collect("R", &index, &fetcher, HOST, "Relates", &NoProgress).await;

        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[1].key, "C1");
        assert_eq!(nodes[1].body, MISSING_BODY_PLACEHOLDER);
        assert!(nodes[1].related.is_empty());
        assert_eq!(nodes[2].key, "C1a");
        assert_eq!(nodes[2].body, "<p>grandchild</p>");
    }

    #[tokio::test]
    async fn test_cycle_guard_terminates() {
        // A -> B -> A through a corrupted children map.
        let mut index = IssueIndex::new();
        index.insert(record("A", None));
        index.insert(record("B", Some("A")));
        // Close the loop: A claims to be B's child too.
        index.insert(IssueRecord {
            parent_key: Some("B".to_string()),
            ..record("A", None)
        });

        let fetcher = StubFetcher::new();
        let nodes = collect("A", &index, &fetcher, HOST, "Relates", &NoProgress).await;

        let keys: Vec<&str> = nodes.iter().map(|n| n.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_related_keys_carried_on_nodes() {
        let index = index_from(vec![record("R", None)]);
        let mut fetcher = StubFetcher::new();
        fetcher.links.insert(
            "R".to_string(),
            vec![
                IssueLink {
                    link_type: "Relates".to_string(),
                    inward_key: None,
                    outward_key: Some("EXT-7".to_string()),
                },
                IssueLink {
                    link_type: "Blocks".to_string(),
                    inward_key: None,
                    outward_key: Some("EXT-8".to_string()),
                },
            ],
        );
        let nodes = collect("R", &index, &fetcher, HOST, "relates", &NoProgress).await;
        assert_eq!(nodes[0].related, vec!["EXT-7"]);
    }
}
