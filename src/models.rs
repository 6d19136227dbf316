//! Core data models used throughout treedoc.
//!
//! These types represent the issue records, the flattened traversal nodes,
//! and the final report document that flow through the compile pipeline.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;

/// One issue as known to the index, before its body is fetched.
#[derive(Debug, Clone)]
pub struct IssueRecord {
    /// Issue key, e.g. `"PROJ-42"`.
    pub key: String,
    pub summary: String,
    /// Issue type name, e.g. `"Story"`, `"Epic"`.
    pub issue_type: String,
    pub status: String,
    /// Issue-type icon URL, used by the icon provider. May be empty.
    pub icon_url: String,
    pub updated_at: DateTime<Utc>,
    /// Parent issue key, if any. Roots have none.
    pub parent_key: Option<String>,
}

/// In-memory issue index: constant-time lookup by key plus an ordered
/// parent→children map. Populated once before compilation and read-only
/// during traversal.
#[derive(Debug, Clone, Default)]
pub struct IssueIndex {
    records: HashMap<String, IssueRecord>,
    children: HashMap<String, Vec<String>>,
}

impl IssueIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record and register it under its parent. Children keep the
    /// order in which they were inserted.
    pub fn insert(&mut self, record: IssueRecord) {
        if let Some(parent) = &record.parent_key {
            self.children
                .entry(parent.clone())
                .or_default()
                .push(record.key.clone());
        }
        self.records.insert(record.key.clone(), record);
    }

    pub fn get(&self, key: &str) -> Option<&IssueRecord> {
        self.records.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Children of `key` in stored order. Empty slice for leaves and
    /// unknown keys.
    pub fn children_of(&self, key: &str) -> &[String] {
        self.children.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// One raw typed link between two issues, as returned by the fetcher.
/// Exactly one of `inward_key` / `outward_key` is set, depending on the
/// link's direction as seen from the fetched issue.
#[derive(Debug, Clone)]
pub struct IssueLink {
    /// Relationship-type name, e.g. `"Relates"`, `"Blocks"`.
    pub link_type: String,
    pub inward_key: Option<String>,
    pub outward_key: Option<String>,
}

/// Per-issue payload returned by a successful fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchedIssue {
    /// Server-rendered description HTML. May be empty.
    pub rendered_body: String,
    /// Attachment filename → content URL.
    pub attachments: HashMap<String, String>,
    /// All typed links on the issue, unfiltered.
    pub links: Vec<IssueLink>,
}

/// One node of the flattened pre-order sequence. Owns its resolved body and
/// related keys; the issue index is never written back to.
#[derive(Debug, Clone)]
pub struct FlatNode {
    pub key: String,
    /// Traversal depth; the root is at 0.
    pub depth: usize,
    /// Dotted-decimal outline number, e.g. `"2.3.1"`. Assigned after
    /// collection; empty until then.
    pub number: String,
    /// Resolved description HTML (attachments rewritten, placeholder
    /// substituted on empty/failed fetch).
    pub body: String,
    /// Keys of issues related through the configured link type.
    pub related: Vec<String>,
}

/// The compiled artifact: the ordered node sequence, the emitted HTML, and
/// where it was (or would be) written.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub root_key: String,
    pub nodes: Vec<FlatNode>,
    pub html: String,
    pub path: PathBuf,
}
