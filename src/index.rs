//! Issue index bootstrap.
//!
//! Pages through the tracker's search endpoint for the configured JQL scope
//! and builds the in-memory [`IssueIndex`] the collector traverses: one
//! record per issue plus a parent→children map in returned order. With a
//! rank-ordered JQL (`ORDER BY rank`), children end up in board order.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::config::TrackerConfig;
use crate::fetcher::TrackerCredentials;
use crate::models::{IssueIndex, IssueRecord};

/// Fields requested from the search endpoint. Bodies, attachments, and
/// links are fetched per node later; the index only needs structure.
const SEARCH_FIELDS: &str = "summary,issuetype,status,updated,parent";

/// Build the issue index by paging `/rest/api/2/search` until `total`
/// records have been retrieved.
pub async fn build_index(
    config: &TrackerConfig,
    creds: &TrackerCredentials,
) -> Result<IssueIndex> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    let url = format!("{}/rest/api/2/search", config.host());
    let mut index = IssueIndex::new();
    let mut start_at: usize = 0;

    loop {
        let resp = client
            .get(&url)
            .basic_auth(&creds.email, Some(&creds.api_token))
            .header("Accept", "application/json")
            .query(&[
                ("jql", config.jql.as_str()),
                ("startAt", &start_at.to_string()),
                ("maxResults", &config.page_size.to_string()),
                ("fields", SEARCH_FIELDS),
            ])
            .send()
            .await
            .with_context(|| format!("Search request failed: {}", url))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!(
                "Issue search failed (HTTP {}): {}",
                status,
                body.chars().take(500).collect::<String>()
            );
        }

        let json: Value = resp.json().await.context("Failed to parse search response")?;
        let (records, total) = parse_search_page(&json);
        let page_len = records.len();

        for record in records {
            index.insert(record);
        }

        start_at += page_len;
        if page_len == 0 || start_at >= total {
            break;
        }
    }

    Ok(index)
}

/// Parse one search page into records plus the reported total.
pub fn parse_search_page(json: &Value) -> (Vec<IssueRecord>, usize) {
    let total = json["total"].as_u64().unwrap_or(0) as usize;

    let mut records = Vec::new();
    if let Some(issues) = json["issues"].as_array() {
        for issue in issues {
            let key = issue["key"].as_str().unwrap_or_default();
            if key.is_empty() {
                continue;
            }
            let fields = &issue["fields"];
            records.push(IssueRecord {
                key: key.to_string(),
                summary: fields["summary"].as_str().unwrap_or_default().to_string(),
                issue_type: fields["issuetype"]["name"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
                status: fields["status"]["name"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
                icon_url: fields["issuetype"]["iconUrl"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
                updated_at: parse_updated(fields["updated"].as_str()),
                parent_key: fields["parent"]["key"].as_str().map(String::from),
            });
        }
    }

    (records, total)
}

/// Parse Jira's timestamp format (`2024-01-15T10:30:00.000+0000`),
/// falling back to the epoch when absent or malformed.
fn parse_updated(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|s| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.3f%z").ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_page_builds_records() {
        let json = serde_json::json!({
            "startAt": 0,
            "maxResults": 50,
            "total": 2,
            "issues": [
                {
                    "key": "PROJ-1",
                    "fields": {
                        "summary": "Root epic",
                        "issuetype": { "name": "Epic", "iconUrl": "https://host/epic.svg" },
                        "status": { "name": "In Progress" },
                        "updated": "2024-01-15T10:30:00.000+0000"
                    }
                },
                {
                    "key": "PROJ-2",
                    "fields": {
                        "summary": "Child story",
                        "issuetype": { "name": "Story", "iconUrl": "https://host/story.svg" },
                        "status": { "name": "To Do" },
                        "updated": "not-a-date",
                        "parent": { "key": "PROJ-1" }
                    }
                }
            ]
        });

        let (records, total) = parse_search_page(&json);
        assert_eq!(total, 2);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key, "PROJ-1");
        assert_eq!(records[0].issue_type, "Epic");
        assert!(records[0].parent_key.is_none());
        assert_eq!(records[0].updated_at.timestamp(), 1705314600);
        assert_eq!(records[1].parent_key.as_deref(), Some("PROJ-1"));
        assert_eq!(records[1].updated_at, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_parse_search_page_children_order_preserved() {
        let json = serde_json::json!({
            "total": 3,
            "issues": [
                { "key": "P-1", "fields": {} },
                { "key": "P-3", "fields": { "parent": { "key": "P-1" } } },
                { "key": "P-2", "fields": { "parent": { "key": "P-1" } } }
            ]
        });
        let (records, _) = parse_search_page(&json);

        let mut index = IssueIndex::new();
        for r in records {
            index.insert(r);
        }
        // Returned order, not key order.
        assert_eq!(index.children_of("P-1"), ["P-3", "P-2"]);
    }

    #[test]
    fn test_parse_search_page_empty() {
        let json = serde_json::json!({ "total": 0, "issues": [] });
        let (records, total) = parse_search_page(&json);
        assert!(records.is_empty());
        assert_eq!(total, 0);
    }
}
