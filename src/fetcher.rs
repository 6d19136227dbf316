//! Remote issue fetching against the tracker's REST API.
//!
//! Defines the [`IssueFetcher`] and [`IconProvider`] seams the compile
//! pipeline consumes, plus their Jira implementations. A fetch returns the
//! server-rendered description HTML, the attachment filename→URL map, and
//! the issue's typed links; any failure is treated as "no data" by the
//! collector — logged, never retried.
//!
//! # Authentication
//!
//! Credentials are read from environment variables:
//! - `JIRA_EMAIL` — required
//! - `JIRA_API_TOKEN` — required
//!
//! Both are sent as HTTP basic auth on every request.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::config::TrackerConfig;
use crate::models::{FetchedIssue, IssueLink};

/// Fetches one issue's rendered body, attachments, and typed links.
///
/// The collector calls this once per visited node, strictly sequentially:
/// each fetch completes before the next sibling or child is requested.
#[async_trait]
pub trait IssueFetcher: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<FetchedIssue>;
}

/// Supplies an optional icon image for an issue key. Absence is not an
/// error — the report section simply renders without an icon.
#[async_trait]
pub trait IconProvider: Send + Sync {
    async fn icon(&self, key: &str) -> Option<Vec<u8>>;
}

/// Tracker credentials loaded from environment variables.
#[derive(Clone)]
pub struct TrackerCredentials {
    pub email: String,
    pub api_token: String,
}

impl TrackerCredentials {
    /// Load credentials from `JIRA_EMAIL` and `JIRA_API_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let email =
            std::env::var("JIRA_EMAIL").context("JIRA_EMAIL environment variable not set")?;
        let api_token = std::env::var("JIRA_API_TOKEN")
            .context("JIRA_API_TOKEN environment variable not set")?;
        Ok(Self { email, api_token })
    }
}

/// [`IssueFetcher`] backed by the Jira REST API (`/rest/api/2/issue`).
pub struct JiraFetcher {
    client: reqwest::Client,
    host: String,
    creds: TrackerCredentials,
}

impl JiraFetcher {
    pub fn new(config: &TrackerConfig, creds: TrackerCredentials) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            host: config.host().to_string(),
            creds,
        })
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let resp = self
            .client
            .get(url)
            .basic_auth(&self.creds.email, Some(&self.creds.api_token))
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Request failed: {}", url))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!(
                "Tracker request failed (HTTP {}): {}",
                status,
                body.chars().take(500).collect::<String>()
            );
        }

        resp.json().await.context("Failed to parse JSON response")
    }
}

#[async_trait]
impl IssueFetcher for JiraFetcher {
    async fn fetch(&self, key: &str) -> Result<FetchedIssue> {
        let url = format!(
            "{}/rest/api/2/issue/{}?expand=renderedFields&fields=description,attachment,issuelinks",
            self.host, key
        );
        let json = self.get_json(&url).await?;
        Ok(parse_issue_response(&json))
    }
}

/// Parse a Jira issue response into a [`FetchedIssue`].
///
/// Missing or null fields degrade to empty values rather than erroring:
/// a ticket without attachments or links is perfectly normal.
pub fn parse_issue_response(json: &Value) -> FetchedIssue {
    let rendered_body = json["renderedFields"]["description"]
        .as_str()
        .unwrap_or_default()
        .to_string();

    let mut attachments = HashMap::new();
    if let Some(list) = json["fields"]["attachment"].as_array() {
        for att in list {
            let filename = att["filename"].as_str().unwrap_or_default();
            let content = att["content"].as_str().unwrap_or_default();
            if !filename.is_empty() && !content.is_empty() {
                attachments.insert(filename.to_string(), content.to_string());
            }
        }
    }

    let mut links = Vec::new();
    if let Some(list) = json["fields"]["issuelinks"].as_array() {
        for link in list {
            let link_type = link["type"]["name"].as_str().unwrap_or_default();
            if link_type.is_empty() {
                continue;
            }
            links.push(IssueLink {
                link_type: link_type.to_string(),
                inward_key: link["inwardIssue"]["key"].as_str().map(String::from),
                outward_key: link["outwardIssue"]["key"].as_str().map(String::from),
            });
        }
    }

    FetchedIssue {
        rendered_body,
        attachments,
        links,
    }
}

/// Verify tracker connectivity and credentials. Returns a short
/// human-readable server description on success.
pub async fn check_connection(config: &TrackerConfig, creds: &TrackerCredentials) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    let url = format!("{}/rest/api/2/serverInfo", config.host());
    let resp = client
        .get(&url)
        .basic_auth(&creds.email, Some(&creds.api_token))
        .header("Accept", "application/json")
        .send()
        .await
        .with_context(|| format!("Request failed: {}", url))?;

    if !resp.status().is_success() {
        bail!("Tracker returned HTTP {} for {}", resp.status(), url);
    }

    let info: Value = resp.json().await.context("Failed to parse serverInfo")?;
    let title = info["serverTitle"].as_str().unwrap_or("unknown");
    let version = info["version"].as_str().unwrap_or("unknown");
    Ok(format!("{} ({})", title, version))
}

/// [`IconProvider`] that downloads issue-type icons and caches them per URL
/// so repeated types are fetched once per run.
pub struct JiraIconProvider {
    client: reqwest::Client,
    creds: TrackerCredentials,
    /// Issue key → icon URL, taken from the index records.
    icon_urls: HashMap<String, String>,
    cache: Mutex<HashMap<String, Option<Vec<u8>>>>,
}

impl JiraIconProvider {
    pub fn new(
        config: &TrackerConfig,
        creds: TrackerCredentials,
        icon_urls: HashMap<String, String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            creds,
            icon_urls,
            cache: Mutex::new(HashMap::new()),
        })
    }

    async fn download(&self, url: &str) -> Option<Vec<u8>> {
        let resp = self
            .client
            .get(url)
            .basic_auth(&self.creds.email, Some(&self.creds.api_token))
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }
        resp.bytes().await.ok().map(|b| b.to_vec())
    }
}

#[async_trait]
impl IconProvider for JiraIconProvider {
    async fn icon(&self, key: &str) -> Option<Vec<u8>> {
        let url = self.icon_urls.get(key)?.clone();
        if url.is_empty() {
            return None;
        }

        if let Some(cached) = self.cache.lock().ok()?.get(&url) {
            return cached.clone();
        }

        let bytes = self.download(&url).await;
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(url, bytes.clone());
        }
        bytes
    }
}

/// [`IconProvider`] that never supplies an icon. Used by `--dry-run` and in
/// tests.
pub struct NoIcons;

#[async_trait]
impl IconProvider for NoIcons {
    async fn icon(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_issue_response() {
        let json = serde_json::json!({
            "key": "PROJ-1",
            "renderedFields": { "description": "<p>Hello</p>" },
            "fields": {
                "attachment": [
                    { "filename": "diagram.png", "content": "https://host/secure/att/123" },
                    { "filename": "", "content": "https://host/secure/att/999" }
                ],
                "issuelinks": [
                    { "type": { "name": "Relates" }, "outwardIssue": { "key": "PROJ-2" } },
                    { "type": { "name": "Blocks" }, "inwardIssue": { "key": "PROJ-3" } }
                ]
            }
        });
        let fetched = parse_issue_response(&json);
        assert_eq!(fetched.rendered_body, "<p>Hello</p>");
        assert_eq!(
            fetched.attachments.get("diagram.png").unwrap(),
            "https://host/secure/att/123"
        );
        assert_eq!(fetched.attachments.len(), 1);
        assert_eq!(fetched.links.len(), 2);
        assert_eq!(fetched.links[0].link_type, "Relates");
        assert_eq!(fetched.links[0].outward_key.as_deref(), Some("PROJ-2"));
        assert!(fetched.links[0].inward_key.is_none());
        assert_eq!(fetched.links[1].inward_key.as_deref(), Some("PROJ-3"));
    }

    #[test]
    fn test_parse_issue_response_null_description() {
        let json = serde_json::json!({
            "renderedFields": { "description": null },
            "fields": {}
        });
        let fetched = parse_issue_response(&json);
        assert_eq!(fetched.rendered_body, "");
        assert!(fetched.attachments.is_empty());
        assert!(fetched.links.is_empty());
    }

    #[test]
    fn test_parse_issue_response_unnamed_link_skipped() {
        let json = serde_json::json!({
            "fields": {
                "issuelinks": [ { "type": {}, "outwardIssue": { "key": "PROJ-9" } } ]
            }
        });
        let fetched = parse_issue_response(&json);
        assert!(fetched.links.is_empty());
    }
}
