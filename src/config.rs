use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrackerConfig {
    /// Base host URL, e.g. `https://jira.example.com`. No trailing slash.
    pub base_url: String,
    /// JQL scope used to bootstrap the issue index,
    /// e.g. `project = DEMO ORDER BY rank`.
    pub jql: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_page_size() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Relationship-type name whose links are surfaced as related issues.
    /// Matched case-insensitively against both link directions.
    #[serde(default = "default_related_link_type")]
    pub related_link_type: String,
    /// Embed issue-type icons into the report as data URIs.
    #[serde(default = "default_embed_icons")]
    pub embed_icons: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            related_link_type: default_related_link_type(),
            embed_icons: default_embed_icons(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./documents")
}
fn default_related_link_type() -> String {
    "Relates".to_string()
}
fn default_embed_icons() -> bool {
    true
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate tracker
    if config.tracker.base_url.is_empty() {
        anyhow::bail!("tracker.base_url must not be empty");
    }
    if !config.tracker.base_url.starts_with("http://")
        && !config.tracker.base_url.starts_with("https://")
    {
        anyhow::bail!(
            "tracker.base_url must start with http:// or https://, got '{}'",
            config.tracker.base_url
        );
    }
    if config.tracker.jql.is_empty() {
        anyhow::bail!("tracker.jql must not be empty");
    }
    if config.tracker.timeout_secs == 0 {
        anyhow::bail!("tracker.timeout_secs must be > 0");
    }
    if config.tracker.page_size == 0 {
        anyhow::bail!("tracker.page_size must be > 0");
    }

    // Validate report
    if config.report.related_link_type.is_empty() {
        anyhow::bail!("report.related_link_type must not be empty");
    }

    Ok(config)
}

impl TrackerConfig {
    /// Base URL with any trailing slash removed, for joining paths.
    pub fn host(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
