//! Compile orchestration.
//!
//! Coordinates the full run: index bootstrap → hierarchical collection →
//! outline numbering → document assembly → artifact write. Per-node fetch
//! failures are contained inside the collector; only the index bootstrap
//! and the final write can fail the run.

use anyhow::Result;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::collect;
use crate::config::Config;
use crate::fetcher::{IconProvider, JiraFetcher, JiraIconProvider, NoIcons, TrackerCredentials};
use crate::index;
use crate::outline;
use crate::progress::ProgressMode;
use crate::report;

pub async fn run_compile(
    config: &Config,
    root_key: &str,
    dry_run: bool,
    progress_mode: ProgressMode,
    output_override: Option<PathBuf>,
) -> Result<()> {
    let creds = TrackerCredentials::from_env()?;
    let progress = progress_mode.reporter();

    let issue_index = index::build_index(&config.tracker, &creds).await?;

    if !issue_index.contains(root_key) {
        // Missing root is not an error: the compile yields nothing.
        println!("compile {}", root_key);
        println!("  root key not found in scope '{}'", config.tracker.jql);
        println!("  nodes: 0");
        println!("ok");
        return Ok(());
    }

    let fetcher = JiraFetcher::new(&config.tracker, creds.clone())?;
    let mut nodes = collect::collect(
        root_key,
        &issue_index,
        &fetcher,
        config.tracker.host(),
        &config.report.related_link_type,
        progress.as_ref(),
    )
    .await;

    outline::assign_numbers(&mut nodes);

    if dry_run {
        let related_total: usize = nodes.iter().map(|n| n.related.len()).sum();
        println!("compile {} (dry-run)", root_key);
        println!("  nodes: {}", nodes.len());
        println!("  toc entries: {}", nodes.len());
        println!("  related links: {}", related_total);
        return Ok(());
    }

    let icons: Box<dyn IconProvider> = if config.report.embed_icons {
        let icon_urls: HashMap<String, String> = nodes
            .iter()
            .filter_map(|n| {
                issue_index
                    .get(&n.key)
                    .map(|r| (r.key.clone(), r.icon_url.clone()))
            })
            .collect();
        Box::new(JiraIconProvider::new(&config.tracker, creds, icon_urls)?)
    } else {
        Box::new(NoIcons)
    };

    let output_dir = output_override.unwrap_or_else(|| config.report.output_dir.clone());
    let doc = report::assemble(
        root_key,
        nodes,
        &issue_index,
        icons.as_ref(),
        &output_dir,
        progress.as_ref(),
    )
    .await;

    report::write(&doc)?;

    println!("compile {}", root_key);
    println!("  nodes: {}", doc.nodes.len());
    println!("  wrote: {}", doc.path.display());
    println!("ok");
    Ok(())
}
