//! # treedoc
//!
//! Compiles a hierarchy of remotely-fetched issue records into one
//! self-contained HTML report with a nested table of contents, dotted
//! outline numbering, and cross-referenced related issues.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌──────────┐   ┌──────────┐
//! │  Index   │──▶│ Collector │──▶│ Outline  │──▶│  Report  │
//! │ (search) │   │ DFS+fetch │   │ numbers  │   │ TOC+body │
//! └──────────┘   └───────────┘   └──────────┘   └──────────┘
//! ```
//!
//! The run is a one-shot, read-only compile from remote state to a static
//! artifact: the index is bootstrapped once, the collector fetches each
//! node's rendered body strictly sequentially in pre-order, the assigner
//! annotates the flat sequence with outline numbers, and the compiler emits
//! a single HTML file.
//!
//! ## Quick Start
//!
//! ```bash
//! export JIRA_EMAIL=me@example.com
//! export JIRA_API_TOKEN=...
//! treedoc check                      # verify connectivity
//! treedoc compile PROJ-1             # write documents/PROJ-1_Report.html
//! treedoc compile PROJ-1 --dry-run   # counts only, no artifact
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`fetcher`] | Issue and icon fetching over the tracker REST API |
//! | [`index`] | Issue/children index bootstrap |
//! | [`collect`] | Hierarchical collection (pre-order DFS) |
//! | [`outline`] | Dotted-decimal outline numbering |
//! | [`resolve`] | Attachment and link resolution |
//! | [`report`] | TOC and body rendering, artifact write |
//! | [`compile`] | End-to-end orchestration |
//! | [`progress`] | Per-node progress reporting |

pub mod collect;
pub mod compile;
pub mod config;
pub mod fetcher;
pub mod index;
pub mod models;
pub mod outline;
pub mod progress;
pub mod report;
pub mod resolve;
