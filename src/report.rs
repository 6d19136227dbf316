//! Document compiler: numbered sequence → one self-contained HTML report.
//!
//! Two passes over the complete, fully numbered sequence. The table of
//! contents is a single linear bracket-balancing transform — no tree walk:
//! pre-order plus outline depth is enough to open and close nested list
//! scopes as the level rises and falls. The body pass then emits one
//! collapsible section per issue, with its resolved description, optional
//! inline icon, and related-issue cross references.
//!
//! Nothing streams: the full sequence must exist before any HTML is
//! produced, because the TOC pass needs the complete ordering up front.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::path::Path;

use crate::fetcher::IconProvider;
use crate::models::{FlatNode, IssueIndex, ReportDocument};
use crate::progress::{CompileProgressEvent, CompileProgressReporter};

/// Fixed inline stylesheet; the artifact must be viewable with no external
/// resources.
const STYLESHEET: &str = "\
body { font-family: sans-serif; margin: 2em auto; max-width: 60em; color: #172b4d; }
h1 { border-bottom: 2px solid #dfe1e6; padding-bottom: 0.3em; }
ul.toc, ul.toc ul { list-style: none; padding-left: 1.4em; }
ul.toc a { text-decoration: none; color: #0052cc; }
details.issue { margin: 0.6em 0; border: 1px solid #dfe1e6; border-radius: 4px; padding: 0.4em 0.8em; }
details.issue > summary { cursor: pointer; font-weight: 600; }
details.issue img.type-icon { width: 16px; height: 16px; vertical-align: text-bottom; margin-right: 0.3em; }
span.key { color: #6b778c; font-weight: 400; }
div.issue-body { margin: 0.6em 0 0.2em 1.2em; }
details.related { margin-top: 0.6em; font-size: 0.92em; }
";

/// Assemble the full report for an already numbered sequence.
///
/// Fires the assembly progress event, renders the TOC and every section
/// (fetching icons through `icons` as it goes), and returns the document
/// with its target path. Writing is a separate step so `--dry-run` can stop
/// here.
pub async fn assemble(
    root_key: &str,
    nodes: Vec<FlatNode>,
    index: &IssueIndex,
    icons: &dyn IconProvider,
    output_dir: &Path,
    progress: &dyn CompileProgressReporter,
) -> ReportDocument {
    progress.report(CompileProgressEvent::Assembling {
        total: nodes.len() as u64,
    });

    let title = match index.get(root_key) {
        Some(record) => format!("{} ({})", record.summary, record.key),
        None => root_key.to_string(),
    };

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(&title)));
    html.push_str(&format!("<style>\n{}</style>\n", STYLESHEET));
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(&title)));

    html.push_str(&render_toc(&nodes, index));

    for node in &nodes {
        let icon = icons.icon(&node.key).await;
        html.push_str(&render_section(node, index, icon.as_deref()));
    }

    html.push_str("</body>\n</html>\n");

    let path = output_dir.join(format!("{}_Report.html", root_key));
    ReportDocument {
        root_key: root_key.to_string(),
        nodes,
        html,
        path,
    }
}

/// Write the assembled report to its path. A failure here is fatal: the
/// error is surfaced to the caller and no artifact is left behind claiming
/// to be complete.
pub fn write(doc: &ReportDocument) -> Result<()> {
    if let Some(parent) = doc.path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output dir {}", parent.display()))?;
    }
    std::fs::write(&doc.path, &doc.html)
        .with_context(|| format!("Failed to write report to {}", doc.path.display()))?;
    Ok(())
}

/// Render the nested table of contents with a single linear pass.
///
/// `previous_level` starts at 0; each entry's level is the count of `'.'`
/// separators in its outline number. Rising levels open that many nested
/// list scopes, falling levels close them, and whatever is still open at
/// the end is closed in one sweep. The nesting trace can never go negative
/// because a level is a count.
pub fn render_toc(nodes: &[FlatNode], index: &IssueIndex) -> String {
    let mut out = String::from("<ul class=\"toc\">\n");
    let mut previous_level = 0usize;

    for node in nodes {
        let level = node.number.matches('.').count();
        if level > previous_level {
            for _ in 0..level - previous_level {
                out.push_str("<ul>\n");
            }
        } else if level < previous_level {
            for _ in 0..previous_level - level {
                out.push_str("</ul>\n");
            }
        }

        let title = index
            .get(&node.key)
            .map(|r| r.summary.as_str())
            .unwrap_or("");
        out.push_str(&format!(
            "<li><a href=\"#issue-{key}\">{num} {title} <span class=\"key\">({key})</span></a></li>\n",
            key = escape_html(&node.key),
            num = node.number,
            title = escape_html(title),
        ));
        previous_level = level;
    }

    for _ in 0..previous_level {
        out.push_str("</ul>\n");
    }
    out.push_str("</ul>\n");
    out
}

/// Render one issue's collapsible section: summary line (icon + outline
/// number + title + key), resolved body, and the related-issues sub-block
/// when any related keys exist.
pub fn render_section(node: &FlatNode, index: &IssueIndex, icon: Option<&[u8]>) -> String {
    let record = index.get(&node.key);
    let title = record.map(|r| r.summary.as_str()).unwrap_or("");
    let type_name = record.map(|r| r.issue_type.as_str()).unwrap_or("");

    let icon_html = match icon {
        Some(bytes) if !bytes.is_empty() => format!(
            "<img class=\"type-icon\" src=\"data:{};base64,{}\" alt=\"{}\">",
            icon_mime(bytes),
            BASE64.encode(bytes),
            escape_html(type_name),
        ),
        _ => String::new(),
    };

    let mut out = format!(
        "<details open class=\"issue\" id=\"issue-{key}\">\n\
         <summary>{icon}<span class=\"number\">{num}</span> {title} <span class=\"key\">({key})</span></summary>\n\
         <div class=\"issue-body\">\n{body}\n",
        key = escape_html(&node.key),
        icon = icon_html,
        num = node.number,
        title = escape_html(title),
        body = node.body,
    );

    if !node.related.is_empty() {
        out.push_str(&format!(
            "<details class=\"related\">\n<summary>Related Issues ({})</summary>\n<ul>\n",
            node.related.len()
        ));
        for key in &node.related {
            if index.contains(key) {
                out.push_str(&format!(
                    "<li><a href=\"#issue-{key}\">{key}</a></li>\n",
                    key = escape_html(key)
                ));
            } else {
                // Out-of-scope project: plain text, not a broken anchor.
                out.push_str(&format!("<li>{}</li>\n", escape_html(key)));
            }
        }
        out.push_str("</ul>\n</details>\n");
    }

    out.push_str("</div>\n</details>\n");
    out
}

/// Guess the data-URI MIME type from the icon bytes. Trackers serve type
/// icons as SVG, PNG, or the occasional GIF.
fn icon_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"\x89PNG") {
        "image/png"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.starts_with(b"<") || bytes.starts_with(b"\xef\xbb\xbf<") {
        "image/svg+xml"
    } else {
        "image/png"
    }
}

/// Escape text for safe interpolation into HTML content and attributes.
/// Issue bodies are NOT escaped — they are server-rendered HTML already.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
