//! Attachment and link resolution for rendered issue bodies.
//!
//! Rewrites `<img>` sources in server-rendered HTML so the report is
//! self-contained: bare attachment filenames become their content URLs and
//! host-relative paths are absolutized against the tracker host. Only image
//! tags are touched; all other markup passes through byte-for-byte.
//!
//! The rewrite is a minimal streaming tag scanner, not a markup parse —
//! case-insensitive on tag and attribute names, tolerant of single or double
//! attribute quoting, and restricted to the `src` attribute. This is the
//! same minimal-scanning tradeoff the rest of the codebase makes instead of
//! pulling in an HTML-tree dependency.

use std::collections::HashMap;

use crate::models::IssueLink;

/// Substituted when an issue's rendered body is empty or its fetch failed,
/// so downstream rendering never sees empty content.
pub const MISSING_BODY_PLACEHOLDER: &str = "No description available.";

/// Resolve a rendered body: placeholder on empty input, otherwise image
/// sources rewritten against the attachment map and base host.
pub fn resolve_body(
    raw: &str,
    attachments: &HashMap<String, String>,
    base_host: &str,
) -> String {
    if raw.trim().is_empty() {
        return MISSING_BODY_PLACEHOLDER.to_string();
    }
    rewrite_image_sources(raw, attachments, base_host)
}

/// Rewrite every `<img>` tag's `src` attribute in `html`.
///
/// - `src` exactly equal (case-insensitive) to an attachment filename is
///   replaced with that attachment's content URL.
/// - `src` starting with `/` is prefixed with `base_host`.
/// - Anything else (absolute/external URLs, data URIs) passes through.
///
/// When nothing matches, the output equals the input.
pub fn rewrite_image_sources(
    html: &str,
    attachments: &HashMap<String, String>,
    base_host: &str,
) -> String {
    let bytes = html.as_bytes();
    let mut out = String::with_capacity(html.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'<' && is_img_tag_at(bytes, i) {
            if let Some(end) = find_tag_end(bytes, i) {
                let tag = &html[i..=end];
                out.push_str(&rewrite_img_tag(tag, attachments, base_host));
                i = end + 1;
                continue;
            }
        }
        // Advance one full character; multi-byte UTF-8 is copied unchanged.
        let ch_len = utf8_len(bytes[i]);
        out.push_str(&html[i..i + ch_len]);
        i += ch_len;
    }

    out
}

/// Extract the keys of issues related through `link_type`, matched
/// case-insensitively. The opposite endpoint is taken regardless of link
/// direction: an outward link names its outward issue, an inward link its
/// inward issue.
pub fn related_keys(links: &[IssueLink], link_type: &str) -> Vec<String> {
    links
        .iter()
        .filter(|l| l.link_type.eq_ignore_ascii_case(link_type))
        .filter_map(|l| l.outward_key.clone().or_else(|| l.inward_key.clone()))
        .collect()
}

/// True if `bytes[at..]` begins an `<img` tag (`<` already confirmed):
/// the name matches case-insensitively and is followed by whitespace,
/// `/`, or `>` so `<imgfoo>` is not mistaken for an image.
fn is_img_tag_at(bytes: &[u8], at: usize) -> bool {
    let name_end = at + 4;
    if name_end > bytes.len() {
        return false;
    }
    if !bytes[at + 1..name_end].eq_ignore_ascii_case(b"img") {
        return false;
    }
    match bytes.get(name_end) {
        Some(b) => b.is_ascii_whitespace() || *b == b'/' || *b == b'>',
        None => false,
    }
}

/// Position of the `>` closing the tag that starts at `start`, if any.
fn find_tag_end(bytes: &[u8], start: usize) -> Option<usize> {
    bytes[start..].iter().position(|b| *b == b'>').map(|p| start + p)
}

/// Rewrite the `src` value inside one `<img ...>` tag, preserving every
/// other attribute and the original quoting style. Tags without a quoted
/// `src` are returned unchanged.
fn rewrite_img_tag(tag: &str, attachments: &HashMap<String, String>, base_host: &str) -> String {
    let Some((value_start, value_end)) = find_src_value(tag) else {
        return tag.to_string();
    };

    let value = &tag[value_start..value_end];
    let replacement = resolve_src(value, attachments, base_host);

    match replacement {
        Some(new_src) => format!("{}{}{}", &tag[..value_start], new_src, &tag[value_end..]),
        None => tag.to_string(),
    }
}

/// Byte range of the quoted `src` attribute value within a tag. Attribute
/// name matching is case-insensitive; the value may use `"` or `'`.
fn find_src_value(tag: &str) -> Option<(usize, usize)> {
    let bytes = tag.as_bytes();
    let mut j = 0;
    while j + 3 <= bytes.len() {
        if bytes[j..j + 3].eq_ignore_ascii_case(b"src")
            && j > 0
            && bytes[j - 1].is_ascii_whitespace()
        {
            let mut k = j + 3;
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k >= bytes.len() || bytes[k] != b'=' {
                j += 1;
                continue;
            }
            k += 1;
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k >= bytes.len() || (bytes[k] != b'"' && bytes[k] != b'\'') {
                j += 1;
                continue;
            }
            let quote = bytes[k];
            let value_start = k + 1;
            let close = bytes[value_start..].iter().position(|b| *b == quote)?;
            return Some((value_start, value_start + close));
        }
        j += 1;
    }
    None
}

/// Decide the new `src` value, or `None` to leave the tag untouched.
fn resolve_src(
    value: &str,
    attachments: &HashMap<String, String>,
    base_host: &str,
) -> Option<String> {
    // Exact filename match against the attachment map, case-insensitive.
    for (filename, url) in attachments {
        if value.eq_ignore_ascii_case(filename) {
            return Some(url.clone());
        }
    }
    // Host-relative path: absolutize.
    if value.starts_with('/') {
        return Some(format!("{}{}", base_host, value));
    }
    None
}

fn utf8_len(first_byte: u8) -> usize {
    match first_byte {
        b if b < 0x80 => 1,
        b if b < 0xE0 => 2,
        b if b < 0xF0 => 3,
        _ => 4,
    }
}
