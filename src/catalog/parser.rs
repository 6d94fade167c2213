//! Listing page parser.
//!
//! A listing page reports its result count as the leading number of the
//! `<title>` text, and marks every name with an anchor like:
//!
//! ```text
//! <a class="baby-name-shlst" data-name="ava" data-origin="Latin">...</a>
//! ```

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use super::NameEntry;

/// Class carried by every name anchor on a listing page.
const NAME_CLASS: &str = "baby-name-shlst";

/// Result count from the page title, e.g. `"412 Baby Girl Names..."`.
pub fn parse_total(html: &str) -> Option<u64> {
    static TITLE: OnceLock<Regex> = OnceLock::new();
    let re = TITLE
        .get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"));

    let title = decode_entities(re.captures(html)?.get(1)?.as_str());
    let first = title.split_whitespace().next()?;
    first.replace(',', "").parse().ok()
}

/// Every name entry on the page, in document order.
///
/// Anchors without a `data-name` are skipped; a missing origin is empty.
pub fn parse_entries(html: &str) -> Vec<NameEntry> {
    static ANCHOR: OnceLock<Regex> = OnceLock::new();
    let re = ANCHOR.get_or_init(|| Regex::new(r"(?is)<a\s[^>]*>").expect("valid regex"));

    re.find_iter(html)
        .filter_map(|tag| {
            let attrs = parse_attributes(tag.as_str());
            let is_name = attrs
                .get("class")
                .is_some_and(|class| class.split_whitespace().any(|c| c == NAME_CLASS));
            if !is_name {
                return None;
            }

            let name = attrs.get("data-name")?.trim();
            if name.is_empty() {
                return None;
            }
            let origin = attrs.get("data-origin").map(|o| o.trim()).unwrap_or("");

            Some(NameEntry {
                name: decode_entities(name),
                origin: decode_entities(origin),
            })
        })
        .collect()
}

fn parse_attributes(tag: &str) -> HashMap<String, &str> {
    static ATTR: OnceLock<Regex> = OnceLock::new();
    let re = ATTR.get_or_init(|| {
        Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
            .expect("valid regex")
    });

    re.captures_iter(tag)
        .filter_map(|caps| {
            let key = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps.get(2).or(caps.get(3)).or(caps.get(4))?.as_str();
            Some((key, value))
        })
        .collect()
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
