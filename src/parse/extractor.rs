// memgate: Link entry -> Memento extraction
//
// Grounded on examples/original_source/main.go's extractMementos, and on
// other_examples' wayback mod.rs (extract_memento_url) for idiomatic
// Rust handling of the same Link-header wire format.

use tracing::warn;

use crate::datetime::parse_rfc1123;
use crate::memento::{Memento, MementoList};

/// Parse one raw Link entry into attribute key/value pairs, href first.
fn split_attrs(entry: &str) -> Option<(String, Vec<(String, String)>)> {
    let trimmed = entry.trim_matches(|c: char| c == '<' || c == '"' || c.is_whitespace());
    let mut parts = trimmed.split(';');
    let href = parts.next()?.trim().trim_end_matches('>').to_string();
    if href.is_empty() {
        return None;
    }
    let mut attrs = Vec::new();
    for piece in parts {
        let piece = piece
            .trim()
            .trim_end_matches('>')
            .trim_matches(|c: char| c == '"' || c.is_whitespace());
        let Some((k, v)) = piece.split_once('=') else {
            continue;
        };
        let k = k.trim().to_string();
        let v = v.trim().trim_matches('"').to_string();
        attrs.push((k, v));
    }
    Some((href, attrs))
}

fn attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn is_memento_rel(rel: &str) -> bool {
    rel.split_whitespace().any(|w| w == "memento")
}

/// Parse one raw entry string (as produced by the tokenizer) into a
/// Memento, rejecting anything that isn't a memento-rel link with a
/// parseable RFC1123 datetime. Failures are logged and skipped; they never
/// fail the archive (§4.3).
pub fn extract_one(entry: &str) -> Option<Memento> {
    let (href, attrs) = split_attrs(entry)?;
    let rel = attr(&attrs, "rel")?;
    if !is_memento_rel(rel) {
        return None;
    }
    let dtm = attr(&attrs, "datetime")?;
    match parse_rfc1123(dtm) {
        Some(datetime) => Some(Memento::new(href, datetime, dtm.to_string())),
        None => {
            warn!(datetime = %dtm, "failed to parse memento datetime, skipping entry");
            None
        }
    }
}

/// Extract mementos from an already-tokenized entry list and fold them into
/// a sorted per-archive MementoList (§4.3's insertion policy).
pub fn extract_all<'a, I: IntoIterator<Item = &'a str>>(entries: I) -> MementoList {
    let mut list = MementoList::new();
    for entry in entries {
        if let Some(m) = extract_one(entry) {
            list.insert_sorted(m);
        }
    }
    list
}
