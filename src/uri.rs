// memgate: URI-R normalization
//
// The teacher never parses URLs; grounded on davemolk-rusty-bits/rq and
// .../cff, both of which pull in the `url` crate for exactly this
// parse-then-re-stringify step (see DESIGN.md).

use url::Url;

use crate::error::{MemgateError, MemgateResult};

/// Normalize a raw target into an absolute URI-R: prepend `http://` if no
/// scheme is present, then parse and re-stringify (§6).
pub fn normalize_urir(raw: &str) -> MemgateResult<String> {
    let candidate = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };
    let url = Url::parse(&candidate).map_err(|_| MemgateError::MalformedUri(raw.to_string()))?;
    Ok(url.to_string())
}

/// Rewrite the closest memento's URI so the archive serves raw, unmodified
/// content: inject an `id_` modifier onto its datestamp path segment
/// (§4.9 "proxy" disposition). Returns the href unchanged if no segment
/// looks like a 14-or-fewer digit datestamp.
pub fn inject_id_modifier(href: &str) -> MemgateResult<String> {
    let url = Url::parse(href).map_err(|_| MemgateError::MalformedUri(href.to_string()))?;
    let segments: Vec<String> = url
        .path_segments()
        .ok_or_else(|| MemgateError::MalformedUri(href.to_string()))?
        .map(|s| s.to_string())
        .collect();

    let mut found = false;
    let rewritten: Vec<String> = segments
        .into_iter()
        .map(|seg| {
            let digits = seg.chars().take_while(|c| c.is_ascii_digit()).count();
            if !found && digits >= 4 && digits == seg.len() && digits <= 14 {
                found = true;
                format!("{seg}id_")
            } else {
                seg
            }
        })
        .collect();

    if !found {
        return Ok(href.to_string());
    }
    let mut result = url;
    result
        .path_segments_mut()
        .map_err(|_| MemgateError::MalformedUri(href.to_string()))?
        .clear()
        .extend(rewritten.iter());
    Ok(result.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injects_id_modifier_onto_datestamp_segment() {
        let rewritten = inject_id_modifier("http://web.archive.org/web/20050101000000/http://example.com").unwrap();
        assert_eq!(rewritten, "http://web.archive.org/web/20050101000000id_/http://example.com");
    }

    #[test]
    fn leaves_href_unchanged_when_no_datestamp_segment() {
        let rewritten = inject_id_modifier("http://archive.example/snapshot/abc").unwrap();
        assert_eq!(rewritten, "http://archive.example/snapshot/abc");
    }

    #[test]
    fn adds_scheme_when_missing() {
        assert_eq!(
            normalize_urir("example.com").unwrap(),
            "http://example.com/"
        );
    }

    #[test]
    fn preserves_existing_scheme() {
        assert_eq!(
            normalize_urir("https://example.com/page").unwrap(),
            "https://example.com/page"
        );
    }

    #[test]
    fn rejects_unparseable_uri() {
        assert!(normalize_urir("http://").is_err());
    }
}
