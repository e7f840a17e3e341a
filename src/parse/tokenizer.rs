// memgate: Link-format tokenizer
//
// Splits a Link-header/TimeMap payload into raw entry strings, respecting
// quoted attribute values and angle-bracketed URIs so commas inside either
// context don't split an entry. Grounded on
// examples/original_source/main.go's splitLinks.

/// Split `payload` on top-level commas, honoring `"..."` and `<...>`
/// nesting. Does not validate entries; malformed ones pass through
/// (filtered downstream by the extractor).
pub fn tokenize(payload: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let bytes = payload.as_bytes();
    let mut in_quotes = false;
    let mut angle_depth = 0usize;
    let mut start = 0usize;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'"' => in_quotes = !in_quotes,
            b'<' if !in_quotes => angle_depth += 1,
            b'>' if !in_quotes && angle_depth > 0 => angle_depth -= 1,
            b',' if !in_quotes && angle_depth == 0 => {
                entries.push(&payload[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < payload.len() {
        entries.push(&payload[start..]);
    }
    entries
}
