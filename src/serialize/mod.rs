// memgate: Serializers (L7) — pull-based Link/JSON/CDXJ renderers
//
// Grounded on examples/original_source/main.go's serializeLinks: each
// format module renders the same MementoList + context into a sequence of
// string chunks; see SPEC_FULL.md §4.7 for why these are built eagerly
// then wrapped in a lazily-pulled stream.

pub mod cdxj;
pub mod json;
pub mod link;

use futures::stream::{self, Stream};

use crate::config::Format;
use crate::memento::MementoList;

/// Everything a serializer needs beyond the memento list itself: the
/// requested URI-R and the service's own self-referential base URLs
/// (§4.7, §6).
#[derive(Debug, Clone)]
pub struct SerializeContext {
    pub urir: String,
    pub map_base: String,
    pub gate_base: String,
    pub navonly: bool,
}

/// Render `list` in `format`, returning the chunk sequence a response
/// writer pulls from. Unknown formats never occur here because `Format`
/// is a closed enum validated at the config boundary (§4.7 "Unknown
/// format" applies to the HTTP path segment, handled in `server::routes`).
pub fn render_chunks(format: Format, ctx: &SerializeContext, list: &MementoList) -> Vec<String> {
    match format {
        Format::Link => link::render(ctx, list),
        Format::Json => json::render(ctx, list),
        Format::Cdxj => cdxj::render(ctx, list),
    }
}

/// Wrap a chunk sequence as the pull-based stream consumers iterate over.
pub fn chunk_stream(chunks: Vec<String>) -> impl Stream<Item = String> {
    stream::iter(chunks)
}
