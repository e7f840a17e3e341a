// memgate: streaming Link-header / TimeMap parsing (L2 + L3)

pub mod extractor;
pub mod tokenizer;

use crate::memento::MementoList;

/// Tokenize then extract a full Link-format payload into a sorted
/// per-archive MementoList in one pass.
pub fn parse_link_payload(payload: &str) -> MementoList {
    extractor::extract_all(tokenizer::tokenize(payload))
}
