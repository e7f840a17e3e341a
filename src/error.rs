// memgate: error types

use thiserror::Error;

/// Crate-wide result alias.
pub type MemgateResult<T> = Result<T, MemgateError>;

/// Error taxonomy from spec §7: config-fatal, per-request malformed,
/// per-archive transient, session-empty, serializer-unknown-format.
#[derive(Debug, Error)]
pub enum MemgateError {
    #[error("failed to load archive list from {source}: {detail}")]
    ArchiveListLoad { source: String, detail: String },

    #[error("failed to parse archive list: {0}")]
    ArchiveListParse(String),

    #[error("could not open log file {path}: {detail}")]
    LogFileOpen { path: String, detail: String },

    #[error("malformed URI-R: {0}")]
    MalformedUri(String),

    #[error("malformed datetime {0}: expected YYYY[MM[DD[hh[mm[ss]]]]] or RFC1123")]
    MalformedDatetime(String),

    #[error("unknown format: {0}")]
    UnknownFormat(String),

    #[error("network error contacting {archive}: {detail}")]
    Network { archive: String, detail: String },

    #[error("request to {archive} timed out")]
    Timeout { archive: String },

    #[error("{archive} responded with status {status}")]
    ResponseStatus { archive: String, status: u16 },

    #[error("no mementos found for {0}")]
    SessionEmpty(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl MemgateError {
    /// Per-archive errors never fail the session; this marks the ones that
    /// should increment an archive's failure counter (§4.4).
    pub fn is_archive_transient(&self) -> bool {
        matches!(
            self,
            MemgateError::Network { .. }
                | MemgateError::Timeout { .. }
                | MemgateError::ResponseStatus { .. }
        )
    }
}
