// memgate: Memento TimeMap/TimeGate aggregator

pub mod aggregate;
pub mod annotate;
pub mod archive;
pub mod bench;
pub mod config;
pub mod datetime;
pub mod error;
pub mod fetch;
pub mod memento;
pub mod parse;
pub mod serialize;
pub mod server;
pub mod session;
pub mod uri;

pub use error::{MemgateError, MemgateResult};
