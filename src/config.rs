// memgate: CLI surface and configuration
//
// CLI parsing via clap's derive+env is grounded on knhk-sidecar::main.rs's
// env::var-driven bootstrap, generalized to a real clap derive struct; the
// optional TOML overlay is grounded on knhk-sidecar::config::SidecarConfig's
// from_file pattern (§6 "Configuration options").

use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::error::{MemgateError, MemgateResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Link,
    Json,
    Cdxj,
}

impl Format {
    pub fn parse(raw: &str) -> MemgateResult<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "link" => Ok(Format::Link),
            "json" => Ok(Format::Json),
            "cdxj" => Ok(Format::Cdxj),
            other => Err(MemgateError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP service.
    Server,
}

/// `memgate [flags] URI-R`, `memgate [flags] URI-R DATETIME`, or
/// `memgate [flags] server` (§6 "CLI surface").
#[derive(Debug, Parser)]
#[command(name = "memgate", version, about = "Memento TimeMap/TimeGate aggregator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// URI-R to query when no subcommand is given.
    pub urir: Option<String>,

    /// Optional accept-datetime when running the describe-closest form.
    pub datetime: Option<String>,

    #[command(flatten)]
    pub opts: ConfigOpts,
}

#[derive(Debug, clap::Args, Clone)]
pub struct ConfigOpts {
    /// Optional TOML config file; CLI flags override its contents.
    #[arg(long, env = "MEMGATE_CONFIG")]
    pub config: Option<String>,

    /// Output format for the CLI `timemap` form.
    #[arg(long, value_enum, env = "MEMGATE_FORMAT", default_value = "link")]
    pub format: Format,

    /// Local path or http(s):// URL for the archive list.
    #[arg(long, env = "MEMGATE_ARCHIVE_LIST", default_value = "archives.json")]
    pub archive_list: String,

    /// Path to the access log; stderr if unset.
    #[arg(long, env = "MEMGATE_LOGFILE")]
    pub log_file: Option<String>,

    /// Path to the newline-delimited-JSON benchmark sink; disabled if unset.
    #[arg(long, env = "MEMGATE_BENCHMARKFILE")]
    pub benchmark_file: Option<String>,

    /// Contact string advertised on the welcome page.
    #[arg(long, env = "MEMGATE_CONTACT", default_value = "")]
    pub contact: String,

    /// User-Agent template; ignored when spoof mode is on.
    #[arg(long, env = "MEMGATE_USERAGENT", default_value = "Memgate/1.0")]
    pub user_agent: String,

    /// Host to bind the HTTP service to.
    #[arg(long, env = "MEMGATE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind the HTTP service to.
    #[arg(long, env = "MEMGATE_PORT", default_value_t = 1208)]
    pub port: u16,

    /// Public base URL used to build self-referential timemap/timegate links.
    #[arg(long, env = "MEMGATE_PROXY_BASE")]
    pub proxy_base: Option<String>,

    /// Root path prefix all routes are mounted under.
    #[arg(long, env = "MEMGATE_ROOT", default_value = "/")]
    pub root: String,

    /// Directory of static assets served at the root path.
    #[arg(long, env = "MEMGATE_STATIC_DIR")]
    pub static_dir: Option<String>,

    /// Spawn at most this many fetchers per session; 0 disables the cap.
    #[arg(long, env = "MEMGATE_TOPK", default_value_t = 0)]
    pub top_k: usize,

    /// Consecutive failures before an archive goes dormant; <=0 disables.
    #[arg(long, env = "MEMGATE_FAILURE_TOLERANCE", default_value_t = 3)]
    pub failure_tolerance: u32,

    /// Log at debug level.
    #[arg(long, short = 'v', env = "MEMGATE_VERBOSE")]
    pub verbose: bool,

    /// Rotate through a fixed User-Agent spoof list instead of `user_agent`.
    #[arg(long, env = "MEMGATE_SPOOF")]
    pub spoof: bool,

    /// Enable the `/monitor` SSE endpoint and live benchmark broadcast.
    #[arg(long, env = "MEMGATE_MONITOR")]
    pub monitor: bool,

    #[arg(long, env = "MEMGATE_CONNECT_TIMEOUT_MS", default_value_t = 3_000)]
    pub connect_timeout_ms: u64,

    #[arg(long, env = "MEMGATE_HEADER_TIMEOUT_MS", default_value_t = 10_000)]
    pub header_timeout_ms: u64,

    #[arg(long, env = "MEMGATE_RESPONSE_TIMEOUT_MS", default_value_t = 20_000)]
    pub response_timeout_ms: u64,

    #[arg(long, env = "MEMGATE_IDLE_TIMEOUT_MS", default_value_t = 90_000)]
    pub idle_timeout_ms: u64,

    #[arg(long, env = "MEMGATE_DORMANT_PERIOD_MS", default_value_t = 600_000)]
    pub dormant_period_ms: u64,
}

/// The subset of `ConfigOpts` that can also arrive via an on-disk TOML file;
/// every field is optional so a partial file only overrides what it names.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TomlOverlay {
    format: Option<Format>,
    archive_list: Option<String>,
    log_file: Option<String>,
    benchmark_file: Option<String>,
    contact: Option<String>,
    user_agent: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    proxy_base: Option<String>,
    root: Option<String>,
    static_dir: Option<String>,
    top_k: Option<usize>,
    failure_tolerance: Option<u32>,
    verbose: Option<bool>,
    spoof: Option<bool>,
    monitor: Option<bool>,
    connect_timeout_ms: Option<u64>,
    header_timeout_ms: Option<u64>,
    response_timeout_ms: Option<u64>,
    idle_timeout_ms: Option<u64>,
    dormant_period_ms: Option<u64>,
}

impl ConfigOpts {
    /// Overlay a TOML file onto these flags. CLI/env-derived fields that were
    /// left at their clap defaults are replaced by the file's values; an
    /// explicitly-passed flag always wins (clap has already resolved env vs.
    /// CLI by this point, so "default" here means "neither was given").
    pub fn with_file_overlay(mut self, matches: &clap::ArgMatches) -> MemgateResult<Self> {
        let Some(path) = self.config.clone() else {
            return Ok(self);
        };
        let text = std::fs::read_to_string(&path).map_err(|e| MemgateError::ArchiveListLoad {
            source: path.clone(),
            detail: e.to_string(),
        })?;
        let overlay: TomlOverlay = toml::from_str(&text)
            .map_err(|e| MemgateError::ArchiveListParse(format!("config file {path}: {e}")))?;

        // A flag "wins" over the file only if it was actually given on the
        // command line or via its env var; clap's default value otherwise
        // counts as unset for this merge.
        macro_rules! overlay_field {
            ($field:ident) => {
                if matches.value_source(stringify!($field)) != Some(clap::parser::ValueSource::CommandLine)
                    && matches.value_source(stringify!($field)) != Some(clap::parser::ValueSource::EnvVariable)
                {
                    if let Some(v) = overlay.$field {
                        self.$field = v;
                    }
                }
            };
        }
        overlay_field!(format);
        overlay_field!(archive_list);
        if overlay.log_file.is_some() {
            self.log_file = overlay.log_file;
        }
        if overlay.benchmark_file.is_some() {
            self.benchmark_file = overlay.benchmark_file;
        }
        overlay_field!(contact);
        overlay_field!(user_agent);
        overlay_field!(host);
        overlay_field!(port);
        if overlay.proxy_base.is_some() {
            self.proxy_base = overlay.proxy_base;
        }
        overlay_field!(root);
        if overlay.static_dir.is_some() {
            self.static_dir = overlay.static_dir;
        }
        overlay_field!(top_k);
        overlay_field!(failure_tolerance);
        overlay_field!(verbose);
        overlay_field!(spoof);
        overlay_field!(monitor);
        overlay_field!(connect_timeout_ms);
        overlay_field!(header_timeout_ms);
        overlay_field!(response_timeout_ms);
        overlay_field!(idle_timeout_ms);
        overlay_field!(dormant_period_ms);
        Ok(self)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
    pub fn header_timeout(&self) -> Duration {
        Duration::from_millis(self.header_timeout_ms)
    }
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
    pub fn dormant_period(&self) -> Duration {
        Duration::from_millis(self.dormant_period_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parse_rejects_unknown() {
        assert!(Format::parse("xml").is_err());
        assert!(matches!(Format::parse("json").unwrap(), Format::Json));
    }
}
