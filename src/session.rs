// memgate: Session entry points (§4.9)
//
// Orchestrates aggregate (§4.5) -> annotate (§4.6) -> serialize (§4.7).
// Grounded on examples/original_source/main.go's memgatorService dispatch,
// which performs the same three-stage pipeline per request.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use reqwest::Client;

use crate::aggregate::aggregate;
use crate::annotate::annotate;
use crate::archive::ArchiveRegistry;
use crate::bench::BenchmarkTap;
use crate::config::Format;
use crate::error::{MemgateError, MemgateResult};
use crate::fetch::FetchSettings;
use crate::serialize::{render_chunks, SerializeContext};
use crate::uri::inject_id_modifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Timemap,
    Timegate,
}

/// One aggregation's lifetime, threaded through to the Benchmark Tap (§3).
pub struct Session {
    pub start: Instant,
    pub mode: SessionMode,
}

impl Session {
    pub fn new(mode: SessionMode) -> Self {
        Self {
            start: Instant::now(),
            mode,
        }
    }
}

/// Collaborators every session entry point needs; threaded in rather than
/// held as global state so the HTTP and CLI surfaces can construct it the
/// same way (§6).
pub struct SessionDeps<'a> {
    pub client: &'a Client,
    pub registry: &'a Arc<ArchiveRegistry>,
    pub settings: &'a FetchSettings,
    pub top_k: usize,
    pub tap: &'a BenchmarkTap,
    pub map_base: String,
    pub gate_base: String,
}

pub struct TimemapResult {
    pub chunks: Vec<String>,
    pub memento_count: usize,
}

/// `timemap(URI-R, format)` (§4.9): aggregate every eligible archive, label
/// first/last, and render the full ordered list.
pub async fn timemap(deps: &SessionDeps<'_>, urir: &str, format: Format) -> MemgateResult<TimemapResult> {
    let _session = Session::new(SessionMode::Timemap);
    let mut list = aggregate(deps.client, deps.registry, urir, None, deps.settings, deps.top_k, deps.tap).await;
    if list.is_empty() {
        return Err(MemgateError::SessionEmpty(urir.to_string()));
    }
    annotate(&mut list, None);
    let ctx = SerializeContext {
        urir: urir.to_string(),
        map_base: deps.map_base.clone(),
        gate_base: deps.gate_base.clone(),
        navonly: false,
    };
    let memento_count = list.len();
    Ok(TimemapResult {
        chunks: render_chunks(format, &ctx, &list),
        memento_count,
    })
}

#[derive(Debug, Clone, Copy)]
pub enum Disposition {
    Describe(Format),
    Redirect,
    Proxy,
    LinkHeader,
}

pub enum TimegateResult {
    Describe { chunks: Vec<String> },
    Redirect { location: String },
    Proxy { location: String },
    LinkHeader { location: String, link_header: String },
}

/// `timegate(URI-R, datetime, disposition)` (§4.9): aggregate in TimeGate
/// mode, select the closest memento, and render per the requested
/// disposition.
pub async fn timegate(
    deps: &SessionDeps<'_>,
    urir: &str,
    accept_datetime: DateTime<Utc>,
    disposition: Disposition,
) -> MemgateResult<TimegateResult> {
    let _session = Session::new(SessionMode::Timegate);
    let mut list = aggregate(
        deps.client,
        deps.registry,
        urir,
        Some(accept_datetime),
        deps.settings,
        deps.top_k,
        deps.tap,
    )
    .await;
    if list.is_empty() {
        return Err(MemgateError::SessionEmpty(urir.to_string()));
    }
    let annotation = annotate(&mut list, Some(accept_datetime));
    let closest = annotation
        .closest_href
        .ok_or_else(|| MemgateError::Internal("closest selection produced no result".to_string()))?;

    match disposition {
        Disposition::Describe(format) => {
            let ctx = SerializeContext {
                urir: urir.to_string(),
                map_base: deps.map_base.clone(),
                gate_base: deps.gate_base.clone(),
                navonly: true,
            };
            Ok(TimegateResult::Describe {
                chunks: render_chunks(format, &ctx, &list),
            })
        }
        Disposition::Redirect => Ok(TimegateResult::Redirect { location: closest }),
        Disposition::Proxy => {
            let rewritten = inject_id_modifier(&closest)?;
            Ok(TimegateResult::Proxy { location: rewritten })
        }
        Disposition::LinkHeader => {
            let ctx = SerializeContext {
                urir: urir.to_string(),
                map_base: deps.map_base.clone(),
                gate_base: deps.gate_base.clone(),
                navonly: true,
            };
            let chunks = crate::serialize::link::render(&ctx, &list);
            let flattened = chunks.concat().replace('\n', " ");
            Ok(TimegateResult::LinkHeader {
                location: closest,
                link_header: flattened,
            })
        }
    }
}
