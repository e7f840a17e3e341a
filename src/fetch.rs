// memgate: Per-Archive Fetcher (L4)
//
// Grounded on examples/original_source/main.go's fetchTimemap: compose
// timemap/timegate URL, fetch with the configured timeouts, accept
// 200/302, pull mementos from the body (timemap mode) or the Link header
// (timegate mode), and report success/failure back into the registry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use tracing::{info, warn};

use crate::archive::{Archive, ArchiveRegistry};
use crate::bench::BenchmarkTap;
use crate::datetime::format_rfc1123;
use crate::error::{MemgateError, MemgateResult};
use crate::memento::MementoList;
use crate::parse::parse_link_payload;

const SPOOF_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36",
];

/// Per-fetcher tunables threaded down from `ConfigOpts` (§4.4).
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub user_agent: String,
    pub spoof: bool,
    pub header_timeout: Duration,
    pub response_timeout: Duration,
}

fn pick_user_agent(settings: &FetchSettings) -> String {
    if settings.spoof {
        let idx = rand::random::<usize>() % SPOOF_AGENTS.len();
        SPOOF_AGENTS[idx].to_string()
    } else {
        settings.user_agent.clone()
    }
}

/// Build the shared `reqwest::Client`, honoring the connect and idle-pool
/// timeouts (`header`/`response` are enforced per-request via
/// `tokio::time::timeout` since reqwest exposes no separate header-read
/// knob; see DESIGN.md).
pub fn build_client(connect_timeout: Duration, idle_timeout: Duration) -> MemgateResult<Client> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .pool_idle_timeout(idle_timeout)
        .build()
        .map_err(|e| MemgateError::Internal(format!("failed to build http client: {e}")))
}

/// Fetch one archive's mementos for `urir`, optionally narrowed by
/// `accept_datetime` (TimeGate mode). Never returns an `Err` that should
/// fail the session: all failure paths report an empty list, having
/// already recorded the failure against `archive` via `registry.trip`.
pub async fn fetch_one(
    client: &Client,
    registry: &Arc<ArchiveRegistry>,
    archive: &Arc<Archive>,
    urir: &str,
    accept_datetime: Option<chrono::DateTime<chrono::Utc>>,
    settings: &FetchSettings,
    tap: &BenchmarkTap,
) -> MementoList {
    let start = Instant::now();
    let url = match accept_datetime {
        None => format!("{}{}", archive.timemap_base, urir),
        Some(_) => format!("{}{}", archive.timegate_base, urir),
    };

    let mut req = client.get(&url).header("User-Agent", pick_user_agent(settings));
    if let Some(dt) = accept_datetime {
        req = req.header("Accept-Datetime", format_rfc1123(&dt));
    }

    let send = tokio::time::timeout(settings.header_timeout, req.send());
    let response = match send.await {
        Ok(Ok(resp)) => resp,
        Ok(Err(e)) => {
            warn!(archive = %archive.id, error = %e, "network error fetching timemap");
            registry.trip(archive);
            tap.record(&archive.id, "timemapfetch", format!("network error: {e}"), start);
            return MementoList::new();
        }
        Err(_) => {
            warn!(archive = %archive.id, "header timeout fetching timemap");
            registry.trip(archive);
            tap.record(&archive.id, "timemapfetch", "header timeout", start);
            return MementoList::new();
        }
    };

    let status = response.status();
    if status.as_u16() != 200 && status.as_u16() != 302 {
        warn!(archive = %archive.id, %status, "non-success response fetching timemap");
        registry.trip(archive);
        tap.record(
            &archive.id,
            "timemapfetch",
            format!("response error, status {status}"),
            start,
        );
        return MementoList::new();
    }

    let link_header = response
        .headers()
        .get(reqwest::header::LINK)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let payload = if accept_datetime.is_some() {
        link_header.unwrap_or_default()
    } else {
        match tokio::time::timeout(settings.response_timeout, response.text()).await {
            Ok(Ok(body)) => body,
            Ok(Err(e)) => {
                warn!(archive = %archive.id, error = %e, "response read error");
                registry.trip(archive);
                tap.record(&archive.id, "timemapfetch", format!("response read error: {e}"), start);
                return MementoList::new();
            }
            Err(_) => {
                warn!(archive = %archive.id, "response timeout reading body");
                registry.trip(archive);
                tap.record(&archive.id, "timemapfetch", "response timeout", start);
                return MementoList::new();
            }
        }
    };

    registry.heal(archive);
    tap.record(
        &archive.id,
        "timemapfetch",
        format!("timemap fetched from {}", archive.name),
        start,
    );

    let extract_start = Instant::now();
    let mementos = parse_link_payload(&payload);
    info!(archive = %archive.id, count = mementos.len(), "success: mementos extracted");
    tap.record(
        &archive.id,
        "extractmementos",
        format!("{} mementos extracted from {}", mementos.len(), archive.name),
        extract_start,
    );
    mementos
}
