// memgate: Aggregator (L5) — fan out fetchers, online-merge their results
//
// Grounded on examples/original_source/main.go's aggregateTimemap: a
// WaitGroup-style fan-out over eligible archives feeding a channel, merged
// into a running base list as results arrive (§4.5).

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use reqwest::Client;
use tokio::sync::mpsc;
use tracing::info;

use crate::archive::ArchiveRegistry;
use crate::bench::BenchmarkTap;
use crate::fetch::{fetch_one, FetchSettings};
use crate::memento::MementoList;

/// Fan out one fetcher per eligible archive (bounded by `top_k` when
/// positive), collect their per-archive lists, and fold them into a single
/// sorted `MementoList` (§4.5).
pub async fn aggregate(
    client: &Client,
    registry: &Arc<ArchiveRegistry>,
    urir: &str,
    accept_datetime: Option<DateTime<Utc>>,
    settings: &FetchSettings,
    top_k: usize,
    tap: &BenchmarkTap,
) -> MementoList {
    let start = Instant::now();
    let mut eligible = registry.eligible();
    if top_k > 0 && eligible.len() > top_k {
        eligible.truncate(top_k);
    }

    let (tx, mut rx) = mpsc::channel::<MementoList>(eligible.len().max(1));

    for archive in eligible {
        let client = client.clone();
        let registry = Arc::clone(registry);
        let urir = urir.to_string();
        let settings = settings.clone();
        let tap = tap.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let list = fetch_one(&client, &registry, &archive, &urir, accept_datetime, &settings, &tap).await;
            let _ = tx.send(list).await;
        });
    }
    drop(tx);

    let mut base = MementoList::new();
    while let Some(incoming) = rx.recv().await {
        base.merge(incoming);
    }

    info!(total = base.len(), "aggregation complete");
    tap.record("AGGREGATOR", "aggregate", format!("{} mementos fused", base.len()), start);
    base
}
