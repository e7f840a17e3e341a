// memgate: Benchmark Tap (L8) and the live-monitor SSE broadcaster
//
// The broker is grounded directly on
// examples/original_source/vendor/sse/sse.go's Broker: one dispatcher task
// owns the subscriber set, fed by three channels (subscribe/unsubscribe/
// publish) so nothing outside the dispatcher ever locks the set (spec.md §9).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

/// One timing event: {session-start, origin, role, info, event-start,
/// event-end} (§4.8), all as nanosecond offsets from session start.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkEvent {
    pub session_start_ns: u128,
    pub origin: String,
    pub role: String,
    pub info: String,
    pub start_ns: u128,
    pub end_ns: u128,
}

struct SubscribeRequest {
    respond_to: oneshot::Sender<(u64, mpsc::Receiver<String>)>,
}

/// Single-writer fan-out dispatcher for live benchmark events.
struct Broker {
    subscribe_rx: mpsc::Receiver<SubscribeRequest>,
    unsubscribe_rx: mpsc::Receiver<u64>,
    publish_rx: mpsc::Receiver<String>,
    subscribers: HashMap<u64, mpsc::Sender<String>>,
    next_id: u64,
}

impl Broker {
    async fn run(mut self) {
        loop {
            tokio::select! {
                Some(req) = self.subscribe_rx.recv() => {
                    let id = self.next_id;
                    self.next_id += 1;
                    let (tx, rx) = mpsc::channel(32);
                    self.subscribers.insert(id, tx);
                    let _ = req.respond_to.send((id, rx));
                }
                Some(id) = self.unsubscribe_rx.recv() => {
                    self.subscribers.remove(&id);
                }
                Some(event) = self.publish_rx.recv() => {
                    self.subscribers.retain(|_, tx| tx.try_send(event.clone()).is_ok());
                }
                else => break,
            }
        }
    }
}

/// Handle to the broker's dispatcher task.
#[derive(Clone)]
pub struct BenchmarkBroker {
    subscribe_tx: mpsc::Sender<SubscribeRequest>,
    unsubscribe_tx: mpsc::Sender<u64>,
    publish_tx: mpsc::Sender<String>,
}

impl BenchmarkBroker {
    pub fn spawn() -> Self {
        let (subscribe_tx, subscribe_rx) = mpsc::channel(8);
        let (unsubscribe_tx, unsubscribe_rx) = mpsc::channel(8);
        let (publish_tx, publish_rx) = mpsc::channel(256);
        let broker = Broker {
            subscribe_rx,
            unsubscribe_rx,
            publish_rx,
            subscribers: HashMap::new(),
            next_id: 0,
        };
        tokio::spawn(broker.run());
        Self {
            subscribe_tx,
            unsubscribe_tx,
            publish_tx,
        }
    }

    pub async fn subscribe(&self) -> Option<(u64, mpsc::Receiver<String>)> {
        let (respond_to, rx) = oneshot::channel();
        self.subscribe_tx
            .send(SubscribeRequest { respond_to })
            .await
            .ok()?;
        rx.await.ok()
    }

    pub async fn unsubscribe(&self, id: u64) {
        let _ = self.unsubscribe_tx.send(id).await;
    }

    async fn publish(&self, event_json: String) {
        let _ = self.publish_tx.send(event_json).await;
    }
}

/// Per-session handle for recording timing events, optionally fanning them
/// out live to `/monitor` subscribers.
#[derive(Clone)]
pub struct BenchmarkTap {
    session_start: Instant,
    session_start_ns: u128,
    sink_tx: mpsc::UnboundedSender<BenchmarkEvent>,
    broker: Option<BenchmarkBroker>,
    next_seq: Arc<AtomicU64>,
}

impl BenchmarkTap {
    pub fn new(sink_tx: mpsc::UnboundedSender<BenchmarkEvent>, broker: Option<BenchmarkBroker>) -> Self {
        let session_start_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        Self {
            session_start: Instant::now(),
            session_start_ns,
            sink_tx,
            broker,
            next_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Record one event spanning `[event_start, now)`.
    pub fn record(&self, origin: &str, role: &str, info: impl Into<String>, event_start: Instant) {
        self.next_seq.fetch_add(1, Ordering::Relaxed);
        let now = Instant::now();
        let event = BenchmarkEvent {
            session_start_ns: self.session_start_ns,
            origin: origin.to_string(),
            role: role.to_string(),
            info: info.into(),
            start_ns: event_start.duration_since(self.session_start).as_nanos(),
            end_ns: now.duration_since(self.session_start).as_nanos(),
        };
        let _ = self.sink_tx.send(event.clone());
        if let Some(broker) = self.broker.clone() {
            if let Ok(json) = serde_json::to_string(&event) {
                tokio::spawn(async move {
                    broker.publish(json).await;
                });
            }
        }
    }
}

/// Spawn the sink writer task that drains benchmark events to `write`
/// (newline-delimited JSON), returning the sender side used by `BenchmarkTap`.
pub fn spawn_sink<W>(mut write: W) -> mpsc::UnboundedSender<BenchmarkEvent>
where
    W: std::io::Write + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<BenchmarkEvent>();
    tokio::task::spawn_blocking(move || {
        while let Some(event) = rx.blocking_recv() {
            if let Ok(line) = serde_json::to_string(&event) {
                let _ = writeln!(write, "{line}");
            }
        }
    });
    tx
}
