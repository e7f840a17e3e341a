// memgate: archive registry and per-archive dormancy state machine
//
// Grounded on knhk-connectors's CircuitBreaker/CircuitBreakerState and
// knhk-sidecar's CircuitBreakerRegistry for the per-id failure-tracking
// shape, adapted to the spec's two-state Active/Dormant machine (§4.1).

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{MemgateError, MemgateResult};

/// One entry from the archive-list JSON (§6 "Archive list (input)").
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveSpec {
    pub id: String,
    pub name: String,
    pub timemap: String,
    pub timegate: String,
    pub probability: f64,
    #[serde(default)]
    pub ignore: bool,
}

/// Immutable archive configuration plus its mutable runtime state.
pub struct Archive {
    pub id: String,
    pub name: String,
    pub timemap_base: String,
    pub timegate_base: String,
    pub probability: f64,
    pub ignore: bool,
    failures: AtomicU32,
    dormant: AtomicBool,
}

impl Archive {
    fn from_spec(spec: ArchiveSpec) -> Self {
        Self {
            id: spec.id,
            name: spec.name,
            timemap_base: ensure_trailing_slash(spec.timemap),
            timegate_base: ensure_trailing_slash(spec.timegate),
            probability: spec.probability,
            ignore: spec.ignore,
            failures: AtomicU32::new(0),
            dormant: AtomicBool::new(false),
        }
    }

    pub fn is_dormant(&self) -> bool {
        self.dormant.load(Ordering::Acquire)
    }

    pub fn failure_count(&self) -> u32 {
        self.failures.load(Ordering::Acquire)
    }
}

fn ensure_trailing_slash(mut base: String) -> String {
    if !base.ends_with('/') {
        base.push('/');
    }
    base
}

/// Holds the ordered archive list and drives the dormancy state machine.
pub struct ArchiveRegistry {
    archives: Vec<Arc<Archive>>,
    failure_tolerance: u32,
    dormant_period: Duration,
}

impl ArchiveRegistry {
    /// Load the archive list from a local path or an `http(s)://` URL,
    /// sort by probability descending (stable, insertion-order tie-break),
    /// and sanitize each base URL (§4.1).
    pub async fn load(
        source: &str,
        failure_tolerance: u32,
        dormant_period: Duration,
    ) -> MemgateResult<Self> {
        let body = if source.starts_with("http://") || source.starts_with("https://") {
            let resp = reqwest::get(source)
                .await
                .map_err(|e| MemgateError::ArchiveListLoad {
                    source: source.to_string(),
                    detail: e.to_string(),
                })?;
            if !resp.status().is_success() {
                return Err(MemgateError::ArchiveListLoad {
                    source: source.to_string(),
                    detail: format!("status {}", resp.status()),
                });
            }
            resp.text().await.map_err(|e| MemgateError::ArchiveListLoad {
                source: source.to_string(),
                detail: e.to_string(),
            })?
        } else {
            std::fs::read_to_string(source).map_err(|e| MemgateError::ArchiveListLoad {
                source: source.to_string(),
                detail: e.to_string(),
            })?
        };

        let specs: Vec<ArchiveSpec> = serde_json::from_str(&body)
            .map_err(|e| MemgateError::ArchiveListParse(e.to_string()))?;

        let mut archives: Vec<Arc<Archive>> = specs
            .into_iter()
            .filter(|s| !s.ignore)
            .map(|s| Arc::new(Archive::from_spec(s)))
            .collect();
        archives.sort_by(|a, b| b.probability.partial_cmp(&a.probability).unwrap());

        info!(count = archives.len(), %source, "loaded archive list");
        Ok(Self {
            archives,
            failure_tolerance,
            dormant_period,
        })
    }

    /// Eligible archives in probability-descending order, dropping those
    /// currently dormant (`ignore=true` entries are dropped at load time).
    pub fn eligible(&self) -> Vec<Arc<Archive>> {
        self.archives
            .iter()
            .filter(|a| !a.is_dormant())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.archives.len()
    }

    /// Record a network/transport/status failure for `archive`. If the
    /// tolerance threshold is reached (disabled when <= 0), transition to
    /// Dormant and schedule a delayed reactivation.
    pub fn trip(self: &Arc<Self>, archive: &Arc<Archive>) {
        if self.failure_tolerance == 0 {
            return;
        }
        let failures = archive.failures.fetch_add(1, Ordering::AcqRel) + 1;
        if failures >= self.failure_tolerance && !archive.is_dormant() {
            archive.dormant.store(true, Ordering::Release);
            warn!(archive = %archive.id, failures, "archive tripped to dormant");
            let archive = Arc::clone(archive);
            let dormant_period = self.dormant_period;
            tokio::spawn(async move {
                tokio::time::sleep(dormant_period).await;
                archive.failures.store(0, Ordering::Release);
                archive.dormant.store(false, Ordering::Release);
                info!(archive = %archive.id, "archive reactivated");
            });
        }
    }

    /// Reset an archive's failure counter after a successful response.
    pub fn heal(&self, archive: &Arc<Archive>) {
        if !archive.is_dormant() {
            archive.failures.store(0, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_archives(json: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(json.as_bytes()).unwrap();
        f
    }

    #[tokio::test]
    async fn load_sorts_by_probability_and_drops_ignored() {
        let json = r#"[
            {"id":"a","name":"A","timemap":"http://a/tm","timegate":"http://a/tg","probability":0.2,"ignore":false},
            {"id":"b","name":"B","timemap":"http://b/tm","timegate":"http://b/tg","probability":0.9,"ignore":false},
            {"id":"c","name":"C","timemap":"http://c/tm","timegate":"http://c/tg","probability":0.5,"ignore":true}
        ]"#;
        let f = write_archives(json);
        let reg = ArchiveRegistry::load(f.path().to_str().unwrap(), 3, Duration::from_secs(60))
            .await
            .unwrap();
        let ids: Vec<_> = reg.eligible().iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert!(reg.eligible().iter().all(|a| a.timemap_base.ends_with('/')));
    }

    #[tokio::test]
    async fn trip_transitions_to_dormant_at_tolerance() {
        let json = r#"[{"id":"a","name":"A","timemap":"http://a/tm","timegate":"http://a/tg","probability":0.5,"ignore":false}]"#;
        let f = write_archives(json);
        let reg = Arc::new(
            ArchiveRegistry::load(f.path().to_str().unwrap(), 3, Duration::from_secs(60))
                .await
                .unwrap(),
        );
        let archive = reg.eligible().remove(0);
        reg.trip(&archive);
        reg.trip(&archive);
        assert!(!archive.is_dormant());
        reg.trip(&archive);
        assert!(archive.is_dormant());
        assert!(reg.eligible().is_empty());
    }
}
