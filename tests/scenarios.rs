// memgate: end-to-end scenario tests from spec.md §8
//
// Each archive is a wiremock server standing in for a real web archive;
// scenarios drive memgate::session's timemap/timegate entry points over the
// full aggregate -> annotate -> serialize pipeline.

use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use wiremock::matchers::path_regex;
use wiremock::{Mock, MockServer, ResponseTemplate};

use memgate::archive::ArchiveRegistry;
use memgate::bench::BenchmarkTap;
use memgate::config::Format;
use memgate::fetch::{build_client, FetchSettings};
use memgate::session::{timegate, timemap, Disposition, SessionDeps, TimegateResult};

fn settings() -> FetchSettings {
    FetchSettings {
        user_agent: "memgate-tests/1.0".to_string(),
        spoof: false,
        header_timeout: Duration::from_secs(5),
        response_timeout: Duration::from_secs(5),
    }
}

async fn registry_from(entries: &[(&str, &str, f64)], tolerance: u32) -> Arc<ArchiveRegistry> {
    let specs: Vec<String> = entries
        .iter()
        .map(|(id, base, prob)| {
            format!(
                r#"{{"id":"{id}","name":"{id}","timemap":"{base}","timegate":"{base}","probability":{prob},"ignore":false}}"#
            )
        })
        .collect();
    let json = format!("[{}]", specs.join(","));
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(json.as_bytes()).unwrap();
    Arc::new(
        ArchiveRegistry::load(f.path().to_str().unwrap(), tolerance, Duration::from_millis(200))
            .await
            .unwrap(),
    )
}

fn tap() -> BenchmarkTap {
    BenchmarkTap::new(tokio::sync::mpsc::unbounded_channel().0, None)
}

#[tokio::test]
async fn fused_order_and_nav_rels_match_scenario_one() {
    let a1 = MockServer::start().await;
    Mock::given(path_regex(r"^/tm/.*"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<http://example.com/a1-1>; rel="memento"; datetime="Mon, 01 Jan 2001 00:00:00 GMT",
<http://example.com/a1-2>; rel="memento"; datetime="Fri, 01 Jan 2010 00:00:00 GMT""#,
        ))
        .mount(&a1)
        .await;
    let a2 = MockServer::start().await;
    Mock::given(path_regex(r"^/tm/.*"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<http://example.com/a2-1>; rel="memento"; datetime="Sat, 01 Jan 2005 00:00:00 GMT""#,
        ))
        .mount(&a2)
        .await;

    let registry = registry_from(
        &[
            ("a1", &format!("{}/tm/", a1.uri()), 0.9),
            ("a2", &format!("{}/tm/", a2.uri()), 0.1),
        ],
        3,
    )
    .await;
    let client = build_client(Duration::from_secs(2), Duration::from_secs(30)).unwrap();
    let tap = tap();
    let deps = SessionDeps {
        client: &client,
        registry: &registry,
        settings: &settings(),
        top_k: 0,
        tap: &tap,
        map_base: "http://memgate.local/timemap".to_string(),
        gate_base: "http://memgate.local/timegate".to_string(),
    };

    let result = timemap(&deps, "http://example.com", Format::Link).await.unwrap();
    assert_eq!(result.memento_count, 3);
    let body = result.chunks.concat();
    let a1_1 = body.find("a1-1").unwrap();
    let a2_1 = body.find("a2-1").unwrap();
    let a1_2 = body.find("a1-2").unwrap();
    assert!(a1_1 < a2_1 && a2_1 < a1_2, "expected fused order A1_1, A2_1, A1_2");
    assert!(body.contains("first memento"));
    assert!(body.contains("last memento"));
}

#[tokio::test]
async fn timegate_redirects_to_closest_by_datetime() {
    let a1 = MockServer::start().await;
    Mock::given(path_regex(r"^/tm/.*"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<http://example.com/a1-1>; rel="memento"; datetime="Mon, 01 Jan 2001 00:00:00 GMT",
<http://example.com/a1-2>; rel="memento"; datetime="Fri, 01 Jan 2010 00:00:00 GMT""#,
        ))
        .mount(&a1)
        .await;
    let a2 = MockServer::start().await;
    Mock::given(path_regex(r"^/tm/.*"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<http://example.com/a2-1>; rel="memento"; datetime="Sat, 01 Jan 2005 00:00:00 GMT""#,
        ))
        .mount(&a2)
        .await;

    let registry = registry_from(
        &[
            ("a1", &format!("{}/tm/", a1.uri()), 0.9),
            ("a2", &format!("{}/tm/", a2.uri()), 0.1),
        ],
        3,
    )
    .await;
    let client = build_client(Duration::from_secs(2), Duration::from_secs(30)).unwrap();
    let tap = tap();
    let deps = SessionDeps {
        client: &client,
        registry: &registry,
        settings: &settings(),
        top_k: 0,
        tap: &tap,
        map_base: "http://memgate.local/timemap".to_string(),
        gate_base: "http://memgate.local/timegate".to_string(),
    };

    let target = Utc.with_ymd_and_hms(2007, 1, 1, 0, 0, 0).unwrap();
    let result = timegate(&deps, "http://example.com", target, Disposition::Redirect).await.unwrap();
    match result {
        TimegateResult::Redirect { location } => assert_eq!(location, "http://example.com/a2-1"),
        _ => panic!("expected redirect"),
    }
}

#[tokio::test]
async fn archive_goes_dormant_after_tolerance_failures() {
    let server = MockServer::start().await;
    Mock::given(path_regex(r"^/tm/.*"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let registry = registry_from(&[("flaky", &format!("{}/tm/", server.uri()), 0.5)], 3).await;
    let client = build_client(Duration::from_secs(2), Duration::from_secs(30)).unwrap();
    let tap = tap();
    let deps = SessionDeps {
        client: &client,
        registry: &registry,
        settings: &settings(),
        top_k: 0,
        tap: &tap,
        map_base: "http://memgate.local/timemap".to_string(),
        gate_base: "http://memgate.local/timegate".to_string(),
    };

    for _ in 0..2 {
        let _ = timemap(&deps, "http://example.com", Format::Link).await;
    }
    assert_eq!(registry.eligible().len(), 1);

    let _ = timemap(&deps, "http://example.com", Format::Link).await;
    assert_eq!(registry.eligible().len(), 0, "third failure should trip the archive dormant");
}

#[tokio::test]
async fn padded_year_only_datetime_resolves_closest() {
    let a1 = MockServer::start().await;
    Mock::given(path_regex(r"^/tm/.*"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<http://example.com/a1-1>; rel="memento"; datetime="Mon, 01 Jan 2001 00:00:00 GMT",
<http://example.com/a1-2>; rel="memento"; datetime="Fri, 01 Jan 2010 00:00:00 GMT""#,
        ))
        .mount(&a1)
        .await;

    let registry = registry_from(&[("a1", &format!("{}/tm/", a1.uri()), 0.9)], 3).await;
    let client = build_client(Duration::from_secs(2), Duration::from_secs(30)).unwrap();
    let tap = tap();
    let deps = SessionDeps {
        client: &client,
        registry: &registry,
        settings: &settings(),
        top_k: 0,
        tap: &tap,
        map_base: "http://memgate.local/timemap".to_string(),
        gate_base: "http://memgate.local/timegate".to_string(),
    };

    let target = memgate::datetime::parse_padded_datetime("2007").unwrap();
    let result = timegate(&deps, "http://example.com", target, Disposition::Redirect).await.unwrap();
    match result {
        TimegateResult::Redirect { location } => assert_eq!(location, "http://example.com/a1-1"),
        _ => panic!("expected redirect"),
    }
}

#[tokio::test]
async fn session_empty_when_all_archives_fail() {
    let server = MockServer::start().await;
    Mock::given(path_regex(r"^/tm/.*"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let registry = registry_from(&[("dead", &format!("{}/tm/", server.uri()), 0.5)], 0).await;
    let client = build_client(Duration::from_secs(2), Duration::from_secs(30)).unwrap();
    let tap = tap();
    let deps = SessionDeps {
        client: &client,
        registry: &registry,
        settings: &settings(),
        top_k: 0,
        tap: &tap,
        map_base: "http://memgate.local/timemap".to_string(),
        gate_base: "http://memgate.local/timegate".to_string(),
    };

    let result = timemap(&deps, "http://example.com", Format::Link).await;
    assert!(matches!(result, Err(memgate::MemgateError::SessionEmpty(_))));
}
