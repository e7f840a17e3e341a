// memgate: axum handlers for the HTTP surface (§6)
//
// Header/redirect/proxy shaping grounded on
// examples/original_source/main.go's memgatorService: 302 to the closest
// URI for redirect/linkheader dispositions, flattened Link header with
// Vary: accept-datetime, X-Memento-Count on timemap responses only.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use futures::stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

use crate::bench::BenchmarkTap;
use crate::config::Format;
use crate::datetime::{parse_padded_datetime, parse_rfc1123};
use crate::error::MemgateError;
use crate::fetch::FetchSettings;
use crate::session::{timegate, timemap, Disposition, SessionDeps, TimegateResult};
use crate::uri::normalize_urir;

use super::AppState;

fn error_response(err: MemgateError) -> Response {
    let status = match &err {
        MemgateError::MalformedUri(_) | MemgateError::MalformedDatetime(_) | MemgateError::UnknownFormat(_) => {
            StatusCode::BAD_REQUEST
        }
        MemgateError::SessionEmpty(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string()).into_response()
}

fn deps<'a>(
    state: &'a AppState,
    settings: &'a FetchSettings,
    tap: &'a BenchmarkTap,
) -> SessionDeps<'a> {
    SessionDeps {
        client: &state.client,
        registry: &state.registry,
        settings,
        top_k: state.top_k,
        tap,
        map_base: state.map_base.clone(),
        gate_base: state.gate_base.clone(),
    }
}

pub async fn welcome(State(state): State<AppState>) -> impl IntoResponse {
    format!(
        "TimeMap             : {0}/link|json|cdxj/{{URI-R}}\n\
         TimeGate            : {1}/{{URI-R}} [Accept-Datetime Header]\n\
         Memento Description : {2}/memento/link|json|cdxj/{{YYYY[MM[DD[hh[mm[ss]]]]]}}/{{URI-R}}\n\
         Memento Redirect    : {2}/memento/{{YYYY[MM[DD[hh[mm[ss]]]]]}}/{{URI-R}}\n",
        state.map_base, state.gate_base, state.service_base
    )
}

pub async fn timemap_route(
    State(state): State<AppState>,
    Path((format, urir)): Path<(String, String)>,
) -> Response {
    let format = match Format::parse(&format) {
        Ok(f) => f,
        Err(e) => return error_response(e),
    };
    let urir = match normalize_urir(&urir) {
        Ok(u) => u,
        Err(e) => return error_response(e),
    };
    let settings = state.settings.clone();
    let result = timemap(&deps(&state, &settings, &state.tap), &urir, format).await;
    match result {
        Ok(r) => {
            let mut headers = HeaderMap::new();
            headers.insert("X-Memento-Count", HeaderValue::from_str(&r.memento_count.to_string()).unwrap());
            (headers, r.chunks.concat()).into_response()
        }
        Err(e) => error_response(e),
    }
}
pub use timemap_route as timemap;

fn accept_datetime_or_now(headers: &HeaderMap) -> Result<chrono::DateTime<Utc>, MemgateError> {
    match headers.get("Accept-Datetime") {
        None => Ok(Utc::now()),
        Some(v) => {
            let raw = v.to_str().map_err(|_| MemgateError::MalformedDatetime("Accept-Datetime".to_string()))?;
            parse_rfc1123(raw).ok_or_else(|| MemgateError::MalformedDatetime(raw.to_string()))
        }
    }
}

pub async fn timegate_route(
    State(state): State<AppState>,
    Path(urir): Path<String>,
    headers: HeaderMap,
) -> Response {
    let urir = match normalize_urir(&urir) {
        Ok(u) => u,
        Err(e) => return error_response(e),
    };
    let accept_datetime = match accept_datetime_or_now(&headers) {
        Ok(d) => d,
        Err(e) => return error_response(e),
    };
    let settings = state.settings.clone();
    let result = timegate(&deps(&state, &settings, &state.tap), &urir, accept_datetime, Disposition::LinkHeader).await;
    match result {
        Ok(TimegateResult::LinkHeader { location, link_header }) => {
            let mut out = (StatusCode::FOUND, ()).into_response();
            let h = out.headers_mut();
            h.insert("Location", HeaderValue::from_str(&location).unwrap_or(HeaderValue::from_static("")));
            h.insert("Link", HeaderValue::from_str(&link_header).unwrap_or(HeaderValue::from_static("")));
            h.insert("Vary", HeaderValue::from_static("accept-datetime"));
            out
        }
        Ok(_) => unreachable!("timegate with LinkHeader disposition always returns LinkHeader"),
        Err(e) => error_response(e),
    }
}
pub use timegate_route as timegate;

fn parse_datetime_segment(raw: &str) -> Result<chrono::DateTime<Utc>, MemgateError> {
    parse_padded_datetime(raw)
}

pub async fn memento_describe_or_proxy(
    State(state): State<AppState>,
    Path((format, datetime, urir)): Path<(String, String, String)>,
) -> Response {
    let urir = match normalize_urir(&urir) {
        Ok(u) => u,
        Err(e) => return error_response(e),
    };
    let accept_datetime = match parse_datetime_segment(&datetime) {
        Ok(d) => d,
        Err(e) => return error_response(e),
    };
    let settings = state.settings.clone();

    if format.eq_ignore_ascii_case("proxy") {
        let result = timegate(&deps(&state, &settings, &state.tap), &urir, accept_datetime, Disposition::Proxy).await;
        return match result {
            Ok(TimegateResult::Proxy { location }) => {
                crate::server::proxy::stream_proxy(&state.client, &location).await
            }
            Ok(_) => unreachable!(),
            Err(e) => error_response(e),
        };
    }

    let fmt = match Format::parse(&format) {
        Ok(f) => f,
        Err(e) => return error_response(e),
    };
    let result = timegate(&deps(&state, &settings, &state.tap), &urir, accept_datetime, Disposition::Describe(fmt)).await;
    match result {
        Ok(TimegateResult::Describe { chunks }) => chunks.concat().into_response(),
        Ok(_) => unreachable!(),
        Err(e) => error_response(e),
    }
}

pub async fn memento_redirect(
    State(state): State<AppState>,
    Path((datetime, urir)): Path<(String, String)>,
) -> Response {
    let urir = match normalize_urir(&urir) {
        Ok(u) => u,
        Err(e) => return error_response(e),
    };
    let accept_datetime = match parse_datetime_segment(&datetime) {
        Ok(d) => d,
        Err(e) => return error_response(e),
    };
    let settings = state.settings.clone();
    let result = timegate(&deps(&state, &settings, &state.tap), &urir, accept_datetime, Disposition::Redirect).await;
    match result {
        Ok(TimegateResult::Redirect { location }) => {
            let mut out = (StatusCode::FOUND, ()).into_response();
            out.headers_mut()
                .insert("Location", HeaderValue::from_str(&location).unwrap_or(HeaderValue::from_static("")));
            out
        }
        Ok(_) => unreachable!(),
        Err(e) => error_response(e),
    }
}

pub async fn monitor(State(state): State<AppState>) -> Response {
    let Some(broker) = state.broker.clone() else {
        return (StatusCode::NOT_FOUND, "monitoring is disabled").into_response();
    };
    let Some((_id, rx)) = broker.subscribe().await else {
        return (StatusCode::INTERNAL_SERVER_ERROR, "broker unavailable").into_response();
    };
    let stream = ReceiverStream::new(rx).map(|json| Ok::<_, std::convert::Infallible>(Event::default().data(json)));
    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}
