//! HTTP API - reading ingest, debug scenarios, uplink buffer and metrics
//!
//! Routes:
//! - `POST /api/radar/sample` - run one reading through the pipeline
//! - `GET /api/debug/simulate` - fixed overspeed scenario at the sensor
//! - `GET /api/debug/simulate_normal?speed_mph=` - normal driving at the sensor
//! - `GET /api/debug/simulate_case?speed_mph=&distance_miles=` - parametric case
//!
//! The debug routes also answer on their camelCase paths (`simulateNormal`,
//! `simulateCase`) with `speedMph` / `distanceMiles` parameters, and the
//! reading body accepts camelCase field names.
//! - `GET|DELETE /api/uplink/buffer` - inspect or clear buffered records
//! - `GET /metrics`, `GET /health`
//!
//! Uses hyper http1 with one task per connection.

use crate::domain::types::Reading;
use crate::io::prometheus::format_prometheus_metrics;
use crate::services::enforcement::EnforcementService;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Default speed for the normal driving scenario (mph)
const NORMAL_SCENARIO_SPEED_MPH: f64 = 30.0;

/// Speed for the fixed violation scenario (mph)
const VIOLATION_SCENARIO_SPEED_MPH: f64 = 50.0;

fn respond(status: StatusCode, content_type: &str, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", content_type)
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(body.into()))
        .expect("static response should not fail")
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(bytes) => respond(status, "application/json", bytes),
        Err(e) => {
            error!(error = %e, "http_serialize_error");
            respond(StatusCode::INTERNAL_SERVER_ERROR, "application/json", r#"{"error":"serialize"}"#)
        }
    }
}

fn bad_request(message: String) -> Response<Full<Bytes>> {
    warn!(error = %message, "http_bad_request");
    json_response(StatusCode::BAD_REQUEST, &json!({ "error": message }))
}

/// Look up a query parameter by name (no percent-decoding; values are numeric)
fn query_param<'a>(query: Option<&'a str>, key: &str) -> Option<&'a str> {
    query?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then_some(v)
    })
}

/// Parse the first of `keys` present in the query as a number
fn parse_f64_param(query: Option<&str>, keys: &[&str]) -> Result<Option<f64>, String> {
    let Some((key, raw)) = keys.iter().find_map(|&k| query_param(query, k).map(|v| (k, v))) else {
        return Ok(None);
    };
    raw.parse::<f64>()
        .map(Some)
        .map_err(|e| format!("invalid {}={:?}: {}", key, raw, e))
}

const SPEED_KEYS: [&str; 2] = ["speed_mph", "speedMph"];
const DISTANCE_KEYS: [&str; 2] = ["distance_miles", "distanceMiles"];

/// Run a reading through the service and wrap the trace with a mode label
async fn run_scenario(
    service: &EnforcementService,
    mode: &str,
    reading: Reading,
) -> Response<Full<Bytes>> {
    match service.ingest(reading).await {
        Ok(trace) => json_response(StatusCode::OK, &json!({ "mode": mode, "trace": trace })),
        Err(e) => bad_request(e.to_string()),
    }
}

async fn handle_sample(
    req: Request<hyper::body::Incoming>,
    service: &EnforcementService,
) -> Response<Full<Bytes>> {
    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => return bad_request(format!("failed to read body: {}", e)),
    };

    let reading: Reading = match serde_json::from_slice(&body) {
        Ok(reading) => reading,
        Err(e) => return bad_request(format!("invalid reading: {}", e)),
    };

    match service.ingest(reading).await {
        Ok(trace) => json_response(StatusCode::OK, &trace),
        Err(e) => bad_request(e.to_string()),
    }
}

/// Handle HTTP requests
async fn handle_request(
    req: Request<hyper::body::Incoming>,
    service: Arc<EnforcementService>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let query = req.uri().query().map(str::to_owned);
    let query = query.as_deref();

    let response = match (&method, path.as_str()) {
        (&Method::POST, "/api/radar/sample") => handle_sample(req, &service).await,
        (&Method::GET, "/api/debug/simulate") => {
            let reading = Reading::new(0.0, VIOLATION_SCENARIO_SPEED_MPH);
            run_scenario(&service, "overspeed-violation-fixed", reading).await
        }
        (&Method::GET, "/api/debug/simulate_normal" | "/api/debug/simulateNormal") => {
            match parse_f64_param(query, &SPEED_KEYS) {
                Ok(speed) => {
                    let reading = Reading::new(0.0, speed.unwrap_or(NORMAL_SCENARIO_SPEED_MPH));
                    run_scenario(&service, "normal-driving", reading).await
                }
                Err(e) => bad_request(e),
            }
        }
        (&Method::GET, "/api/debug/simulate_case" | "/api/debug/simulateCase") => {
            let speed = parse_f64_param(query, &SPEED_KEYS);
            let distance = parse_f64_param(query, &DISTANCE_KEYS);
            match (speed, distance) {
                (Ok(Some(speed)), Ok(Some(distance))) => {
                    run_scenario(&service, "custom-case", Reading::new(distance, speed)).await
                }
                (Err(e), _) | (_, Err(e)) => bad_request(e),
                _ => bad_request("speed_mph and distance_miles are required".to_string()),
            }
        }
        (&Method::GET, "/api/uplink/buffer") => {
            let records = service.buffered_records();
            let summaries: Vec<serde_json::Value> = records.iter().map(|r| r.summary()).collect();
            json_response(
                StatusCode::OK,
                &json!({ "count": summaries.len(), "records": summaries }),
            )
        }
        (&Method::DELETE, "/api/uplink/buffer") => {
            let cleared = service.clear_buffer();
            info!(cleared = %cleared, "uplink_buffer_cleared");
            json_response(StatusCode::OK, &json!({ "cleared": cleared }))
        }
        (&Method::GET, "/metrics") => {
            let buffered = service.buffered_records().len();
            let body = format_prometheus_metrics(service.metrics(), buffered, service.site_id());
            respond(StatusCode::OK, "text/plain; version=0.0.4; charset=utf-8", body)
        }
        (&Method::GET, "/health") => respond(StatusCode::OK, "text/plain", "ok"),
        _ => respond(StatusCode::NOT_FOUND, "text/plain", "Not Found"),
    };

    Ok(response)
}

/// Serve requests on an already bound listener until shutdown
pub async fn serve(
    listener: TcpListener,
    service: Arc<EnforcementService>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _addr)) => {
                        let io = TokioIo::new(stream);
                        let service = service.clone();

                        tokio::spawn(async move {
                            let svc = service_fn(move |req| {
                                let service = service.clone();
                                async move { handle_request(req, service).await }
                            });

                            if let Err(e) = http1::Builder::new()
                                .serve_connection(io, svc)
                                .await
                            {
                                error!(error = %e, "http_connection_error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "http_accept_error");
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("http_server_shutdown");
                    return Ok(());
                }
            }
        }
    }
}

/// Bind and start the HTTP server
pub async fn start_http_server(
    bind_address: &str,
    port: u16,
    service: Arc<EnforcementService>,
    shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind((bind_address, port)).await?;

    info!(
        bind_address = %bind_address,
        port = %port,
        site = %service.site_id(),
        "http_server_started"
    );

    serve(listener, service, shutdown).await
}
