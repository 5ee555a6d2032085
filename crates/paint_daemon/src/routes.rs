use crate::state::AppState;
use crate::tick_loop::{forward_snapshots, run_tick_loop};
use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{
        sse::{Event, Sse},
        Json,
    },
    routing::{get, post},
    Router,
};
use paint_core::Snapshot;
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

const SNAPSHOT_BUFFER: usize = 16;

#[cfg(test)]
pub fn make_router(state: AppState) -> Router {
    make_router_with_cors(state, HeaderValue::from_static("http://localhost:5173"))
}

pub fn make_router_with_cors(state: AppState, cors_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/meta", get(meta_handler))
        .route("/api/v1/snapshot", get(snapshot_handler))
        .route("/api/v1/stream", get(stream_handler))
        .route("/api/v1/start", post(start_handler))
        .route("/api/v1/stop", post(stop_handler))
        .route("/api/v1/reset", post(reset_handler))
        .route("/api/v1/speed", post(speed_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn meta_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    let sim = app_state.sim.lock();
    Json(serde_json::json!({
        "run_id": sim.run.id(),
        "tick": sim.run.tick(),
        "seed": sim.seed,
        "running": app_state.control.is_running(),
        "tick_delay_secs": app_state.control.delay().as_secs_f64(),
        "vehicles_remaining": sim.feeder.remaining(),
    }))
}

pub async fn snapshot_handler(
    State(app_state): State<AppState>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let snapshot = app_state.sim.lock().run.snapshot();
    match serde_json::to_string(&snapshot) {
        Ok(json) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            json,
        ),
        Err(err) => {
            tracing::error!("snapshot serialization failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "application/json")],
                r#"{"error":"serialization failed"}"#.to_string(),
            )
        }
    }
}

pub async fn start_handler(
    State(app_state): State<AppState>,
) -> (StatusCode, Json<serde_json::Value>) {
    if !app_state.control.try_begin() {
        return (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"error": "simulation already running"})),
        );
    }

    let restarted = {
        let mut sim = app_state.sim.lock();
        sim.restart().map(|()| sim.run.id())
    };
    let run_id = match restarted {
        Ok(run_id) => run_id,
        Err(err) => {
            app_state.control.finish();
            tracing::error!("restart failed: {err:#}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("{err:#}")})),
            );
        }
    };

    let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);
    tokio::spawn(forward_snapshots(rx, app_state.snapshot_tx.clone()));
    tokio::spawn(run_tick_loop(
        app_state.sim.clone(),
        app_state.control.clone(),
        tx,
        app_state.send_timeout,
    ));
    tracing::info!(%run_id, "simulation started");

    (
        StatusCode::OK,
        Json(serde_json::json!({"started": true, "run_id": run_id})),
    )
}

pub async fn stop_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    let was_running = app_state.control.is_running();
    app_state.control.request_stop();
    tracing::info!(was_running, "stop requested");
    Json(serde_json::json!({"stopping": was_running}))
}

/// Stops any active loop and replaces the run with a fresh one. The new
/// snapshot is returned and pushed to stream subscribers.
pub async fn reset_handler(
    State(app_state): State<AppState>,
) -> Result<Json<Snapshot>, (StatusCode, Json<serde_json::Value>)> {
    app_state.control.request_stop();
    let reset = {
        let mut sim = app_state.sim.lock();
        sim.restart().map(|()| sim.run.snapshot())
    };
    match reset {
        Ok(snapshot) => {
            tracing::info!(run_id = %snapshot.run_id, "simulation reset");
            let _ = app_state.snapshot_tx.send(snapshot.clone());
            Ok(Json(snapshot))
        }
        Err(err) => {
            tracing::error!("reset failed: {err:#}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("{err:#}")})),
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SpeedRequest {
    pub seconds: f64,
}

pub async fn speed_handler(
    State(app_state): State<AppState>,
    Json(request): Json<SpeedRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    match app_state.control.set_delay_secs(request.seconds) {
        Some(delay) => {
            tracing::info!(seconds = delay.as_secs_f64(), "tick delay changed");
            (
                StatusCode::OK,
                Json(serde_json::json!({"seconds": delay.as_secs_f64()})),
            )
        }
        None => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": format!(
                    "seconds must be positive and at most {}",
                    paint_core::MAX_TICK_DELAY_SECS
                )
            })),
        ),
    }
}

pub async fn stream_handler(
    State(app_state): State<AppState>,
) -> Sse<impl futures_core::Stream<Item = Result<Event, Infallible>>> {
    let mut rx = app_state.snapshot_tx.subscribe();
    let sim = app_state.sim.clone();

    let stream = async_stream::stream! {
        let mut heartbeat = tokio::time::interval(Duration::from_secs(5));
        heartbeat.tick().await; // discard the immediate first tick
        loop {
            tokio::select! {
                result = rx.recv() => {
                    match result {
                        Ok(snapshot) => {
                            let data = serde_json::to_string(&snapshot).unwrap_or_default();
                            yield Ok(Event::default().event("snapshot").data(data));
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::debug!(skipped, "stream subscriber lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                _ = heartbeat.tick() => {
                    let tick = sim.lock().run.tick();
                    let hb = serde_json::json!({"heartbeat": true, "tick": tick});
                    yield Ok(Event::default().data(hb.to_string()));
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use crate::state::SimState;
    use http_body_util::BodyExt;
    use paint_control::TickSource;
    use paint_core::test_fixtures::base_config;
    use tower::ServiceExt;

    fn make_test_state() -> AppState {
        AppState::new(base_config(), 0).unwrap()
    }

    async fn send(
        app: Router,
        method: Method,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let request = builder
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_meta_reports_idle_run() {
        let state = make_test_state();
        let run_id = state.sim.lock().run.id().to_string();
        let (status, json) = send(make_router(state), Method::GET, "/api/v1/meta", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["tick"], 0);
        assert_eq!(json["seed"], 0);
        assert_eq!(json["running"], false);
        assert_eq!(json["run_id"], run_id.as_str());
        assert_eq!(json["vehicles_remaining"], 50);
    }

    #[tokio::test]
    async fn test_snapshot_is_idempotent() {
        let state = make_test_state();
        let app = make_router(state);
        let (status, first) = send(app.clone(), Method::GET, "/api/v1/snapshot", None).await;
        let (_, second) = send(app, Method::GET, "/api/v1/snapshot", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first, second);
        assert_eq!(first["tick"], 0);
        assert_eq!(first["lanes"]["stage1"].as_array().unwrap().len(), 4);
        assert_eq!(first["lanes"]["stage2"].as_array().unwrap().len(), 5);
        assert_eq!(first["kpis"]["target_jph"], 900);
    }

    #[tokio::test]
    async fn test_speed_rejects_non_positive() {
        let state = make_test_state();
        let app = make_router(state.clone());
        let (status, _) = send(
            app.clone(),
            Method::POST,
            "/api/v1/speed",
            Some(r#"{"seconds": 0}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(state.control.delay(), Duration::from_secs(1));

        let (status, json) = send(
            app,
            Method::POST,
            "/api/v1/speed",
            Some(r#"{"seconds": 0.5}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["seconds"], 0.5);
        assert_eq!(state.control.delay(), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_speed_rejects_out_of_range() {
        let state = make_test_state();
        let app = make_router(state.clone());
        let (status, json) = send(
            app,
            Method::POST,
            "/api/v1/speed",
            Some(r#"{"seconds": 1e300}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("at most"));
        assert_eq!(state.control.delay(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_start_twice_conflicts_until_stopped() {
        let state = make_test_state();
        let app = make_router(state.clone());
        let idle_run = state.sim.lock().run.id();

        let (status, json) = send(app.clone(), Method::POST, "/api/v1/start", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_ne!(json["run_id"], idle_run.to_string().as_str());
        assert!(state.control.is_running());

        let (status, _) = send(app.clone(), Method::POST, "/api/v1/start", None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, json) = send(app, Method::POST, "/api/v1/stop", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["stopping"], true);
        assert!(state.control.stop_requested());
    }

    #[tokio::test]
    async fn test_reset_returns_fresh_snapshot() {
        let state = make_test_state();
        {
            let mut sim = state.sim.lock();
            let SimState { run, feeder, .. } = &mut *sim;
            let action = feeder.next_action(run).unwrap();
            run.apply(&action);
        }
        let mut sub = state.snapshot_tx.subscribe();
        let app = make_router(state.clone());
        let (status, json) = send(app, Method::POST, "/api/v1/reset", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["tick"], 0);
        assert_eq!(json["kpis"]["throughput"], 0);
        assert_eq!(state.sim.lock().run.tick(), 0);
        assert_eq!(sub.recv().await.unwrap().tick, 0);
    }
}
