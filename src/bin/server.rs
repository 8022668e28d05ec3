use std::time::Duration;

use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use row_packer::Error;
use row_packer::solver::{CancelToken, Solver};
use row_packer::types::{PackingResult, Rect};
use serde::{Deserialize, Serialize};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Deserialize, Serialize)]
struct PackRequest {
    container: Rect,
    pieces: Vec<Rect>,
    #[serde(default = "default_time_limit_ms")]
    time_limit_ms: u64,
}

fn default_time_limit_ms() -> u64 {
    10_000
}

#[derive(Serialize)]
struct PackResponse {
    #[serde(flatten)]
    result: PackingResult,
    container_count: usize,
    waste_percent: f64,
}

async fn pack(Json(req): Json<PackRequest>) -> Result<Json<PackResponse>, (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /pack"
    );

    let solver = Solver::new(req.container, &req.pieces)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let cancel = CancelToken::new();
    let timer = {
        let cancel = cancel.clone();
        let limit = Duration::from_millis(req.time_limit_ms);
        tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            tracing::warn!(?limit, "time limit reached, returning best layout so far");
            cancel.cancel();
        })
    };

    let outcome = tokio::task::spawn_blocking(move || solver.solve(&cancel)).await;
    timer.abort();

    match outcome {
        Ok(Ok(result)) => Ok(Json(PackResponse {
            container_count: result.container_count(),
            waste_percent: result.waste_percent(),
            result,
        })),
        Ok(Err(e @ Error::NoFeasibleSolution)) => {
            Err((StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
        }
        Ok(Err(e)) => Err((StatusCode::BAD_REQUEST, e.to_string())),
        Err(e) => {
            tracing::error!(error = %e, "search task failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "search task failed".to_string(),
            ))
        }
    }
}

fn main() {
    let _sentry = sentry::init(sentry::ClientOptions {
        dsn: std::env::var("SENTRY_DSN")
            .ok()
            .and_then(|dsn| dsn.parse().ok()),
        release: sentry::release_name!(),
        ..Default::default()
    });

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .expect("failed to open development.log");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
        .block_on(serve());
}

async fn serve() {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let app = Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/pack", post(pack))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    eprintln!("Listening on {addr}");
    axum::serve(listener, app).await.unwrap();
}
