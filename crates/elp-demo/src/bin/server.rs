//! Demo server exposing one protected endpoint, `GET /api/v1/resource`,
//! behind the `elp-axum` middleware. The handler itself sleeps a random
//! 10-50ms before responding, same as a real downstream call would, so
//! the equalizer's 15-60ms window has something realistic to cover.

use std::net::SocketAddr;

use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use rand::Rng;
use serde_json::json;

use elp_axum::EwLayer;
use elp_core::{Engine, EngineConfig};

#[derive(Parser)]
struct Args {
    /// HMAC secret shared with clients. In production this comes from a
    /// secret store, never a CLI flag.
    #[arg(long, env = "ELP_SECRET", default_value = "SUA_CHAVE_MESTRA_AQUI")]
    secret: String,

    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,
}

async fn resource_handler() -> impl IntoResponse {
    let jitter_ms = rand::thread_rng().gen_range(10..=50);
    tokio::time::sleep(std::time::Duration::from_millis(jitter_ms)).await;

    Json(json!({
        "status": "success",
        "transaction_id": "11111111-2222-3333-4444-555555555555",
        "timestamp": elp_core::freshness::now_ms().unwrap_or(0),
        "data": {
            "account_type": "checking",
            "balance": 18234.57,
            "currency": "BRL",
            "flags": ["verified", "secure"],
            "senha": "hunter2",
            "cpf": "12345678901",
        },
        "meta": {
            "processing_time_ms": jitter_ms,
            "region": "us-east-1",
        }
    }))
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let engine = Engine::new(
        EngineConfig::builder()
            .secret(args.secret.into_bytes())
            .build()
            .expect("valid engine configuration"),
    );

    let app = Router::new()
        .route("/api/v1/resource", get(resource_handler))
        .layer(EwLayer::new(engine));

    log::info!("listening on {}", args.listen);
    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .expect("failed to bind listener");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server error");
}
