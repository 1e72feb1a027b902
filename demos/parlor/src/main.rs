//! Parlor: a runnable Dicehall server with the default dice engine.
//!
//! Configuration comes from the environment:
//! - `BIND_ADDR`    — listen address (default `127.0.0.1:8080`)
//! - `SESSION_KEY`  — secret for session-token encryption
//! - `RUST_LOG`     — tracing filter (default `info`)

use dicehall::prelude::*;

#[tokio::main]
async fn main() -> Result<(), DicehallError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let bind_addr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    let server = DicehallServer::builder()
        .bind(&bind_addr)
        .build(PrngEngine)
        .await?;

    tracing::info!(addr = %bind_addr, "parlor is open");
    server.run().await
}
