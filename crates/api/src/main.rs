use anyhow::Context;

use casetrack_api::{app, config::ApiConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    casetrack_observability::init();

    let config = ApiConfig::from_env()?;
    let app = app::build_app(&config);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "casetrack api listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
