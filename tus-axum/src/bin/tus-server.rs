use anyhow::Result;
use tus_axum::{ServerConfig, TusApp};
use tus_core::{MemoryStore, TusServer};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::from_env("TUS__")?;
    let server = TusServer::new(MemoryStore::new(), config.tus.clone())?;
    let app = TusApp::from_config(server, &config);

    let addr = config.addr();
    tracing::info!("[tus] listening on http://{}{}", addr, config.base_path);

    app.listen(addr).await?;

    Ok(())
}
