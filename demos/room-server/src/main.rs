use roomcast::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND: &str = "0.0.0.0:12345";

/// Picks the listen address: `ROOMCAST_BIND` if set and non-empty.
fn bind_addr(from_env: Option<String>) -> String {
    from_env
        .filter(|addr| !addr.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BIND.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = bind_addr(std::env::var("ROOMCAST_BIND").ok());
    tracing::info!(%addr, "starting room server");

    let server = RoomcastServer::builder().bind(&addr).build().await?;
    server.run().await?;
    Ok(())
}
