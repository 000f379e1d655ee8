use std::{env, sync::Arc};

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};
use upstream::Fixture;

const DEFAULT_PORT: &str = "9876";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let port = env::var("TESTER_PORT").unwrap_or_else(|_| DEFAULT_PORT.to_string());
    let fixture = Arc::new(Fixture::sample(12, 6).with_comments(3, 9).with_comments(17, 9));

    let address = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&address).await?;
    info!("Mock collaborator running on {address}");

    axum::serve(listener, tester::router(fixture)).await?;

    Ok(())
}
