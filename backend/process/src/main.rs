use std::{sync::Arc, time::Duration};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use process::{Aggregator, models::ViewKind};
use tracing_subscriber::{EnvFilter, fmt};
use upstream::{Authenticator, Credentials, HttpAuthenticator, HttpSource, Source, TokenProvider};

/// Computes one view straight from the collaborator and prints it as JSON.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, value_enum)]
    view: ViewArg,

    #[arg(long, env = "UPSTREAM_URL", default_value = "http://localhost:9876")]
    upstream_url: String,

    #[arg(long, env = "CLIENT_ID")]
    client_id: String,

    #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
    client_secret: String,

    #[arg(long, env = "FETCH_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ViewArg {
    Users,
    Latest,
    Popular,
}

impl From<ViewArg> for ViewKind {
    fn from(view: ViewArg) -> Self {
        match view {
            ViewArg::Users => ViewKind::TopUsers,
            ViewArg::Latest => ViewKind::LatestPosts,
            ViewArg::Popular => ViewKind::PopularPosts,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    let http = reqwest::Client::new();
    let authenticator: Arc<dyn Authenticator> = Arc::new(HttpAuthenticator::new(
        http.clone(),
        &args.upstream_url,
        Credentials::new(args.client_id, args.client_secret),
    ));
    let tokens = Arc::new(TokenProvider::new(authenticator, Duration::from_secs(60)));
    let source: Arc<dyn Source> = Arc::new(HttpSource::new(http, &args.upstream_url, tokens));

    let view = Aggregator::new(source)
        .with_concurrency(args.concurrency)
        .compute(args.view.into())
        .await
        .context("Failed to compute view")?;

    println!("{}", serde_json::to_string_pretty(&view.items()?)?);

    Ok(())
}
