#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pulse_server::start_server().await
}
