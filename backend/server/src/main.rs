#[tokio::main]
async fn main() -> anyhow::Result<()> {
    live_display::start_server().await
}
