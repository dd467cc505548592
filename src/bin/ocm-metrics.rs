#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ocm_ui_terminal::run().await
}
