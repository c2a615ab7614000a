#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bharat_engine_lib::run().await
}
