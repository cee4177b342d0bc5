#[tokio::main]
async fn main() {
    agent_platform_backend::run().await;
}
