use analyst_backend::{Behavior, MockBackend};
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let addr = env::var("ANALYST_MOCK_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_string());
    let behavior = Behavior {
        layer_frames: env::var("ANALYST_MOCK_LAYER_FRAMES").is_ok(),
        ..Behavior::default()
    };

    tracing::info!("Starting Analyst mock backend on {}", addr);
    MockBackend::with_behavior(behavior).serve(&addr).await
}
