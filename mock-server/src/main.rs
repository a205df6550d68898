use mock_server::ReplayLog;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let log = match std::env::var("REPLAY_LOG") {
        Ok(path) => ReplayLog::from_file(&path)?,
        Err(_) => ReplayLog::default(),
    };
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, recordings = log.calls.len(), "replay server listening");
    mock_server::run(listener, log).await
}
