use std::sync::Arc;
use std::time::Duration;

use menudesk::config::AppConfig;
use menudesk::manager::Manager;
use menudesk::respond::WebhookResponder;
use menudesk::services::sweeper::spawn_session_sweeper;
use menudesk::state::AppState;
use menudesk::stream::fetch::HttpFetcher;
use menudesk::stream::{ImageStreamer, StreamConfig};
use menudesk::{demo, routes};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env()?;
    let stream_config = StreamConfig::from_env();

    let responder = Arc::new(WebhookResponder::new(&config)?);
    let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(config.connect_timeout_secs))?);
    let streamer = Arc::new(ImageStreamer::new(fetcher, stream_config));

    let mut manager = Manager::new(responder);
    manager.add_pages(demo::pages(streamer, config.demo_image_urls.clone()));
    tracing::info!(pages = manager.page_count(), "menudesk: pages registered");

    let state = AppState::new(manager);

    // Spawn background session sweeper.
    let _sweeper = spawn_session_sweeper(state.sessions.clone(), config.session_idle, config.session_sweep);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    tracing::info!(port = config.port, "menudesk listening");
    axum::serve(listener, app).await?;
    Ok(())
}
