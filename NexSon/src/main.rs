use nexconfig::get_config;
use nexserver::{LoggingOptions, ServerBuilder};
use nexstream::NexStreamExt;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ========== PHASE 1 : Infrastructure ==========
    let config = get_config();
    let mut server = ServerBuilder::new_configured().build();

    server
        .init_logging(LoggingOptions::from_config(&config))
        .await;

    let server_info = server.info();
    server
        .add_route("/info", move || {
            let server_info = server_info.clone();
            async move { server_info }
        })
        .await;

    // ========== PHASE 2 : Service musical ==========
    info!("🎵 Initializing music service...");
    server.init_music_service().await?;

    // ========== PHASE 3 : Démarrage du serveur ==========
    info!("🌐 Starting HTTP server...");
    server.start().await?;

    info!("✅ {} is ready!", config.get_service_name());
    info!("Press Ctrl+C to stop...");
    server.wait().await;

    Ok(())
}
