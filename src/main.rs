use anyhow::Result;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;

use ara_template_preview::config::Settings;
use ara_template_preview::server::{create_app, AppState};
use ara_template_preview::tasks::SessionCleanupTask;
use ara_template_preview::telemetry::init_telemetry;
use ara_template_preview::template::TemplateRenderer;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing
    init_telemetry(&settings.logging)?;
    tracing::info!("Configuration loaded");

    // Create application state
    let state = AppState::new(settings.clone());
    tracing::info!(renderer = state.renderer.kind(), "Application state initialized");

    // Start idle session cleanup in background
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let cleanup_task = SessionCleanupTask::new(
        settings.preview.clone(),
        state.preview_sessions.clone(),
        shutdown_tx.subscribe(),
    );
    let cleanup_handle = tokio::spawn(cleanup_task.run());

    // Create Axum app
    let app = create_app(state);

    // Start server
    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal_handler(shutdown_tx))
        .await?;

    // Wait for background tasks to finish
    let _ = cleanup_handle.await;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal_handler(shutdown_tx: broadcast::Sender<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }

    // Stop background tasks
    let _ = shutdown_tx.send(());
}
