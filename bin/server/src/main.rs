use minigraph_config::load_config;
use minigraph_server::{
    listen, logger::configure_logging, tutorial::tutorial_executor, ServerInitError,
};
use mimalloc::MiMalloc;
use tokio::signal;
use tracing::{error, warn};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!("Failed to start the server: {}", err);
        eprintln!("Failed to start the server: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ServerInitError> {
    let config_path = std::env::var("MINIGRAPH_CONFIG_FILE_PATH").ok();
    let config = load_config(config_path)?;
    configure_logging(&config.log)?;

    let executor = tutorial_executor()?;
    let server = listen(&config, executor).await?;
    server.run_until(shutdown_signal()).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
