// Server module entry point
// Accept loop serving an Application until Ctrl+C

pub mod connection;
pub mod listener;

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

pub use connection::ConnectionSettings;
pub use listener::create_reusable_listener;

use crate::app::Application;
use crate::config::Config;
use crate::error::Result;
use crate::logger;

/// Bind the configured address and serve `app` until Ctrl+C
pub async fn serve(app: Arc<Application>, config: &Config) -> Result<()> {
    let addr = config.socket_addr()?;
    let listener = create_reusable_listener(addr)?;
    logger::log_server_start(&listener.local_addr()?, config);

    let settings = ConnectionSettings {
        keep_alive: config.performance.keep_alive,
        timeout: Duration::from_secs(config.performance.request_timeout),
    };
    serve_listener(listener, app, settings, shutdown_signal()).await;
    Ok(())
}

/// Accept connections on `listener` until `shutdown` completes
pub async fn serve_listener<F>(
    listener: TcpListener,
    app: Arc<Application>,
    settings: ConnectionSettings,
    shutdown: F,
) where
    F: std::future::Future<Output = ()>,
{
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        connection::handle_connection(stream, peer_addr, Arc::clone(&app), settings);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }
            () = &mut shutdown => {
                logger::log_server_stop();
                break;
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        logger::log_error(&format!("Failed to listen for Ctrl+C: {e}"));
        std::future::pending::<()>().await;
    }
}
