// Connection handling module
// Serves one accepted TCP connection with the application

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;

use crate::app::Application;
use crate::logger;

/// Per-connection settings taken from the performance configuration
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub keep_alive: bool,
    pub timeout: Duration,
}

/// Serve `stream` in a spawned task
pub fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    app: Arc<Application>,
    settings: ConnectionSettings,
) {
    logger::log_connection_accepted(&peer_addr);

    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let mut builder = http1::Builder::new();
        builder.keep_alive(settings.keep_alive);

        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let app = Arc::clone(&app);
                async move { app.handle(req, Some(peer_addr)).await }
            }),
        );

        match tokio::time::timeout(settings.timeout, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {} seconds",
                    settings.timeout.as_secs()
                ));
            }
        }
    });
}
