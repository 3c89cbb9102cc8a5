//! Liveness HTTP server
//!
//! Answers `GET /` with a static confirmation so hosting platforms can tell
//! the bot process is up. Everything else is a 404.

use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, info};

pub const RUNNING_TEXT: &str = "🤖 Telegram Bot is running...";

pub struct HealthServer {
    address: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl HealthServer {
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            shutdown_tx: None,
            server_handle: None,
        }
    }

    /// Listen on all interfaces at `port`.
    pub fn on_port(port: u16) -> Self {
        Self::new(SocketAddr::from(([0, 0, 0, 0], port)))
    }

    /// Bind and start serving in the background.
    ///
    /// Returns the bound address, which differs from the configured one when
    /// port 0 was requested.
    pub async fn start(&mut self) -> crate::Result<SocketAddr> {
        let listener = TcpListener::bind(self.address).await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);
        self.server_handle = Some(tokio::spawn(run_server(listener, shutdown_rx)));

        info!("Liveness server running on {}", addr);
        Ok(addr)
    }

    /// Wait for the server task to end.
    ///
    /// Cancel-safe: the task handle is only released once the task has
    /// finished, so a later [`shutdown`](Self::shutdown) still waits for it.
    pub async fn wait(&mut self) {
        if let Some(handle) = self.server_handle.as_mut() {
            let _ = handle.await;
            self.server_handle = None;
        }
    }

    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.wait().await;
    }
}

async fn run_server(listener: TcpListener, mut shutdown_rx: oneshot::Receiver<()>) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => break,
            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        let io = TokioIo::new(stream);
                        tokio::spawn(async move {
                            if let Err(e) = http1::Builder::new()
                                .serve_connection(io, service_fn(handle_request))
                                .await
                            {
                                debug!("Liveness connection from {} ended: {}", peer, e);
                            }
                        });
                    }
                    Err(e) => debug!("Failed to accept liveness connection: {}", e),
                }
            }
        }
    }
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (status, body) = match (req.method(), req.uri().path()) {
        (&Method::GET, "/") => (StatusCode::OK, RUNNING_TEXT),
        _ => (StatusCode::NOT_FOUND, "Not Found"),
    };

    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    Ok(response)
}
