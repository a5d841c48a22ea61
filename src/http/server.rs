//! HTTP server implementation.

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{error, info};

use super::routes::router;
use super::state::AppState;
use crate::error::{Result, SafekeysError};

/// HTTP server for the SafeKeys API.
pub struct HttpServer {
    /// Bound listener
    listener: TcpListener,
    /// Shared gates and hasher
    state: AppState,
}

impl HttpServer {
    /// Bind the listening socket.
    pub async fn bind(addr: SocketAddr, state: AppState) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, state })
    }

    /// The address actually bound, useful when binding port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve requests until `signal` resolves, then drain in-flight requests.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        info!(addr = %addr, "Starting HTTP server with graceful shutdown");

        // Peer addresses are the identity the gates key on.
        let app = router(self.state).into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(self.listener, app)
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP server failed");
                SafekeysError::Io(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HashingConfig, SafekeysConfig};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    fn test_state() -> AppState {
        let config = SafekeysConfig {
            hashing: HashingConfig {
                time_cost: 1,
                memory_cost_kib: 64,
                parallelism: 1,
                hash_len: 32,
                salt_len: 16,
            },
            ..SafekeysConfig::default()
        };
        AppState::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn test_serves_and_shuts_down() {
        let state = test_state();
        let limiter = state.rate_limiter.clone();
        let server = HttpServer::bind(SocketAddr::from(([127, 0, 0, 1], 0)), state)
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();

        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve_with_shutdown(async move {
            rx.await.ok();
        }));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /generate/token HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        // The request was counted against the peer's IP.
        assert_eq!(limiter.recorded("127.0.0.1"), 1);

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
