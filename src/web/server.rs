//! HTTP server for ByteBucket.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::{ServerConfig, StorageConfig};
use crate::file::BlobStore;
use crate::{BucketError, Database, Result};

use super::handlers::AppState;
use super::router::create_router;

/// HTTP server for the bucket API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Allowed CORS origins.
    cors_origins: Vec<String>,
    /// Request body limit in bytes.
    max_upload_bytes: usize,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(
        server: &ServerConfig,
        storage_config: &StorageConfig,
        db: Database,
        storage: BlobStore,
    ) -> Result<Self> {
        let addr = format!("{}:{}", server.host, server.port)
            .parse()
            .map_err(|e| {
                BucketError::Config(format!(
                    "invalid server address {}:{}: {e}",
                    server.host, server.port
                ))
            })?;

        Ok(Self {
            addr,
            app_state: Arc::new(AppState::new(Arc::new(db), storage)),
            cors_origins: server.cors_origins.clone(),
            max_upload_bytes: storage_config.max_upload_size_bytes(),
        })
    }

    /// Get the configured server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn router(&self) -> Router {
        create_router(
            self.app_state.clone(),
            &self.cors_origins,
            self.max_upload_bytes,
        )
    }

    /// Run the web server until Ctrl+C.
    pub async fn run(self) -> Result<()> {
        let router = self.router();
        let listener = TcpListener::bind(self.addr).await?;
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Web server stopped");
        self.app_state.db.close().await;
        Ok(())
    }

    /// Start the server in the background and return the bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let router = self.router();
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn create_test_config() -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec![],
        }
    }

    #[tokio::test]
    async fn test_web_server_new() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db = Database::open_in_memory().await.unwrap();

        let server = WebServer::new(
            &create_test_config(),
            &StorageConfig::default(),
            db,
            BlobStore::new(temp_dir.path()),
        )
        .unwrap();
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn test_web_server_invalid_host() {
        let db = Database::open_in_memory().await.unwrap();
        let mut config = create_test_config();
        config.host = "not an address".to_string();

        let result = WebServer::new(
            &config,
            &StorageConfig::default(),
            db,
            BlobStore::new("unused"),
        );
        assert!(matches!(result, Err(BucketError::Config(_))));
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db = Database::open_in_memory().await.unwrap();

        let server = WebServer::new(
            &create_test_config(),
            &StorageConfig::default(),
            db,
            BlobStore::new(temp_dir.path()),
        )
        .unwrap();
        let addr = server.run_with_addr().await.unwrap();

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains(r#"{"status":"ok"}"#));
    }
}
