//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use spa_edge::config::{EdgeConfig, TierConfig};
use spa_edge::credentials::CredentialSet;
use spa_edge::http::HttpServer;
use spa_edge::lifecycle::Shutdown;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const INDEX_HTML: &str = "<!doctype html><html><body><div id=\"root\"></div></body></html>";

/// Peer address used with `MockConnectInfo`.
pub const PEER: ([u8; 4], u16) = ([203, 0, 113, 7], 41000);

pub fn peer() -> SocketAddr {
    SocketAddr::from(PEER)
}

/// A compressible script large enough to cross the default threshold.
pub fn app_js() -> String {
    "console.log('spa edge bundle');\n".repeat(200)
}

/// Build a static bundle: `index.html` plus `assets/app.js` and a small icon.
pub fn static_site() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), INDEX_HTML).unwrap();
    std::fs::create_dir(dir.path().join("assets")).unwrap();
    std::fs::write(dir.path().join("assets/app.js"), app_js()).unwrap();
    std::fs::write(dir.path().join("assets/icon.bin"), [0u8, 159, 146, 150, 255]).unwrap();
    dir
}

/// Development config serving `root` with generous limits.
pub fn test_config(root: &Path) -> EdgeConfig {
    let mut config = EdgeConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.static_files.root = root.to_path_buf();
    config.rate_limit.global = Some(TierConfig {
        window_secs: 900,
        max_requests: 1000,
    });
    config.rate_limit.api = Some(TierConfig {
        window_secs: 60,
        max_requests: 1000,
    });
    config.credentials = CredentialSet::from_values(
        Some("gsk_test_groq".into()),
        Some("pplx-test".into()),
        None,
    );
    config
}

/// Start a real server on an ephemeral port.
pub async fn start_server(config: EdgeConfig) -> (SocketAddr, Shutdown, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    let handle = tokio::spawn(async move {
        server.run(listener, server_shutdown).await.unwrap();
    });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    (addr, shutdown, handle)
}

/// In-memory log sink for asserting on emitted records.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Install a subscriber writing into this buffer for the current thread.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
