//! Test daemon management.
//!
//! Spawns `ipacld` processes against a temporary config and database.

use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::sleep;

/// A running `ipacld` instance.
pub struct TestServer {
    child: Child,
    port: u16,
    _data_dir: TempDir,
}

impl TestServer {
    /// Spawn a daemon with admission enabled and forwarded-for trusted.
    pub async fn spawn() -> anyhow::Result<Self> {
        let data_dir = tempfile::tempdir()?;
        let port = free_port()?;
        let config_path = write_config(data_dir.path(), port)?;

        let child = Command::new(env!("CARGO_BIN_EXE_ipacld"))
            .arg(&config_path)
            .env("RUST_LOG", "warn")
            .spawn()?;

        let server = Self {
            child,
            port,
            _data_dir: data_dir,
        };
        server.wait_until_ready().await?;
        Ok(server)
    }

    async fn wait_until_ready(&self) -> anyhow::Result<()> {
        for _ in 0..50 {
            if TcpStream::connect(("127.0.0.1", self.port)).await.is_ok() {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("ipacld failed to start within 5 seconds")
    }

    /// Issue a request and return the status code and body.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        forwarded_for: Option<&str>,
        body: Option<&str>,
    ) -> anyhow::Result<(u16, String)> {
        let mut stream = TcpStream::connect(("127.0.0.1", self.port)).await?;

        let mut head = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n");
        if let Some(ip) = forwarded_for {
            head.push_str(&format!("X-Forwarded-For: {ip}\r\n"));
        }
        let body = body.unwrap_or("");
        if !body.is_empty() {
            head.push_str("Content-Type: application/json\r\n");
        }
        head.push_str(&format!("Content-Length: {}\r\n\r\n", body.len()));

        stream.write_all(head.as_bytes()).await?;
        stream.write_all(body.as_bytes()).await?;

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await?;
        let text = String::from_utf8_lossy(&raw).into_owned();

        let status = text
            .split_whitespace()
            .nth(1)
            .and_then(|s| s.parse::<u16>().ok())
            .ok_or_else(|| anyhow::anyhow!("malformed response: {text}"))?;
        let body = text
            .split_once("\r\n\r\n")
            .map(|(_, b)| b.to_string())
            .unwrap_or_default();
        Ok((status, body))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn free_port() -> anyhow::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

fn write_config(dir: &Path, port: u16) -> anyhow::Result<PathBuf> {
    let config_path = dir.join("ipacl.toml");
    let db_path = dir.join("ipacl.db");
    let content = format!(
        r#"
[server]
listen = "127.0.0.1:{port}"
metrics_port = 0

[database]
path = "{}"

[sweep]
interval_secs = 1

[admission]
enabled = true
policy = "fail_closed"
trust_forwarded_for = true

[[admin]]
id = "ops"
name = "Operations"
"#,
        db_path.display()
    );
    std::fs::write(&config_path, content)?;
    Ok(config_path)
}
