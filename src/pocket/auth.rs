//! Pocket credentials
//!
//! The consumer key lives in `consumer_key`, the access token in
//! `auth.json`. When no token is stored, the OAuth handshake runs against a
//! loopback callback listener and the result is persisted.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};
use url::Url;

use crate::core::paths::ConfigPaths;

use super::client::PocketApi;
use super::types::{Authorization, RequestTokenResponse};

const REQUEST_TOKEN_PATH: &str = "/v3/oauth/request";
const AUTHORIZE_PATH: &str = "/v3/oauth/authorize";
const AUTHORIZE_PAGE: &str = "/auth/authorize";

/// Upper bound on the callback request head we bother reading
const MAX_REQUEST_HEAD: usize = 8 * 1024;

/// How long one connection may take to send its request line
const CALLBACK_READ_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Consumer key
// ============================================================================

/// Read the consumer key, prompting for it (and saving it) when missing
pub async fn get_consumer_key(paths: &ConfigPaths) -> Result<String> {
    match read_consumer_key(&paths.consumer_key) {
        Ok(key) => return Ok(key),
        Err(e) => warn!("Can't get consumer key: {:#}", e),
    }

    eprint!("Enter your consumer key (from https://getpocket.com/developer/apps/): ");
    std::io::stderr().flush().ok();

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read consumer key from stdin")?;

    let key = line.trim().to_string();
    if key.is_empty() {
        anyhow::bail!("No consumer key given");
    }

    write_private(&paths.consumer_key, key.as_bytes())?;
    Ok(key)
}

/// First line of the consumer key file
fn read_consumer_key(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let key = content.lines().next().unwrap_or_default().trim().to_string();
    if key.is_empty() {
        anyhow::bail!("{} is empty", path.display());
    }
    Ok(key)
}

// ============================================================================
// Access token
// ============================================================================

/// Load the stored authorization, running the OAuth flow when there is none
pub async fn restore_authorization(
    paths: &ConfigPaths,
    consumer_key: &str,
) -> Result<Authorization> {
    match load_json::<Authorization>(&paths.auth) {
        Ok(auth) if !auth.access_token.is_empty() => return Ok(auth),
        Ok(_) => warn!("{} holds an empty access token", paths.auth.display()),
        Err(e) => warn!("{:#}", e),
    }

    authorize(paths, consumer_key).await
}

/// Run the OAuth flow and persist the resulting token
pub async fn authorize(paths: &ConfigPaths, consumer_key: &str) -> Result<Authorization> {
    let network = &paths.config.network;
    let api = PocketApi::new(network)?;
    let timeout = Duration::from_secs(network.auth_timeout_secs);

    let auth = obtain_access_token(&api, consumer_key, timeout).await?;
    save_json(&paths.auth, &auth)?;
    info!(username = %auth.username, "Access token stored");

    Ok(auth)
}

async fn obtain_access_token(
    api: &PocketApi,
    consumer_key: &str,
    timeout: Duration,
) -> Result<Authorization> {
    let listener = CallbackListener::bind().await?;
    let redirect_uri = listener.redirect_uri();

    let request_token: RequestTokenResponse = api
        .post_json(
            REQUEST_TOKEN_PATH,
            &serde_json::json!({
                "consumer_key": consumer_key,
                "redirect_uri": redirect_uri,
            }),
        )
        .await
        .context("Failed to obtain request token")?;

    let url = authorization_url(api.base_url(), &request_token.code, &redirect_uri)?;
    println!("Open this URL to authorize pocket-autotag:");
    println!("{}", url);

    tokio::time::timeout(timeout, listener.wait())
        .await
        .context("Timed out waiting for authorization")??;

    api.post_json(
        AUTHORIZE_PATH,
        &serde_json::json!({
            "consumer_key": consumer_key,
            "code": request_token.code,
        }),
    )
    .await
    .context("Failed to obtain access token")
}

/// Browser URL where the user approves the request token
pub fn authorization_url(base_url: &str, request_token: &str, redirect_uri: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)
        .with_context(|| format!("Invalid API base URL: {}", base_url))?
        .join(AUTHORIZE_PAGE)?;
    url.query_pairs_mut()
        .append_pair("request_token", request_token)
        .append_pair("redirect_uri", redirect_uri);
    Ok(url)
}

// ============================================================================
// Callback listener
// ============================================================================

/// Loopback HTTP endpoint Pocket redirects the browser to after approval
pub struct CallbackListener {
    listener: TcpListener,
    read_timeout: Duration,
}

impl CallbackListener {
    pub async fn bind() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind callback listener")?;
        Ok(Self {
            listener,
            read_timeout: CALLBACK_READ_TIMEOUT,
        })
    }

    /// Limit how long a silent connection (e.g. a browser preconnect) can
    /// hold up the accept loop
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn redirect_uri(&self) -> String {
        match self.listener.local_addr() {
            Ok(addr) => format!("http://{}/", addr),
            Err(_) => "http://127.0.0.1/".to_string(),
        }
    }

    /// Serve requests until the browser hits the callback.
    ///
    /// `/favicon.ico` gets a 404; any other path completes the wait.
    pub async fn wait(self) -> Result<()> {
        loop {
            let (mut stream, peer) = self.listener.accept().await?;
            let read = tokio::time::timeout(self.read_timeout, read_request_path(&mut stream));
            let path = match read.await {
                Ok(Ok(path)) => path,
                Ok(Err(e)) => {
                    debug!(%peer, "Ignoring malformed callback request: {:#}", e);
                    continue;
                }
                Err(_) => {
                    debug!(%peer, "Dropping idle callback connection");
                    continue;
                }
            };

            if path.starts_with("/favicon.ico") {
                respond(&mut stream, "404 Not Found", "Not Found\n").await?;
                continue;
            }

            respond(&mut stream, "200 OK", "Authorized.\n").await?;
            return Ok(());
        }
    }
}

async fn read_request_path(stream: &mut TcpStream) -> Result<String> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") && head.len() < MAX_REQUEST_HEAD {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        head.extend_from_slice(&buf[..n]);
    }

    let head = String::from_utf8_lossy(&head);
    let request_line = head.lines().next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(_method), Some(path)) => Ok(path.to_string()),
        _ => anyhow::bail!("Bad request line: {:?}", request_line),
    }
}

async fn respond(stream: &mut TcpStream, status: &str, body: &str) -> Result<()> {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await.ok();
    Ok(())
}

// ============================================================================
// File helpers
// ============================================================================

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string(value)?;
    write_private(path, content.as_bytes())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write a credential file readable only by the owner
fn write_private(path: &Path, content: &[u8]) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    file.write_all(content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
