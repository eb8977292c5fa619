// ABOUTME: Loopback listener that receives the GitHub redirect for terminal logins
// ABOUTME: Answers the browser with a small HTML page and hands the query parameters to the callback flow

use std::net::SocketAddr;

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
    error::{AuthError, AuthResult},
    oauth::callback::CallbackParams,
};

const DEFAULT_PORT: u16 = 3737;
const DEFAULT_PATH: &str = "/auth/callback";

pub struct CallbackServer {
    port: u16,
    path: String,
}

impl Default for CallbackServer {
    fn default() -> Self {
        Self::new()
    }
}

impl CallbackServer {
    pub fn new() -> Self {
        Self {
            port: DEFAULT_PORT,
            path: DEFAULT_PATH.to_string(),
        }
    }

    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Self::new()
        }
    }

    /// Listen where the configured redirect URI points. Only loopback hosts are accepted.
    pub fn from_redirect_uri(redirect_uri: &str) -> AuthResult<Self> {
        let url = Url::parse(redirect_uri).map_err(|e| {
            AuthError::Configuration(format!("Invalid redirect URI {}: {}", redirect_uri, e))
        })?;

        match url.host_str() {
            Some("localhost") | Some("127.0.0.1") => {}
            other => {
                return Err(AuthError::Configuration(format!(
                    "Redirect URI host {:?} is not a loopback address",
                    other
                )))
            }
        }

        Ok(Self {
            port: url.port_or_known_default().unwrap_or(DEFAULT_PORT),
            path: url.path().to_string(),
        })
    }

    pub fn callback_url(&self) -> String {
        format!("http://localhost:{}{}", self.port, self.path)
    }

    /// Bind the listener. Port 0 picks a free port; see `CallbackListener::local_addr`.
    pub async fn listen(&self) -> AuthResult<CallbackListener> {
        let addr = format!("127.0.0.1:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| AuthError::CallbackServer(format!("Failed to bind to {}: {}", addr, e)))?;

        info!("📡 Waiting for OAuth callback on {}", addr);
        Ok(CallbackListener {
            listener,
            path: self.path.clone(),
        })
    }
}

pub struct CallbackListener {
    listener: TcpListener,
    path: String,
}

impl CallbackListener {
    pub fn local_addr(&self) -> AuthResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve requests until one hits the callback path.
    ///
    /// Anything else (favicon probes, stray tabs) gets a 404 and the loop continues.
    pub async fn accept_callback(&self) -> AuthResult<CallbackParams> {
        loop {
            let (mut stream, peer_addr) = self.listener.accept().await.map_err(|e| {
                AuthError::CallbackServer(format!("Failed to accept connection: {}", e))
            })?;
            debug!("Received connection from {}", peer_addr);

            let request = match read_request_head(&mut stream).await {
                Ok(request) => request,
                Err(e) => {
                    warn!("Dropping unreadable callback request: {}", e);
                    continue;
                }
            };

            let Some(target) = request_target(&request) else {
                respond(&mut stream, "400 Bad Request", &error_page("Malformed request")).await;
                continue;
            };

            let (path, query) = target.split_once('?').unwrap_or((target, ""));
            if path != self.path {
                debug!("Ignoring request for {}", path);
                respond(&mut stream, "404 Not Found", "").await;
                continue;
            }

            let params = CallbackParams::from_query(query);
            match (&params.code, &params.error) {
                (_, Some(error)) => {
                    respond(&mut stream, "400 Bad Request", &error_page(error)).await;
                }
                (Some(_), None) => {
                    respond(&mut stream, "200 OK", SUCCESS_HTML).await;
                    info!("✅ Received authorization code");
                }
                (None, None) => {
                    respond(
                        &mut stream,
                        "400 Bad Request",
                        &error_page("No authorization code received"),
                    )
                    .await;
                }
            }
            return Ok(params);
        }
    }
}

async fn read_request_head(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut buffer = vec![0; 4096];
    let n = stream.read(&mut buffer).await?;
    Ok(String::from_utf8_lossy(&buffer[..n]).into_owned())
}

/// Target of `GET <target> HTTP/1.1`
fn request_target(request: &str) -> Option<&str> {
    let mut parts = request.lines().next()?.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("GET"), Some(target)) => Some(target),
        _ => None,
    }
}

async fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        error!("Failed to write callback response: {}", e);
    }
}

fn error_page(message: &str) -> String {
    let escaped = message
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    format!(
        r#"<html><body><h1>❌ Authentication Failed</h1><p>{}</p><p>You can close this tab and return to your terminal.</p></body></html>"#,
        escaped
    )
}

const SUCCESS_HTML: &str = r#"<html>
<head>
    <title>Signed in to revdash</title>
    <style>
        body { font-family: system-ui, -apple-system, sans-serif; max-width: 600px; margin: 100px auto; text-align: center; }
        h1 { color: #22c55e; }
        p { color: #64748b; }
    </style>
</head>
<body>
    <h1>✅ GitHub authorization received</h1>
    <p>You can close this tab and return to your terminal.</p>
</body>
</html>"#;
