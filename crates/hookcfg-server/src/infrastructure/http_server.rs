//! HTTP listener: accept loop, HTTP/1.1 framing, and request dispatch.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Accepting browser connections, one Tokio task per connection.
//! 3. Reading one HTTP/1.1 request (request line, headers, `Content-Length`
//!    body) and decoding `application/x-www-form-urlencoded` bodies.
//! 4. Handing the request to the [`ConfigController`] on the blocking pool,
//!    since the controller's stores and renderer are synchronous.
//! 5. Writing the response and closing the connection.
//! 6. Stopping when the `running` flag is cleared.
//!
//! # Status mapping
//!
//! | Controller outcome            | Status                |
//! |-------------------------------|-----------------------|
//! | `Unauthorized`                | 401                   |
//! | `Rendered`                    | 200 `text/html`       |
//! | `Redirect(url)`               | 302 `Location: url`   |
//! | any `ControllerError`         | 500                   |
//!
//! Requests that never reach the controller get 400 (unparsable), 404
//! (unknown path), 408 (not received within the read timeout), or 413
//! (body too large).  405 and 415 are only returned to administrators;
//! everyone else gets 401.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::application::config_controller::{ConfigController, ControllerResponse};
use crate::domain::http::{HttpRequest, HttpResponse, Method};
use crate::domain::request::RequestContext;

/// Upper bound on header lines per request.
const MAX_HEADERS: usize = 100;

/// Unread input discarded after rejecting a request, and for how long.
const DRAIN_LIMIT_BYTES: u64 = 1024 * 1024;
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Upper bound on the request line and on each header line, in bytes.
pub const MAX_LINE_BYTES: usize = 8 * 1024;

/// Error type for reading a request off the wire.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The bytes received are not a well-formed HTTP/1.1 request.
    #[error("malformed request: {0}")]
    Malformed(String),

    /// The declared body is larger than the configured limit.
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    /// Reading from the socket failed.
    #[error("I/O error reading request: {0}")]
    Io(#[from] std::io::Error),
}

/// Paths that serve the settings page.
#[derive(Debug, Clone)]
pub struct Routes {
    admin_path: String,
}

impl Routes {
    pub fn new(context_path: &str) -> Self {
        Self {
            admin_path: format!(
                "{}/plugins/servlet/yacc/admin",
                context_path.trim_end_matches('/')
            ),
        }
    }

    pub fn admin_path(&self) -> &str {
        &self.admin_path
    }

    pub fn matches(&self, path: &str) -> bool {
        path == "/" || path == self.admin_path
    }
}

/// Everything a connection task needs, shared behind one `Arc`.
pub struct ServerState {
    pub controller: ConfigController,
    pub routes: Routes,
    pub max_body_bytes: usize,
    /// Time allowed for a client to send a complete request.
    pub read_timeout: Duration,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `addr` and serves until `running` is set to `false`.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot be bound (e.g., the port is
/// already in use).
pub async fn run_server(
    addr: SocketAddr,
    state: Arc<ServerState>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind settings listener on {addr}"))?;

    info!(
        "settings page listening on http://{addr}{}",
        state.routes.admin_path()
    );

    serve(listener, state, running).await;
    Ok(())
}

/// Runs the accept loop on an already bound listener.
pub async fn serve(listener: TcpListener, state: Arc<ServerState>, running: Arc<AtomicBool>) {
    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        // Short accept timeout so the loop notices the shutdown flag even
        // when no browser is connecting.
        match timeout(Duration::from_millis(200), listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    handle_connection(stream, peer_addr, state).await;
                });
            }
            Ok(Err(e)) => {
                error!("accept error: {e}");
            }
            Err(_) => {}
        }
    }
}

/// Reads one request from `reader`.
///
/// Request and header lines are capped at [`MAX_LINE_BYTES`] and must be
/// UTF-8.  Bodies are framed by `Content-Length` only; a request carrying
/// `Transfer-Encoding` is rejected rather than read as empty.
///
/// # Errors
///
/// [`HttpError::Malformed`] for a bad, oversized or non-UTF-8 line, a bad
/// length, or any `Transfer-Encoding`; [`HttpError::TooLarge`] when
/// `Content-Length` exceeds `max_body`; [`HttpError::Io`] when the socket
/// fails or closes inside the body.
pub async fn read_request<R>(reader: &mut R, max_body: usize) -> Result<HttpRequest, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let Some(line) = read_line(reader).await? else {
        return Err(HttpError::Malformed(
            "connection closed before request line".to_string(),
        ));
    };

    let mut parts = line.split_whitespace();
    let (Some(method), Some(target), Some(version)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(HttpError::Malformed(format!("bad request line: {line:?}")));
    };
    if !version.starts_with("HTTP/1.") {
        return Err(HttpError::Malformed(format!("unsupported version {version}")));
    }
    let method = Method::parse(method);
    let target = target.to_string();

    let mut headers = Vec::new();
    loop {
        let Some(line) = read_line(reader).await? else {
            return Err(HttpError::Malformed(
                "connection closed inside headers".to_string(),
            ));
        };
        if line.is_empty() {
            break;
        }
        if headers.len() == MAX_HEADERS {
            return Err(HttpError::Malformed("too many headers".to_string()));
        }
        let Some((name, value)) = line.split_once(':') else {
            return Err(HttpError::Malformed(format!("bad header line: {line:?}")));
        };
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }

    if headers
        .iter()
        .any(|(k, _)| k.eq_ignore_ascii_case("transfer-encoding"))
    {
        return Err(HttpError::Malformed(
            "Transfer-Encoding is not supported; send Content-Length".to_string(),
        ));
    }

    let content_length = match headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
    {
        Some((_, v)) => v
            .parse::<usize>()
            .map_err(|_| HttpError::Malformed(format!("bad Content-Length {v:?}")))?,
        None => 0,
    };
    if content_length > max_body {
        return Err(HttpError::TooLarge { limit: max_body });
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await?;

    Ok(HttpRequest {
        method,
        target,
        headers,
        body,
    })
}

/// Reads one CRLF- or LF-terminated line without its terminator.
///
/// `Ok(None)` means the peer closed the connection before sending a byte.
async fn read_line<R>(reader: &mut R) -> Result<Option<String>, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let limit = MAX_LINE_BYTES as u64 + 1;
    let n = (&mut *reader).take(limit).read_until(b'\n', &mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    if buf.last() != Some(&b'\n') {
        return Err(HttpError::Malformed(if buf.len() > MAX_LINE_BYTES {
            format!("line longer than {MAX_LINE_BYTES} bytes")
        } else {
            "connection closed mid-line".to_string()
        }));
    }

    let mut line = String::from_utf8(buf)
        .map_err(|_| HttpError::Malformed("line is not valid UTF-8".to_string()))?;
    let trimmed_len = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed_len);
    Ok(Some(line))
}

/// Decodes an `application/x-www-form-urlencoded` body into ordered pairs.
pub fn decode_form(body: &[u8]) -> Vec<(String, String)> {
    url::form_urlencoded::parse(body).into_owned().collect()
}

/// Builds the application-facing context from the request headers.
///
/// When a header is repeated, the first occurrence wins, the same rule as
/// [`HttpRequest::header`].
pub fn request_context(request: &HttpRequest) -> RequestContext {
    request
        .headers
        .iter()
        .fold(RequestContext::new(), |ctx, (name, value)| {
            ctx.with_header(name, value.clone())
        })
}

/// Routes `request` to the controller and maps the outcome to a response.
pub fn dispatch(state: &ServerState, request: &HttpRequest) -> HttpResponse {
    if !state.routes.matches(request.path()) {
        return HttpResponse::status(404);
    }

    let ctx = request_context(request);
    debug!(request = %ctx.id, "{:?} {}", request.method, request.target);

    // Method and media-type rejections are only revealed to administrators.
    let rejection = match &request.method {
        Method::Get => None,
        Method::Post if is_form_encoded(request) => None,
        Method::Post => Some(HttpResponse::status(415)),
        Method::Other(_) => {
            let mut resp = HttpResponse::status(405);
            resp.headers
                .push(("Allow".to_string(), "GET, POST".to_string()));
            Some(resp)
        }
    };
    if let Some(resp) = rejection {
        if !state.controller.is_authorized(&ctx) {
            return HttpResponse::status(401);
        }
        return resp;
    }

    let mut body = Vec::new();
    let outcome = if request.method == Method::Get {
        state.controller.handle_load(&ctx, &mut body)
    } else {
        let form = decode_form(&request.body);
        state.controller.handle_submit(&ctx, &form, &mut body)
    };

    match outcome {
        Ok(ControllerResponse::Unauthorized) => HttpResponse::status(401),
        Ok(ControllerResponse::Rendered) => HttpResponse::html(body),
        Ok(ControllerResponse::Redirect(location)) => HttpResponse::redirect(location),
        Err(e) => {
            warn!(request = %ctx.id, "settings request failed: {e}");
            HttpResponse::status(500)
        }
    }
}

// ── Per-connection handler ────────────────────────────────────────────────────

async fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, state: Arc<ServerState>) {
    match serve_connection(stream, state).await {
        Ok(status) => debug!("connection {peer_addr} answered {status}"),
        Err(e) => warn!("connection {peer_addr} failed: {e:#}"),
    }
}

async fn serve_connection(stream: TcpStream, state: Arc<ServerState>) -> anyhow::Result<u16> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let read = timeout(
        state.read_timeout,
        read_request(&mut reader, state.max_body_bytes),
    )
    .await;
    let mut rejected = true;
    let response = match read {
        Err(_) => {
            debug!("request not received within {:?}", state.read_timeout);
            HttpResponse::status(408)
        }
        Ok(Ok(request)) => {
            rejected = false;
            let state = Arc::clone(&state);
            tokio::task::spawn_blocking(move || dispatch(&state, &request))
                .await
                .context("settings handler task failed")?
        }
        Ok(Err(HttpError::TooLarge { limit })) => {
            debug!("rejecting request body over {limit} bytes");
            HttpResponse::status(413)
        }
        Ok(Err(HttpError::Malformed(reason))) => {
            debug!("rejecting malformed request: {reason}");
            HttpResponse::status(400)
        }
        Ok(Err(HttpError::Io(e))) => return Err(e).context("failed to read request"),
    };

    write_half
        .write_all(&response.to_bytes())
        .await
        .context("failed to write response")?;
    write_half.shutdown().await.ok();

    // Closing with unread input would reset the connection before the
    // client reads the error response.
    if rejected {
        let mut rest = (&mut reader).take(DRAIN_LIMIT_BYTES);
        timeout(DRAIN_TIMEOUT, tokio::io::copy(&mut rest, &mut tokio::io::sink()))
            .await
            .ok();
    }
    Ok(response.status)
}

fn is_form_encoded(request: &HttpRequest) -> bool {
    match request.header("content-type") {
        None => true,
        Some(value) => value
            .split(';')
            .next()
            .map(str::trim)
            .is_some_and(|mime| mime.eq_ignore_ascii_case("application/x-www-form-urlencoded")),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
