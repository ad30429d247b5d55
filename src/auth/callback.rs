//! Loopback redirect listener
//!
//! Twitch's implicit grant returns the token in the URL *fragment*
//! (`#access_token=...&state=...`), which browsers never send to a server.
//! The listener therefore answers the first hit on the callback path with a
//! small relay page whose script re-requests the same path with the fragment
//! moved into the query string.  Denials arrive directly as query parameters
//! (`?error=access_denied&...`) and need no relay.
//!
//! Request flow on the callback path:
//!
//! ```text
//! GET /callback                       -> relay page
//! GET /callback?access_token=..&state=..  -> result (success)
//! GET /callback?error=..&state=..         -> result (provider error)
//! GET /callback?relay_error=missing_fragment -> result (browser error)
//! GET /anything-else                  -> 404, keep waiting
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::auth::request::{AuthorizationResult, Outcome};
use crate::error::{AuthError, Result};

/// Query parameter the relay page uses to report a redirect without fragment.
const RELAY_ERROR: &str = "relay_error";

/// Upper bound on request-head lines read from a single connection.
const MAX_HEADER_LINES: usize = 100;

/// Upper bound on request-head bytes read from a single connection.
const MAX_HEAD_BYTES: u64 = 8 * 1024;

/// A connection must deliver its request within this window.  Browsers open
/// speculative connections that never send anything.
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

const COMPLETE_PAGE: &str = "<!doctype html><html><head><title>Signed in</title></head>\
<body><p>Sign-in complete. You may close this tab.</p></body></html>";

const DECLINED_PAGE: &str = "<!doctype html><html><head><title>Sign-in not completed</title></head>\
<body><p>Sign-in was not completed. You may close this tab.</p></body></html>";

/// Serves the callback path until a redirect result arrives.
///
/// Each connection is handled on its own task under [`CONNECTION_TIMEOUT`],
/// so an idle or slow connection never holds up the redirect.
///
/// # Errors
///
/// Returns [`AuthError::Browser`] if accepting a connection fails.  Errors on
/// an individual connection are logged and the listener keeps waiting.
pub(crate) async fn await_redirect(
    listener: TcpListener,
    callback_path: &str,
) -> Result<AuthorizationResult> {
    let callback_path: Arc<str> = Arc::from(callback_path);
    let (tx, mut rx) = mpsc::channel(1);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted.map_err(|e| {
                    AuthError::Browser(format!("failed to accept redirect connection: {e}"))
                })?;
                tracing::debug!(%peer, "Redirect connection accepted");

                let tx = tx.clone();
                let callback_path = Arc::clone(&callback_path);
                tokio::spawn(async move {
                    let handled = tokio::time::timeout(
                        CONNECTION_TIMEOUT,
                        handle_connection(stream, &callback_path),
                    )
                    .await;
                    match handled {
                        Ok(Ok(Some(result))) => {
                            let _ = tx.send(result).await;
                        }
                        Ok(Ok(None)) => {}
                        Ok(Err(e)) => {
                            tracing::warn!(%peer, "Ignoring malformed redirect request: {e}")
                        }
                        Err(_) => tracing::debug!(%peer, "Redirect connection timed out"),
                    }
                });
            }
            Some(result) = rx.recv() => return Ok(result),
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    callback_path: &str,
) -> Result<Option<AuthorizationResult>> {
    let target = read_request_target(&mut stream).await?;
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, query),
        None => (target.as_str(), ""),
    };

    if path != callback_path {
        write_response(&mut stream, "404 Not Found", "text/plain", "Not Found").await?;
        return Ok(None);
    }

    let params = parse_query(query);
    match result_from_params(params) {
        Some(result) => {
            let page = if result.access_token.is_some() {
                COMPLETE_PAGE
            } else {
                DECLINED_PAGE
            };
            write_response(&mut stream, "200 OK", "text/html; charset=utf-8", page).await?;
            Ok(Some(result))
        }
        None => {
            let page = relay_page(callback_path);
            write_response(&mut stream, "200 OK", "text/html; charset=utf-8", &page).await?;
            Ok(None)
        }
    }
}

/// Reads the request head and returns the request-target of the request line.
async fn read_request_target(stream: &mut TcpStream) -> Result<String> {
    let mut reader = BufReader::new(stream.take(MAX_HEAD_BYTES));
    let mut request_line = String::new();
    let mut line = String::new();

    for _ in 0..MAX_HEADER_LINES {
        line.clear();
        let read = reader.read_line(&mut line).await.map_err(AuthError::from)?;
        if reader.get_ref().limit() == 0 && !line.ends_with('\n') {
            return Err(AuthError::Browser(format!(
                "request head exceeds {MAX_HEAD_BYTES} bytes"
            ))
            .into());
        }
        let trimmed = line.trim_end();
        // Headers end at the first empty line.
        if read == 0 || trimmed.is_empty() {
            break;
        }
        if request_line.is_empty() {
            request_line = trimmed.to_string();
        }
    }

    let mut parts = request_line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("GET"), Some(target)) => Ok(target.to_string()),
        _ => Err(AuthError::Browser(format!("unexpected request line: {request_line:?}")).into()),
    }
}

async fn write_response(
    stream: &mut TcpStream,
    status: &str,
    content_type: &str,
    body: &str,
) -> Result<()> {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nCache-Control: no-store\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream
        .write_all(response.as_bytes())
        .await
        .map_err(AuthError::from)?;
    stream.shutdown().await.map_err(AuthError::from)?;
    Ok(())
}

fn parse_query(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

/// Maps redirect query parameters to a result.  `None` means the request
/// carried nothing we recognise and the relay page should be served.
fn result_from_params(mut params: HashMap<String, String>) -> Option<AuthorizationResult> {
    if let Some(code) = params.remove(RELAY_ERROR) {
        return Some(AuthorizationResult::error(code));
    }

    let access_token = params.remove("access_token");
    let error_code = params.remove("error");
    if access_token.is_none() && error_code.is_none() {
        return None;
    }

    Some(AuthorizationResult {
        outcome: Outcome::Success,
        access_token,
        returned_state: params.remove("state").filter(|s| !s.is_empty()),
        error_code,
        error_description: params.remove("error_description"),
    })
}

/// Page that forwards the URL fragment back to the listener as a query.
fn relay_page(callback_path: &str) -> String {
    // JSON string literals are valid JavaScript string literals; `<` is
    // escaped so the path cannot close the script element.
    let path = serde_json::to_string(callback_path)
        .unwrap_or_else(|_| "\"/\"".to_string())
        .replace('<', "\\u003c");
    let relay_error = RELAY_ERROR;
    format!(
        "<!doctype html><html><head><title>Completing sign-in</title></head><body>\
<p>Completing sign-in&hellip;</p>\
<script>\
var fragment = window.location.hash.substring(1);\
var query = fragment.length > 0 ? fragment : \"{relay_error}=missing_fragment\";\
window.location.replace({path} + \"?\" + query);\
</script></body></html>"
    )
}
