//! Single-request JSON fetching.
//!
//! [`JsonFetcher`] is the seam between the paging/fallback logic and the
//! network. [`HttpFetcher`] is the production implementation on top of
//! `reqwest`. Neither retries: a failed request is reported once and the
//! caller decides what to do next.

use std::time::Duration;

use crate::FetchError;

/// Identifies the client to `ArcGIS` services. Some public servers sit
/// behind WAFs that reject requests with no User-Agent.
const USER_AGENT: &str = concat!("lihtc-map/", env!("CARGO_PKG_VERSION"));

/// Maximum length of the response body preview included in errors.
const BODY_PREVIEW_LEN: usize = 300;

/// Performs one GET request and returns the parsed JSON body.
pub trait JsonFetcher: Send + Sync {
    /// Fetches `url` and parses the response as JSON.
    ///
    /// # Errors
    ///
    /// * [`FetchError::RequestFailed`] if the server answers with a
    ///   non-success status
    /// * [`FetchError::MalformedResponse`] if the body is not valid JSON
    /// * [`FetchError::Timeout`] or [`FetchError::Http`] if the request
    ///   itself fails
    fn get_json(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<serde_json::Value, FetchError>> + Send;
}

/// [`JsonFetcher`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Builds a fetcher whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the TLS backend cannot be
    /// initialised.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    fn transport_error(url: &str, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Http(e)
        }
    }
}

impl JsonFetcher for HttpFetcher {
    async fn get_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        log::debug!("GET {url}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::RequestFailed {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| Self::transport_error(url, e))?;

        serde_json::from_str(&text).map_err(|e| {
            FetchError::malformed(
                url,
                format!(
                    "{e} ({} bytes, body preview: {})",
                    text.len(),
                    truncate_for_log(&text, BODY_PREVIEW_LEN)
                ),
            )
        })
    }
}

/// Truncates a string for logging, appending "..." if it exceeds
/// `max_chars` characters.
fn truncate_for_log(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Serves a single connection on localhost. Answers with `response`
    /// verbatim, or holds the connection open without answering when it
    /// is `None`. Returns the URL to request.
    async fn serve_once(response: Option<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            match response {
                Some(response) => {
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                }
                None => while socket.read(&mut buf).await.is_ok_and(|n| n > 0) {},
            }
        });

        format!("http://{addr}/arcgis/rest/services/LIHTC/FeatureServer/0/query?f=geojson")
    }

    fn http_response(status_line: &str, content_type: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    #[test]
    fn truncates_long_bodies_on_char_boundaries() {
        assert_eq!(truncate_for_log("short", 10), "short");
        assert_eq!(truncate_for_log("abcdef", 3), "abc...");
        assert_eq!(truncate_for_log("ééééé", 2), "éé...");
    }

    #[tokio::test]
    async fn parses_json_body() {
        let url = serve_once(Some(http_response(
            "200 OK",
            "application/json",
            r#"{"type":"FeatureCollection","features":[]}"#,
        )))
        .await;
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();

        let body = fetcher.get_json(&url).await.unwrap();

        assert_eq!(body["type"], "FeatureCollection");
    }

    #[tokio::test]
    async fn non_success_status_is_request_failed() {
        let url = serve_once(Some(http_response(
            "503 Service Unavailable",
            "text/plain",
            "down for maintenance",
        )))
        .await;
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();

        let err = fetcher.get_json(&url).await.unwrap_err();

        assert!(
            matches!(&err, FetchError::RequestFailed { status: 503, url: u } if *u == url),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn html_body_is_malformed_with_preview() {
        let url = serve_once(Some(http_response(
            "200 OK",
            "text/html",
            "<html><body>Service temporarily unavailable</body></html>",
        )))
        .await;
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();

        let err = fetcher.get_json(&url).await.unwrap_err();

        let FetchError::MalformedResponse { message, .. } = &err else {
            panic!("expected MalformedResponse, got {err:?}");
        };
        assert!(message.contains("body preview: <html>"), "{message}");
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let url = serve_once(None).await;
        let fetcher = HttpFetcher::new(Duration::from_millis(300)).unwrap();

        let err = fetcher.get_json(&url).await.unwrap_err();

        assert!(
            matches!(&err, FetchError::Timeout { url: u } if *u == url),
            "got {err:?}"
        );
    }
}
