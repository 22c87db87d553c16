//! HTTP datamart source. One GET per attempt, JSON body.
//!
//! No timeout or retry here: the loader wraps each call and drops the future on timeout,
//! which aborts the in-flight request.

use crate::domain::AttemptFailure;
use crate::ports::DatamartSource;
use reqwest::Client;
use reqwest::header::ACCEPT;
use tracing::warn;

pub struct HttpDatamartSource {
    client: Client,
    url: String,
}

impl HttpDatamartSource {
    /// Create a source for `url`. The client sends no cookies or credentials.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    #[cfg(test)]
    fn with_client(url: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait::async_trait]
impl DatamartSource for HttpDatamartSource {
    async fn fetch_payload(&self) -> Result<serde_json::Value, AttemptFailure> {
        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AttemptFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, url = %self.url, "datamart returned error status");
            return Err(AttemptFailure::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AttemptFailure::Transport(format!("reading body: {}", e)))?;
        serde_json::from_slice(&body)
            .map_err(|e| AttemptFailure::Validation(format!("body is not JSON: {}", e)))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve one canned HTTP response on a local port. Yields the request head.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut chunk = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&chunk[..n]);
            }
            let _ = tx.send(String::from_utf8_lossy(&head).into_owned());
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        (format!("http://{}/datamart", addr), rx)
    }

    fn source(url: String) -> HttpDatamartSource {
        let client = Client::builder().no_proxy().build().unwrap();
        HttpDatamartSource::with_client(url, client)
    }

    #[tokio::test]
    async fn test_fetch_valid_body_sends_json_accept() {
        let (url, request) = serve_once("200 OK", r#"{"empresas":[{"rubro":"Tech"}]}"#).await;

        let payload = source(url).fetch_payload().await.unwrap();

        assert_eq!(payload["empresas"][0]["rubro"], "Tech");
        let head = request.await.unwrap().to_ascii_lowercase();
        assert!(head.starts_with("get /datamart http/1.1"));
        assert!(head.contains("accept: application/json"));
    }

    #[tokio::test]
    async fn test_error_status_maps_to_status_failure() {
        let (url, _request) = serve_once("503 Service Unavailable", "{}").await;

        let err = source(url).fetch_payload().await.unwrap_err();

        match err {
            AttemptFailure::Status { status, reason } => {
                assert_eq!(status, 503);
                assert_eq!(reason, "Service Unavailable");
            }
            other => panic!("expected status failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_maps_to_validation_failure() {
        let (url, _request) = serve_once("200 OK", "<html>maintenance</html>").await;

        let err = source(url).fetch_payload().await.unwrap_err();

        assert!(matches!(err, AttemptFailure::Validation(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_refused_connection_maps_to_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = source(format!("http://{}/datamart", addr))
            .fetch_payload()
            .await
            .unwrap_err();

        assert!(matches!(err, AttemptFailure::Transport(_)), "{:?}", err);
    }
}
