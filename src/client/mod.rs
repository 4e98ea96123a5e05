use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::drug::{AskRequest, AskResponse, Outcome, UNEXPECTED_RESPONSE};

/// Shown whenever the server could not be reached at all
pub const CONNECTION_ERROR: &str = "There was an error contacting the MedWise server.";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}")]
    Status { status: u16 },

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can answer a drug question.
#[async_trait]
pub trait AskService: Send + Sync {
    async fn ask(&self, question: &str) -> Result<AskResponse, ClientError>;
}

/// Talks to the `/ask` endpoint over HTTP
#[derive(Debug, Clone)]
pub struct HttpAskClient {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpAskClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AskService for HttpAskClient {
    async fn ask(&self, question: &str) -> Result<AskResponse, ClientError> {
        tracing::info!("Asking {}: {}", self.endpoint, question);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&AskRequest { question })
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        tracing::debug!("Response {} ({} bytes)", status, body.len());

        // Error responses still carry `{"error": ...}` when the server is healthy
        match serde_json::from_slice::<AskResponse>(&body) {
            Ok(parsed) if status.is_success() || parsed.error.is_some() => Ok(parsed),
            Ok(_) => Err(ClientError::Status { status: status.as_u16() }),
            Err(e) if status.is_success() => Err(ClientError::Decode(e)),
            Err(_) => Err(ClientError::Status { status: status.as_u16() }),
        }
    }
}

/// Turn the result of one call into something the user can look at
pub fn resolve(result: Result<AskResponse, ClientError>) -> Outcome {
    match result {
        Ok(response) => response.into_outcome(),
        Err(ClientError::Transport(e)) => {
            tracing::warn!("Could not reach server: {}", e);
            Outcome::Error(CONNECTION_ERROR.to_string())
        }
        Err(ClientError::Status { status }) => {
            tracing::warn!("Server returned {}", status);
            Outcome::Error(format!("Server returned {}", status))
        }
        Err(ClientError::Decode(e)) => {
            tracing::warn!("Undecodable response: {}", e);
            Outcome::Error(UNEXPECTED_RESPONSE.to_string())
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve exactly one request with the given status and body, handing back the request body
    async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];

            // Read headers, then as much body as Content-Length promises
            let body_start = loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let headers = String::from_utf8_lossy(&request[..body_start]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while request.len() < body_start + content_length {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();

            let _ = tx.send(String::from_utf8_lossy(&request[body_start..]).to_string());
        });

        (format!("http://{}/ask", addr), rx)
    }

    fn client(endpoint: &str) -> HttpAskClient {
        // Loopback traffic must not go through a proxy from the environment
        HttpAskClient {
            endpoint: endpoint.to_string(),
            client: reqwest::Client::builder()
                .no_proxy()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap(),
        }
    }

    #[tokio::test]
    async fn test_posts_question_as_json() {
        let (endpoint, sent) = serve_once("200 OK", r#"{"brand": {"name": "Advil"}}"#).await;

        let response = client(&endpoint).ask("cheapest generic for Advil?").await.unwrap();
        let request: serde_json::Value = serde_json::from_str(&sent.await.unwrap()).unwrap();

        assert_eq!(request, serde_json::json!({"question": "cheapest generic for Advil?"}));
        assert!(matches!(response.into_outcome(), Outcome::Bundle(b) if b.brand.name == "Advil"));
    }

    #[tokio::test]
    async fn test_server_error_body_is_shown_verbatim() {
        let (endpoint, _sent) =
            serve_once("400 Bad Request", r#"{"error": "No question provided"}"#).await;

        let outcome = resolve(client(&endpoint).ask("").await);
        assert_eq!(outcome, Outcome::Error("No question provided".to_string()));
    }

    #[tokio::test]
    async fn test_error_status_without_body() {
        let (endpoint, _sent) = serve_once("502 Bad Gateway", "<html>bad gateway</html>").await;

        let result = client(&endpoint).ask("Tylenol?").await;
        assert!(matches!(result, Err(ClientError::Status { status: 502 })));
        assert_eq!(resolve(result), Outcome::Error("Server returned 502".to_string()));
    }

    #[tokio::test]
    async fn test_garbage_success_body() {
        let (endpoint, _sent) = serve_once("200 OK", "not json").await;

        let result = client(&endpoint).ask("Tylenol?").await;
        assert!(matches!(result, Err(ClientError::Decode(_))));
        assert_eq!(resolve(result), Outcome::Error(UNEXPECTED_RESPONSE.to_string()));
    }

    #[tokio::test]
    async fn test_scripted_transport_failure_reads_as_connection_error() {
        let service = testing::FakeService::default().reply(None);

        let result = service.ask("Zyrtec?").await;
        assert!(matches!(result, Err(ClientError::Transport(_))));
        assert_eq!(resolve(result), Outcome::Error(CONNECTION_ERROR.to_string()));
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_server_gives_connection_error() {
        // Grab a free port, then close it so nothing is listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = client(&format!("http://{}/ask", addr)).ask("Zyrtec?").await;
        assert!(matches!(result, Err(ClientError::Transport(_))));
        assert_eq!(resolve(result), Outcome::Error(CONNECTION_ERROR.to_string()));
    }
}
