use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Backend origin used when neither the config file nor `--backend` says otherwise.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Outcome of a backend call. The chat views react differently to a rejected
/// request than to one that never reached the server, so the two classes stay
/// distinct here instead of collapsing into one error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("backend returned {0}")]
    Status(StatusCode),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct LoginRequest {
    login_id: String,
    password: String,
    #[serde(rename = "type")]
    user_type: String,
}

/// Successful login body. `type` is kept as a free-form string: the backend
/// decides the role, and unrecognized values are the caller's problem.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginOk {
    pub login_id: String,
    #[serde(rename = "type")]
    pub user_type: String,
}

#[derive(Serialize)]
struct ChatRequest {
    message: String,
    login_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_type: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: String,
}

#[derive(Serialize)]
struct ReportRequest {
    login_id: String,
    send_to_slack: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportOk {
    pub report: String,
    pub slack_status: String,
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "POST");

        let response = self.client.post(&url).json(body).send().await?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), %url, "rejected");
            return Err(ApiError::Status(response.status()));
        }

        Ok(response.json().await?)
    }

    pub async fn login(
        &self,
        login_id: &str,
        password: &str,
        user_type: &str,
    ) -> Result<LoginOk, ApiError> {
        let request = LoginRequest {
            login_id: login_id.to_string(),
            password: password.to_string(),
            user_type: user_type.to_string(),
        };
        self.post("/login", &request).await
    }

    pub async fn patient_chat(&self, login_id: &str, message: &str) -> Result<String, ApiError> {
        let request = ChatRequest {
            message: message.to_string(),
            login_id: login_id.to_string(),
            user_type: Some("patient".to_string()),
        };
        let reply: ChatResponse = self.post("/chat", &request).await?;
        Ok(reply.response)
    }

    pub async fn doctor_chat(&self, login_id: &str, message: &str) -> Result<String, ApiError> {
        let request = ChatRequest {
            message: message.to_string(),
            login_id: login_id.to_string(),
            user_type: None,
        };
        let reply: ChatResponse = self.post("/chat-doctor", &request).await?;
        Ok(reply.response)
    }

    pub async fn generate_report(&self, login_id: &str) -> Result<ReportOk, ApiError> {
        let request = ReportRequest {
            login_id: login_id.to_string(),
            send_to_slack: true,
        };
        self.post("/generate-report", &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::oneshot;

    /// Serve exactly one HTTP exchange: drain the request, send `response`
    /// verbatim, hand the raw request bytes back for assertions.
    async fn respond_once(response: String) -> (String, oneshot::Receiver<Vec<u8>>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if let Some(header_end) = find(&request, b"\r\n\r\n") {
                    let body_len = content_length(&request[..header_end]);
                    if request.len() >= header_end + 4 + body_len {
                        break;
                    }
                }
            }
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            let _ = tx.send(request);
        });

        (format!("http://{}", addr), rx)
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    fn content_length(headers: &[u8]) -> usize {
        let text = String::from_utf8_lossy(headers);
        text.lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse().ok())?
            })
            .unwrap_or(0)
    }

    fn json_response(body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        )
    }

    #[tokio::test]
    async fn login_parses_identity_from_response() {
        let body = r#"{"login_id":"pat42","password":"x","type":"Patient"}"#;
        let (base_url, request) = respond_once(json_response(body)).await;

        let client = ApiClient::new(&base_url);
        let ok = client.login("pat42", "secret", "Patient").await.unwrap();
        assert_eq!(ok.login_id, "pat42");
        assert_eq!(ok.user_type, "Patient");

        let raw = request.await.unwrap();
        let raw = String::from_utf8_lossy(&raw);
        assert!(raw.starts_with("POST /login"));
        assert!(raw.contains(r#""type":"Patient""#));
    }

    #[tokio::test]
    async fn patient_chat_sends_user_type_and_returns_response_field() {
        let (base_url, request) = respond_once(json_response(r#"{"response":"Take ibuprofen"}"#)).await;

        let client = ApiClient::new(&base_url);
        let reply = client.patient_chat("pat42", "my tooth hurts").await.unwrap();
        assert_eq!(reply, "Take ibuprofen");

        let raw = request.await.unwrap();
        let raw = String::from_utf8_lossy(&raw);
        assert!(raw.starts_with("POST /chat "));
        assert!(raw.contains(r#""user_type":"patient""#));
    }

    #[tokio::test]
    async fn doctor_chat_omits_user_type() {
        let (base_url, request) = respond_once(json_response(r#"{"response":"3 today"}"#)).await;

        let client = ApiClient::new(&base_url);
        let reply = client.doctor_chat("doc7", "appointments today?").await.unwrap();
        assert_eq!(reply, "3 today");

        let raw = request.await.unwrap();
        let raw = String::from_utf8_lossy(&raw);
        assert!(raw.starts_with("POST /chat-doctor"));
        assert!(!raw.contains("user_type"));
    }

    #[tokio::test]
    async fn generate_report_requests_slack_delivery() {
        let body = r#"{"report":"3 patients seen","slack_status":"sent"}"#;
        let (base_url, request) = respond_once(json_response(body)).await;

        let client = ApiClient::new(&base_url);
        let ok = client.generate_report("doc7").await.unwrap();
        assert_eq!(ok.report, "3 patients seen");
        assert_eq!(ok.slack_status, "sent");

        let raw = request.await.unwrap();
        let raw = String::from_utf8_lossy(&raw);
        assert!(raw.starts_with("POST /generate-report"));
        assert!(raw.contains(r#""send_to_slack":true"#));
    }

    #[tokio::test]
    async fn non_success_status_is_reported_as_status_error() {
        let response = "HTTP/1.1 401 Unauthorized\r\ncontent-length: 0\r\nconnection: close\r\n\r\n".to_string();
        let (base_url, _request) = respond_once(response).await;

        let client = ApiClient::new(&base_url);
        match client.login("pat42", "wrong", "Patient").await {
            Err(ApiError::Status(status)) => assert_eq!(status, StatusCode::UNAUTHORIZED),
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        // Port 1 is never listening.
        let client = ApiClient::new("http://127.0.0.1:1");
        match client.patient_chat("pat42", "hello").await {
            Err(ApiError::Network(_)) => {}
            other => panic!("expected network error, got {other:?}"),
        }
    }
}
