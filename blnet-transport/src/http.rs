//! HTTP transport for the CMI JSON API

use crate::error::{BlnetError, BlnetResult};
use async_trait::async_trait;
use blnet_core::CmiRequest;
use std::time::Duration;

/// Path of the JSON API on the CMI
pub const API_PATH: &str = "/INCLUDE/api.cgi";

/// Fetches one JSON document per request
#[async_trait]
pub trait JsonExchange: Send {
    async fn get_json(&mut self, request: &CmiRequest) -> BlnetResult<String>;
}

/// HTTP settings of a CMI
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Base URL, e.g. `http://192.168.1.20`
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
}

impl HttpSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: None,
            password: None,
            timeout: Duration::from_secs(10),
        }
    }

    /// Credentials passed through as HTTP Basic Auth
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL of the JSON API
    pub fn api_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), API_PATH)
    }
}

/// reqwest-based [`JsonExchange`]
#[derive(Debug, Clone)]
pub struct CmiHttpTransport {
    client: reqwest::Client,
    settings: HttpSettings,
}

impl CmiHttpTransport {
    pub fn new(settings: HttpSettings) -> BlnetResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| BlnetError::Http(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &HttpSettings {
        &self.settings
    }
}

fn map_reqwest_error(e: reqwest::Error) -> BlnetError {
    if e.is_timeout() {
        BlnetError::Timeout
    } else {
        BlnetError::Http(e.to_string())
    }
}

#[async_trait]
impl JsonExchange for CmiHttpTransport {
    async fn get_json(&mut self, request: &CmiRequest) -> BlnetResult<String> {
        let url = self.settings.api_url();
        log::debug!("GET {} {}", url, request);

        let mut builder = self.client.get(&url).query(&request.query());
        if let Some(username) = &self.settings.username {
            builder = builder.basic_auth(username, self.settings.password.as_ref());
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(BlnetError::Http(format!("{} returned HTTP {}", url, status)));
        }

        let body = response.text().await.map_err(map_reqwest_error)?;
        log::debug!("Received {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one HTTP response and hands back the raw request head
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (u16, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !String::from_utf8_lossy(&request).contains("\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\
                 Connection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).into_owned()
        });
        (port, handle)
    }

    #[test]
    fn test_api_url() {
        assert_eq!(
            HttpSettings::new("http://cmi.local/").api_url(),
            "http://cmi.local/INCLUDE/api.cgi"
        );
    }

    #[tokio::test]
    async fn test_get_json_with_basic_auth() {
        let body = r#"{"Status":"OK","Status code":0}"#;
        let (port, server) = serve_once("HTTP/1.1 200 OK", body).await;

        let settings = HttpSettings::new(format!("http://127.0.0.1:{}", port))
            .with_credentials("admin", "admin");
        let mut transport = CmiHttpTransport::new(settings).unwrap();
        let request = CmiRequest::new(1, vec!["I".to_string(), "O".to_string()]);
        let received = transport.get_json(&request).await.unwrap();
        assert_eq!(received, body);

        let head = server.await.unwrap();
        assert!(head.starts_with("GET /INCLUDE/api.cgi?"));
        assert!(head.contains("jsonnode=1"));
        assert!(head.contains("jsonparam=I%2CO"));
        assert!(head.to_ascii_lowercase().contains("authorization: basic ywrtaw46ywrtaw4="));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let (port, server) = serve_once("HTTP/1.1 401 Unauthorized", "").await;
        let mut transport =
            CmiHttpTransport::new(HttpSettings::new(format!("http://127.0.0.1:{}", port))).unwrap();
        let result = transport.get_json(&CmiRequest::new(1, vec!["I".to_string()])).await;
        assert!(matches!(result, Err(BlnetError::Http(_))));
        server.await.unwrap();
    }
}
