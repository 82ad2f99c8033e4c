//! HTTP client abstraction for testability

use std::time::Duration;

use super::types::ProviderError;

/// Default User-Agent string for HTTP requests.
/// Some map endpoints reject requests without one.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Status, content type and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
    }
}

/// Trait for synchronous HTTP client operations.
///
/// Non-success statuses are returned as responses, not errors, so the caller
/// can classify them. Only failures to complete the request are errors.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    fn get(&self, url: &str) -> Result<HttpResponse, ProviderError>;
}

/// Real HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a client whose requests fail after `timeout`.
    ///
    /// Must not be called from inside an async context: the blocking reqwest
    /// client owns its own runtime.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| {
                ProviderError::Transport(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<HttpResponse, ProviderError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ProviderError::Transport(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| {
                ProviderError::Transport(format!("Failed to read response: {}", e.without_url()))
            })?;

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Mock HTTP client that replays scripted responses in order.
    ///
    /// Once the script runs out the last entry repeats. Every requested URL
    /// is recorded.
    pub struct MockHttpClient {
        script: Mutex<VecDeque<Result<HttpResponse, ProviderError>>>,
        last: Mutex<Option<Result<HttpResponse, ProviderError>>>,
        pub urls: Mutex<Vec<String>>,
    }

    impl MockHttpClient {
        pub fn new(script: Vec<Result<HttpResponse, ProviderError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                last: Mutex::new(None),
                urls: Mutex::new(Vec::new()),
            }
        }

        pub fn always(response: Result<HttpResponse, ProviderError>) -> Self {
            Self::new(vec![response])
        }

        pub fn image(body: Vec<u8>) -> HttpResponse {
            HttpResponse {
                status: 200,
                content_type: Some("image/jpeg".to_string()),
                body,
            }
        }

        pub fn status(status: u16, body: &str) -> HttpResponse {
            HttpResponse {
                status,
                content_type: Some("text/plain".to_string()),
                body: body.as_bytes().to_vec(),
            }
        }

        pub fn request_count(&self) -> usize {
            self.urls.lock().unwrap().len()
        }
    }

    impl HttpClient for MockHttpClient {
        fn get(&self, url: &str) -> Result<HttpResponse, ProviderError> {
            self.urls.lock().unwrap().push(url.to_string());
            let next = self.script.lock().unwrap().pop_front();
            let mut last = self.last.lock().unwrap();
            match next {
                Some(response) => {
                    *last = Some(response.clone());
                    response
                }
                None => last
                    .clone()
                    .unwrap_or_else(|| Err(ProviderError::Transport("empty script".into()))),
            }
        }
    }

    #[test]
    fn test_mock_replays_in_order_then_repeats() {
        let mock = MockHttpClient::new(vec![
            Ok(MockHttpClient::status(500, "boom")),
            Ok(MockHttpClient::image(vec![1, 2, 3])),
        ]);

        assert_eq!(mock.get("a").unwrap().status, 500);
        assert_eq!(mock.get("b").unwrap().body, vec![1, 2, 3]);
        assert_eq!(mock.get("c").unwrap().body, vec![1, 2, 3]);
        assert_eq!(mock.request_count(), 3);
    }

    #[test]
    fn test_response_classification() {
        assert!(MockHttpClient::image(vec![]).is_image());
        assert!(MockHttpClient::image(vec![]).is_success());

        let html = HttpResponse {
            status: 200,
            content_type: Some("text/html; charset=UTF-8".into()),
            body: vec![],
        };
        assert!(!html.is_image());

        let missing = HttpResponse {
            status: 200,
            content_type: None,
            body: vec![],
        };
        assert!(!missing.is_image());
        assert!(!MockHttpClient::status(403, "denied").is_success());
    }
}
