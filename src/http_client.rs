//! HTTP client abstraction for the AI provider and update checks.
//!
//! Provider errors are classified by status code further up, so responses
//! come back with their status instead of being turned into errors here.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for HTTP communication with external APIs.
///
/// This abstraction allows injecting mock HTTP clients for testing without
/// making real network requests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error only if the request could not be sent or the body
    /// could not be read. Non-2xx statuses are returned as responses.
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<HttpResponse>;

    /// Sends a GET request and returns the body as text.
    async fn get_text(&self, url: &str) -> Result<HttpResponse>;
}

/// HTTP client implementation using reqwest.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<HttpResponse> {
        let mut request = self.client.post(url);

        for (key, value) in headers {
            request = request.header(*key, *value);
        }

        let response = request.json(body).send().await?;
        let status = response.status().as_u16();
        Ok(HttpResponse {
            status,
            body: response.text().await?,
        })
    }

    async fn get_text(&self, url: &str) -> Result<HttpResponse> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        Ok(HttpResponse {
            status,
            body: response.text().await?,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A request the mock saw.
    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub url: String,
        pub headers: Vec<(String, String)>,
        pub body: Option<serde_json::Value>,
    }

    /// Mock HTTP client for testing.
    ///
    /// Replays queued responses in order and records every request.
    #[derive(Default)]
    pub struct MockHttpClient {
        responses: Mutex<VecDeque<Result<HttpResponse>>>,
        pub requests: Mutex<Vec<RecordedRequest>>,
    }

    impl MockHttpClient {
        pub fn with_responses(responses: Vec<Result<HttpResponse>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn ok(status: u16, body: &str) -> Result<HttpResponse> {
            Ok(HttpResponse {
                status,
                body: body.to_string(),
            })
        }

        fn next(&self) -> Result<HttpResponse> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("no response queued")))
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn post_json(
            &self,
            url: &str,
            headers: &[(&str, &str)],
            body: &serde_json::Value,
        ) -> Result<HttpResponse> {
            self.requests.lock().unwrap().push(RecordedRequest {
                url: url.to_string(),
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                body: Some(body.clone()),
            });
            self.next()
        }

        async fn get_text(&self, url: &str) -> Result<HttpResponse> {
            self.requests.lock().unwrap().push(RecordedRequest {
                url: url.to_string(),
                headers: Vec::new(),
                body: None,
            });
            self.next()
        }
    }

    #[tokio::test]
    async fn test_mock_http_client_replays_in_order() {
        let client = MockHttpClient::with_responses(vec![
            MockHttpClient::ok(200, "first"),
            MockHttpClient::ok(429, "slow down"),
        ]);

        let first = client.get_text("https://example.com/a").await.unwrap();
        let second = client
            .post_json("https://example.com/b", &[], &serde_json::json!({}))
            .await
            .unwrap();

        assert!(first.is_success());
        assert_eq!(second.status, 429);
        assert!(!second.is_success());
        assert!(client.get_text("https://example.com/c").await.is_err());
        assert_eq!(client.requests.lock().unwrap().len(), 3);
    }
}
