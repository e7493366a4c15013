use anyhow::Result;
use futures::future::try_join_all;
use reqwest::header::CACHE_CONTROL;
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::models::Joke;

pub const DEFAULT_API_BASE: &str = "https://api.chucknorris.io";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request aborted")]
    Aborted,

    #[error("Failed to fetch random joke ({0})")]
    Status(StatusCode),

    #[error("Invalid joke response")]
    InvalidResponse,

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl FetchError {
    /// Aborts come from our own cancellation and should never reach the user.
    pub fn is_aborted(&self) -> bool {
        matches!(self, FetchError::Aborted)
    }
}

/// Anything that can hand out one random joke per call.
pub trait JokeSource: Send + Sync + 'static {
    fn fetch_random_joke(
        &self,
        cancel: &CancelToken,
    ) -> impl Future<Output = Result<Joke, FetchError>> + Send;
}

/// Fetches `count` jokes concurrently. Any failure fails the whole batch.
pub async fn fetch_batch<S: JokeSource>(
    source: &S,
    count: usize,
    cancel: &CancelToken,
) -> Result<Vec<Joke>, FetchError> {
    try_join_all((0..count).map(|_| source.fetch_random_joke(cancel))).await
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base: String,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

pub struct ChuckClient {
    client: Client,
    random_url: String,
}

impl ChuckClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("chuck_jokes_reader/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            random_url: format!("{}/jokes/random", config.api_base.trim_end_matches('/')),
        })
    }

    async fn request_random(&self) -> Result<Joke, FetchError> {
        // The random endpoint must never be served from a cache
        let response = self
            .client
            .get(&self.random_url)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        parse_joke_payload(&body)
    }
}

impl JokeSource for ChuckClient {
    fn fetch_random_joke(
        &self,
        cancel: &CancelToken,
    ) -> impl Future<Output = Result<Joke, FetchError>> + Send {
        async move {
            if cancel.is_cancelled() {
                return Err(FetchError::Aborted);
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(FetchError::Aborted),
                result = self.request_random() => {
                    if let Err(e) = &result {
                        tracing::debug!(error = %e, "random joke request failed");
                    }
                    result
                }
            }
        }
    }
}

/// Validates a random-joke response body. `id` and `value` must be
/// non-empty strings.
pub fn parse_joke_payload(body: &str) -> Result<Joke, FetchError> {
    let joke: Joke = serde_json::from_str(body).map_err(|_| FetchError::InvalidResponse)?;
    if joke.id.is_empty() || joke.value.is_empty() {
        return Err(FetchError::InvalidResponse);
    }
    Ok(joke)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        fail_on: Option<usize>,
    }

    impl JokeSource for CountingSource {
        fn fetch_random_joke(
            &self,
            cancel: &CancelToken,
        ) -> impl Future<Output = Result<Joke, FetchError>> + Send {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail_on == Some(n);
            let cancelled = cancel.is_cancelled();
            async move {
                if cancelled {
                    return Err(FetchError::Aborted);
                }
                if fail {
                    return Err(FetchError::InvalidResponse);
                }
                parse_joke_payload(&format!(r#"{{"id":"j{n}","value":"joke {n}"}}"#))
            }
        }
    }

    #[test]
    fn test_parse_full_payload() {
        let body = r#"{
            "categories": ["dev"],
            "created_at": "2020-01-05 13:42:19.576875",
            "icon_url": "https://api.chucknorris.io/img/avatar/chuck-norris.png",
            "id": "abc123",
            "updated_at": "2020-01-05 13:42:19.576875",
            "url": "https://api.chucknorris.io/jokes/abc123",
            "value": "Chuck Norris can divide by zero."
        }"#;
        let joke = parse_joke_payload(body).unwrap();
        assert_eq!(joke.id, "abc123");
        assert_eq!(joke.categories, vec!["dev".to_string()]);
        assert_eq!(joke.url, "https://api.chucknorris.io/jokes/abc123");
    }

    #[test]
    fn test_parse_rejects_missing_or_empty_fields() {
        for body in [
            r#"{"value":"no id"}"#,
            r#"{"id":"no value"}"#,
            r#"{"id":"","value":"empty id"}"#,
            r#"{"id":"x","value":""}"#,
            "<html>oops</html>",
        ] {
            assert!(
                matches!(parse_joke_payload(body), Err(FetchError::InvalidResponse)),
                "body: {body}"
            );
        }
    }

    #[test]
    fn test_status_error_message_mentions_code() {
        let err = FetchError::Status(StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.to_string().contains("503"));
        assert!(!err.is_aborted());
        assert!(FetchError::Aborted.is_aborted());
    }

    #[tokio::test]
    async fn test_batch_collects_all_results() {
        let source = CountingSource {
            calls: AtomicUsize::new(0),
            fail_on: None,
        };
        let jokes = fetch_batch(&source, 10, &CancelToken::new()).await.unwrap();
        assert_eq!(jokes.len(), 10);
    }

    #[tokio::test]
    async fn test_batch_fails_when_any_call_fails() {
        let source = CountingSource {
            calls: AtomicUsize::new(0),
            fail_on: Some(4),
        };
        let result = fetch_batch(&source, 10, &CancelToken::new()).await;
        assert!(matches!(result, Err(FetchError::InvalidResponse)));
    }

    #[tokio::test]
    async fn test_cancelled_client_call_is_aborted_without_network() {
        let client = ChuckClient::new(&ClientConfig {
            api_base: "http://127.0.0.1:9".to_string(),
            request_timeout: Duration::from_secs(1),
        })
        .unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = client.fetch_random_joke(&cancel).await;
        assert!(matches!(result, Err(FetchError::Aborted)));
    }
}
