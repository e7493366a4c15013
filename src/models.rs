use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

/// A joke as returned by the remote joke API.
///
/// Only `id` and `value` are required; everything else defaults so that
/// older or partial records still deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Joke {
    pub id: String,
    pub value: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub icon_url: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Joke {
    /// First eight characters of the id followed by an ellipsis, for card footers.
    pub fn short_id(&self) -> String {
        let mut chars = self.id.chars();
        let head: String = chars.by_ref().take(8).collect();
        if chars.next().is_some() {
            format!("{}…", head)
        } else {
            head
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JokeItem {
    pub joke: Joke,
    // Milliseconds since the epoch, assigned locally when the joke arrived.
    // `None` marks a placeholder that should never be evicted first.
    pub fetched_at: Option<i64>,
}

impl JokeItem {
    pub fn new(joke: Joke, fetched_at: i64) -> Self {
        Self {
            joke,
            fetched_at: Some(fetched_at),
        }
    }

    pub fn fetched_at_local(&self) -> Option<String> {
        let millis = self.fetched_at?;
        let utc = chrono::DateTime::from_timestamp_millis(millis)?;
        Some(
            utc.with_timezone(&chrono::Local)
                .format("%H:%M:%S")
                .to_string(),
        )
    }
}

/// Hands out strictly increasing millisecond timestamps.
///
/// Wall-clock time is used when it moves forward; otherwise the previous
/// value plus one, so two jokes never share a `fetched_at`.
#[derive(Debug, Default)]
pub struct FetchClock {
    last: AtomicI64,
}

impl FetchClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> i64 {
        self.reserve(1)
    }

    /// Reserves `count` consecutive timestamps and returns the first one.
    pub fn reserve(&self, count: usize) -> i64 {
        let count = count.max(1) as i64;
        let now = chrono::Utc::now().timestamp_millis();
        // The closure never returns None, so this always succeeds
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1) + count - 1)
            })
            .unwrap_or_else(|prev| prev);
        now.max(previous + 1)
    }
}
