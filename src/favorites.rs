use anyhow::Result;
use std::collections::HashSet;

use crate::db::KeyValueStore;
use crate::models::Joke;

/// Versioned so a future layout change can tell legacy data apart.
pub const STORAGE_KEY: &str = "chuck:favorites:v1";

pub const MAX_FAVORITES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub favorites: Vec<Joke>,
    pub did_add: bool,
    pub blocked_by_limit: bool,
}

pub fn is_favorite(favorites: &[Joke], id: &str) -> bool {
    favorites.iter().any(|joke| joke.id == id)
}

/// Removes `joke` if present, otherwise appends it unless the limit is reached.
pub fn toggle_favorite(favorites: &[Joke], joke: &Joke) -> ToggleOutcome {
    if is_favorite(favorites, &joke.id) {
        return ToggleOutcome {
            favorites: remove_favorite(favorites, &joke.id),
            did_add: false,
            blocked_by_limit: false,
        };
    }

    if favorites.len() >= MAX_FAVORITES {
        return ToggleOutcome {
            favorites: favorites.to_vec(),
            did_add: false,
            blocked_by_limit: true,
        };
    }

    let mut next = Vec::with_capacity(favorites.len() + 1);
    next.extend_from_slice(favorites);
    next.push(joke.clone());
    ToggleOutcome {
        favorites: next,
        did_add: true,
        blocked_by_limit: false,
    }
}

pub fn remove_favorite(favorites: &[Joke], id: &str) -> Vec<Joke> {
    favorites.iter().filter(|joke| joke.id != id).cloned().collect()
}

/// Reads the stored favorites. Never fails: a missing store, a read error,
/// or malformed content all come back as an empty list.
pub fn load_favorites(store: Option<&dyn KeyValueStore>) -> Vec<Joke> {
    let Some(store) = store else {
        return Vec::new();
    };

    match store.get_item(STORAGE_KEY) {
        Ok(Some(raw)) => parse_favorites(&raw),
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read favorites, starting empty");
            Vec::new()
        }
    }
}

/// Writes the full collection. A missing store is a no-op.
pub fn save_favorites(store: Option<&dyn KeyValueStore>, favorites: &[Joke]) -> Result<()> {
    let Some(store) = store else {
        return Ok(());
    };
    let raw = serde_json::to_string(favorites)?;
    store.set_item(STORAGE_KEY, &raw)
}

/// Parses stored favorites, keeping only well-formed, unique entries up to
/// the limit.
pub fn parse_favorites(raw: &str) -> Vec<Joke> {
    let parsed: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "stored favorites are not valid JSON");
            return Vec::new();
        }
    };

    let serde_json::Value::Array(elements) = parsed else {
        tracing::warn!("stored favorites are not an array");
        return Vec::new();
    };

    let total = elements.len();
    let mut seen = HashSet::new();
    let favorites: Vec<Joke> = elements
        .into_iter()
        .filter_map(|element| serde_json::from_value::<Joke>(element).ok())
        .filter(|joke| seen.insert(joke.id.clone()))
        .take(MAX_FAVORITES)
        .collect();

    if favorites.len() < total {
        tracing::debug!(
            kept = favorites.len(),
            dropped = total - favorites.len(),
            "dropped invalid stored favorites"
        );
    }
    favorites
}
