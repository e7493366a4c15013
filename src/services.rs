use std::sync::Arc;

use crate::favorites_hub::FavoritesHub;
use crate::toast::ToastQueue;

/// Raised when a view asks for a service nobody wired in. This is a
/// programming mistake, so views resolve their services once at
/// construction and refuse to start without them.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0} must be used within a scope that provides it")]
    NotProvided(&'static str),
}

/// Shared services handed to views when they are built.
#[derive(Clone, Default)]
pub struct Services {
    favorites: Option<Arc<FavoritesHub>>,
    toasts: Option<Arc<ToastQueue>>,
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_favorites(mut self, hub: Arc<FavoritesHub>) -> Self {
        self.favorites = Some(hub);
        self
    }

    pub fn with_toasts(mut self, toasts: Arc<ToastQueue>) -> Self {
        self.toasts = Some(toasts);
        self
    }

    pub fn favorites(&self) -> Result<Arc<FavoritesHub>, ServiceError> {
        self.favorites
            .clone()
            .ok_or(ServiceError::NotProvided("favorites"))
    }

    pub fn toasts(&self) -> Result<Arc<ToastQueue>, ServiceError> {
        self.toasts.clone().ok_or(ServiceError::NotProvided("toasts"))
    }
}

/// Everything a joke card needs to show and flip favorite state.
#[derive(Clone)]
pub struct FavoriteActions {
    pub favorites: Arc<FavoritesHub>,
    pub toasts: Arc<ToastQueue>,
}

pub const LIMIT_REACHED_MESSAGE: &str = "Maximum of 10 favorites allowed.";
pub const SAVE_FAILED_MESSAGE: &str = "Favorites could not be saved and will be lost on exit.";

impl FavoriteActions {
    pub fn from_services(services: &Services) -> Result<Self, ServiceError> {
        Ok(Self {
            favorites: services.favorites()?,
            toasts: services.toasts()?,
        })
    }

    /// Toggles and raises the limit toast when the add was refused.
    pub fn toggle(&self, joke: &crate::models::Joke) -> bool {
        let result = self.favorites.toggle(joke);
        tracing::debug!(id = %joke.id, added = result.did_add, blocked = result.blocked_by_limit, "favorite toggled");
        if result.blocked_by_limit {
            self.toasts.warning(LIMIT_REACHED_MESSAGE);
        } else if result.save_failed {
            self.toasts.error(SAVE_FAILED_MESSAGE);
        }
        result.blocked_by_limit
    }

    pub fn remove(&self, id: &str) {
        if self.favorites.remove(id).is_err() {
            self.toasts.error(SAVE_FAILED_MESSAGE);
        }
    }

    pub fn clear(&self) {
        if self.favorites.clear().is_err() {
            self.toasts.error(SAVE_FAILED_MESSAGE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{KeyValueStore, MemoryStore};
    use crate::toast::ToastLevel;
    use crate::favorites::MAX_FAVORITES;
    use crate::models::Joke;

    fn joke(id: &str) -> Joke {
        Joke {
            id: id.to_string(),
            value: format!("joke-{}", id),
            url: String::new(),
            icon_url: String::new(),
            categories: Vec::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_missing_services_fail_fast() {
        let err = FavoriteActions::from_services(&Services::new()).err();
        assert_eq!(err, Some(ServiceError::NotProvided("favorites")));

        let only_favorites = Services::new().with_favorites(FavoritesHub::new(None));
        let err = FavoriteActions::from_services(&only_favorites).err();
        assert_eq!(err, Some(ServiceError::NotProvided("toasts")));
        assert!(err.unwrap().to_string().contains("toasts"));
    }

    #[test]
    fn test_limit_raises_toast() {
        let services = Services::new()
            .with_favorites(FavoritesHub::new(Some(Arc::new(MemoryStore::new()))))
            .with_toasts(Arc::new(ToastQueue::default()));
        let actions = FavoriteActions::from_services(&services).unwrap();

        for i in 0..MAX_FAVORITES {
            assert!(!actions.toggle(&joke(&i.to_string())));
        }
        assert!(actions.toasts.current().is_none());

        assert!(actions.toggle(&joke("one-too-many")));
        assert_eq!(actions.toasts.current().unwrap().message, LIMIT_REACHED_MESSAGE);
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get_item(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Ok(None)
        }

        fn set_item(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("disk full"))
        }

        fn remove_item(&self, _key: &str) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("disk full"))
        }

        fn change_marker(&self) -> anyhow::Result<u64> {
            Ok(0)
        }
    }

    #[test]
    fn test_failed_save_raises_error_toast() {
        let services = Services::new()
            .with_favorites(FavoritesHub::new(Some(Arc::new(BrokenStore))))
            .with_toasts(Arc::new(ToastQueue::default()));
        let actions = FavoriteActions::from_services(&services).unwrap();

        assert!(!actions.toggle(&joke("a")));
        assert!(actions.favorites.is_favorite("a"));
        let toast = actions.toasts.current().unwrap();
        assert_eq!(toast.message, SAVE_FAILED_MESSAGE);
        assert_eq!(toast.level, ToastLevel::Error);

        actions.toasts.dismiss();
        actions.remove("a");
        assert_eq!(actions.favorites.count(), 0);
        assert_eq!(actions.toasts.current().unwrap().message, SAVE_FAILED_MESSAGE);
    }
}
