// Transient feedback shown at the bottom of the window.
// Only one toast is visible at a time; a new one replaces the old.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

impl ToastLevel {
    pub fn icon(&self) -> &'static str {
        match self {
            ToastLevel::Info => "ℹ",
            ToastLevel::Warning => "⚠",
            ToastLevel::Error => "✗",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub level: ToastLevel,
    pub shown_at: Instant,
    pub duration: Duration,
}

impl Toast {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.shown_at) >= self.duration
    }
}

pub struct ToastQueue {
    current: Mutex<Option<Toast>>,
    duration: Duration,
}

impl ToastQueue {
    pub fn new(duration: Duration) -> Self {
        Self {
            current: Mutex::new(None),
            duration,
        }
    }

    pub fn show(&self, level: ToastLevel, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(?level, %message, "toast");
        *self.current.lock() = Some(Toast {
            message,
            level,
            shown_at: Instant::now(),
            duration: self.duration,
        });
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.show(ToastLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(ToastLevel::Error, message);
    }

    /// The visible toast, if any. Expired toasts are cleared here.
    pub fn current(&self) -> Option<Toast> {
        self.current_at(Instant::now())
    }

    fn current_at(&self, now: Instant) -> Option<Toast> {
        let mut current = self.current.lock();
        if current.as_ref().is_some_and(|toast| toast.is_expired(now)) {
            *current = None;
        }
        current.clone()
    }

    pub fn dismiss(&self) {
        *self.current.lock() = None;
    }
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_DURATION)
    }
}
