use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Oldest notifications are dropped beyond this many.
const MAX_PENDING: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Non-blocking user notifications (toasts). Producers never wait on the UI.
#[derive(Clone, Default)]
pub struct Notifier {
    pending: Arc<Mutex<VecDeque<Notification>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn success(&self, message: impl Into<String>) {
        self.push(NotificationLevel::Success, message.into()).await;
    }

    pub async fn info(&self, message: impl Into<String>) {
        self.push(NotificationLevel::Info, message.into()).await;
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.push(NotificationLevel::Error, message.into()).await;
    }

    async fn push(&self, level: NotificationLevel, message: String) {
        let mut pending = self.pending.lock().await;
        if pending.len() == MAX_PENDING {
            pending.pop_front();
        }
        pending.push_back(Notification {
            level,
            message,
            created_at: Utc::now(),
        });
    }

    /// Takes every pending notification, oldest first.
    pub async fn drain(&self) -> Vec<Notification> {
        self.pending.lock().await.drain(..).collect()
    }

    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
