//! Notification sink collaborator
//!
//! Best-effort, post-commit only. Delivery (Telegram, email, ...) is owned
//! by an external collaborator; a failed notification is logged and dropped.

use async_trait::async_trait;

use crate::core_types::UserId;

/// Post-commit user notification
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, user_id: UserId, message: &str) -> anyhow::Result<()>;
}

/// Default sink: structured log line per notification
pub struct TracingNotifier;

#[async_trait]
impl NotificationSink for TracingNotifier {
    async fn notify(&self, user_id: UserId, message: &str) -> anyhow::Result<()> {
        tracing::info!(user_id = user_id, message = %message, "notify");
        Ok(())
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    pub struct MockNotifier {
        pub sent: Mutex<Vec<(UserId, String)>>,
    }

    impl MockNotifier {
        pub fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
            }
        }

        pub fn count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl NotificationSink for MockNotifier {
        async fn notify(&self, user_id: UserId, message: &str) -> anyhow::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((user_id, message.to_string()));
            Ok(())
        }
    }
}
