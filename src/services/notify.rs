use async_trait::async_trait;
use serde::Serialize;

use crate::pricing::PopinType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

/// Уведомление верхнего уровня для пользователя.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Окно подтверждения. `true` - пользователь подтвердил, `false` - отменил.
#[async_trait]
pub trait ConfirmationDialog: Send + Sync {
    async fn confirm(&self, popin: PopinType) -> bool;
}
