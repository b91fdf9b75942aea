use crate::features::lists::RemovalKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 通知の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

/// 利用者に表示する通知
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }
}

/// 通知の表示先
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// 取り消せない操作の前に利用者の確認を取る
#[async_trait]
pub trait ConfirmationGate: Send + Sync {
    async fn confirm(&self, kind: RemovalKind) -> bool;
}

/// ログに通知を出力する
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => log::error!("{}", notification.message),
            NotificationLevel::Success | NotificationLevel::Info => {
                log::info!("{}", notification.message)
            }
        }
    }
}

/// 常に確認済みとして扱う（対話のない実行向け）
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConfirm;

#[async_trait]
impl ConfirmationGate for AlwaysConfirm {
    async fn confirm(&self, kind: RemovalKind) -> bool {
        log::debug!("確認を省略しました: {kind}");
        true
    }
}
