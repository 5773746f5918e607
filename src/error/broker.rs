use std::{any::Any, sync::Arc};

use thiserror::Error;

use crate::{context::ContextId, subscription::SubscriptionId};

/// Ошибка при оформлении подписки.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscribeError {
    #[error("invalid channel name: empty identifier")]
    InvalidChannel,

    #[error("message context {0} is disposed or unknown")]
    ContextDisposed(ContextId),

    #[error("duplicate subscription id {0} in registry")]
    DuplicateSubscription(SubscriptionId),

    #[error("channel {0} subscriber limit exceeded (limit {1})")]
    SubscriberLimitExceeded(String, usize),
}

/// Ошибка при публикации.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("invalid channel name: empty identifier")]
    InvalidChannel,

    #[error("message serialization error: {0}")]
    Serialization(String),
}

/// Сбой обработчика подписчика, перехваченный при доставке.
///
/// Никогда не возвращается издателю: брокер передаёт его в хук отчётов
/// и продолжает доставку остальным подписчикам из снимка.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("subscriber {subscription} on channel {channel} failed: {reason}")]
pub struct CallbackError {
    /// Подписка, чей обработчик завершился паникой.
    pub subscription: SubscriptionId,
    /// Канал, в который шла доставка.
    pub channel: Arc<str>,
    /// Сообщение паники, если его удалось извлечь.
    pub reason: String,
}

impl CallbackError {
    /// Собирает описание сбоя из полезной нагрузки паники.
    pub(crate) fn from_panic(
        subscription: SubscriptionId,
        channel: Arc<str>,
        panic: Box<dyn Any + Send>,
    ) -> Self {
        let reason = if let Some(text) = panic.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = panic.downcast_ref::<String>() {
            text.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self {
            subscription,
            channel,
            reason,
        }
    }
}
