//! Интерфейс (порт) обмена сообщениями через брокер.
//!
//! Этот трейт описывает пять публичных операций ядра:
//! - `create_context` — создать контекст подписчика.
//! - `subscribe` — подписать обработчик на канал в рамках контекста.
//! - `unsubscribe` — снять отдельную подписку.
//! - `publish` — опубликовать сообщение в канал.
//! - `dispose_context` — освободить контекст вместе с его подписками.
//!
//! Хозяин-приложение зависит от порта, а не от конкретного брокера.

use crate::{
    error::{PublishError, SubscribeError},
    message::MessagePayload,
    metrics::PublishResult,
    subscription::{MessageHandler, Subscription},
    Broker, MessageContext,
};

pub trait MessagingPort: Send + Sync {
    /// Создать новый контекст подписчика.
    fn create_context(&self) -> MessageContext;
    /// Подписать обработчик на канал в рамках контекста.
    fn subscribe(
        &self,
        context: &MessageContext,
        channel: &str,
        handler: MessageHandler,
    ) -> Result<Subscription, SubscribeError>;
    /// Снять подписку; `false` — подписка уже была снята.
    fn unsubscribe(&self, subscription: &Subscription) -> bool;
    /// Опубликовать сообщение в канал.
    fn publish(
        &self,
        channel: &str,
        payload: MessagePayload,
    ) -> Result<PublishResult, PublishError>;
    /// Освободить контекст; возвращает количество снятых подписок.
    fn dispose_context(&self, context: &MessageContext) -> usize;
}

impl MessagingPort for Broker {
    fn create_context(&self) -> MessageContext {
        Broker::create_context(self)
    }

    fn subscribe(
        &self,
        context: &MessageContext,
        channel: &str,
        handler: MessageHandler,
    ) -> Result<Subscription, SubscribeError> {
        self.subscribe_handler(context, channel, handler)
    }

    fn unsubscribe(
        &self,
        subscription: &Subscription,
    ) -> bool {
        Broker::unsubscribe(self, subscription)
    }

    fn publish(
        &self,
        channel: &str,
        payload: MessagePayload,
    ) -> Result<PublishResult, PublishError> {
        Broker::publish(self, channel, payload)
    }

    fn dispose_context(
        &self,
        context: &MessageContext,
    ) -> usize {
        Broker::dispose_context(self, context)
    }
}
