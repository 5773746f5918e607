use std::{
    fmt,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use bytes::Bytes;
use tracing::{debug, error, trace};

use crate::{
    config::BrokerConfig,
    context::{ContextRegistry, MessageContext},
    error::{CallbackError, PublishError, SubscribeError},
    intern_channel,
    message::{Message, MessageMetadata, MessagePayload},
    metrics::{BrokerMetrics, ChannelStats, PublishResult},
    registry::ChannelRegistry,
    reporter::{ErrorReporter, TracingReporter},
    subscription::{MessageHandler, SubscriberEntry, Subscription},
    SubscriptionId,
};

/// Брокер сообщений: координация подписок и синхронная доставка.
///
/// Поддерживает:
/// - Контексты подписчиков с атомарным демонтажом их подписок
/// - Доставку в порядке регистрации по снимку канала
/// - Изоляцию сбоев: паника одного подписчика не прерывает доставку
/// - Статистику публикаций и счётчики подписок
///
/// Все операции принимают `&self`; брокер безопасно разделяется между
/// потоками. Колбэки вызываются вне каких-либо замков, поэтому
/// вложенные `publish`/`subscribe`/`unsubscribe` из обработчика
/// допустимы и видят реестр уже после снимка текущей доставки.
pub struct Broker {
    registry: ChannelRegistry,
    contexts: ContextRegistry,
    config: BrokerConfig,
    reporter: Arc<dyn ErrorReporter>,
    metrics: BrokerMetrics,
    sequence: AtomicU64,
}

impl Broker {
    /// Создаёт брокер с настройками по умолчанию.
    pub fn new() -> Self {
        Self::with_config(BrokerConfig::default())
    }

    /// Создаёт брокер с заданными настройками и репортёром по умолчанию.
    pub fn with_config(config: BrokerConfig) -> Self {
        Self::with_reporter(config, Arc::new(TracingReporter))
    }

    /// Создаёт брокер с заданными настройками и хуком отчётов о сбоях
    /// подписчиков.
    pub fn with_reporter(
        config: BrokerConfig,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            registry: ChannelRegistry::new(),
            contexts: ContextRegistry::new(),
            config,
            reporter,
            metrics: BrokerMetrics::new(),
            sequence: AtomicU64::new(0),
        }
    }

    /// Создаёт новый контекст подписчика.
    pub fn create_context(&self) -> MessageContext {
        let context = self.contexts.create();
        debug!(context = %context.id(), "message context created");
        context
    }

    /// Подписывает обработчик на канал в рамках контекста.
    ///
    /// Возвращает хэндл, по которому подписку можно снять отдельно от
    /// контекста. Пустое имя канала и освобождённый контекст —
    /// синхронные ошибки вызывающему; контекст чужого брокера
    /// неотличим от освобождённого.
    pub fn subscribe<S, F>(
        &self,
        context: &MessageContext,
        channel: S,
        handler: F,
    ) -> Result<Subscription, SubscribeError>
    where
        S: AsRef<str>,
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.subscribe_handler(context, channel.as_ref(), Arc::new(handler))
    }

    /// Вариант `subscribe` для уже готового `MessageHandler`.
    pub fn subscribe_handler(
        &self,
        context: &MessageContext,
        channel: &str,
        handler: MessageHandler,
    ) -> Result<Subscription, SubscribeError> {
        if channel.is_empty() {
            return Err(SubscribeError::InvalidChannel);
        }
        if !self.contexts.contains(context.id()) {
            return Err(SubscribeError::ContextDisposed(context.id()));
        }

        let key = intern_channel(channel);
        let id = SubscriptionId::next();
        let entry = SubscriberEntry {
            id,
            context: context.id(),
            handler,
        };

        let count = self
            .registry
            .register(key.clone(), entry, self.config.max_subscribers_per_channel)
            .inspect_err(|err| {
                if let SubscribeError::DuplicateSubscription(dup) = err {
                    error!(subscription = %dup, channel, "duplicate subscription id in registry");
                }
            })?;

        // счётчик растёт до track: параллельный dispose декрементирует
        // только уже учтённую подписку
        self.metrics.subscription_added();
        if !self.contexts.track(context.id(), id) {
            // контекст освободили между проверкой и регистрацией
            self.registry.unregister(id);
            self.metrics.subscription_removed();
            return Err(SubscribeError::ContextDisposed(context.id()));
        }

        debug!(
            subscription = %id,
            channel,
            context = %context.id(),
            subscribers = count,
            "subscribed"
        );
        Ok(Subscription {
            id,
            channel: key,
            context: context.id(),
        })
    }

    /// Снимает подписку и убирает её из набора владеющего контекста.
    ///
    /// Возвращает `false`, если подписка уже снята: повторный вызов —
    /// обычный no-op, не ошибка. Уже взятый снимок текущей доставки
    /// отписка не ревизует.
    pub fn unsubscribe(
        &self,
        subscription: &Subscription,
    ) -> bool {
        match self.registry.unregister(subscription.id()) {
            Some(channel) => {
                self.contexts
                    .untrack(subscription.context_id(), subscription.id());
                self.metrics.subscription_removed();
                debug!(subscription = %subscription.id(), channel = %channel, "unsubscribed");
                true
            }
            None => false,
        }
    }

    /// Публикует сообщение в канал.
    ///
    /// Снимок подписчиков берётся на входе; каждый обработчик
    /// вызывается синхронно на потоке издателя, в порядке регистрации.
    /// Паника обработчика перехватывается, уходит в хук отчётов и не
    /// мешает остальным подписчикам из снимка. Канал без подписчиков —
    /// нормальный no-op с нулевым итогом.
    pub fn publish<S: AsRef<str>>(
        &self,
        channel: S,
        payload: MessagePayload,
    ) -> Result<PublishResult, PublishError> {
        let name = channel.as_ref();
        if name.is_empty() {
            return Err(PublishError::InvalidChannel);
        }
        self.metrics.record_publish();

        let snapshot = self.registry.snapshot(name);
        if snapshot.is_empty() {
            return Ok(PublishResult::default());
        }
        self.registry.record_publish(name);

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let message = Message {
            channel: intern_channel(name),
            payload,
            metadata: MessageMetadata::with_sequence(sequence),
        };

        let mut result = PublishResult::default();
        for entry in &snapshot {
            result.subscribers_reached += 1;
            match catch_unwind(AssertUnwindSafe(|| (*entry.handler)(&message))) {
                Ok(()) => self.metrics.record_delivery(),
                Err(panic) => {
                    result.failed += 1;
                    self.metrics.record_failed_callback();
                    let failure =
                        CallbackError::from_panic(entry.id, message.channel.clone(), panic);
                    self.reporter.report(&failure);
                }
            }
        }

        trace!(
            channel = name,
            sequence,
            reached = result.subscribers_reached,
            failed = result.failed,
            "published"
        );
        Ok(result)
    }

    /// Публикует бинарную нагрузку.
    pub fn publish_bytes<S: AsRef<str>>(
        &self,
        channel: S,
        payload: Bytes,
    ) -> Result<PublishResult, PublishError> {
        self.publish(channel, MessagePayload::Bytes(payload))
    }

    /// Публикует текстовую нагрузку.
    pub fn publish_str<S, T>(
        &self,
        channel: S,
        text: T,
    ) -> Result<PublishResult, PublishError>
    where
        S: AsRef<str>,
        T: Into<String>,
    {
        self.publish(channel, MessagePayload::String(text.into()))
    }

    /// Сериализует значение в JSON и публикует его.
    pub fn publish_json<S, T>(
        &self,
        channel: S,
        value: &T,
    ) -> Result<PublishResult, PublishError>
    where
        S: AsRef<str>,
        T: serde::Serialize,
    {
        let json = serde_json::to_value(value)
            .map_err(|err| PublishError::Serialization(err.to_string()))?;
        self.publish(channel, MessagePayload::Json(json))
    }

    /// Освобождает контекст: снимает все его подписки и изымает сам
    /// контекст. Возвращает количество снятых подписок; повторное
    /// освобождение — no-op с нулём.
    pub fn dispose_context(
        &self,
        context: &MessageContext,
    ) -> usize {
        match self.contexts.dispose(context.id()) {
            Some(owned) => {
                let mut removed = 0;
                for id in owned {
                    if self.registry.unregister(id).is_some() {
                        removed += 1;
                        self.metrics.subscription_removed();
                    }
                }
                debug!(context = %context.id(), removed, "message context disposed");
                removed
            }
            None => 0,
        }
    }

    /// Количество подписчиков канала.
    pub fn subscriber_count<S: AsRef<str>>(
        &self,
        channel: S,
    ) -> usize {
        self.registry.subscriber_count(channel.as_ref())
    }

    /// Список всех каналов с хотя бы одним подписчиком.
    pub fn active_channels(&self) -> Vec<String> {
        self.registry.active_channels()
    }

    /// Статистика канала, если он существует.
    pub fn channel_stats<S: AsRef<str>>(
        &self,
        channel: S,
    ) -> Option<ChannelStats> {
        self.registry.stats(channel.as_ref())
    }

    /// Количество живых контекстов.
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Глобальные счётчики брокера.
    pub fn metrics(&self) -> &BrokerMetrics {
        &self.metrics
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Broker {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Broker")
            .field("channels", &self.registry.channel_count())
            .field("subscriptions", &self.registry.subscription_count())
            .field("contexts", &self.contexts.len())
            .finish()
    }
}
