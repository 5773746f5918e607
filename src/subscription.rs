use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use crate::{context::ContextId, Message};

/// Обработчик сообщений подписчика.
///
/// Вызывается синхронно при каждой доставке; ссылка на сообщение
/// действительна только на время вызова. Хранится за `Arc`, потому что
/// снимок канала при публикации клонирует записи подписчиков.
pub type MessageHandler = Arc<dyn Fn(&Message) + Send + Sync>;

/// Сквозной счётчик идентификаторов подписок, общий на процесс.
static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Уникальный идентификатор подписки, сквозной для всего процесса.
///
/// Счётчик общий для всех брокеров, поэтому хэндл одного брокера
/// никогда не совпадёт с подпиской другого.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Выдаёт следующий свободный идентификатор.
    pub(crate) fn next() -> Self {
        Self::new(NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Числовое значение идентификатора.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Хэндл активной подписки: канал, владеющий контекст и идентификатор.
///
/// Хэндл — обычное клонируемое значение. Сброс хэндла ничего не
/// освобождает: подписка снимается только явным `unsubscribe` либо
/// освобождением владеющего контекста. Идентификатор контекста здесь —
/// слабая обратная ссылка для поиска, а не владение.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub(crate) id: SubscriptionId,
    pub(crate) channel: Arc<str>,
    pub(crate) context: ContextId,
}

impl Subscription {
    /// Идентификатор подписки.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Возвращает имя канала, на который подписались.
    pub fn channel_name(&self) -> &Arc<str> {
        &self.channel
    }

    /// Идентификатор владеющего контекста.
    pub fn context_id(&self) -> ContextId {
        self.context
    }
}

/// Запись подписчика в реестре каналов.
///
/// Клонируется в снимок при публикации, поэтому обработчик разделяется
/// через `Arc`, а не принадлежит записи.
#[derive(Clone)]
pub(crate) struct SubscriberEntry {
    pub(crate) id: SubscriptionId,
    pub(crate) context: ContextId,
    pub(crate) handler: MessageHandler,
}

impl fmt::Debug for SubscriberEntry {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("SubscriberEntry")
            .field("id", &self.id)
            .field("context", &self.context)
            .finish()
    }
}
