use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;

use crate::subscription::SubscriptionId;

/// Сквозной счётчик идентификаторов контекстов, общий на процесс.
static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Уникальный идентификатор контекста, сквозной для всего процесса.
///
/// Счётчик общий для всех брокеров: контексты независимых
/// экземпляров не совпадают по идентификатору.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Выдаёт следующий свободный идентификатор.
    pub(crate) fn next() -> Self {
        Self::new(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Числовое значение идентификатора.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Хэндл контекста подписчика: область жизни его подписок.
///
/// Контекст создаётся явно через `Broker::create_context` до первой
/// подписки и освобождается явно через `Broker::dispose_context`;
/// скрытого общего контекста по умолчанию нет. Хэндл — копируемый
/// токен поиска, его сброс ничего не освобождает. Хэндл привязан
/// к создавшему его брокеру: чужой экземпляр отвергнет его как
/// освобождённый.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageContext {
    pub(crate) id: ContextId,
}

impl MessageContext {
    /// Идентификатор контекста.
    pub fn id(&self) -> ContextId {
        self.id
    }
}

/// Реестр живых контекстов и принадлежащих им подписок.
///
/// Освобождённый контекст покидает таблицу целиком, поэтому повторное
/// освобождение и подписка через него различимы за одну проверку.
pub(crate) struct ContextRegistry {
    contexts: DashMap<ContextId, Vec<SubscriptionId>>,
}

impl ContextRegistry {
    pub(crate) fn new() -> Self {
        Self {
            contexts: DashMap::new(),
        }
    }

    /// Создаёт новый контекст с пустым набором подписок.
    pub(crate) fn create(&self) -> MessageContext {
        let id = ContextId::next();
        self.contexts.insert(id, Vec::new());
        MessageContext { id }
    }

    /// Жив ли контекст.
    pub(crate) fn contains(&self, id: ContextId) -> bool {
        self.contexts.contains_key(&id)
    }

    /// Добавляет подписку в набор контекста.
    /// Возвращает `false`, если контекст уже освобождён.
    pub(crate) fn track(
        &self,
        context: ContextId,
        subscription: SubscriptionId,
    ) -> bool {
        match self.contexts.get_mut(&context) {
            Some(mut owned) => {
                owned.push(subscription);
                true
            }
            None => false,
        }
    }

    /// Убирает подписку из набора контекста. Отсутствие записи — no-op.
    pub(crate) fn untrack(
        &self,
        context: ContextId,
        subscription: SubscriptionId,
    ) {
        if let Some(mut owned) = self.contexts.get_mut(&context) {
            owned.retain(|s| *s != subscription);
        }
    }

    /// Изымает контекст из реестра, возвращая принадлежавшие ему
    /// подписки в порядке создания. `None` при повторном освобождении.
    pub(crate) fn dispose(
        &self,
        context: ContextId,
    ) -> Option<Vec<SubscriptionId>> {
        self.contexts.remove(&context).map(|(_, owned)| owned)
    }

    /// Количество живых контекстов.
    pub(crate) fn len(&self) -> usize {
        self.contexts.len()
    }
}
