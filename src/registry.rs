use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use dashmap::{mapref::entry::Entry, DashMap};

use crate::{
    error::SubscribeError, metrics::ChannelStats, subscription::SubscriberEntry, SubscriptionId,
};

/// Interned-ключ канала, общий с хэндлами и сообщениями.
pub(crate) type ChannelKey = Arc<str>;

/// Запись канала: упорядоченный список подписчиков и счётчик доставок.
struct ChannelEntry {
    /// Подписчики в порядке регистрации.
    subscribers: Vec<SubscriberEntry>,
    messages_sent: AtomicU64,
}

impl ChannelEntry {
    fn with_subscriber(entry: SubscriberEntry) -> Self {
        Self {
            subscribers: vec![entry],
            messages_sent: AtomicU64::new(0),
        }
    }
}

/// Реестр каналов: имя канала → упорядоченный список подписчиков.
///
/// Вторичный индекс `id → канал` обеспечивает уникальность
/// идентификаторов по всем каналам сразу и даёт `unregister` без
/// знания канала. Канал без подписчиков изымается из таблицы, так что
/// пустая запись снаружи не наблюдаема.
pub(crate) struct ChannelRegistry {
    channels: DashMap<ChannelKey, ChannelEntry>,
    index: DashMap<SubscriptionId, ChannelKey>,
}

impl ChannelRegistry {
    pub(crate) fn new() -> Self {
        Self {
            channels: DashMap::new(),
            index: DashMap::new(),
        }
    }

    /// Добавляет подписчика в хвост списка канала.
    ///
    /// Возвращает размер списка после вставки. Повторный идентификатор
    /// в любом канале — нарушение инварианта реестра; превышение
    /// лимита `limit` отклоняет вставку, не создавая пустых записей.
    pub(crate) fn register(
        &self,
        channel: ChannelKey,
        entry: SubscriberEntry,
        limit: Option<usize>,
    ) -> Result<usize, SubscribeError> {
        let id = entry.id;
        if self.index.contains_key(&id) {
            return Err(SubscribeError::DuplicateSubscription(id));
        }

        let count = match self.channels.entry(channel.clone()) {
            Entry::Occupied(mut occupied) => {
                let subscribers = &mut occupied.get_mut().subscribers;
                if let Some(limit) = limit {
                    if subscribers.len() >= limit {
                        return Err(SubscribeError::SubscriberLimitExceeded(
                            channel.to_string(),
                            limit,
                        ));
                    }
                }
                subscribers.push(entry);
                subscribers.len()
            }
            Entry::Vacant(vacant) => {
                if let Some(0) = limit {
                    return Err(SubscribeError::SubscriberLimitExceeded(channel.to_string(), 0));
                }
                vacant.insert(ChannelEntry::with_subscriber(entry));
                1
            }
        };

        self.index.insert(id, channel);
        Ok(count)
    }

    /// Убирает подписку из её канала. Возвращает ключ канала либо
    /// `None`, если подписка уже снята (идемпотентный демонтаж).
    pub(crate) fn unregister(
        &self,
        id: SubscriptionId,
    ) -> Option<ChannelKey> {
        let (_, channel) = self.index.remove(&id)?;
        if let Some(mut entry) = self.channels.get_mut(&channel) {
            entry.subscribers.retain(|s| s.id != id);
            let now_empty = entry.subscribers.is_empty();
            drop(entry);
            if now_empty {
                // повторная проверка под замком: подписка могла успеть добавиться
                self.channels
                    .remove_if(&channel, |_, e| e.subscribers.is_empty());
            }
        }
        Some(channel)
    }

    /// Снимок подписчиков канала в порядке регистрации.
    ///
    /// Возвращает копию списка: мутации реестра во время доставки не
    /// затрагивают уже взятый снимок.
    pub(crate) fn snapshot(
        &self,
        channel: &str,
    ) -> Vec<SubscriberEntry> {
        match self.channels.get(channel) {
            Some(entry) => entry.subscribers.clone(),
            None => Vec::new(),
        }
    }

    /// Засчитывает доставленное в канал сообщение.
    pub(crate) fn record_publish(
        &self,
        channel: &str,
    ) {
        if let Some(entry) = self.channels.get(channel) {
            entry.messages_sent.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Количество подписчиков канала.
    pub(crate) fn subscriber_count(
        &self,
        channel: &str,
    ) -> usize {
        self.channels
            .get(channel)
            .map(|entry| entry.subscribers.len())
            .unwrap_or(0)
    }

    /// Имена всех каналов с хотя бы одним подписчиком.
    pub(crate) fn active_channels(&self) -> Vec<String> {
        self.channels
            .iter()
            .map(|entry| entry.key().to_string())
            .collect()
    }

    /// Статистика канала, если он существует.
    pub(crate) fn stats(
        &self,
        channel: &str,
    ) -> Option<ChannelStats> {
        self.channels.get(channel).map(|entry| ChannelStats {
            subscribers: entry.subscribers.len(),
            messages_sent: entry.messages_sent.load(Ordering::Relaxed),
        })
    }

    /// Количество каналов в реестре.
    pub(crate) fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Общее количество подписок по всем каналам.
    pub(crate) fn subscription_count(&self) -> usize {
        self.index.len()
    }
}
