use std::sync::atomic::{AtomicU64, Ordering};

/// Глобальные счётчики брокера.
///
/// Счётчики обновляются с `Ordering::Relaxed`: важна итоговая сумма,
/// а не порядок наблюдений между потоками.
#[derive(Debug, Default)]
pub struct BrokerMetrics {
    /// Общее количество вызовов `publish` (включая пустые каналы).
    pub total_publishes: AtomicU64,
    /// Количество успешно отработавших колбэков.
    pub total_deliveries: AtomicU64,
    /// Количество колбэков, завершившихся паникой.
    pub failed_callbacks: AtomicU64,
    /// Текущее количество живых подписок.
    pub active_subscriptions: AtomicU64,
}

impl BrokerMetrics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_publish(&self) {
        self.total_publishes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivery(&self) {
        self.total_deliveries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed_callback(&self) {
        self.failed_callbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn subscription_added(&self) {
        self.active_subscriptions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn subscription_removed(&self) {
        self.active_subscriptions.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Статистика одного канала на момент запроса.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelStats {
    /// Количество подписчиков.
    pub subscribers: usize,
    /// Сколько сообщений было доставлено в канал.
    pub messages_sent: u64,
}

/// Итог публикации: скольких подписчиков достигла доставка.
///
/// `subscribers_reached` считает вызванные колбэки, включая упавшие;
/// `failed` — сколько из них завершились паникой. Публикация в канал
/// без подписчиков возвращает нули.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishResult {
    pub subscribers_reached: usize,
    pub failed: usize,
}
