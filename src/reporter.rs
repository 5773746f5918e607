use parking_lot::Mutex;

use crate::error::CallbackError;

/// Хук отчётов о сбоях подписчиков.
///
/// Брокер вызывает `report` для каждого обработчика, упавшего во время
/// доставки, и продолжает публикацию. Сбой одного подписчика никогда
/// не доходит до издателя иначе как через этот хук.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &CallbackError);
}

/// Репортёр по умолчанию: пишет каждый сбой в `tracing`.
#[derive(Debug, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &CallbackError) {
        tracing::error!(
            subscription = %error.subscription,
            channel = %error.channel,
            reason = %error.reason,
            "subscriber callback failed"
        );
    }
}

/// Копящий репортёр: складывает сбои в память.
///
/// Используется тестами и диагностикой, когда важно проверить, что
/// именно было передано в хук.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    errors: Mutex<Vec<CallbackError>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Количество накопленных сбоев.
    pub fn len(&self) -> usize {
        self.errors.lock().len()
    }

    /// Пуст ли список сбоев.
    pub fn is_empty(&self) -> bool {
        self.errors.lock().is_empty()
    }

    /// Забирает накопленные сбои, очищая список.
    pub fn take(&self) -> Vec<CallbackError> {
        std::mem::take(&mut self.errors.lock())
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, error: &CallbackError) {
        self.errors.lock().push(error.clone());
    }
}
