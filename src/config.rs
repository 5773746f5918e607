use serde::{Deserialize, Serialize};

/// Настройки брокера.
///
/// Структура сериализуема, чтобы встраиваться в конфигурацию
/// приложения-хозяина; сам брокер внешних источников не читает.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Максимум подписок на один канал. `None` — без ограничения.
    #[serde(default)]
    pub max_subscribers_per_channel: Option<usize>,
}
