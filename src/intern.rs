use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

/// Пул повторного использования `Arc<str>` для одинаковых имён каналов.
/// Crate-private: ключи каналов в реестре, хэндлах подписок и доставляемых
/// сообщениях указывают на одну и ту же аллокацию.
static CHANNEL_NAMES: Lazy<DashMap<String, Arc<str>>> = Lazy::new(DashMap::new);

/// Возвращает interned `Arc<str>` для данного имени канала.
/// При первом обращении создаёт запись в пуле, при повторных —
/// отдаёт уже существующий `Arc`.
#[inline]
pub(crate) fn intern_channel<S: AsRef<str>>(name: S) -> Arc<str> {
    let key = name.as_ref();
    if let Some(existing) = CHANNEL_NAMES.get(key) {
        return existing.clone();
    }
    CHANNEL_NAMES
        .entry(key.to_string())
        .or_insert_with(|| Arc::from(key))
        .clone()
}
