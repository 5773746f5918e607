use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::intern_channel;

/// Полезная нагрузка сообщения.
///
/// Форма данных — соглашение между издателем и подписчиками; брокер
/// не навязывает схему и перевозит нагрузку как есть.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MessagePayload {
    /// Непрозрачные бинарные данные.
    Bytes(Bytes),
    /// Текст в UTF-8.
    String(String),
    /// Структурированные данные JSON.
    Json(serde_json::Value),
}

impl From<Bytes> for MessagePayload {
    fn from(value: Bytes) -> Self {
        MessagePayload::Bytes(value)
    }
}

impl From<String> for MessagePayload {
    fn from(value: String) -> Self {
        MessagePayload::String(value)
    }
}

impl From<&str> for MessagePayload {
    fn from(value: &str) -> Self {
        MessagePayload::String(value.to_string())
    }
}

impl From<serde_json::Value> for MessagePayload {
    fn from(value: serde_json::Value) -> Self {
        MessagePayload::Json(value)
    }
}

/// Метаданные опубликованного сообщения.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageMetadata {
    /// Сквозной номер сообщения в пределах брокера (с единицы).
    pub sequence: u64,
    /// Момент публикации.
    pub published_at: DateTime<Utc>,
}

impl MessageMetadata {
    /// Метаданные с заданным номером и текущим временем.
    pub(crate) fn with_sequence(sequence: u64) -> Self {
        Self {
            sequence,
            published_at: Utc::now(),
        }
    }
}

/// Сообщение, доставляемое подписчикам канала.
///
/// Строится один раз на публикацию; все колбэки получают ссылку на один
/// и тот же экземпляр, поэтому нагрузка не копируется и не изменяется
/// по пути.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Имя канала (interned-ключ, общий с реестром).
    pub channel: Arc<str>,
    /// Полезная нагрузка.
    pub payload: MessagePayload,
    /// Метаданные доставки.
    pub metadata: MessageMetadata,
}

impl Message {
    /// Собирает сообщение для канала. Номер последовательности
    /// проставляет брокер при публикации; здесь он нулевой.
    pub fn new(
        channel: impl AsRef<str>,
        payload: impl Into<MessagePayload>,
    ) -> Self {
        Self {
            channel: intern_channel(channel),
            payload: payload.into(),
            metadata: MessageMetadata::with_sequence(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    /// Тест проверяет создание сообщения с текстовой нагрузкой.
    #[test]
    fn test_message_with_text_payload() {
        let msg = Message::new("news", "hello world");

        assert_eq!(msg.channel.as_ref(), "news");
        assert_eq!(
            msg.payload,
            MessagePayload::String("hello world".to_string())
        );
        assert_eq!(msg.metadata.sequence, 0);
    }

    /// Тест проверяет создание сообщения с бинарной нагрузкой.
    #[test]
    fn test_message_with_bytes_payload() {
        let msg = Message::new("bin", Bytes::from_static(&[0, 255, 128, 64]));

        assert_eq!(msg.channel.as_ref(), "bin");
        if let MessagePayload::Bytes(payload) = &msg.payload {
            assert_eq!(payload, &Bytes::from_static(&[0, 255, 128, 64]));
        } else {
            panic!("Expected Bytes payload");
        }
    }

    /// Тест проверяет создание сообщения с JSON-нагрузкой.
    #[test]
    fn test_message_with_json_payload() {
        let data = json!({ "value": "hello" });
        let msg = Message::new("updates", data.clone());

        if let MessagePayload::Json(payload) = &msg.payload {
            assert_eq!(payload["value"], "hello");
            assert_eq!(payload, &data);
        } else {
            panic!("Expected Json payload");
        }
    }

    /// Тест проверяет, что каналы двух сообщений с одним именем
    /// делят одну аллокацию.
    #[test]
    fn test_messages_share_interned_channel() {
        let m1 = Message::new("shared", "a");
        let m2 = Message::new("shared", "b");

        assert!(Arc::ptr_eq(&m1.channel, &m2.channel));
    }

    /// Тест проверяет равенство нагрузок после клонирования.
    #[test]
    fn test_payload_equality_after_clone() {
        let payload = MessagePayload::Json(json!({ "value": 42 }));
        let clone = payload.clone();

        assert_eq!(payload, clone);
    }

    /// Тест проверяет конверсии `From` для всех видов нагрузок.
    #[test]
    fn test_payload_from_conversions() {
        assert_eq!(
            MessagePayload::from("text"),
            MessagePayload::String("text".to_string())
        );
        assert_eq!(
            MessagePayload::from(String::from("owned")),
            MessagePayload::String("owned".to_string())
        );
        assert_eq!(
            MessagePayload::from(Bytes::from_static(b"raw")),
            MessagePayload::Bytes(Bytes::from_static(b"raw"))
        );
        assert_eq!(
            MessagePayload::from(json!([1, 2, 3])),
            MessagePayload::Json(json!([1, 2, 3]))
        );
    }
}
