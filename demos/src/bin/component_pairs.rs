use std::sync::{atomic::Ordering, Arc};

use anyhow::Result;
use serde_json::json;
use tracing_subscriber::EnvFilter;
use vestnik::{Broker, Message, MessageContext, MessagePayload};

const EVENT_CHANNEL: &str = "component:valueChange";
const MESSAGE_CHANNEL: &str = "sample:messageChannel";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== Vestnik component pair examples ===\n");

    let broker = Arc::new(Broker::new());

    example_1_value_events(&broker)?;
    example_2_message_channel(&broker)?;
    example_3_metrics(&broker)?;

    println!("\n=== All examples completed successfully! ===");
    Ok(())
}

/// Пример 1: пара компонентов, связанная каналом событий.
///
/// Индикатор монтируется (контекст + подписка), издатель шлёт значения,
/// после размонтирования публикации никого не достигают.
fn example_1_value_events(broker: &Arc<Broker>) -> Result<()> {
    println!("Example 1: value change events");
    println!("------------------------------");

    let display = ValueDisplay::mount(broker)?;

    for value in ["42", "forty-two"] {
        let result = broker.publish_str(EVENT_CHANNEL, value)?;
        println!(
            "  published {value:?}, reached {} subscriber(s)",
            result.subscribers_reached
        );
    }

    display.unmount(broker);

    let after = broker.publish_str(EVENT_CHANNEL, "unheard")?;
    println!(
        "  after unmount: {} subscriber(s) reached\n",
        after.subscribers_reached
    );
    Ok(())
}

/// Пример 2: обмен JSON-сообщениями вида `{"messageText": ...}`.
fn example_2_message_channel(broker: &Arc<Broker>) -> Result<()> {
    println!("Example 2: JSON message channel");
    println!("-------------------------------");

    let viewer = MessageViewer::mount(broker)?;

    broker.publish(
        MESSAGE_CHANNEL,
        MessagePayload::Json(json!({ "messageText": "This is a test" })),
    )?;
    broker.publish_json(
        MESSAGE_CHANNEL,
        &SamplePing {
            message_text: "And this is another".into(),
        },
    )?;

    viewer.unmount(broker);
    println!();
    Ok(())
}

/// Пример 3: сводка счётчиков брокера после обеих пар.
fn example_3_metrics(broker: &Arc<Broker>) -> Result<()> {
    println!("Example 3: broker metrics");
    println!("-------------------------");

    let metrics = broker.metrics();
    println!(
        "  publishes: {}, deliveries: {}, failed callbacks: {}",
        metrics.total_publishes.load(Ordering::Relaxed),
        metrics.total_deliveries.load(Ordering::Relaxed),
        metrics.failed_callbacks.load(Ordering::Relaxed),
    );
    println!(
        "  live subscriptions: {}, live contexts: {}, channels: {:?}",
        metrics.active_subscriptions.load(Ordering::Relaxed),
        broker.context_count(),
        broker.active_channels(),
    );
    Ok(())
}

/// Компонент-индикатор: печатает каждое новое значение из канала событий.
struct ValueDisplay {
    context: MessageContext,
}

impl ValueDisplay {
    fn mount(broker: &Broker) -> Result<Self> {
        let context = broker.create_context();
        broker.subscribe(&context, EVENT_CHANNEL, |msg: &Message| {
            if let MessagePayload::String(value) = &msg.payload {
                println!("  display <- value changed to {value:?}");
            }
        })?;
        Ok(Self { context })
    }

    fn unmount(self, broker: &Broker) {
        let removed = broker.dispose_context(&self.context);
        println!("  display unmounted, {removed} subscription(s) removed");
    }
}

/// Компонент-приёмник: разбирает JSON-сообщения и печатает `messageText`.
struct MessageViewer {
    context: MessageContext,
}

impl MessageViewer {
    fn mount(broker: &Broker) -> Result<Self> {
        let context = broker.create_context();
        broker.subscribe(&context, MESSAGE_CHANNEL, |msg: &Message| {
            if let MessagePayload::Json(value) = &msg.payload {
                if let Some(text) = value.get("messageText").and_then(|v| v.as_str()) {
                    println!("  viewer <- {text}");
                }
            }
        })?;
        Ok(Self { context })
    }

    fn unmount(self, broker: &Broker) {
        broker.dispose_context(&self.context);
    }
}

/// Типизированное сообщение для `publish_json`.
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct SamplePing {
    message_text: String,
}
