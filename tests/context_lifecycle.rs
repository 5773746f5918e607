use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use parking_lot::Mutex;
use vestnik::{Broker, Message, MessageContext, SubscribeError};

/// Тест проверяет, что освобождение контекста снимает все его
/// подписки на всех каналах и вычищает опустевшие каналы.
#[test]
fn test_dispose_removes_all_owned_subscriptions() {
    let broker = Broker::new();
    let context = broker.create_context();
    let hits = Arc::new(Mutex::new(0_usize));

    for channel in ["alpha", "beta", "gamma"] {
        let counter = hits.clone();
        broker
            .subscribe(&context, channel, move |_msg: &Message| {
                *counter.lock() += 1;
            })
            .unwrap();
    }
    assert_eq!(broker.active_channels().len(), 3);

    assert_eq!(broker.dispose_context(&context), 3);

    for channel in ["alpha", "beta", "gamma"] {
        let result = broker.publish_str(channel, "after dispose").unwrap();
        assert_eq!(result.subscribers_reached, 0);
    }
    assert_eq!(*hits.lock(), 0);
    assert!(broker.active_channels().is_empty());
}

/// Тест проверяет идемпотентность освобождения: второй вызов —
/// no-op с нулём.
#[test]
fn test_dispose_is_idempotent() {
    let broker = Broker::new();
    let context = broker.create_context();
    broker
        .subscribe(&context, "chan", |_msg: &Message| {})
        .unwrap();

    assert_eq!(broker.dispose_context(&context), 1);
    assert_eq!(broker.dispose_context(&context), 0);
    assert_eq!(broker.dispose_context(&context), 0);
}

/// Тест проверяет независимость контекстов: освобождение одного
/// не трогает подписки другого.
#[test]
fn test_contexts_are_independent() {
    let broker = Broker::new();
    let doomed = broker.create_context();
    let survivor = broker.create_context();
    let log = Arc::new(Mutex::new(Vec::new()));

    let first = log.clone();
    broker
        .subscribe(&doomed, "shared", move |_msg: &Message| {
            first.lock().push("doomed");
        })
        .unwrap();
    let second = log.clone();
    broker
        .subscribe(&survivor, "shared", move |_msg: &Message| {
            second.lock().push("survivor");
        })
        .unwrap();

    broker.dispose_context(&doomed);
    let result = broker.publish_str("shared", "ping").unwrap();

    assert_eq!(result.subscribers_reached, 1);
    assert_eq!(log.lock().as_slice(), &["survivor"]);
    assert_eq!(broker.context_count(), 1);
}

/// Тест проверяет взаимодействие отдельной отписки и освобождения:
/// снятая вручную подписка не учитывается при dispose.
#[test]
fn test_manual_unsubscribe_then_dispose() {
    let broker = Broker::new();
    let context = broker.create_context();

    let early = broker
        .subscribe(&context, "chan", |_msg: &Message| {})
        .unwrap();
    broker
        .subscribe(&context, "chan", |_msg: &Message| {})
        .unwrap();

    assert!(broker.unsubscribe(&early));
    assert_eq!(broker.dispose_context(&context), 1);
}

/// Тест проверяет, что подписка через освобождённый контекст
/// отклоняется синхронной структурной ошибкой.
#[test]
fn test_subscribe_after_dispose_is_rejected() {
    let broker = Broker::new();
    let context = broker.create_context();
    broker.dispose_context(&context);

    let err = broker
        .subscribe(&context, "late", |_msg: &Message| {})
        .unwrap_err();
    assert_eq!(err, SubscribeError::ContextDisposed(context.id()));
}

/// Тест проверяет, что отписка по хэндлу из уже освобождённого
/// контекста — безопасный no-op.
#[test]
fn test_unsubscribe_after_dispose_is_noop() {
    let broker = Broker::new();
    let context = broker.create_context();
    let sub = broker
        .subscribe(&context, "chan", |_msg: &Message| {})
        .unwrap();

    broker.dispose_context(&context);
    assert!(!broker.unsubscribe(&sub));
}

/// Тест проверяет, что контекст чужого брокера отклоняется: хэндлы
/// независимых экземпляров не взаимозаменяемы.
#[test]
fn test_subscribe_rejects_context_from_another_broker() {
    let ours = Broker::new();
    let theirs = Broker::new();
    let foreign = theirs.create_context();

    let err = ours
        .subscribe(&foreign, "chan", |_msg: &Message| {})
        .unwrap_err();

    assert_eq!(err, SubscribeError::ContextDisposed(foreign.id()));
    assert_eq!(ours.context_count(), 0);
    assert_eq!(theirs.context_count(), 1);
}

/// Тест проверяет, что отписка по хэндлу чужого брокера — no-op
/// и не задевает собственных подписчиков.
#[test]
fn test_unsubscribe_ignores_handle_from_another_broker() {
    let ours = Broker::new();
    let theirs = Broker::new();
    let our_context = ours.create_context();
    let their_context = theirs.create_context();

    let hits = Arc::new(Mutex::new(0_usize));
    let counter = hits.clone();
    let local = ours
        .subscribe(&our_context, "shared", move |_msg: &Message| {
            *counter.lock() += 1;
        })
        .unwrap();
    let foreign = theirs
        .subscribe(&their_context, "shared", |_msg: &Message| {})
        .unwrap();

    // сквозная нумерация: чужой хэндл не совпадает со своим
    assert_ne!(local.id(), foreign.id());
    assert!(!ours.unsubscribe(&foreign));

    let result = ours.publish_str("shared", "ping").unwrap();
    assert_eq!(result.subscribers_reached, 1);
    assert_eq!(*hits.lock(), 1);
    assert_eq!(ours.subscriber_count("shared"), 1);
}

/// Тест проверяет, что счётчик живых подписок возвращается к нулю
/// после полного демонтажа.
#[test]
fn test_active_subscription_counter_balances() {
    let broker = Broker::new();
    let context = broker.create_context();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            broker
                .subscribe(&context, "counted", |_msg: &Message| {})
                .unwrap()
        })
        .collect();
    assert_eq!(
        broker.metrics().active_subscriptions.load(Ordering::Relaxed),
        4
    );

    broker.unsubscribe(&handles[0]);
    broker.dispose_context(&context);

    assert_eq!(
        broker.metrics().active_subscriptions.load(Ordering::Relaxed),
        0
    );
    assert_eq!(broker.subscriber_count("counted"), 0);
}

/// Тест проверяет, что счётчик живых подписок не проваливается ниже
/// нуля, когда dispose_context гонится с subscribe на общем контексте:
/// подписка учитывается раньше, чем dispose может её снять.
#[test]
fn test_subscription_counter_survives_dispose_race() {
    const ROUNDS: u64 = 200;

    let broker = Arc::new(Broker::new());
    let slot: Arc<Mutex<Option<MessageContext>>> = Arc::new(Mutex::new(None));
    let stop = Arc::new(AtomicBool::new(false));

    let sampler = {
        let watched = broker.clone();
        let halt = stop.clone();
        std::thread::spawn(move || {
            while !halt.load(Ordering::Relaxed) {
                let gauge = watched
                    .metrics()
                    .active_subscriptions
                    .load(Ordering::Relaxed);
                assert!(gauge <= ROUNDS, "счётчик ушёл в минус: {gauge}");
            }
        })
    };

    let disposer = {
        let sweeper = broker.clone();
        let shared = slot.clone();
        let halt = stop.clone();
        std::thread::spawn(move || {
            while !halt.load(Ordering::Relaxed) {
                let current = *shared.lock();
                if let Some(context) = current {
                    sweeper.dispose_context(&context);
                }
            }
        })
    };

    for _ in 0..ROUNDS {
        let context = broker.create_context();
        *slot.lock() = Some(context);
        // dispose мог успеть раньше: отказ здесь — штатный исход гонки
        let _ = broker.subscribe(&context, "churn", |_msg: &Message| {});
        broker.dispose_context(&context);
    }
    stop.store(true, Ordering::Relaxed);
    disposer.join().unwrap();
    sampler.join().unwrap();

    assert_eq!(
        broker.metrics().active_subscriptions.load(Ordering::Relaxed),
        0
    );
    assert_eq!(broker.subscriber_count("churn"), 0);
}
