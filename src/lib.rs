/// Port traits decoupling hosts from the concrete broker.
pub mod application;
/// Broker: subscription coordination and synchronous delivery.
pub mod broker;
/// Broker configuration.
pub mod config;
/// Subscriber contexts scoping subscription lifetimes.
pub mod context;
/// Error types for subscribe, publish and callback failures.
pub mod error;
/// Message, payload and metadata types.
pub mod message;
/// Broker counters and per-channel statistics.
pub mod metrics;
/// Pluggable reporting hook for subscriber failures.
pub mod reporter;
/// Subscription handles, ids and the handler type.
pub mod subscription;

mod intern;
mod registry;

pub(crate) use intern::intern_channel;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Port trait naming the five public operations.
pub use application::MessagingPort;
/// The coordination core.
pub use broker::Broker;
/// Broker settings.
pub use config::BrokerConfig;
/// Context handle and its identifier.
pub use context::{ContextId, MessageContext};
/// Operation errors and the captured callback failure.
pub use error::{CallbackError, PublishError, SubscribeError};
/// Delivered message, payload kinds, metadata.
pub use message::{Message, MessageMetadata, MessagePayload};
/// Counters, channel statistics, publish outcome.
pub use metrics::{BrokerMetrics, ChannelStats, PublishResult};
/// Failure-reporting hook and its stock implementations.
pub use reporter::{CollectingReporter, ErrorReporter, TracingReporter};
/// Subscription handle, id and handler alias.
pub use subscription::{MessageHandler, Subscription, SubscriptionId};
