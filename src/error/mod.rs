pub mod broker;

pub use broker::{CallbackError, PublishError, SubscribeError};
