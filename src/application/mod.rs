pub mod messaging_port;

pub use messaging_port::MessagingPort;
