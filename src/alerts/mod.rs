//! Alert model and delivery backends

pub mod alert;
pub mod notifier;

pub use alert::{Alert, AlertPriority};
pub use notifier::{
    AlertNotifier, ChannelNotifier, JsonlAlertWriter, LogNotifier, MemoryNotifier, NotifyError,
};
