mod push;

pub use push::{LogNotifier, Notifier, WebhookNotifier};

#[cfg(test)]
pub(crate) use push::testing;
