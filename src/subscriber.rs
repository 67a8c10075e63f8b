//! Message and status subscribers.

use std::{borrow::Cow, fmt::Debug};

use crate::ws::ChatMessage;

/// Subscriber receives every inbound chat message, in arrival order.
pub trait MessageSubscriber: Send + 'static {
    /// subscriber name
    fn name(&self) -> Cow<'static, str> {
        "Anonymous Message Subscriber".into()
    }
    /// callback will be execute for each delivered message
    fn on_message(&mut self, message: ChatMessage);
}

impl<F> MessageSubscriber for F
where
    F: FnMut(ChatMessage) + Send + 'static,
{
    fn on_message(&mut self, message: ChatMessage) {
        self(message)
    }
}

/// Subscriber receives connected/disconnected edges.
pub trait StatusSubscriber: Send + 'static {
    /// subscriber name
    fn name(&self) -> Cow<'static, str> {
        "Anonymous Status Subscriber".into()
    }
    /// callback will be execute on every status edge, never twice with same value
    fn on_status_change(&mut self, connected: bool);
}

impl<F> StatusSubscriber for F
where
    F: FnMut(bool) + Send + 'static,
{
    fn on_status_change(&mut self, connected: bool) {
        self(connected)
    }
}

/// At most one subscriber of each kind, later registration replaces the former.
#[derive(Default)]
pub(crate) struct Subscriptions {
    message: Option<Box<dyn MessageSubscriber>>,
    status: Option<Box<dyn StatusSubscriber>>,
}

impl Debug for Subscriptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriptions")
            .field("message", &self.message.as_ref().map(|s| s.name()))
            .field("status", &self.status.as_ref().map(|s| s.name()))
            .finish()
    }
}

impl Subscriptions {
    pub fn set_message(&mut self, subscriber: Box<dyn MessageSubscriber>) {
        if let Some(old) = self.message.replace(subscriber) {
            log::debug!("Message subscriber {} replaced", old.name());
        }
    }

    pub fn set_status(&mut self, subscriber: Box<dyn StatusSubscriber>) {
        if let Some(old) = self.status.replace(subscriber) {
            log::debug!("Status subscriber {} replaced", old.name());
        }
    }

    pub fn deliver(&mut self, message: ChatMessage) {
        match self.message.as_mut() {
            Some(subscriber) => subscriber.on_message(message),
            None => log::trace!("No message subscriber, drop message"),
        }
    }

    pub fn notify(&mut self, connected: bool) {
        if let Some(subscriber) = self.status.as_mut() {
            subscriber.on_status_change(connected);
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn test_later_subscriber_replaces_former() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut subscriptions = Subscriptions::default();

        let first = seen.clone();
        subscriptions.set_message(Box::new(move |m: ChatMessage| {
            first.lock().unwrap().push(format!("first:{}", m.content))
        }));
        subscriptions.deliver(ChatMessage::new("a", "1", "t"));

        let second = seen.clone();
        subscriptions.set_message(Box::new(move |m: ChatMessage| {
            second.lock().unwrap().push(format!("second:{}", m.content))
        }));
        subscriptions.deliver(ChatMessage::new("a", "2", "t"));

        assert_eq!(*seen.lock().unwrap(), vec!["first:1", "second:2"]);
    }

    #[test]
    fn test_notify_without_subscriber() {
        let mut subscriptions = Subscriptions::default();
        subscriptions.notify(true);
        subscriptions.deliver(ChatMessage::default());
    }
}
