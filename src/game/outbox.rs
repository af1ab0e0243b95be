//! Notification queues drained once per tick.
//!
//! Public messages go to the shared channel, private ones to a single
//! player. A drain joins each queue with newlines and preserves enqueue
//! order inside a batch.

use std::collections::BTreeMap;

/// One message ready for the transport. `to == None` is the public channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub to: Option<String>,
    pub content: String,
}

impl OutgoingMessage {
    pub fn public(content: impl Into<String>) -> Self {
        Self {
            to: None,
            content: content.into(),
        }
    }

    pub fn direct(to: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            to: Some(to.into()),
            content: content.into(),
        }
    }

    pub fn is_public(&self) -> bool {
        self.to.is_none()
    }
}

#[derive(Debug, Default)]
pub struct Outbox {
    public: Vec<String>,
    private: BTreeMap<String, Vec<String>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn public(&mut self, message: impl Into<String>) {
        self.public.push(message.into());
    }

    pub fn private(&mut self, owner_id: &str, message: impl Into<String>) {
        self.private
            .entry(owner_id.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.public.is_empty() && self.private.is_empty()
    }

    /// Public batch first, then one batch per player ordered by owner id.
    pub fn drain(&mut self) -> Vec<OutgoingMessage> {
        let mut out = Vec::with_capacity(1 + self.private.len());
        if !self.public.is_empty() {
            out.push(OutgoingMessage::public(self.public.join("\n")));
            self.public.clear();
        }
        for (owner, lines) in std::mem::take(&mut self.private) {
            out.push(OutgoingMessage::direct(owner, lines.join("\n")));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_batches_by_recipient() {
        let mut outbox = Outbox::new();
        outbox.private("b", "two");
        outbox.public("hello");
        outbox.private("a", "one");
        outbox.private("b", "three");
        outbox.public("world");

        let batch = outbox.drain();
        assert_eq!(
            batch,
            vec![
                OutgoingMessage::public("hello\nworld"),
                OutgoingMessage::direct("a", "one"),
                OutgoingMessage::direct("b", "two\nthree"),
            ]
        );
        assert!(outbox.is_empty());
        assert!(outbox.drain().is_empty());
    }
}
