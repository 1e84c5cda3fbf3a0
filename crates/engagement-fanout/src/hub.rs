use crate::types::{FanoutEvent, SubscriberFilter, SYNC_RESET_KIND};
use engagement_common::{EventSink, Id};
use serde_json::json;
use tokio::sync::broadcast;

/// Default per-subscriber mailbox depth ("bounded mailbox
/// (e.g. 64)").
pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;

/// C7 — the event fan-out hub. A single `broadcast` channel backs every
/// subscription: its fixed capacity *is* the bounded mailbox, and a slow
/// subscriber naturally drops the oldest buffered events once it falls
/// behind (`RecvError::Lagged`), which `Subscription::recv` turns into the
/// `sync.reset` hint asks for. One shared ring buffer rather
/// than N independent per-subscriber queues, since `tokio::sync::broadcast`
/// already implements exactly this drop-oldest-on-overflow contract.
pub struct Hub {
    tx: broadcast::Sender<FanoutEvent>,
}

impl Hub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self, filter: SubscriberFilter) -> Subscription {
        Subscription { rx: self.tx.subscribe(), filter }
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(DEFAULT_MAILBOX_CAPACITY)
    }
}

impl EventSink for Hub {
    fn publish(&self, kind: &str, target: Option<Id>, payload: serde_json::Value) {
        let event = FanoutEvent { kind: kind.to_string(), target, payload };
        // No receivers is not an error: nothing is subscribed yet.
        let _ = self.tx.send(event);
    }
}

/// A live subscription. `recv` blocks until the next event this
/// subscriber's filter admits, transparently surfacing a `sync.reset` event
/// whenever the hub dropped messages this subscriber never saw.
pub struct Subscription {
    rx: broadcast::Receiver<FanoutEvent>,
    filter: SubscriberFilter,
}

impl Subscription {
    pub async fn recv(&mut self) -> FanoutEvent {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.matches(&self.filter) => return event,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    return FanoutEvent {
                        kind: SYNC_RESET_KIND.to_string(),
                        target: None,
                        payload: json!({ "reason": "mailbox overflow" }),
                    };
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return FanoutEvent {
                        kind: SYNC_RESET_KIND.to_string(),
                        target: None,
                        payload: json!({ "reason": "hub closed" }),
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_matching_events_only() {
        let hub = Hub::new(8);
        let target = Id::new("event", "e1");
        let mut sub = hub.subscribe(SubscriberFilter {
            user_id: Id::new("user", "u1"),
            guild_ids: None,
            target_ids: Some([target.clone()].into_iter().collect()),
        });

        hub.publish("event.rsvp", Some(Id::new("event", "other")), json!({}));
        hub.publish("event.rsvp", Some(target.clone()), json!({"status": "approved"}));

        let received = sub.recv().await;
        assert_eq!(received.kind, "event.rsvp");
        assert_eq!(received.target, Some(target));
    }

    #[tokio::test]
    async fn overflow_surfaces_sync_reset() {
        let hub = Hub::new(2);
        let mut sub = hub.subscribe(SubscriberFilter::for_user(Id::new("user", "u1")));

        for i in 0..10 {
            hub.publish("event.rsvp", Some(Id::new("event", format!("e{i}"))), json!({}));
        }

        let received = sub.recv().await;
        assert_eq!(received.kind, SYNC_RESET_KIND);
    }
}
