//! In-process publish/subscribe bus for note events.
//!
//! Subscribers pick a filter (one note id, or every note) and drain their
//! queue from their own dispatch loop. Publishing never blocks: each
//! subscriber owns an unbounded queue.

use crate::model::note::{NoteId, NoteStatus};
use log::debug;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard};

/// Change notification scoped to one note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteEvent {
    StatusChanged { note_id: NoteId, status: NoteStatus },
    NoteDeleted { note_id: NoteId },
}

impl NoteEvent {
    pub fn note_id(&self) -> NoteId {
        match self {
            Self::StatusChanged { note_id, .. } | Self::NoteDeleted { note_id } => *note_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::StatusChanged { .. } => "status_changed",
            Self::NoteDeleted { .. } => "note_deleted",
        }
    }
}

struct Subscriber {
    filter: Option<NoteId>,
    sender: Sender<NoteEvent>,
}

impl Subscriber {
    fn wants(&self, event: &NoteEvent) -> bool {
        self.filter.map_or(true, |id| id == event.note_id())
    }
}

/// Cloneable handle to one process-local bus.
#[derive(Clone, Default)]
pub struct SyncBus {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl SyncBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to events for a single note.
    pub fn subscribe(&self, note_id: NoteId) -> Subscription {
        self.register(Some(note_id))
    }

    /// Subscribes to events for every note (management views).
    pub fn subscribe_all(&self) -> Subscription {
        self.register(None)
    }

    /// Delivers `event` to every matching live subscriber.
    ///
    /// Returns the number of subscribers the event was queued for. Dropped
    /// subscriptions are pruned here.
    pub fn publish(&self, event: NoteEvent) -> usize {
        let mut subscribers = self.lock();
        let mut delivered = 0;
        subscribers.retain(|subscriber| {
            if !subscriber.wants(&event) {
                return true;
            }
            match subscriber.sender.send(event) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });
        debug!(
            "event=bus_publish module=sync status=ok kind={} note_id={} delivered={}",
            event.kind(),
            event.note_id(),
            delivered
        );
        delivered
    }

    /// Number of registered subscriptions, including ones not yet pruned.
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn register(&self, filter: Option<NoteId>) -> Subscription {
        let (sender, receiver) = mpsc::channel();
        self.lock().push(Subscriber { filter, sender });
        Subscription { filter, receiver }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Subscriber>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Receiving end of one bus subscription. Dropping it unsubscribes.
pub struct Subscription {
    filter: Option<NoteId>,
    receiver: Receiver<NoteEvent>,
}

impl Subscription {
    /// Note id this subscription is scoped to, `None` for all notes.
    pub fn filter(&self) -> Option<NoteId> {
        self.filter
    }

    /// Pops the next queued event without blocking.
    pub fn try_next(&self) -> Option<NoteEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Drains every queued event in publish order.
    pub fn drain(&self) -> Vec<NoteEvent> {
        self.receiver.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{NoteEvent, SyncBus};
    use crate::model::note::{NoteId, NoteStatus};

    #[test]
    fn delivers_only_to_matching_note_subscribers() {
        let bus = SyncBus::new();
        let seven = bus.subscribe(NoteId(7));
        let eight = bus.subscribe(NoteId(8));
        let all = bus.subscribe_all();

        let event = NoteEvent::StatusChanged {
            note_id: NoteId(7),
            status: NoteStatus::Hidden,
        };
        assert_eq!(bus.publish(event), 2);

        assert_eq!(seven.drain(), vec![event]);
        assert!(eight.try_next().is_none());
        assert_eq!(all.try_next(), Some(event));
    }

    #[test]
    fn dropped_subscriptions_are_pruned_on_publish() {
        let bus = SyncBus::new();
        let kept = bus.subscribe(NoteId(1));
        drop(bus.subscribe(NoteId(1)));
        assert_eq!(bus.subscriber_count(), 2);

        let delivered = bus.publish(NoteEvent::NoteDeleted { note_id: NoteId(1) });
        assert_eq!(delivered, 1);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.drain().len(), 1);
    }
}
