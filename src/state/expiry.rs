use crate::handlers::messages::Message;
use std::{collections::HashMap, time::Duration};
use tokio::{sync::mpsc::UnboundedSender, task::AbortHandle};

#[derive(Debug)]
struct Pending {
    generation: u64,
    handle: AbortHandle,
}

/// One-shot popup timers keyed by notification id.
///
/// Scheduling an id that already has a timer aborts the old one. A timer that
/// had already posted before the abort is rejected by [`PopupExpiry::fire`]
/// because its generation is stale.
#[derive(Debug)]
pub struct PopupExpiry {
    tx: UnboundedSender<Message>,
    pending: HashMap<u32, Pending>,
    next_generation: u64,
}

impl PopupExpiry {
    pub fn new(tx: UnboundedSender<Message>) -> Self {
        Self {
            tx,
            pending: HashMap::new(),
            next_generation: 0,
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn schedule(&mut self, id: u32, after: Duration) -> u64 {
        self.cancel(id);

        let generation = self.next_generation;
        self.next_generation += 1;

        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if tx.send(Message::PopupExpired { id, generation }).is_err() {
                tracing::trace!("main loop gone, dropping popup expiry for {id}");
            }
        })
        .abort_handle();

        tracing::trace!("popup timer {generation} for {id} in {after:?}");
        self.pending.insert(id, Pending { generation, handle });
        generation
    }

    /// Accept a posted expiry only if it is the latest timer for `id`.
    pub fn fire(&mut self, id: u32, generation: u64) -> bool {
        match self.pending.get(&id) {
            Some(pending) if pending.generation == generation => {
                self.pending.remove(&id);
                true
            }
            _ => {
                tracing::trace!("ignoring stale popup timer {generation} for {id}");
                false
            }
        }
    }

    pub fn cancel(&mut self, id: u32) {
        if let Some(pending) = self.pending.remove(&id) {
            pending.handle.abort();
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, pending) in self.pending.drain() {
            pending.handle.abort();
        }
    }
}

impl Drop for PopupExpiry {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
