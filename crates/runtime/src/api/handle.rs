//! Handle to a running duel.
//!
//! [`DuelHandle`] lets callers cancel a duel or wait for its report. Dropping
//! the handle detaches the duel; it still runs to completion.
use combat_core::LocationId;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use super::errors::{Result, RuntimeError};
use crate::duel::{DuelId, DuelReport};
use crate::events::{Event, EventBus, Topic};

pub struct DuelHandle {
    id: DuelId,
    location: LocationId,
    cancel: watch::Sender<bool>,
    events: EventBus,
    task: JoinHandle<DuelReport>,
}

impl DuelHandle {
    pub(crate) fn new(
        id: DuelId,
        location: LocationId,
        cancel: watch::Sender<bool>,
        events: EventBus,
        task: JoinHandle<DuelReport>,
    ) -> Self {
        Self {
            id,
            location,
            cancel,
            events,
            task,
        }
    }

    pub fn id(&self) -> DuelId {
        self.id
    }

    pub fn location(&self) -> LocationId {
        self.location
    }

    /// Ask the duel to end at the next turn boundary.
    ///
    /// Cleanup runs exactly as for any other ending.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Subscribe to duel events.
    ///
    /// The stream carries every duel's events; filter on the duel id.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe(Topic::Duel)
    }

    /// Wait for the duel to finish.
    pub async fn join(self) -> Result<DuelReport> {
        self.task.await.map_err(RuntimeError::DuelTask)
    }
}
