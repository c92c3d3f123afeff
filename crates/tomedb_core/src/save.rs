//! Save scheduling: coalescing concurrent save requests into single writes.

use crate::database::Shared;
use crate::error::{CoreError, CoreResult};
use crate::record::Record;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, trace};

/// Callers waiting on a write that has not started yet.
type Waiters = Vec<oneshot::Sender<CoreResult<()>>>;

/// Phase of the save scheduler.
///
/// At most one write to the backing store is in flight at any instant.
/// Saves requested while a write runs do not start a second write; they
/// queue up and are answered by one follow-up write that starts after
/// the current one finishes. A caller is only told "saved" once a write
/// that began at or after its request has completed, so its mutation is
/// guaranteed to be in the written snapshot.
#[derive(Debug)]
pub(crate) enum SaveState {
    /// No write in flight.
    Idle,
    /// One write in flight, nothing queued behind it.
    Writing,
    /// One write in flight, plus queued callers for the follow-up write.
    WritingDirty {
        /// Resolved together when the follow-up write completes.
        waiters: Waiters,
    },
}

/// Requests a durable save of the current snapshot.
///
/// Resolves with the outcome of a write that began at or after this
/// call. Concurrent requests coalesce: any number of saves issued
/// during one in-flight write are all answered by the single write
/// that follows it.
pub(crate) async fn request_save(shared: &Arc<Shared>) -> CoreResult<()> {
    let (sender, receiver) = oneshot::channel();
    {
        let mut state = shared.save.lock();
        match &mut *state {
            SaveState::Idle => {
                trace!("save requested while idle; starting write");
                *state = SaveState::Writing;
                tokio::spawn(Arc::clone(shared).write_pass(vec![sender]));
            }
            SaveState::Writing => {
                trace!("save requested during write; scheduling follow-up write");
                *state = SaveState::WritingDirty {
                    waiters: vec![sender],
                };
            }
            SaveState::WritingDirty { waiters } => {
                trace!("save requested during write; joining scheduled follow-up");
                waiters.push(sender);
            }
        }
    }

    match receiver.await {
        Ok(outcome) => outcome,
        Err(_) => Err(CoreError::task_failed("save writer dropped before reporting")),
    }
}

impl Shared {
    /// Runs writes until the scheduler returns to idle.
    ///
    /// Each pass snapshots, writes, and fans the outcome out to the
    /// waiters that write answers. If more saves arrived during the
    /// write, the loop immediately starts the follow-up write with the
    /// queued waiters. A failed write is reported the same way and does
    /// not stop the loop: in-memory state stays the source of truth and
    /// the next write retries the full snapshot.
    async fn write_pass(self: Arc<Self>, mut waiters: Waiters) {
        loop {
            let outcome = self.write_snapshot().await;
            if let Err(err) = &outcome {
                error!(store = %self.backend.describe(), error = %err, "save failed");
            }
            for waiter in waiters.drain(..) {
                // A caller that dropped its save future is not a problem.
                let _ = waiter.send(outcome.clone());
            }

            let mut state = self.save.lock();
            match std::mem::replace(&mut *state, SaveState::Idle) {
                SaveState::WritingDirty { waiters: queued } => {
                    *state = SaveState::Writing;
                    drop(state);
                    waiters = queued;
                }
                _ => return,
            }
        }
    }

    /// Serializes the current snapshot and writes it through the backend.
    ///
    /// The snapshot is taken here, when the write begins, not when the
    /// triggering save was requested, so it reflects every mutation
    /// applied up to this point.
    async fn write_snapshot(&self) -> CoreResult<()> {
        let bytes = self.encode_snapshot()?;
        let backend = Arc::clone(&self.backend);
        match tokio::task::spawn_blocking(move || backend.write(&bytes)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(err.into()),
            Err(err) => Err(CoreError::task_failed(format!("write task: {err}"))),
        }
    }

    /// Encodes every collection's records as the single JSON document.
    fn encode_snapshot(&self) -> CoreResult<Vec<u8>> {
        let collections = self.collections.read();
        let document: BTreeMap<&String, &[Record]> = collections
            .iter()
            .map(|(name, data)| (name, data.records()))
            .collect();

        let bytes = if self.config.pretty {
            serde_json::to_vec_pretty(&document)?
        } else {
            serde_json::to_vec(&document)?
        };
        Ok(bytes)
    }
}
