//! Sequential consumer feeding watch events into the recorder.

use futures_util::{Stream, StreamExt};
use tokio::sync::broadcast;

use crate::recorder::PhaseRecorder;
use crate::watch::{WatchError, WatchEvent};

/// Counters describing one consumer run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerSummary {
    pub upserts: u64,
    pub deletes: u64,
    pub transitions: u64,
    /// Events dropped because they could not be decoded or recorded.
    pub skipped: u64,
    /// Bookmarks, error statuses and unknown notification types.
    pub ignored: u64,
    /// True when the loop ended on the shutdown signal.
    pub shutdown: bool,
}

/// Drive `recorder` from `events` until the feed closes, a shutdown is
/// signalled or the transport fails.
///
/// Per-event failures are logged and skipped. Only a transport failure is
/// returned as an error.
pub async fn run_consumer<S>(
    mut events: S,
    recorder: &mut PhaseRecorder,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<ConsumerSummary, WatchError>
where
    S: Stream<Item = Result<WatchEvent, WatchError>> + Unpin,
{
    let mut summary = ConsumerSummary::default();

    loop {
        let next = tokio::select! {
            next = events.next() => next,
            _ = shutdown.recv() => {
                tracing::info!("Consumer received shutdown signal, exiting loop");
                summary.shutdown = true;
                break;
            }
        };

        match next {
            Some(Ok(event)) => dispatch(recorder, event, &mut summary),
            Some(Err(WatchError::Decode(e))) => {
                tracing::warn!(error = %e, "Skipping undecodable watch event");
                summary.skipped += 1;
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "Watch feed failed");
                return Err(e);
            }
            None => {
                tracing::info!("Watch feed closed");
                break;
            }
        }
    }

    tracing::info!(
        upserts = summary.upserts,
        deletes = summary.deletes,
        transitions = summary.transitions,
        skipped = summary.skipped,
        tracked = recorder.tracked_count(),
        "Consumer stopped"
    );
    Ok(summary)
}

fn dispatch(recorder: &mut PhaseRecorder, event: WatchEvent, summary: &mut ConsumerSummary) {
    let result = match &event {
        WatchEvent::Added(doc) | WatchEvent::Modified(doc) => {
            summary.upserts += 1;
            recorder.observe_upsert(doc)
        }
        WatchEvent::Deleted(doc) => {
            summary.deletes += 1;
            recorder.observe_delete(doc)
        }
        WatchEvent::Error(status) => {
            tracing::warn!(status = %status, "Watch reported an error status");
            summary.ignored += 1;
            return;
        }
        WatchEvent::Bookmark | WatchEvent::Unknown(_) => {
            tracing::trace!(kind = event.kind(), "Ignoring watch event");
            summary.ignored += 1;
            return;
        }
    };

    match result {
        Ok(Some(_)) => summary.transitions += 1,
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(kind = event.kind(), error = %e, "Recording error");
            summary.skipped += 1;
        }
    }
}
