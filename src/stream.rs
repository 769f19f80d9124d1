use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use roost_core::{CoreError, Thing};

use crate::dispatch::Dispatch;
use crate::reaper::Fetch;

/// Outcome of one poll cycle.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TickReport {
    pub delivered: usize,
    pub gap: bool,
}

/// Poller for one subscription target.
///
/// The cursor is the fullname of the most recently delivered item. It is
/// owned exclusively by this stream's task and lives only for the run:
/// restarting the process restarts every stream from "now", with no
/// replay of history.
pub struct Stream {
    target: String,
    path: String,
    fetcher: Arc<dyn Fetch>,
    dispatcher: Arc<dyn Dispatch>,
    cursor: Option<String>,
    gaps: u64,
}

impl Stream {
    pub(crate) fn new(
        target: impl Into<String>,
        path: impl Into<String>,
        fetcher: Arc<dyn Fetch>,
        dispatcher: Arc<dyn Dispatch>,
    ) -> Self {
        Self {
            target: target.into(),
            path: path.into(),
            fetcher,
            dispatcher,
            cursor: None,
            gaps: 0,
        }
    }

    /// Poll cycles in which the cursor was missing from a non-empty
    /// page, i.e. more items may have passed than one page holds.
    #[cfg(test)]
    pub(crate) fn gaps(&self) -> u64 {
        self.gaps
    }

    /// Polls once: fetch, split off the unseen prefix, deliver oldest
    /// first, advance the cursor.
    ///
    /// The cursor only moves past an item once its handler call has
    /// returned, so a failed cycle never skips anything and a stop
    /// mid-cycle leaves a consistent watermark.
    pub(crate) async fn tick(
        &mut self,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<TickReport, CoreError> {
        let listing = self.fetcher.fetch(&self.path).await?;

        // The fetch (and the rate wait inside it) is allowed to finish,
        // but nothing gets delivered once a stop has been requested.
        if *shutdown.borrow() {
            return Ok(TickReport::default());
        }

        let Some(cursor) = self.cursor.clone() else {
            // First poll: the page is history, not news. Seed the cursor
            // at the newest item and deliver nothing.
            if let Some(newest) = newest_fullname(&listing) {
                debug!(target = %self.target, cursor = newest, "first poll, suppressing backlog");
                self.cursor = Some(newest.to_owned());
            }
            return Ok(TickReport::default());
        };

        let (fresh, gap) = take_new(listing, &cursor);
        if gap {
            self.gaps += 1;
            warn!(
                target = %self.target,
                "cursor not found in page, items may have been missed; delivering the whole page"
            );
        }

        let mut delivered = 0;
        for thing in fresh.into_iter().rev() {
            let fullname = thing.fullname().map(str::to_owned);
            self.dispatcher
                .dispatch(thing)
                .await
                .map_err(|e| CoreError::Handler {
                    target: self.target.clone(),
                    source: e,
                })?;
            delivered += 1;
            if let Some(fullname) = fullname {
                self.cursor = Some(fullname);
            }
            if *shutdown.borrow() {
                debug!(target = %self.target, "stop requested mid-cycle");
                break;
            }
        }

        Ok(TickReport { delivered, gap })
    }

    /// Runs the poll loop until a stop signal or an error. Pacing comes
    /// from the shared rate limiter behind the fetcher; the loop itself
    /// never sleeps.
    pub(crate) async fn run(mut self, shutdown: watch::Receiver<bool>) -> Result<(), CoreError> {
        info!(target = %self.target, path = %self.path, "stream started");
        loop {
            if *shutdown.borrow() {
                info!(target = %self.target, gaps = self.gaps, "stream stopped");
                return Ok(());
            }
            match self.tick(&shutdown).await {
                Ok(report) => {
                    if report.delivered > 0 || report.gap {
                        debug!(
                            target = %self.target,
                            delivered = report.delivered,
                            gap = report.gap,
                            "poll cycle complete"
                        );
                    }
                }
                Err(e) => return Err(CoreError::in_stream(self.target.clone(), e)),
            }
        }
    }
}

/// Splits a newest-first listing at the cursor.
///
/// Returns the unseen prefix (still newest first) and whether the cursor
/// was missing from a non-empty page.
fn take_new(listing: Vec<Thing>, cursor: &str) -> (Vec<Thing>, bool) {
    if listing.is_empty() {
        return (Vec::new(), false);
    }
    let mut fresh = Vec::new();
    for thing in listing {
        if thing.fullname() == Some(cursor) {
            return (fresh, false);
        }
        fresh.push(thing);
    }
    (fresh, true)
}

fn newest_fullname(listing: &[Thing]) -> Option<&str> {
    listing.iter().find_map(Thing::fullname)
}
