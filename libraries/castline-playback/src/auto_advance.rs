//! Pending auto-advance handle
//!
//! Between an episode finishing and the next one loading there is a short,
//! cancellable delay. At most one timer is pending. Cancelling forgets the
//! timer and aborts its task; the task itself must `claim` its token before
//! acting, so a timer that lost the race to a cancel never fires.

use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub(crate) struct AutoAdvance {
    pending: Option<(u64, JoinHandle<()>)>,
    next_token: u64,
}

impl AutoAdvance {
    /// Reserve a token for a timer about to be spawned
    pub(crate) fn next_token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    /// Install a timer, cancelling whatever was pending
    pub(crate) fn arm(&mut self, token: u64, handle: JoinHandle<()>) {
        self.cancel();
        self.pending = Some((token, handle));
    }

    /// Forget the pending timer; returns whether one was pending
    pub(crate) fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Called by the timer task when it wakes up
    ///
    /// Succeeds only if `token` is still the pending timer, clearing it.
    pub(crate) fn claim(&mut self, token: u64) -> bool {
        match &self.pending {
            Some((pending, _)) if *pending == token => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Whether `token` is still the pending timer, without clearing it
    pub(crate) fn is_current(&self, token: u64) -> bool {
        matches!(&self.pending, Some((pending, _)) if *pending == token)
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
