//! Watcher handles.

use std::cell::Cell;
use std::rc::Rc;

/// Handle to an active watcher.
///
/// [`stop`](WatchHandle::stop) detaches the watcher; dropping the handle does
/// the same. Stopping is idempotent. A watcher stopped in the middle of a
/// notification round is skipped for the rest of that round.
pub struct WatchHandle {
    stopped: Rc<Cell<bool>>,
    detach: Option<Box<dyn FnOnce()>>,
}

impl WatchHandle {
    pub(crate) fn new(stopped: Rc<Cell<bool>>, detach: Box<dyn FnOnce()>) -> Self {
        WatchHandle {
            stopped,
            detach: Some(detach),
        }
    }

    /// Detach the watcher from its store.
    pub fn stop(&mut self) {
        if let Some(detach) = self.detach.take() {
            self.stopped.set(true);
            detach();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
