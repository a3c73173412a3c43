//! Write serialization.
//!
//! A single [`WriteLock`] queues mutating operations: the holder runs, every
//! later caller suspends in FIFO order until the guard ahead of it is
//! dropped. Readers never touch the lock — they run against whatever node
//! graph is reachable when they start.
//!
//! The lock keeps an explicit queue of waiters plus a current-holder flag.
//! Each waiter parks on a oneshot channel; releasing the guard hands the
//! lock to the waiter at the head of the queue, so writers are served
//! strictly in the order they asked.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::oneshot;

/// FIFO mutual exclusion for writers.
///
/// `acquire` suspends cooperatively; it never blocks an OS thread. There is
/// no timeout and no deadlock detection: a caller that leaks its guard
/// starves every later writer. Dropping a pending `acquire` future while it
/// is still queued simply removes the waiter from consideration.
#[derive(Debug, Default)]
pub struct WriteLock {
    state: Mutex<LockState>,
}

#[derive(Debug, Default)]
struct LockState {
    held: bool,
    waiters: VecDeque<oneshot::Sender<()>>,
}

impl WriteLock {
    /// Create an unheld lock with an empty waiter queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive write access.
    ///
    /// Returns a guard that releases the lock when dropped. Waiters are
    /// granted the lock in the order their `acquire` calls ran.
    pub async fn acquire(&self) -> WriteGuard<'_> {
        let waiter = {
            let mut state = self.state.lock();
            if !state.held {
                state.held = true;
                None
            } else {
                let (grant, wait) = oneshot::channel();
                state.waiters.push_back(grant);
                Some(wait)
            }
        };
        if let Some(wait) = waiter {
            // The sender is only dropped if the lock itself is torn down;
            // either way the queue entry ahead of us has been consumed.
            let _ = wait.await;
        }
        WriteGuard { lock: self }
    }

    /// Number of writers currently suspended behind the holder.
    pub fn queued_writers(&self) -> usize {
        self.state.lock().waiters.len()
    }

    fn release(&self) {
        let mut state = self.state.lock();
        loop {
            match state.waiters.pop_front() {
                // A dead receiver means the waiter gave up; skip it.
                Some(grant) => {
                    if grant.send(()).is_ok() {
                        return;
                    }
                }
                None => {
                    state.held = false;
                    return;
                }
            }
        }
    }
}

/// Exclusive write access to the structure guarded by a [`WriteLock`].
///
/// Dropping the guard wakes the next queued writer, if any. The guard is
/// released on unwind as well, so a panicking mutation cannot wedge the
/// queue.
#[derive(Debug)]
pub struct WriteGuard<'a> {
    lock: &'a WriteLock,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.lock.release();
    }
}
