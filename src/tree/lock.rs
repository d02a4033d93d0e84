//! Reentrant read/write lock shared by every node of one tree.
//!
//! The thread holding the write lock may re-acquire it (read or write) any
//! number of times; listeners dispatched during a mutation therefore read and
//! mutate the tree freely. Upgrading a read lock to a write lock on the same
//! thread is not supported and blocks forever.
//!
//! The first write acquisition of a nested sequence fixes the root cause of
//! the transaction; nested acquisitions with another or no cause keep it.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::thread::ThreadId;

use parking_lot::Condvar;
use parking_lot::Mutex;
use tracing::trace;

use super::Cause;

pub(crate) struct TreeLock {
    state: Mutex<LockState>,
    released: Condvar,
}

#[derive(Default)]
struct LockState {
    writer: Option<ThreadId>,
    write_depth: usize,
    readers: usize,
    root_cause: Option<Cause>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hold {
    Read,
    Write,
    /// Read acquired by the thread already holding the write lock
    Nested,
}

impl TreeLock {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(TreeLock {
            state: Mutex::new(LockState::default()),
            released: Condvar::new(),
        })
    }

    pub(crate) fn lock(
        self: &Arc<Self>,
        write: bool,
        cause: Option<&Cause>,
    ) -> Transaction {
        match self.acquire(write, cause, true) {
            Some(tx) => tx,
            None => unreachable!("blocking acquisition always succeeds"),
        }
    }

    pub(crate) fn try_lock(
        self: &Arc<Self>,
        write: bool,
        cause: Option<&Cause>,
    ) -> Option<Transaction> {
        self.acquire(write, cause, false)
    }

    /// Root cause of the write transaction held by the calling thread.
    pub(crate) fn current_cause(&self) -> Option<Cause> {
        let state = self.state.lock();
        if state.writer == Some(thread::current().id()) {
            state.root_cause.clone()
        } else {
            None
        }
    }


    fn acquire(
        self: &Arc<Self>,
        write: bool,
        cause: Option<&Cause>,
        block: bool,
    ) -> Option<Transaction> {
        let me = thread::current().id();
        let mut state = self.state.lock();

        if state.writer == Some(me) {
            let hold = if write {
                state.write_depth += 1;
                Hold::Write
            } else {
                Hold::Nested
            };
            return Some(Transaction {
                lock: self.clone(),
                hold,
            });
        }

        if write {
            while state.writer.is_some() || state.readers > 0 {
                if !block {
                    return None;
                }
                self.released.wait(&mut state);
            }
            let root_cause = cause.cloned().unwrap_or_default();
            trace!(cause = %root_cause, "Write transaction opened");
            state.writer = Some(me);
            state.write_depth = 1;
            state.root_cause = Some(root_cause);
            Some(Transaction {
                lock: self.clone(),
                hold: Hold::Write,
            })
        } else {
            while state.writer.is_some() {
                if !block {
                    return None;
                }
                self.released.wait(&mut state);
            }
            state.readers += 1;
            Some(Transaction {
                lock: self.clone(),
                hold: Hold::Read,
            })
        }
    }

    fn release(
        &self,
        hold: Hold,
    ) {
        let mut state = self.state.lock();
        match hold {
            Hold::Nested => {}
            Hold::Read => {
                state.readers -= 1;
                if state.readers == 0 {
                    self.released.notify_all();
                }
            }
            Hold::Write => {
                state.write_depth -= 1;
                if state.write_depth == 0 {
                    state.writer = None;
                    if let Some(cause) = state.root_cause.take() {
                        trace!(cause = %cause, "Write transaction closed");
                    }
                    self.released.notify_all();
                }
            }
        }
    }
}

/// Scoped hold on a tree lock, released on drop.
#[must_use = "the lock is released as soon as the transaction is dropped"]
pub struct Transaction {
    lock: Arc<TreeLock>,
    hold: Hold,
}

impl Transaction {
    pub fn is_write(&self) -> bool {
        self.hold == Hold::Write
    }

    /// Root cause of the enclosing write transaction, if any.
    pub fn cause(&self) -> Option<Cause> {
        self.lock.current_cause()
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        self.lock.release(self.hold);
    }
}

impl fmt::Debug for Transaction {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Transaction").field("hold", &self.hold).finish()
    }
}
