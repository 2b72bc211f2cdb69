//! A process's view of itself: the handle passed into a spawned body.
//!
//! Mirrors the original's `actor_t *self` argument (`process.c`), but as
//! an owned, cheaply cloneable handle rather than a borrowed pointer into
//! a shared table — the table only ever stores the mailbox's send half.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::constants::INVALID_ID;
use crate::error::Error;
use crate::mailbox::Mailbox;
use crate::message::Message;
use crate::node::Node;

struct Inner {
    node: Arc<Node>,
    nid: u32,
    pid: u32,
    mailbox: Mailbox,
    supervisor: Mutex<Option<(u32, u32)>>,
}

/// Everything a running process body needs to talk to the rest of the
/// runtime: its own address, its mailbox, and a way to address others.
///
/// Cloning a `ProcessHandle` does not create a second process — all
/// clones share the same mailbox and supervisor link, the way multiple
/// references to one C `actor_t` would.
#[derive(Clone)]
pub struct ProcessHandle {
    inner: Arc<Inner>,
}

impl ProcessHandle {
    pub(crate) fn new(node: Arc<Node>, nid: u32, pid: u32, mailbox: Mailbox) -> Self {
        ProcessHandle {
            inner: Arc::new(Inner {
                node,
                nid,
                pid,
                mailbox,
                supervisor: Mutex::new(None),
            }),
        }
    }

    /// This process's node id.
    pub fn nid(&self) -> u32 {
        self.inner.nid
    }

    /// This process's id on its own node.
    pub fn pid(&self) -> u32 {
        self.inner.pid
    }

    /// Send a message to `(dest_nid, dest_pid)`, local or remote (§4.4).
    pub fn send(&self, dest_nid: u32, dest_pid: u32, type_tag: u32, bytes: &[u8]) -> Result<(), Error> {
        self.inner
            .node
            .route(self.inner.nid, self.inner.pid, dest_nid, dest_pid, type_tag, bytes.to_vec())
    }

    /// Take the next message from this process's own mailbox, waiting up
    /// to `timeout_seconds` (§4.1).
    pub fn receive(&self, timeout_seconds: f64) -> Result<Message, Error> {
        self.inner.mailbox.take(timeout_seconds)
    }

    /// Install (or, passing `(INVALID_ID, INVALID_ID)`, clear) the
    /// supervisor notified on this process's exit (§4.5). Last call wins;
    /// there is exactly one supervisor slot, not a set of links.
    pub fn link(&self, supervisor_nid: u32, supervisor_pid: u32) {
        let target = if supervisor_nid == INVALID_ID && supervisor_pid == INVALID_ID {
            None
        } else {
            Some((supervisor_nid, supervisor_pid))
        };
        *self.inner.supervisor.lock() = target;
    }

    /// Suspend the calling thread, i.e. this process, for `seconds`.
    pub fn sleep(&self, seconds: f64) {
        if seconds > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(seconds));
        }
    }

    pub(crate) fn supervisor(&self) -> Option<(u32, u32)> {
        *self.inner.supervisor.lock()
    }
}
