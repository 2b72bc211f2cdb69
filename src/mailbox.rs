//! A process's mailbox: an unbounded FIFO with a blocking, timeout-capable
//! take operation (§4.1).
//!
//! Backed by `crossbeam_channel`, whose `recv_timeout` parks the waiting
//! thread on a real condition primitive rather than polling. The
//! original C implementation busy-waits in 100us slices
//! (`message_queue_get`, `src/message.c`) — §9 calls this out as a latent
//! defect that must not be reproduced.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::error::Error;
use crate::message::Message;

/// The sending half of a mailbox. Cheaply cloneable; many processes may
/// hold a clone and enqueue into the same mailbox concurrently.
#[derive(Clone)]
pub(crate) struct MailboxSender {
    inner: Sender<Message>,
}

impl MailboxSender {
    /// Enqueue a message. Never blocks. Fails only once the owning
    /// mailbox has been dropped.
    pub(crate) fn put(&self, msg: Message) -> Result<(), Message> {
        self.inner.send(msg).map_err(|e| e.0)
    }
}

/// The receive half of a mailbox, owned by exactly one process.
pub struct Mailbox {
    inner: Receiver<Message>,
}

impl Mailbox {
    pub(crate) fn new() -> (MailboxSender, Mailbox) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (MailboxSender { inner: tx }, Mailbox { inner: rx })
    }

    /// Wait up to `timeout_seconds` (fractional seconds) for a message.
    ///
    /// `timeout_seconds == 0.0` is a non-blocking peek-and-pop. Negative
    /// timeouts are rejected with [`Error::Invalue`].
    pub fn take(&self, timeout_seconds: f64) -> Result<Message, Error> {
        if timeout_seconds < 0.0 {
            return Err(Error::invalue("negative receive timeout"));
        }
        if timeout_seconds == 0.0 {
            return match self.inner.try_recv() {
                Ok(msg) => Ok(msg),
                Err(TryRecvError::Empty) => Err(Error::Timeout),
                Err(TryRecvError::Disconnected) => Err(Error::Timeout),
            };
        }
        match self.inner.recv_timeout(Duration::from_secs_f64(timeout_seconds)) {
            Ok(msg) => Ok(msg),
            Err(RecvTimeoutError::Timeout) => Err(Error::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(Error::Timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use std::thread;
    use std::time::{Duration, Instant};

    fn msg(tag: u32) -> Message {
        Message::new(0, 0, 0, 0, tag, vec![])
    }

    #[test]
    fn fifo_order_preserved() {
        let (tx, rx) = Mailbox::new();
        for i in 0..10 {
            tx.put(msg(i)).unwrap();
        }
        for i in 0..10 {
            assert_eq!(rx.take(0.0).unwrap().type_tag, i);
        }
    }

    #[test]
    fn take_zero_on_empty_is_immediate_timeout() {
        let (_tx, rx) = Mailbox::new();
        let start = Instant::now();
        assert!(matches!(rx.take(0.0), Err(Error::Timeout)));
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn take_with_deadline_times_out_within_slack() {
        let (_tx, rx) = Mailbox::new();
        let start = Instant::now();
        assert!(matches!(rx.take(0.1), Err(Error::Timeout)));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(400));
    }

    #[test]
    fn negative_timeout_is_rejected() {
        let (_tx, rx) = Mailbox::new();
        assert!(matches!(rx.take(-1.0), Err(Error::Invalue(_))));
    }

    #[test]
    fn take_unblocks_when_message_arrives() {
        let (tx, rx) = Mailbox::new();
        let sender = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            tx.put(msg(1)).unwrap();
        });
        let got = rx.take(5.0).unwrap();
        assert_eq!(got.type_tag, 1);
        sender.join().unwrap();
    }
}
