//! The sender half of a triad: drains its own mailbox onto a socket.
//!
//! Grounded in `distributer.c`'s `actor_distributer_message_send`. Every
//! outgoing message is whatever arrived in this process's mailbox,
//! addressed at the remote pid through the ordinary send path — callers
//! never touch the socket directly, they just `send()` to the nid this
//! triad represents.

use std::net::TcpStream;

use crate::error::Error;
use crate::process::ProcessHandle;

use super::wire::{self, Header};

/// A message addressed to `(handle.nid(), handle.pid())` — i.e. to this
/// very process — is the shutdown sentinel rather than outbound traffic.
fn is_shutdown_sentinel(handle: &ProcessHandle, msg: &crate::message::Message) -> bool {
    msg.dest_nid == handle.nid() && msg.dest_pid == handle.pid()
}

pub(crate) fn run(handle: ProcessHandle, mut stream: TcpStream) -> Result<(), Error> {
    loop {
        // A ten-second idle mailbox surfaces as `Timeout`, which the
        // connection supervisor treats as a liveness nudge and restarts
        // us for (distributer.c's sender loop has the identical shape:
        // any non-success `actor_receive` simply ends the process).
        let msg = handle.receive(crate::constants::DEFAULT_SOCKET_TIMEOUT_SECS as f64)?;
        if is_shutdown_sentinel(&handle, &msg) {
            return Ok(());
        }
        let header = Header {
            dest_pid: msg.dest_pid,
            size: msg.size() as u32,
            type_tag: msg.type_tag,
        };
        wire::write_frame(&mut stream, &header, &msg.bytes)?;
    }
}
