//! The connection supervisor: the third member of a triad, linked to
//! both the sender and the receiver, that decides what a child's exit
//! means for the connection as a whole (§4.6).
//!
//! Grounded in `distributer.c`'s `actor_distributer_connection_supervisor`:
//! a `Timeout` exit (the sender's mailbox went quiet, or — in this
//! crate's reading of §5 — the receiver's socket went quiet) respawns
//! just the sender on the same socket. Anything else tears the whole
//! triad down.

use std::net::TcpStream;
use std::sync::Arc;

use crate::error::{Error, ErrorCode};
use crate::node::Node;
use crate::process::ProcessHandle;

use super::sender;

pub(crate) fn run(node: Arc<Node>, handle: ProcessHandle, remote_nid: u32, stream: TcpStream) -> Result<(), Error> {
    loop {
        let msg = match handle.receive(node.socket_timeout().as_secs_f64()) {
            Ok(msg) => msg,
            Err(Error::Timeout) => continue,
            Err(e) => return Err(e),
        };
        let Some(info) = msg.as_exit_info() else {
            continue;
        };

        if info.error == ErrorCode::Timeout {
            let respawned = respawn_sender(&node, handle.pid(), remote_nid, &stream);
            if let Err(err) = respawned {
                tracing::warn!(remote_nid, %err, "failed to respawn distributer sender, tearing down connection");
                node.teardown_triad(remote_nid);
                return Ok(());
            }
        } else {
            tracing::info!(remote_nid, error = %info.error, "distributer triad member exited, tearing down connection");
            node.teardown_triad(remote_nid);
            return Ok(());
        }
    }
}

fn respawn_sender(node: &Arc<Node>, supervisor_pid: u32, remote_nid: u32, stream: &TcpStream) -> Result<(), Error> {
    let stream = stream.try_clone()?;
    let supervisor_nid = node.nid();
    let new_pid = node.spawn(move |handle| {
        handle.link(supervisor_nid, supervisor_pid);
        sender::run(handle, stream)
    })?;
    node.set_remote_sender(remote_nid, new_pid);
    Ok(())
}
