//! The receiver half of a triad: pulls frames off a socket and delivers
//! them into the local process table.
//!
//! Grounded in `distributer.c`'s `actor_distributer_message_receive`.
//! Unlike the original — which treats a `recv` timeout as "nothing to do
//! yet" and loops forever — this reports the timeout as an exit (§5): a
//! silent peer is expected to surface a `Timeout` exit that the
//! connection supervisor can react to, not go unnoticed indefinitely.

use std::net::TcpStream;

use crate::error::Error;
use crate::process::ProcessHandle;

use super::wire;

pub(crate) fn run(handle: ProcessHandle, mut stream: TcpStream) -> Result<(), Error> {
    loop {
        let header = match wire::read_header(&mut stream) {
            Ok(h) => h,
            Err(e) if wire::is_timeout(&e) => return Err(Error::Timeout),
            Err(e) => return Err(Error::network(e.to_string())),
        };
        let payload = match wire::read_payload(&mut stream, header.size) {
            Ok(p) => p,
            Err(e) if wire::is_timeout(&e) => return Err(Error::Timeout),
            Err(e) => return Err(Error::network(e.to_string())),
        };
        // Delivery failure (the destination pid has already exited) is
        // not this loop's problem to report; the frame is simply dropped.
        let _ = handle.send(handle.nid(), header.dest_pid, header.type_tag, &payload);
    }
}
