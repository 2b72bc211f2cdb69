//! Establishing a triad: the pre-shared-key handshake plus spawning the
//! sender/receiver/supervisor trio (§4.6).
//!
//! Grounded in `distributer.c`'s `actor_distributer_connect_to_node` and
//! `actor_distributer_listen`. Both sides exchange a fixed-width key
//! buffer and their own nid; a mismatched key or nid closes the socket
//! without starting a triad.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::constants::{INVALID_ID, KEYLENGTH, MAX_REMOTE_NODES};
use crate::error::Error;
use crate::node::Node;

use super::{receiver, sender, supervisor};

/// Placeholder dropped into the remote-node table the instant a handshake
/// reserves a slot, before any triad member has a real pid to publish.
/// Never transmitted; distinct from [`INVALID_ID`] so the CAS in
/// `reserve_remote` treats it as "taken".
const RESERVING: u32 = INVALID_ID - 2;

fn write_key(stream: &mut TcpStream, key: &[u8]) -> Result<(), Error> {
    if key.len() > KEYLENGTH {
        return Err(Error::invalue("key exceeds KEYLENGTH"));
    }
    let mut buf = [0u8; KEYLENGTH + 1];
    buf[..key.len()].copy_from_slice(key);
    stream.write_all(&buf).map_err(Error::from)
}

fn read_key(stream: &mut TcpStream) -> Result<[u8; KEYLENGTH + 1], Error> {
    let mut buf = [0u8; KEYLENGTH + 1];
    stream.read_exact(&mut buf).map_err(Error::from)?;
    Ok(buf)
}

fn expected_key_buf(key: &[u8]) -> [u8; KEYLENGTH + 1] {
    let mut buf = [0u8; KEYLENGTH + 1];
    buf[..key.len()].copy_from_slice(key);
    buf
}

impl Node {
    /// Connect to a remote node already listening at `host:port`, using
    /// `key` as the pre-shared secret, and start a triad for it (§6).
    pub fn connect_to_node(self: &Arc<Node>, host: &str, port: u16, key: &[u8]) -> Result<u32, Error> {
        if key.len() > KEYLENGTH {
            return Err(Error::invalue("key exceeds KEYLENGTH"));
        }
        let mut stream = TcpStream::connect((host, port)).map_err(|e| Error::network(e.to_string()))?;
        stream.set_read_timeout(Some(self.socket_timeout())).map_err(Error::from)?;

        write_key(&mut stream, key)?;
        stream.write_u32::<LittleEndian>(self.nid()).map_err(Error::from)?;
        let peer_nid = stream
            .read_u32::<LittleEndian>()
            .map_err(|e| Error::network(format!("handshake: failed to read peer nid: {e}")))?;

        self.install_triad(peer_nid, stream)
    }

    /// Accept a single inbound connection on `port`, verify its key
    /// against ours, and start a triad for whoever connected (§6).
    ///
    /// Blocks the calling thread until a peer connects; callers that want
    /// to keep accepting should call this in a loop from a dedicated
    /// thread or process.
    pub fn listen(self: &Arc<Node>, port: u16, key: &[u8]) -> Result<u32, Error> {
        if key.len() > KEYLENGTH {
            return Err(Error::invalue("key exceeds KEYLENGTH"));
        }
        let listener = TcpListener::bind(("0.0.0.0", port)).map_err(|e| Error::network(e.to_string()))?;
        let (mut stream, _addr) = listener.accept().map_err(|e| Error::network(e.to_string()))?;
        stream.set_read_timeout(Some(self.socket_timeout())).map_err(Error::from)?;

        let received = read_key(&mut stream)?;
        if received != expected_key_buf(key) {
            tracing::warn!("handshake: rejected inbound connection, pre-shared key mismatch");
            return Err(Error::network("handshake: key mismatch"));
        }
        stream.write_u32::<LittleEndian>(self.nid()).map_err(Error::from)?;
        let peer_nid = stream
            .read_u32::<LittleEndian>()
            .map_err(|e| Error::network(format!("handshake: failed to read peer nid: {e}")))?;

        self.install_triad(peer_nid, stream)
    }

    fn install_triad(self: &Arc<Node>, remote_nid: u32, stream: TcpStream) -> Result<u32, Error> {
        if remote_nid as usize >= MAX_REMOTE_NODES || remote_nid == self.nid() {
            tracing::warn!(remote_nid, "handshake: rejected peer, unusable nid");
            return Err(Error::network("handshake: peer presented an unusable nid"));
        }

        // Reserve the table slot before touching the socket map or
        // spawning anything, so a duplicate handshake against an
        // already-connected nid is rejected without ever touching the
        // real connection's state.
        if self.reserve_remote(remote_nid, RESERVING).is_err() {
            tracing::warn!(remote_nid, "handshake: rejected peer, node id already connected");
            return Err(Error::network("remote node id already connected"));
        }

        match self.spawn_triad(remote_nid, stream) {
            Ok(sender_pid) => {
                self.set_remote_sender(remote_nid, sender_pid);
                Ok(remote_nid)
            }
            Err(err) => {
                self.clear_remote_reservation(remote_nid);
                Err(err)
            }
        }
    }

    fn spawn_triad(self: &Arc<Node>, remote_nid: u32, stream: TcpStream) -> Result<u32, Error> {
        let recv_stream = stream.try_clone().map_err(Error::from)?;
        let send_stream = stream.try_clone().map_err(Error::from)?;
        let sup_stream = stream.try_clone().map_err(Error::from)?;
        self.register_socket(remote_nid, stream);

        let sup_node = Arc::clone(self);
        let supervisor_pid = self.spawn(move |handle| supervisor::run(sup_node, handle, remote_nid, sup_stream))?;

        let supervisor_nid = self.nid();
        self.spawn(move |handle| {
            handle.link(supervisor_nid, supervisor_pid);
            receiver::run(handle, recv_stream)
        })?;

        self.spawn(move |handle| {
            handle.link(supervisor_nid, supervisor_pid);
            sender::run(handle, send_stream)
        })
    }
}
