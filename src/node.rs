//! A node: the process table, the remote-node table, and the executor
//! that backs both (§4.2-§4.5).
//!
//! Grounded in `process.c`'s `actor_node_t` (an array of slots plus a
//! mutex) and `distributer.c`'s `remote_nodes` array. This crate folds
//! both into one `Node` since they share the same table lock and the
//! same executor.

use std::any::Any;
use std::collections::HashMap;
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::constants::{DEFAULT_SOCKET_TIMEOUT_SECS, INVALID_ID, MAX_REMOTE_NODES};
use crate::error::{Error, ErrorCode};
use crate::executor::Executor;
use crate::mailbox::Mailbox;
use crate::message::Message;
use crate::process::ProcessHandle;

/// Tunable knobs for a [`Node`], beyond the bare `(own_nid, capacity)`
/// pair spec.md's table lists. Ambient configuration, not part of the
/// addressing model.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Number of process slots. Bounds concurrently-alive local
    /// processes; exceeding it yields [`Error::NoSlots`] from `spawn`.
    pub capacity: usize,
    /// Receive timeout applied to every socket the distributer opens,
    /// both during handshake and in the triad's steady state.
    pub socket_timeout: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            capacity: 1024,
            socket_timeout: Duration::from_secs(DEFAULT_SOCKET_TIMEOUT_SECS),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Free,
    Alive,
    Exiting,
}

struct Slot {
    state: SlotState,
    sender: Option<crate::mailbox::MailboxSender>,
}

impl Slot {
    fn free() -> Self {
        Slot {
            state: SlotState::Free,
            sender: None,
        }
    }
}

/// One address-space participant: a process table, a remote-node table,
/// and the machinery to route messages between them (§4).
pub struct Node {
    nid: u32,
    socket_timeout: Duration,
    table: Mutex<Vec<Slot>>,
    remote_nodes: Vec<AtomicU32>,
    sockets: Mutex<HashMap<u32, TcpStream>>,
    executor: Executor,
    releasing: AtomicBool,
}

impl Node {
    /// Create a node with `capacity` process slots, using default
    /// ambient settings (§4.2).
    pub fn create(nid: u32, capacity: usize) -> Result<Arc<Node>, Error> {
        Node::create_with_config(
            nid,
            NodeConfig {
                capacity,
                ..NodeConfig::default()
            },
        )
    }

    /// Create a node with explicit [`NodeConfig`].
    pub fn create_with_config(nid: u32, config: NodeConfig) -> Result<Arc<Node>, Error> {
        if config.capacity == 0 {
            return Err(Error::invalue("capacity must be non-zero"));
        }
        if nid as usize >= MAX_REMOTE_NODES {
            return Err(Error::invalue("nid out of range"));
        }
        let table = (0..config.capacity).map(|_| Slot::free()).collect();
        let remote_nodes = (0..MAX_REMOTE_NODES).map(|_| AtomicU32::new(INVALID_ID)).collect();
        Ok(Arc::new(Node {
            nid,
            socket_timeout: config.socket_timeout,
            table: Mutex::new(table),
            remote_nodes,
            sockets: Mutex::new(HashMap::new()),
            executor: Executor::new(),
            releasing: AtomicBool::new(false),
        }))
    }

    pub fn nid(&self) -> u32 {
        self.nid
    }

    pub(crate) fn socket_timeout(&self) -> Duration {
        self.socket_timeout
    }

    /// Spawn a process running `body` to completion on its own thread
    /// (§4.2, §4.5). Returns the new local pid.
    pub fn spawn<F>(self: &Arc<Node>, body: F) -> Result<u32, Error>
    where
        F: FnOnce(ProcessHandle) -> Result<(), Error> + Send + 'static,
    {
        let (pid, rx) = self.alloc_pid()?;
        let handle = ProcessHandle::new(Arc::clone(self), self.nid, pid, rx);
        let body_handle = handle.clone();
        let node = Arc::clone(self);

        self.executor.spawn(move || {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| body(body_handle)))
                .unwrap_or_else(|panic| Err(Error::generic(panic_message(panic))));
            node.finish_process(handle, result);
        });
        Ok(pid)
    }

    fn alloc_pid(&self) -> Result<(u32, Mailbox), Error> {
        let mut table = self.table.lock();
        let idx = table
            .iter()
            .position(|slot| slot.state == SlotState::Free)
            .ok_or(Error::NoSlots)?;
        let (tx, rx) = Mailbox::new();
        table[idx] = Slot {
            state: SlotState::Alive,
            sender: Some(tx),
        };
        Ok((idx as u32, rx))
    }

    fn finish_process(&self, handle: ProcessHandle, result: Result<(), Error>) {
        let pid = handle.pid();
        {
            let mut table = self.table.lock();
            if let Some(slot) = table.get_mut(pid as usize) {
                slot.state = SlotState::Exiting;
            }
        }
        let code = match &result {
            Ok(()) => ErrorCode::Ok,
            Err(e) => e.code(),
        };
        if let Some((sup_nid, sup_pid)) = handle.supervisor() {
            let payload = Message::exit_payload(handle.nid(), pid, code);
            if let Err(err) = self.route(handle.nid(), pid, sup_nid, sup_pid, crate::constants::EXIT_MESSAGE, payload) {
                tracing::warn!(
                    pid,
                    supervisor_nid = sup_nid,
                    supervisor_pid = sup_pid,
                    %err,
                    "failed to deliver exit notification"
                );
            }
        }
        let mut table = self.table.lock();
        table[pid as usize] = Slot::free();
    }

    /// Route a message, local or remote, resolving the destination the
    /// way §4.4 describes: local pid lookup, or remote nid -> registered
    /// sender pid -> local pid lookup.
    pub(crate) fn route(
        &self,
        source_nid: u32,
        source_pid: u32,
        dest_nid: u32,
        dest_pid: u32,
        type_tag: u32,
        bytes: Vec<u8>,
    ) -> Result<(), Error> {
        let local_pid = if dest_nid == self.nid {
            dest_pid
        } else {
            let dest_nid = dest_nid as usize;
            if dest_nid >= MAX_REMOTE_NODES {
                return Err(Error::NoNode);
            }
            let sender_pid = self.remote_nodes[dest_nid].load(Ordering::Acquire);
            if sender_pid == INVALID_ID {
                return Err(Error::NoNode);
            }
            sender_pid
        };

        let sender = {
            let table = self.table.lock();
            let slot = table.get(local_pid as usize).ok_or(Error::NoProcess)?;
            if slot.state != SlotState::Alive {
                return Err(Error::NoProcess);
            }
            slot.sender.clone().ok_or(Error::NoProcess)?
        };
        let msg = Message::new(source_nid, source_pid, dest_nid, dest_pid, type_tag, bytes);
        sender.put(msg).map_err(|_| Error::NoProcess)
    }

    pub(crate) fn set_remote_sender(&self, remote_nid: u32, sender_pid: u32) {
        self.remote_nodes[remote_nid as usize].store(sender_pid, Ordering::Release);
    }

    pub(crate) fn reserve_remote(&self, remote_nid: u32, sender_pid: u32) -> Result<(), ()> {
        self.remote_nodes[remote_nid as usize]
            .compare_exchange(INVALID_ID, sender_pid, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| ())
    }

    /// Release a reservation taken by `reserve_remote` that never made it
    /// to a live triad (a handshake that failed partway through spawning).
    /// Closes whatever socket got registered and frees the table entry
    /// directly, without routing a sentinel through it — nothing has
    /// subscribed to this nid's table entry yet, since we own the
    /// reservation exclusively.
    pub(crate) fn clear_remote_reservation(&self, remote_nid: u32) {
        if let Some(stream) = self.sockets.lock().remove(&remote_nid) {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
        self.remote_nodes[remote_nid as usize].store(INVALID_ID, Ordering::SeqCst);
    }

    pub(crate) fn register_socket(&self, remote_nid: u32, stream: TcpStream) {
        self.sockets.lock().insert(remote_nid, stream);
    }

    /// Signal the sender half of a triad to stop, via the same
    /// self-addressed sentinel the original uses (`distributer.c`,
    /// `actor_distributer_disconnect_from_node`). The sender loop
    /// recognizes the sentinel by address, not payload, but the payload
    /// mirrors the original's literal `"STOP"` + NUL, five bytes.
    pub(crate) fn shutdown_sender(&self, sender_pid: u32) {
        let _ = self.route(self.nid, sender_pid, self.nid, sender_pid, 0, b"STOP\0".to_vec());
    }

    /// Tear down a triad: close its socket, ask its sender to stop, and
    /// free the remote-node table entry.
    pub(crate) fn teardown_triad(&self, remote_nid: u32) {
        if let Some(stream) = self.sockets.lock().remove(&remote_nid) {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
        let sender_pid = self.remote_nodes[remote_nid as usize].swap(INVALID_ID, Ordering::AcqRel);
        if sender_pid != INVALID_ID {
            self.shutdown_sender(sender_pid);
        }
    }

    /// Ask the remote node at `nid` to disconnect (§6). A no-op target
    /// (nothing registered) is reported as a network error, matching the
    /// original's `ACTOR_ERROR_NETWORK` return.
    pub fn disconnect_from_node(&self, nid: u32) -> Result<(), Error> {
        if nid as usize >= MAX_REMOTE_NODES {
            return Err(Error::invalue("nid out of range"));
        }
        let sender_pid = self.remote_nodes[nid as usize].load(Ordering::Acquire);
        if sender_pid == INVALID_ID {
            return Err(Error::network("not connected to that node"));
        }
        self.shutdown_sender(sender_pid);
        Ok(())
    }

    /// Drain every alive process and reset all tables (§4.2). Idempotent:
    /// a second call is a no-op.
    pub fn release(&self) {
        if self.releasing.swap(true, Ordering::SeqCst) {
            return;
        }
        let sockets: Vec<TcpStream> = self.sockets.lock().drain().map(|(_, s)| s).collect();
        for socket in sockets {
            let _ = socket.shutdown(std::net::Shutdown::Both);
        }
        {
            let mut table = self.table.lock();
            for slot in table.iter_mut() {
                slot.sender = None;
            }
        }
        self.executor.drain();
        let mut table = self.table.lock();
        for slot in table.iter_mut() {
            *slot = Slot::free();
        }
        for entry in &self.remote_nodes {
            entry.store(INVALID_ID, Ordering::SeqCst);
        }
        self.releasing.store(false, Ordering::SeqCst);
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.release();
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "process body panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn spawn_and_local_send_receive() {
        let node = Node::create(0, 4).unwrap();
        let (done_tx, done_rx) = mpsc::channel();
        node.spawn(move |handle| {
            let msg = handle.receive(5.0)?;
            done_tx.send(msg.bytes).unwrap();
            Ok(())
        })
        .unwrap();

        // Give the spawned thread a moment to reach `receive`.
        std::thread::sleep(Duration::from_millis(50));
        node.route(0, 0, 0, 0, 1, b"hi".to_vec()).unwrap();
        assert_eq!(done_rx.recv_timeout(Duration::from_secs(5)).unwrap(), b"hi");
    }

    #[test]
    fn send_to_unknown_pid_is_no_process() {
        let node = Node::create(0, 4).unwrap();
        assert!(matches!(node.route(0, 0, 0, 3, 1, vec![]), Err(Error::NoProcess)));
    }

    #[test]
    fn send_to_unknown_nid_is_no_node() {
        let node = Node::create(0, 4).unwrap();
        assert!(matches!(node.route(0, 0, 9, 0, 1, vec![]), Err(Error::NoNode)));
    }

    #[test]
    fn exhausting_capacity_yields_no_slots() {
        let node = Node::create(0, 1).unwrap();
        node.spawn(|handle| {
            let _ = handle.receive(5.0);
            Ok(())
        })
        .unwrap();
        let err = node.spawn(|_| Ok(())).unwrap_err();
        assert!(matches!(err, Error::NoSlots));
        node.release();
    }

    #[test]
    fn supervisor_receives_exit_message_on_body_error() {
        let node = Node::create(0, 4).unwrap();
        let supervisor_pid = node
            .spawn(|handle| {
                let msg = handle.receive(5.0)?;
                let info = msg.as_exit_info().expect("exit message");
                assert_eq!(info.error, ErrorCode::Generic);
                Ok(())
            })
            .unwrap();

        node.spawn(move |handle| {
            handle.link(0, supervisor_pid);
            Err(Error::generic("boom"))
        })
        .unwrap();

        std::thread::sleep(Duration::from_millis(100));
        node.release();
    }
}
