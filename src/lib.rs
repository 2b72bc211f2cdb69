/*!
A distributed actor runtime: lightweight processes, mailboxes,
supervision links, and a TCP distributer that splices remote nodes into
one address space.

# Main concepts

A [`Node`] owns a table of lightweight processes, each addressed by a
`(nid, pid)` pair. Processes share nothing; the only way to interact
with one is to send it a message through [`ProcessHandle::send`], and
the only way a process observes the world is by calling
[`ProcessHandle::receive`] on its own mailbox.

```no_run
use glia::Node;

let node = Node::create(0, 16).unwrap();
let echo = node
    .spawn(|handle| {
        let msg = handle.receive(5.0)?;
        handle.send(msg.source_nid, msg.source_pid, msg.type_tag, &msg.bytes)
    })
    .unwrap();

node.spawn(move |handle| {
    handle.send(0, echo, 1, b"ping")?;
    let reply = handle.receive(5.0)?;
    assert_eq!(reply.bytes, b"ping");
    Ok(())
})
.unwrap();
```

# Supervision

A process can install a supervisor with [`ProcessHandle::link`]. When
that process's body returns — successfully, with an error, or via a
caught panic — the runtime delivers a single `EXIT_MESSAGE`-tagged
[`Message`] to the supervisor, carrying the dying process's address and
an [`ErrorCode`].

# Distribution

[`Node::connect_to_node`] and [`Node::listen`] exchange a pre-shared key
with a remote node and, on success, start a triad of processes — sender,
receiver, connection supervisor — that makes the remote node's processes
reachable as if they were local. A silent peer surfaces as a `Timeout`
exit; the connection supervisor restarts the sender for it without
tearing down the whole connection.
*/

mod constants;
mod distributed;
mod error;
mod executor;
mod mailbox;
mod message;
mod node;
mod process;

pub use constants::{DEFAULT_SOCKET_TIMEOUT_SECS, EXIT_MESSAGE, INVALID_ID, KEYLENGTH, MAX_REMOTE_NODES};
pub use error::{Error, ErrorCode};
pub use message::{ExitInfo, Message};
pub use node::{Node, NodeConfig};
pub use process::ProcessHandle;

/// A node id. An alias, not a newtype: it travels in message headers and
/// exit payloads as a bare `u32`, and callers building wire-compatible
/// peers need to see that directly.
pub type Nid = u32;

/// A process id, scoped to a single node's table.
pub type Pid = u32;
