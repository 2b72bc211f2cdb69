//! Fixed-width wire constants shared by every node in a cluster.
//!
//! These widths must agree between any two `glia` processes that intend
//! to talk over the distributer (§6 of the design): they are baked into
//! the handshake and frame header, not negotiated.

/// Length, in bytes, of the pre-shared key exchanged during the
/// handshake (§4.6). The wire format transmits `KEYLENGTH + 1` bytes,
/// the extra byte mirroring the original implementation's NUL-terminated
/// buffer.
pub const KEYLENGTH: usize = 32;

/// Upper bound on the number of distinct remote nodes a single node can
/// be connected to at once. Indexes the remote-node table.
pub const MAX_REMOTE_NODES: usize = 256;

/// Sentinel marking an absent table entry. Outside the legal id range
/// for both `Nid` and `Pid`.
pub const INVALID_ID: u32 = u32::MAX;

/// Reserved `type_tag` value carrying a supervision exit notification.
pub const EXIT_MESSAGE: u32 = u32::MAX - 1;

/// Default socket receive timeout used by both handshake directions and
/// the triad's receiver loop (§4.6, §5). Matches the original's
/// `SO_RCVTIMEO` of 10 seconds.
pub const DEFAULT_SOCKET_TIMEOUT_SECS: u64 = 10;
