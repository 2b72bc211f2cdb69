//! The message envelope exchanged between processes (§3).

use crate::constants::EXIT_MESSAGE;
use crate::error::ErrorCode;

/// An owned message, exclusively held by whoever currently has it:
/// the sender up to enqueue, the mailbox while queued, the receiver
/// once taken.
#[derive(Debug, Clone)]
pub struct Message {
    pub source_nid: u32,
    pub source_pid: u32,
    pub dest_nid: u32,
    pub dest_pid: u32,
    pub type_tag: u32,
    pub bytes: Vec<u8>,
}

impl Message {
    pub(crate) fn new(
        source_nid: u32,
        source_pid: u32,
        dest_nid: u32,
        dest_pid: u32,
        type_tag: u32,
        bytes: Vec<u8>,
    ) -> Self {
        Message {
            source_nid,
            source_pid,
            dest_nid,
            dest_pid,
            type_tag,
            bytes,
        }
    }

    /// Byte length of the payload.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Whether this message is a supervision exit notification (§4.5).
    pub fn is_exit_message(&self) -> bool {
        self.type_tag == EXIT_MESSAGE
    }

    /// Decode `self` as an exit message payload: `(nid, pid, error)` as
    /// three 32-bit little-endian integers (§3, §9). Returns `None` if
    /// this isn't tagged as an exit message or the payload is malformed.
    pub fn as_exit_info(&self) -> Option<ExitInfo> {
        if !self.is_exit_message() || self.bytes.len() != 12 {
            return None;
        }
        let nid = u32::from_le_bytes(self.bytes[0..4].try_into().ok()?);
        let pid = u32::from_le_bytes(self.bytes[4..8].try_into().ok()?);
        let error = u32::from_le_bytes(self.bytes[8..12].try_into().ok()?);
        Some(ExitInfo {
            nid,
            pid,
            error: ErrorCode::from_u32(error),
        })
    }

    pub(crate) fn exit_payload(nid: u32, pid: u32, error: ErrorCode) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(12);
        bytes.extend_from_slice(&nid.to_le_bytes());
        bytes.extend_from_slice(&pid.to_le_bytes());
        bytes.extend_from_slice(&(error as u32).to_le_bytes());
        bytes
    }
}

/// The decoded payload of an exit message: which process died, and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitInfo {
    pub nid: u32,
    pub pid: u32,
    pub error: ErrorCode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_info_round_trips() {
        let payload = Message::exit_payload(3, 7, ErrorCode::Generic);
        let msg = Message::new(0, 0, 0, 0, EXIT_MESSAGE, payload);
        let info = msg.as_exit_info().expect("exit info");
        assert_eq!(info.nid, 3);
        assert_eq!(info.pid, 7);
        assert_eq!(info.error, ErrorCode::Generic);
    }

    #[test]
    fn non_exit_message_has_no_exit_info() {
        let msg = Message::new(0, 0, 0, 0, 42, vec![1, 2, 3]);
        assert!(msg.as_exit_info().is_none());
    }
}
