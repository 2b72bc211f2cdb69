//! The runtime's error taxonomy.
//!
//! Every fallible operation in `glia` returns one of these kinds. There is
//! no `OK` variant — success is `Result::Ok(_)`.

use std::fmt;

/// The error kinds a `glia` operation can fail with (§7).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller supplied a nonsense argument (zero capacity, negative
    /// timeout, oversized key, out-of-range id, ...).
    #[error("invalid argument: {0}")]
    Invalue(String),

    /// The node's process table is full.
    #[error("no free process slots")]
    NoSlots,

    /// The addressed pid is not alive on the resolving node.
    #[error("no such process")]
    NoProcess,

    /// The addressed nid has no connected remote.
    #[error("no such node")]
    NoNode,

    /// A mailbox or socket receive timed out.
    #[error("timed out")]
    Timeout,

    /// Any socket-level failure: short read, short write, closed peer,
    /// handshake mismatch.
    #[error("network error: {0}")]
    Network(String),

    /// Catch-all for process body failures, including caught panics.
    #[error("{0}")]
    Generic(String),
}

impl Error {
    pub fn invalue(msg: impl Into<String>) -> Self {
        Error::Invalue(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Error::Network(msg.into())
    }

    pub fn generic(msg: impl Into<String>) -> Self {
        Error::Generic(msg.into())
    }

    /// Narrow, wire-stable projection used inside exit message payloads
    /// (§3, §9): the full `Display` text doesn't survive a trip across
    /// the wire, but the discriminant does.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Invalue(_) => ErrorCode::Invalue,
            Error::NoSlots => ErrorCode::NoSlots,
            Error::NoProcess => ErrorCode::NoProcess,
            Error::NoNode => ErrorCode::NoNode,
            Error::Timeout => ErrorCode::Timeout,
            Error::Network(_) => ErrorCode::Network,
            Error::Generic(_) => ErrorCode::Generic,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Network(err.to_string())
    }
}

/// The small fixed set of integers an [`Error`] collapses to when it has
/// to travel inside an exit message's payload bytes (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Ok = 0,
    Invalue = 1,
    NoSlots = 2,
    NoProcess = 3,
    NoNode = 4,
    Timeout = 5,
    Network = 6,
    Generic = 7,
}

impl ErrorCode {
    pub fn from_u32(value: u32) -> Self {
        match value {
            1 => ErrorCode::Invalue,
            2 => ErrorCode::NoSlots,
            3 => ErrorCode::NoProcess,
            4 => ErrorCode::NoNode,
            5 => ErrorCode::Timeout,
            6 => ErrorCode::Network,
            7 => ErrorCode::Generic,
            _ => ErrorCode::Ok,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_round_trips() {
        for code in [
            ErrorCode::Ok,
            ErrorCode::Invalue,
            ErrorCode::NoSlots,
            ErrorCode::NoProcess,
            ErrorCode::NoNode,
            ErrorCode::Timeout,
            ErrorCode::Network,
            ErrorCode::Generic,
        ] {
            assert_eq!(ErrorCode::from_u32(code as u32) as u32, code as u32);
        }
    }
}
