//! The frame format the distributer speaks over TCP (§4.6).
//!
//! A frame is a fixed-width header — `dest_pid`, payload `size`,
//! `type_tag`, each a little-endian `u32` — followed by exactly `size`
//! payload bytes. The header's field order and widths mirror the
//! original's `message_header_t` (`distributer.c`), made explicit with
//! `byteorder` instead of relying on a packed C struct's host-native
//! layout.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

pub(super) struct Header {
    pub dest_pid: u32,
    pub size: u32,
    pub type_tag: u32,
}

pub(super) fn write_frame(stream: &mut impl Write, header: &Header, payload: &[u8]) -> io::Result<()> {
    stream.write_u32::<LittleEndian>(header.dest_pid)?;
    stream.write_u32::<LittleEndian>(header.size)?;
    stream.write_u32::<LittleEndian>(header.type_tag)?;
    stream.write_all(payload)?;
    stream.flush()
}

pub(super) fn read_header(stream: &mut impl Read) -> io::Result<Header> {
    let dest_pid = stream.read_u32::<LittleEndian>()?;
    let size = stream.read_u32::<LittleEndian>()?;
    let type_tag = stream.read_u32::<LittleEndian>()?;
    Ok(Header { dest_pid, size, type_tag })
}

pub(super) fn read_payload(stream: &mut impl Read, size: u32) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; size as usize];
    stream.read_exact(&mut buf)?;
    Ok(buf)
}

/// Returns whether an I/O error is a receive-timeout expiring rather than
/// a hard failure (closed socket, reset connection, ...).
pub(super) fn is_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn frame_round_trips() {
        let mut buf = Vec::new();
        write_frame(
            &mut buf,
            &Header {
                dest_pid: 7,
                size: 3,
                type_tag: 42,
            },
            b"abc",
        )
        .unwrap();

        let mut cursor = Cursor::new(buf);
        let header = read_header(&mut cursor).unwrap();
        assert_eq!(header.dest_pid, 7);
        assert_eq!(header.size, 3);
        assert_eq!(header.type_tag, 42);
        let payload = read_payload(&mut cursor, header.size).unwrap();
        assert_eq!(payload, b"abc");
    }

    #[test]
    fn short_payload_is_an_error() {
        let mut cursor = Cursor::new(vec![1u8, 2, 3]);
        assert!(read_payload(&mut cursor, 10).is_err());
    }
}
