//! Record framing for the compressed stream.
//!
//! A compressed stream is a concatenation of records, each a 16-byte header
//! (chunk index and payload length, both u64 little-endian) followed by the
//! codec-transformed payload. Records appear in strictly ascending index
//! order because the ordering writer enforces this on the write side.

use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::warn;

/// Size of a record header in bytes: index (8) + payload length (8).
pub const RECORD_HEADER_LEN: usize = 16;

/// Per-record header stored before each payload in the compressed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Zero-based chunk index.
    pub index: u64,
    /// Number of payload bytes following the header.
    pub payload_len: u64,
}

impl RecordHeader {
    /// Serialize the header to its 16-byte wire form.
    pub fn encode(&self) -> [u8; RECORD_HEADER_LEN] {
        let mut buf = [0u8; RECORD_HEADER_LEN];
        buf[..8].copy_from_slice(&self.index.to_le_bytes());
        buf[8..].copy_from_slice(&self.payload_len.to_le_bytes());
        buf
    }

    /// Parse a header from its 16-byte wire form.
    pub fn decode(buf: &[u8; RECORD_HEADER_LEN]) -> Self {
        let mut index = [0u8; 8];
        let mut payload_len = [0u8; 8];
        index.copy_from_slice(&buf[..8]);
        payload_len.copy_from_slice(&buf[8..]);
        Self {
            index: u64::from_le_bytes(index),
            payload_len: u64::from_le_bytes(payload_len),
        }
    }
}

/// Whether the ordering writer frames each payload with a record header.
/// Compression output is framed; decompression output is the raw byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Write a `[index][payload_len]` header before each payload.
    Framed,
    /// Write payload bytes only.
    Raw,
}

/// Write one framed record to the sink.
pub async fn write_record<W: AsyncWrite + Unpin>(
    sink: &mut W,
    index: u64,
    payload: &[u8],
) -> io::Result<()> {
    let header = RecordHeader {
        index,
        payload_len: payload.len() as u64,
    };
    sink.write_all(&header.encode()).await?;
    sink.write_all(payload).await
}

/// Read one framed record from the source.
///
/// Returns `Ok(None)` when the stream is exhausted: either a clean end of
/// stream before the next header, or a truncated header/payload. Truncation
/// mid-record is logged but deliberately not an error — the stream is simply
/// deemed exhausted from that point on.
///
/// `max_payload_len` bounds the length a header may declare. The length is
/// untrusted on-disk input, so it must be validated before the payload
/// buffer is allocated; a header claiming more is corrupt and yields an
/// `InvalidData` error.
pub async fn read_record<R: AsyncRead + Unpin>(
    source: &mut R,
    max_payload_len: u64,
) -> io::Result<Option<(u64, Vec<u8>)>> {
    let mut buf = [0u8; RECORD_HEADER_LEN];
    match source.read_exact(&mut buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }
    let header = RecordHeader::decode(&buf);
    if header.payload_len > max_payload_len {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "record {} declares payload length {} exceeding cap {}",
                header.index, header.payload_len, max_payload_len
            ),
        ));
    }
    let mut payload = vec![0u8; header.payload_len as usize];
    match source.read_exact(&mut payload).await {
        Ok(_) => Ok(Some((header.index, payload))),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            warn!(
                index = header.index,
                expected = header.payload_len,
                "truncated record payload, treating stream as exhausted"
            );
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn header_wire_form() {
        let h = RecordHeader {
            index: 7,
            payload_len: 513,
        };
        let buf = h.encode();
        assert_eq!(&buf[..8], &7u64.to_le_bytes());
        assert_eq!(&buf[8..], &513u64.to_le_bytes());
        assert_eq!(RecordHeader::decode(&buf), h);
    }

    #[tokio::test]
    async fn record_roundtrip() {
        let mut sink = Cursor::new(Vec::new());
        write_record(&mut sink, 3, b"hello").await.unwrap();
        write_record(&mut sink, 4, b"").await.unwrap();

        let mut source = Cursor::new(sink.into_inner());
        assert_eq!(
            read_record(&mut source, 1 << 20).await.unwrap(),
            Some((3, b"hello".to_vec()))
        );
        assert_eq!(
            read_record(&mut source, 1 << 20).await.unwrap(),
            Some((4, vec![]))
        );
        assert_eq!(read_record(&mut source, 1 << 20).await.unwrap(), None);
    }

    #[tokio::test]
    async fn truncated_header_ends_stream() {
        // 10 bytes is less than a full header.
        let mut source = Cursor::new(vec![0u8; 10]);
        assert_eq!(read_record(&mut source, 1 << 20).await.unwrap(), None);
    }

    #[tokio::test]
    async fn truncated_payload_ends_stream() {
        let mut sink = Cursor::new(Vec::new());
        write_record(&mut sink, 0, b"payload bytes").await.unwrap();
        let mut bytes = sink.into_inner();
        bytes.truncate(bytes.len() - 4);

        let mut source = Cursor::new(bytes);
        assert_eq!(read_record(&mut source, 1 << 20).await.unwrap(), None);
    }

    #[tokio::test]
    async fn oversized_declared_payload_is_an_error() {
        // A corrupt header claiming a u64::MAX payload must be rejected
        // before any buffer of that size is allocated.
        let header = RecordHeader {
            index: 0,
            payload_len: u64::MAX,
        };
        let mut bytes = header.encode().to_vec();
        bytes.extend_from_slice(&[0u8; 64]);

        let mut source = Cursor::new(bytes);
        let err = read_record(&mut source, 1 << 20).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
