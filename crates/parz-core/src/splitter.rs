//! Splitters: turn a byte source into a finite ordered sequence of chunks.

use crate::error::PipelineError;
use crate::frame;
use tokio::io::{AsyncRead, AsyncReadExt};

/// The unit of work in the pipeline: a dense zero-based index and a payload.
///
/// The index is assigned once when the chunk is produced and never changes
/// as the chunk moves through transform and reassembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of this chunk in the logical sequence.
    pub index: u64,
    /// Raw bytes before the transform, or transformed bytes after it.
    pub payload: Vec<u8>,
}

impl Chunk {
    /// Create a chunk.
    pub fn new(index: u64, payload: Vec<u8>) -> Self {
        Self { index, payload }
    }
}

/// Splits a raw byte source into fixed-size blocks for compression.
///
/// Every chunk has exactly `chunk_size` bytes except possibly the last.
/// Indices are assigned 0, 1, 2, … in read order. An empty source yields
/// no chunks at all.
pub struct BlockSplitter<R> {
    source: R,
    chunk_size: usize,
    next_index: u64,
}

impl<R: AsyncRead + Unpin> BlockSplitter<R> {
    /// Create a splitter producing blocks of `chunk_size` bytes.
    pub fn new(source: R, chunk_size: usize) -> Self {
        Self {
            source,
            chunk_size,
            next_index: 0,
        }
    }

    /// Read the next block. Returns `Ok(None)` once the source is exhausted.
    pub async fn next_chunk(&mut self) -> Result<Option<Chunk>, PipelineError> {
        let mut payload = vec![0u8; self.chunk_size];
        let mut filled = 0;
        while filled < self.chunk_size {
            let n = self.source.read(&mut payload[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            return Ok(None);
        }
        payload.truncate(filled);
        let index = self.next_index;
        self.next_index += 1;
        Ok(Some(Chunk::new(index, payload)))
    }
}

/// Splits a framed compressed stream into chunks for decompression.
///
/// Each record already carries its index, which is trusted as-is; the
/// ordering writer downstream rejects sequences that are not dense.
/// A truncated trailing record ends the stream without error, but a header
/// declaring a payload larger than `max_payload_len` is rejected outright.
pub struct RecordSplitter<R> {
    source: R,
    max_payload_len: u64,
}

impl<R: AsyncRead + Unpin> RecordSplitter<R> {
    /// Create a splitter over a framed stream. Stored payload lengths above
    /// `max_payload_len` are treated as corruption.
    pub fn new(source: R, max_payload_len: u64) -> Self {
        Self {
            source,
            max_payload_len,
        }
    }

    /// Read the next record. Returns `Ok(None)` once the stream is exhausted.
    pub async fn next_chunk(&mut self) -> Result<Option<Chunk>, PipelineError> {
        match frame::read_record(&mut self.source, self.max_payload_len).await? {
            Some((index, payload)) => Ok(Some(Chunk::new(index, payload))),
            None => Ok(None),
        }
    }
}
