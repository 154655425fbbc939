//! The ordering writer: single consumer that restores chunk order.
//!
//! Workers publish transformed chunks in whatever order they finish. The
//! writer drains the results channel and writes to the sink strictly in
//! ascending index order, staging early arrivals in a holding buffer until
//! the chunks before them show up. It terminates when the channel closes,
//! which happens once every worker has published its result (or the
//! orchestrator has given up).

use crate::error::PipelineError;
use crate::frame::{self, Framing, RECORD_HEADER_LEN};
use crate::splitter::Chunk;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::debug;

/// What the writer accomplished before the channel closed.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteSummary {
    /// Chunks written to the sink, equal to the next expected index.
    pub chunks_written: u64,
    /// Total bytes written, headers included in framed mode.
    pub bytes_written: u64,
}

/// Single-consumer writer that reassembles chunk order before writing.
pub struct OrderingWriter<W> {
    sink: W,
    framing: Framing,
    next_index: u64,
    // Early arrivals, keyed by index. Invariant: every key > next_index.
    pending: BTreeMap<u64, Vec<u8>>,
    chunks_written: u64,
    bytes_written: u64,
}

impl<W: AsyncWrite + Unpin> OrderingWriter<W> {
    /// Create a writer over the given sink.
    pub fn new(sink: W, framing: Framing) -> Self {
        Self {
            sink,
            framing,
            next_index: 0,
            pending: BTreeMap::new(),
            chunks_written: 0,
            bytes_written: 0,
        }
    }

    /// Drain the results channel until it closes, writing chunks in index
    /// order. Returns an error as soon as a chunk failure arrives, or if the
    /// channel closes while earlier chunks are still missing.
    pub async fn run(
        mut self,
        mut rx: mpsc::Receiver<Result<Chunk, PipelineError>>,
    ) -> Result<WriteSummary, PipelineError> {
        while let Some(result) = rx.recv().await {
            self.accept(result?).await?;
        }
        if !self.pending.is_empty() {
            return Err(PipelineError::MissingChunk {
                index: self.next_index,
            });
        }
        self.sink.flush().await?;
        Ok(WriteSummary {
            chunks_written: self.chunks_written,
            bytes_written: self.bytes_written,
        })
    }

    async fn accept(&mut self, chunk: Chunk) -> Result<(), PipelineError> {
        match chunk.index.cmp(&self.next_index) {
            Ordering::Less => Err(PipelineError::DuplicateChunk { index: chunk.index }),
            Ordering::Greater => {
                debug!(
                    index = chunk.index,
                    next_index = self.next_index,
                    staged = self.pending.len() + 1,
                    "staging out-of-order chunk"
                );
                if self.pending.insert(chunk.index, chunk.payload).is_some() {
                    return Err(PipelineError::DuplicateChunk { index: chunk.index });
                }
                Ok(())
            }
            Ordering::Equal => {
                self.write_chunk(chunk.index, &chunk.payload).await?;
                self.next_index += 1;
                // Flush the contiguous run this arrival may have unblocked.
                while let Some(payload) = self.pending.remove(&self.next_index) {
                    self.write_chunk(self.next_index, &payload).await?;
                    self.next_index += 1;
                }
                Ok(())
            }
        }
    }

    async fn write_chunk(&mut self, index: u64, payload: &[u8]) -> Result<(), PipelineError> {
        match self.framing {
            Framing::Framed => {
                frame::write_record(&mut self.sink, index, payload).await?;
                self.bytes_written += (RECORD_HEADER_LEN + payload.len()) as u64;
            }
            Framing::Raw => {
                self.sink.write_all(payload).await?;
                self.bytes_written += payload.len() as u64;
            }
        }
        self.chunks_written += 1;
        Ok(())
    }
}
