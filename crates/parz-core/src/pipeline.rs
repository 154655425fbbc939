//! Pipeline orchestration: split → transform in parallel → reassemble in order.
//!
//! Compress path: raw source → [`BlockSplitter`] → bounded worker pool running
//! the codec → [`OrderingWriter`] emitting framed records.
//! Decompress path: framed source → [`RecordSplitter`] → worker pool →
//! [`OrderingWriter`] emitting the original raw byte stream.

use crate::codec::{Codec, CompressionAlgorithm};
use crate::error::PipelineError;
use crate::frame::Framing;
use crate::splitter::{BlockSplitter, Chunk, RecordSplitter};
use crate::writer::OrderingWriter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

/// Default chunk size for compression: 1 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Default cap on the decoded size of a single chunk: 64 MiB.
pub const DEFAULT_MAX_DECODED_SIZE: usize = 64 * 1024 * 1024;

/// Configuration for the chunk pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Size of each raw chunk handed to a compression worker.
    pub chunk_size: usize,
    /// Codec used when the pipeline is built with [`ChunkPipeline::new`].
    pub algorithm: CompressionAlgorithm,
    /// Maximum number of codec transforms running concurrently.
    pub max_workers: usize,
    /// Hard cap on the decoded size of any single chunk.
    pub max_decoded_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            algorithm: CompressionAlgorithm::Zstd { level: 3 },
            max_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            max_decoded_size: DEFAULT_MAX_DECODED_SIZE,
        }
    }
}

/// Statistics from a pipeline run
#[derive(Debug, Default, Clone)]
pub struct PipelineStats {
    /// Total bytes read from the source.
    pub input_bytes: u64,
    /// Total bytes written to the sink, record headers included.
    pub output_bytes: u64,
    /// Number of chunks that flowed through the pipeline.
    pub chunks_total: u64,
    /// input_bytes / output_bytes (above 1.0 means the output shrank).
    pub compression_ratio: f64,
}

/// Which way the codec is applied by the worker pool.
#[derive(Clone, Copy)]
enum TransformOp {
    Encode,
    Decode,
}

/// The two splitter shapes the orchestrator can drive.
enum ChunkSource<R> {
    Blocks(BlockSplitter<R>),
    Records(RecordSplitter<R>),
}

impl<R: AsyncRead + Unpin> ChunkSource<R> {
    async fn next_chunk(&mut self) -> Result<Option<Chunk>, PipelineError> {
        match self {
            Self::Blocks(s) => s.next_chunk().await,
            Self::Records(s) => s.next_chunk().await,
        }
    }
}

/// The ordered parallel chunk pipeline.
///
/// Chunks are dispatched to workers as the splitter produces them, transforms
/// run concurrently (bounded by `max_workers`), and a single ordering writer
/// reconstructs the original sequence on the sink. A failed chunk aborts the
/// whole operation with [`PipelineError::ChunkFailed`] — there is no silent
/// drop.
pub struct ChunkPipeline {
    config: PipelineConfig,
    codec: Arc<dyn Codec>,
}

impl ChunkPipeline {
    /// Create a pipeline using the codec named in the configuration.
    pub fn new(config: PipelineConfig) -> Self {
        let codec: Arc<dyn Codec> = Arc::new(config.algorithm);
        Self { config, codec }
    }

    /// Create a pipeline with an explicit codec implementation.
    pub fn with_codec(config: PipelineConfig, codec: Arc<dyn Codec>) -> Self {
        Self { config, codec }
    }

    /// Access the pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Compress the source into framed records on the sink.
    #[instrument(skip_all)]
    pub async fn compress<R, W>(&self, source: R, sink: &mut W) -> Result<PipelineStats, PipelineError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let splitter = ChunkSource::Blocks(BlockSplitter::new(source, self.config.chunk_size));
        let stats = self
            .run(splitter, sink, Framing::Framed, TransformOp::Encode)
            .await?;
        info!(
            input_bytes = stats.input_bytes,
            output_bytes = stats.output_bytes,
            chunks = stats.chunks_total,
            ratio = stats.compression_ratio,
            "compression complete"
        );
        Ok(stats)
    }

    /// Decompress framed records from the source into raw bytes on the sink.
    #[instrument(skip_all)]
    pub async fn decompress<R, W>(
        &self,
        source: R,
        sink: &mut W,
    ) -> Result<PipelineStats, PipelineError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        // Compressed payloads can slightly exceed the decoded cap when a
        // chunk is incompressible, so the record length bound carries slack
        // for codec framing overhead.
        let max_record_len = (self.config.max_decoded_size as u64).saturating_add(1 << 20);
        let splitter = ChunkSource::Records(RecordSplitter::new(source, max_record_len));
        let stats = self
            .run(splitter, sink, Framing::Raw, TransformOp::Decode)
            .await?;
        info!(
            input_bytes = stats.input_bytes,
            output_bytes = stats.output_bytes,
            chunks = stats.chunks_total,
            "decompression complete"
        );
        Ok(stats)
    }

    /// Drive one pipeline run: stream chunks from the splitter into workers,
    /// close the results channel once every worker has finished, and wait for
    /// the writer to drain.
    async fn run<R, W>(
        &self,
        mut chunks: ChunkSource<R>,
        sink: &mut W,
        framing: Framing,
        op: TransformOp,
    ) -> Result<PipelineStats, PipelineError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let max_workers = self.config.max_workers.max(1);
        let max_decoded = self.config.max_decoded_size;
        let (tx, rx) = mpsc::channel::<Result<Chunk, PipelineError>>(max_workers * 2);
        let writer = OrderingWriter::new(&mut *sink, framing).run(rx);

        let semaphore = Arc::new(Semaphore::new(max_workers));
        let dispatch = async {
            let mut workers = JoinSet::new();
            let mut chunks_total: u64 = 0;
            let mut input_bytes: u64 = 0;
            while let Some(chunk) = chunks.next_chunk().await? {
                if tx.is_closed() {
                    // The writer bailed out; stop reading and let its error win.
                    debug!("results channel closed, stopping dispatch");
                    break;
                }
                chunks_total += 1;
                input_bytes += chunk.payload.len() as u64;
                let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                    break;
                };
                let codec = Arc::clone(&self.codec);
                let tx = tx.clone();
                workers.spawn(async move {
                    let _permit = permit;
                    let index = chunk.index;
                    let transformed = match op {
                        TransformOp::Encode => codec.encode(&chunk.payload),
                        TransformOp::Decode => codec.decode(&chunk.payload, max_decoded),
                    };
                    let result = transformed
                        .map(|payload| Chunk::new(index, payload))
                        .map_err(|e| {
                            warn!(index, error = %e, "chunk transform failed");
                            PipelineError::ChunkFailed {
                                index,
                                source: Box::new(e),
                            }
                        });
                    // The receiver may already be gone if the writer errored.
                    let _ = tx.send(result).await;
                });
            }
            drop(tx);
            while let Some(joined) = workers.join_next().await {
                if let Err(e) = joined {
                    return Err(PipelineError::WorkerPanic(e.to_string()));
                }
            }
            Ok((chunks_total, input_bytes))
        };

        let (write_result, dispatch_result) = tokio::join!(writer, dispatch);
        let (chunks_total, input_bytes) = dispatch_result?;
        let summary = write_result?;
        if summary.chunks_written != chunks_total {
            // A worker vanished without publishing; surface the gap.
            return Err(PipelineError::MissingChunk {
                index: summary.chunks_written,
            });
        }

        Ok(PipelineStats {
            input_bytes,
            output_bytes: summary.bytes_written,
            chunks_total,
            compression_ratio: if summary.bytes_written > 0 {
                input_bytes as f64 / summary.bytes_written as f64
            } else {
                1.0
            },
        })
    }
}
