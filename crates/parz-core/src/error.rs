//! Error types for the parz pipeline

/// All errors that can occur while splitting, transforming, or reassembling chunks
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Compression operation failed
    #[error("Compression failed: {0}")]
    CompressionFailed(String),
    /// Decompression operation failed
    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),
    /// A decoded chunk exceeded the configured size cap
    #[error("Decoded chunk size {actual} exceeds limit {limit}")]
    DecodedSizeExceeded {
        /// Actual decoded size in bytes
        actual: usize,
        /// Configured maximum decoded size in bytes
        limit: usize,
    },
    /// A single chunk's transform failed; the whole operation is aborted
    #[error("Chunk {index} failed: {source}")]
    ChunkFailed {
        /// Index of the failed chunk
        index: u64,
        /// The underlying codec error
        #[source]
        source: Box<PipelineError>,
    },
    /// The pipeline finished with a gap in the output sequence
    #[error("Missing chunk {index}: pipeline ended with a gap in the output sequence")]
    MissingChunk {
        /// First index that never arrived
        index: u64,
    },
    /// A chunk index was seen twice — the input sequence is not dense/unique
    #[error("Duplicate chunk {index}: index already written or staged")]
    DuplicateChunk {
        /// The offending index
        index: u64,
    },
    /// A worker task panicked instead of publishing a result
    #[error("Worker task panicked: {0}")]
    WorkerPanic(String),
    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
