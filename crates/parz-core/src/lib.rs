#![warn(missing_docs)]

//! parz core: ordered parallel chunk compression pipeline
//!
//! Compress path: source → fixed-size chunks → concurrent codec workers → ordering writer → framed records
//! Decompress path: framed records → concurrent codec workers → ordering writer → original byte stream
//!
//! Transforms complete in arbitrary order; the ordering writer's holding
//! buffer is the sole mechanism restoring the original sequence.

pub mod codec;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod splitter;
pub mod writer;

pub use codec::{Codec, CompressionAlgorithm};
pub use error::PipelineError;
pub use frame::{Framing, RecordHeader, RECORD_HEADER_LEN};
pub use pipeline::{
    ChunkPipeline, PipelineConfig, PipelineStats, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_DECODED_SIZE,
};
pub use splitter::{BlockSplitter, Chunk, RecordSplitter};
pub use writer::{OrderingWriter, WriteSummary};
