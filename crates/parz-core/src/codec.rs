//! LZ4 and Zstd codecs for the chunk pipeline

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};

/// Compression algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CompressionAlgorithm {
    /// No compression (passthrough)
    None,
    /// LZ4 block format with prepended size — fast path
    #[default]
    Lz4,
    /// Zstandard — higher ratio, the default for archival output
    Zstd {
        /// Compression level (1=fastest, 19=best ratio, 3=balanced default)
        level: i32,
    },
}

/// Compress data with the given algorithm. Returns compressed bytes.
pub fn compress(data: &[u8], algo: CompressionAlgorithm) -> Result<Vec<u8>, PipelineError> {
    match algo {
        CompressionAlgorithm::None => Ok(data.to_vec()),
        CompressionAlgorithm::Lz4 => Ok(lz4_flex::compress_prepend_size(data)),
        CompressionAlgorithm::Zstd { level } => zstd::encode_all(data, level)
            .map_err(|e| PipelineError::CompressionFailed(e.to_string())),
    }
}

/// Decompress data using the algorithm that was used for compression.
/// The true decoded size comes from the codec frame itself; there is no
/// caller-supplied guess.
pub fn decompress(data: &[u8], algo: CompressionAlgorithm) -> Result<Vec<u8>, PipelineError> {
    match algo {
        CompressionAlgorithm::None => Ok(data.to_vec()),
        CompressionAlgorithm::Lz4 => lz4_flex::decompress_size_prepended(data)
            .map_err(|e| PipelineError::DecompressionFailed(e.to_string())),
        CompressionAlgorithm::Zstd { .. } => {
            zstd::decode_all(data).map_err(|e| PipelineError::DecompressionFailed(e.to_string()))
        }
    }
}

/// The byte-level transform applied to each chunk.
///
/// The pipeline treats the codec as an opaque collaborator: workers hand it a
/// payload and publish whatever comes back. Implementations must be shareable
/// across worker tasks.
pub trait Codec: Send + Sync + 'static {
    /// Transform a raw payload into its encoded form.
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, PipelineError>;
    /// Transform an encoded payload back into raw bytes.
    /// Fails with [`PipelineError::DecodedSizeExceeded`] if the decoded output
    /// would exceed `max_decoded_size`.
    fn decode(&self, data: &[u8], max_decoded_size: usize) -> Result<Vec<u8>, PipelineError>;
}

impl Codec for CompressionAlgorithm {
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, PipelineError> {
        compress(data, *self)
    }

    fn decode(&self, data: &[u8], max_decoded_size: usize) -> Result<Vec<u8>, PipelineError> {
        let out = decompress(data, *self)?;
        if out.len() > max_decoded_size {
            return Err(PipelineError::DecodedSizeExceeded {
                actual: out.len(),
                limit: max_decoded_size,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_lz4_roundtrip(data in prop::collection::vec(0u8..=255, 0..100_000)) {
            let c = compress(&data, CompressionAlgorithm::Lz4).unwrap();
            let d = decompress(&c, CompressionAlgorithm::Lz4).unwrap();
            prop_assert_eq!(d, data);
        }
        #[test]
        fn prop_zstd_roundtrip(data in prop::collection::vec(0u8..=255, 0..100_000)) {
            let c = compress(&data, CompressionAlgorithm::Zstd { level: 3 }).unwrap();
            let d = decompress(&c, CompressionAlgorithm::Zstd { level: 3 }).unwrap();
            prop_assert_eq!(d, data);
        }
        #[test]
        fn prop_none_roundtrip(data in prop::collection::vec(0u8..=255, 0..100_000)) {
            let c = compress(&data, CompressionAlgorithm::None).unwrap();
            let d = decompress(&c, CompressionAlgorithm::None).unwrap();
            prop_assert_eq!(d, data);
        }
    }

    #[test]
    fn empty_roundtrips() {
        for algo in [
            CompressionAlgorithm::None,
            CompressionAlgorithm::Lz4,
            CompressionAlgorithm::Zstd { level: 3 },
        ] {
            let c = compress(&[], algo).unwrap();
            let d = decompress(&c, algo).unwrap();
            assert_eq!(d, b"");
        }
    }

    #[test]
    fn decode_cap_enforced() {
        let data = vec![0u8; 4096];
        for algo in [
            CompressionAlgorithm::Lz4,
            CompressionAlgorithm::Zstd { level: 3 },
        ] {
            let c = algo.encode(&data).unwrap();
            assert!(matches!(
                algo.decode(&c, 100),
                Err(PipelineError::DecodedSizeExceeded { actual: 4096, limit: 100 })
            ));
            assert_eq!(algo.decode(&c, 4096).unwrap(), data);
        }
    }

    #[test]
    fn corrupt_input_fails() {
        let garbage = vec![0xFF; 64];
        assert!(decompress(&garbage, CompressionAlgorithm::Zstd { level: 3 }).is_err());
    }
}
