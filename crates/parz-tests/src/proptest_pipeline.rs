//! Property-based roundtrip tests for the chunk pipeline.

use proptest::prelude::*;

/// Generates random byte vectors up to `max_size` bytes.
pub fn arb_data(max_size: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..=255, 0..max_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parz_core::{ChunkPipeline, CompressionAlgorithm, PipelineConfig};
    use std::io::Cursor;

    fn roundtrip(data: &[u8], chunk_size: usize, algorithm: CompressionAlgorithm) -> Vec<u8> {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let p = ChunkPipeline::new(PipelineConfig {
                chunk_size,
                algorithm,
                ..Default::default()
            });
            let mut compressed = Cursor::new(Vec::new());
            p.compress(data, &mut compressed).await.unwrap();
            let mut restored = Cursor::new(Vec::new());
            p.decompress(compressed.into_inner().as_slice(), &mut restored)
                .await
                .unwrap();
            restored.into_inner()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_pipeline_roundtrip_lz4(
            data in arb_data(64 * 1024),
            chunk_size in 64usize..8192,
        ) {
            prop_assert_eq!(roundtrip(&data, chunk_size, CompressionAlgorithm::Lz4), data);
        }

        #[test]
        fn prop_pipeline_roundtrip_zstd(
            data in arb_data(64 * 1024),
            chunk_size in 64usize..8192,
        ) {
            prop_assert_eq!(
                roundtrip(&data, chunk_size, CompressionAlgorithm::Zstd { level: 1 }),
                data
            );
        }

        #[test]
        fn prop_chunk_count_matches_arithmetic(
            len in 0usize..200_000,
            chunk_size in 256usize..16_384,
        ) {
            let data = vec![0xA5u8; len];
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let stats = rt.block_on(async {
                let p = ChunkPipeline::new(PipelineConfig {
                    chunk_size,
                    algorithm: CompressionAlgorithm::None,
                    ..Default::default()
                });
                let mut sink = Cursor::new(Vec::new());
                p.compress(data.as_slice(), &mut sink).await.unwrap()
            });
            prop_assert_eq!(stats.chunks_total, (len as u64).div_ceil(chunk_size as u64));
        }
    }
}
