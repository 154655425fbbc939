#![warn(missing_docs)]

//! parz: parallel chunked file compression.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use parz_core::{ChunkPipeline, CompressionAlgorithm, PipelineConfig, DEFAULT_CHUNK_SIZE};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufReader, BufWriter};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "parz")]
#[command(about = "Parallel chunked file compression", long_about = None)]
struct Cli {
    /// Number of concurrent codec workers (defaults to available parallelism).
    #[arg(short, long, global = true)]
    workers: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compress a file into the parz framed format.
    Compress {
        /// Input file to compress.
        input: PathBuf,
        /// Output file for the framed compressed stream.
        output: PathBuf,
        /// Codec to apply to each chunk.
        #[arg(long, value_enum, default_value = "zstd")]
        algorithm: Algorithm,
        /// Zstd compression level (ignored by other codecs).
        #[arg(long, default_value_t = 3)]
        level: i32,
        /// Chunk size in bytes.
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },
    /// Decompress a parz framed file back into the original byte stream.
    Decompress {
        /// Input file in the parz framed format.
        input: PathBuf,
        /// Output file for the restored bytes.
        output: PathBuf,
        /// Codec the archive was compressed with. The framed format does not
        /// record it, so it must match the compress-side choice.
        #[arg(long, value_enum, default_value = "zstd")]
        algorithm: Algorithm,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Algorithm {
    /// Passthrough, no compression.
    None,
    /// LZ4, fastest.
    Lz4,
    /// Zstandard, best ratio.
    Zstd,
}

impl Algorithm {
    fn to_codec(self, level: i32) -> CompressionAlgorithm {
        match self {
            Algorithm::None => CompressionAlgorithm::None,
            Algorithm::Lz4 => CompressionAlgorithm::Lz4,
            Algorithm::Zstd => CompressionAlgorithm::Zstd { level },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    run(Cli::parse()).await
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Compress {
            ref input,
            ref output,
            algorithm,
            level,
            chunk_size,
        } => {
            let config = PipelineConfig {
                chunk_size,
                algorithm: algorithm.to_codec(level),
                max_workers: cli.workers.unwrap_or_else(default_workers),
                ..Default::default()
            };
            tracing::info!(input = %input.display(), output = %output.display(), "compressing");
            let (source, mut sink) = open_files(input, output).await?;
            let stats = ChunkPipeline::new(config).compress(source, &mut sink).await?;
            sink.shutdown().await?;
            println!(
                "compressed {} -> {} bytes ({} chunks, ratio {:.2})",
                stats.input_bytes, stats.output_bytes, stats.chunks_total, stats.compression_ratio
            );
        }
        Command::Decompress {
            ref input,
            ref output,
            algorithm,
        } => {
            let config = PipelineConfig {
                algorithm: algorithm.to_codec(0),
                max_workers: cli.workers.unwrap_or_else(default_workers),
                ..Default::default()
            };
            tracing::info!(input = %input.display(), output = %output.display(), "decompressing");
            let (source, mut sink) = open_files(input, output).await?;
            let stats = ChunkPipeline::new(config).decompress(source, &mut sink).await?;
            sink.shutdown().await?;
            println!(
                "decompressed {} -> {} bytes ({} chunks)",
                stats.input_bytes, stats.output_bytes, stats.chunks_total
            );
        }
    }
    Ok(())
}

fn default_workers() -> usize {
    PipelineConfig::default().max_workers
}

async fn open_files(
    input: &Path,
    output: &Path,
) -> Result<(BufReader<File>, BufWriter<File>)> {
    let source = File::open(input)
        .await
        .with_context(|| format!("failed to open input file {}", input.display()))?;
    let sink = File::create(output)
        .await
        .with_context(|| format!("failed to create output file {}", output.display()))?;
    Ok((BufReader::new(source), BufWriter::new(sink)))
}
