//! parz Test & Validation
//!
//! Integration tests for the ordered parallel chunk pipeline: end-to-end
//! roundtrips over files and in-memory buffers, ordering tests under forced
//! out-of-order completion, and property-based roundtrip checks.

pub mod pipeline_integration;
pub mod proptest_pipeline;

pub use proptest_pipeline::arb_data;
