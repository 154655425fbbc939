//! End-to-end pipeline integration tests over in-memory buffers and files.
