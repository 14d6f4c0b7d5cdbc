#![deny(missing_docs)]
//! Incremental NDJSON decoding for parley.
//!
//! Bytes arrive in arbitrary chunks; records are separated by `\n` (0x0A).
//! [`NdjsonDecoder`] appends every chunk to a [`GrowableBuffer`], cuts one
//! record per delimiter, and hands each record to serde. The buffer is
//! bounded by [`BufferConfig::max_size`], so a peer that never sends a
//! newline costs at most that much memory before the stream fails with
//! `BufferOverflow`.
//!
//! ```text
//! {"done":false,"message":{"role":"assistant","content":"Hi"}}\n
//! {"done":true,"message":{"role":"assistant","content":""}}\n
//! ```

pub mod buffer;
pub mod decoder;
pub mod source;

pub use buffer::{BufferConfig, GrowableBuffer};
pub use decoder::NdjsonDecoder;
pub use source::StreamSource;
