//! Concrete directory sources

pub mod memory;
pub mod parquet;

pub use memory::MemoryDirectory;
pub use parquet::{directory_from_frames, load_follow_snapshot};
