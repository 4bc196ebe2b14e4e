//! Sampled follow graph representation

pub mod builder;
pub mod compressed;

pub use builder::GraphBuilder;
pub use compressed::CompressedGraph;
