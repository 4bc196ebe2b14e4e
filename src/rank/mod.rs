//! Rank computation over sampled follow graphs

pub mod pagerank;

pub use pagerank::{RankError, RankSolver};
