//! Personalized account ranking over a sampled follow graph

pub mod cache;
pub mod config;
pub mod data;
pub mod directory;
pub mod graph;
pub mod rank;
pub mod ranking;
pub mod report;
pub mod selection;

pub use anyhow::{anyhow, Result};
