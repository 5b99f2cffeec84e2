//! Block-partitioned Conway's Game of Life.
//!
//! The square global grid is decomposed into a square arrangement of
//! blocks. Every block is owned by exactly one worker which seeds it
//! randomly, evolves it for a fixed number of generations and hands the
//! finished block to the merge step over a channel. Workers never
//! communicate with each other: neighbors outside the own block are
//! treated as dead, so each block evolves as an isolated universe with
//! a dead border.
//!
//! A run proceeds through two fork-join phases. The first fills a
//! shared grid through disjoint per-block tiles for displaying the
//! initial state, the second evolves the independently reseeded blocks
//! and assembles the final grid from their results.

/// Decomposition of the global grid into blocks and their reassembly.
pub mod domain;
/// Error types for setup, execution and merging.
pub mod errors;
/// The cell grid together with the local transition rule.
pub mod grid;
/// Orchestration of the simulation phases.
pub mod runner;
/// The per-block evolution worker.
pub mod worker;

pub use domain::*;
pub use errors::*;
pub use grid::*;
pub use runner::*;
pub use worker::*;
