//! Core orchestration for reqminer.
//!
//! Coordinates the chunking → extraction → consolidation pipeline over a
//! project's document corpus and writes the run's output files.

pub mod chunker;
pub mod consolidation;
pub mod extraction;
pub mod output;
pub mod pipeline;
pub mod prompts;

#[cfg(test)]
mod testing;
