//! Shared types, error model, and configuration for reqminer.
//!
//! This crate is the foundation depended on by all other reqminer crates.
//! It provides:
//! - [`ReqMinerError`], the unified error type
//! - Domain types ([`Chunk`], [`ExtractionResult`], [`ProfileBook`], [`RunId`])
//! - Configuration ([`AppConfig`], [`ChunkConfig`], [`InferenceConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CHARS_PER_WORD, ChunkConfig, ChunkingConfig, DefaultsConfig, InferenceConfig,
    OllamaConfig, ProfilesConfig, config_dir, config_file_path, expand_home, init_config,
    load_config, load_config_from, profiles_file_path,
};
pub use error::{ReqMinerError, Result};
pub use types::{
    CONTEXT_FILE_PREFIX, Chunk, DEFAULT_ORIENTATION, DEFAULT_PROFILE_KEY, DefaultProfile,
    ExtractionResult, ModelProfile, ProfileBook, ProfileSource, ResolvedProfile, RunId,
    SUMMARY_FILE_PREFIX, Topic,
};
