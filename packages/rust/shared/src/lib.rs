//! Shared types, error model, and configuration for the DeFi trainer.
//!
//! This crate is the foundation depended on by all other trainer crates.
//! It provides:
//! - [`TrainerError`], the unified error type
//! - Domain types ([`KnowledgeBase`], [`TrainingExample`], [`EmbeddedExample`])
//! - Configuration ([`TrainerConfig`], [`Endpoints`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    DEFAULT_MODEL, Endpoints, PipelineConfig, ServerConfig, SmokeTestConfig, TrainerConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, TrainerError};
pub use types::{
    CATEGORY_FLASH_LOANS, CATEGORY_MEV, CATEGORY_STRATEGIES, CATEGORY_TOPICS, EmbeddedExample,
    KnowledgeBase, TrainingExample,
};
