//! Pipeline orchestration for the DeFi trainer.
//!
//! Ties together knowledge loading, example building, embedding, artifact
//! writing, and the smoke test into a single run (`run_training`).

pub mod pipeline;
pub mod smoke;

pub use pipeline::{
    RunOutcome, RunSummary, SilentProgress, TrainingProgress, embed_examples, run_training,
};
pub use smoke::{SmokeTestOutcome, ask_sample_question, run_smoke_test};
