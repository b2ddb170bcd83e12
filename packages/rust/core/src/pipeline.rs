//! End-to-end training-data pipeline:
//! load → build examples → embed contexts → write artifact → smoke test.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{error, info, instrument};

use defi_trainer_artifacts::{WriteReport, build_output, write_output};
use defi_trainer_client::{ClientOptions, EmbedProgress, ModelClient};
use defi_trainer_shared::{EmbeddedExample, Result, TrainerConfig, TrainingExample};

use crate::smoke::{SmokeTestOutcome, run_smoke_test};

/// Result of a pipeline run that got past configuration.
#[derive(Debug)]
pub enum RunOutcome {
    /// The knowledge base was missing, unreadable, or had no records.
    NoData,
    /// Every stage ran.
    Completed(RunSummary),
}

/// What a completed run produced.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    /// Number of training examples built and written.
    pub examples: usize,
    /// Examples that received an embedding.
    pub embedded: usize,
    /// Examples whose embedding call failed (written as `null`).
    pub failed_embeddings: usize,
    /// The artifact on disk.
    pub output: WriteReport,
    pub smoke_test: SmokeTestOutcome,
    /// Total elapsed time.
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait TrainingProgress: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each embedding request (1-based `current`).
    fn embedding(&self, current: usize, total: usize, embedded: bool);
    /// Called when the run completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl TrainingProgress for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn embedding(&self, _current: usize, _total: usize, _embedded: bool) {}
    fn done(&self, _summary: &RunSummary) {}
}

/// Forwards the client's per-item callback to the pipeline reporter.
struct EmbedForwarder<'a>(&'a dyn TrainingProgress);

impl EmbedProgress for EmbedForwarder<'_> {
    fn item_done(&self, current: usize, total: usize, embedded: bool) {
        self.0.embedding(current, total, embedded);
    }
}

/// Embed each example's context and pair the result with the example.
///
/// The output has the same length and order as `examples`.
pub async fn embed_examples(
    client: &ModelClient,
    examples: Vec<TrainingExample>,
    progress: &dyn TrainingProgress,
) -> Vec<EmbeddedExample> {
    let embeddings = {
        let contexts: Vec<&str> = examples.iter().map(|e| e.context()).collect();
        client
            .embed_many(&contexts, &EmbedForwarder(progress))
            .await
    };

    examples
        .into_iter()
        .zip(embeddings)
        .map(|(example, embedding)| EmbeddedExample { example, embedding })
        .collect()
}

/// Run the full pipeline.
///
/// 1. Load the knowledge base (abort with [`RunOutcome::NoData`] if empty)
/// 2. Build training examples (a malformed record is a fatal error)
/// 3. Embed each example's context (failures become `null`)
/// 4. Write the output artifact
/// 5. Smoke-test the chat endpoint (best effort)
#[instrument(skip_all, fields(input = %config.pipeline.input_path.display()))]
pub async fn run_training(
    config: &TrainerConfig,
    progress: &dyn TrainingProgress,
) -> Result<RunOutcome> {
    let start = Instant::now();
    info!("starting Solana DeFi AI training");

    // --- Phase 1: Load ---
    progress.phase("Loading training data");
    let kb = defi_trainer_knowledge::load(&config.pipeline.input_path);
    if kb.is_empty() {
        error!("no training data loaded");
        return Ok(RunOutcome::NoData);
    }

    // --- Phase 2: Build ---
    progress.phase("Creating training examples");
    let examples = defi_trainer_knowledge::build_examples(&kb)?;
    info!(count = examples.len(), "created training examples");

    // --- Phase 3: Embed ---
    let client = ModelClient::new(ClientOptions::from_config(config)?)?;
    progress.phase("Generating embeddings");
    info!("generating embeddings for context texts");
    let items = embed_examples(&client, examples, progress).await;
    let embedded = items.iter().filter(|i| i.embedding.is_some()).count();

    // --- Phase 4: Write ---
    progress.phase("Writing training output");
    let output = build_output(&config.server.embedding_model, &items);
    info!(count = output.training_prompts.len(), "generated training prompts");
    let report = write_output(&config.pipeline.output_path, &output)?;

    // --- Phase 5: Smoke test ---
    progress.phase("Testing model");
    let smoke_test = run_smoke_test(&client, &config.smoke_test).await;

    let summary = RunSummary {
        examples: items.len(),
        embedded,
        failed_embeddings: items.len() - embedded,
        output: report,
        smoke_test,
        elapsed: start.elapsed(),
    };

    info!(
        examples = summary.examples,
        embedded = summary.embedded,
        failed = summary.failed_embeddings,
        "Solana DeFi AI training completed successfully"
    );
    progress.done(&summary);

    Ok(RunOutcome::Completed(summary))
}
