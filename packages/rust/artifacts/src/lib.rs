//! Training output artifact: schema, assembly, and atomic write.
//!
//! The artifact is a single pretty-printed JSON file:
//! ```text
//! {
//!   "metadata":          { model, training_date, examples_count, topics_covered },
//!   "training_examples": [ { input, context, expected_output, embedding | null } ],
//!   "training_prompts":  [ "<rendered prompt>", ... ]
//! }
//! ```

mod prompt;

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use defi_trainer_shared::{EmbeddedExample, Result, TrainerError};

pub use prompt::{ASSISTANT_PERSONA, render_prompt};

/// Topic labels recorded in every artifact's metadata.
pub const TOPICS_COVERED: [&str; 6] = [
    "Solana Transaction Types",
    "DEX Trading Strategies",
    "Flash Loans",
    "MEV Strategies",
    "DeFi Protocols",
    "Risk Management",
];

/// Timestamp format for `metadata.training_date` (local time).
const TRAINING_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Root of the output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOutput {
    pub metadata: OutputMetadata,
    pub training_examples: Vec<OutputExample>,
    pub training_prompts: Vec<String>,
}

/// `metadata` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputMetadata {
    /// Embedding model identifier.
    pub model: String,
    pub training_date: String,
    pub examples_count: usize,
    pub topics_covered: Vec<String>,
}

/// One entry of `training_examples`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputExample {
    pub input: String,
    pub context: String,
    pub expected_output: String,
    /// `null` when embedding failed for this example.
    pub embedding: Option<Vec<f64>>,
}

impl From<&EmbeddedExample> for OutputExample {
    fn from(item: &EmbeddedExample) -> Self {
        Self {
            input: item.example.input_text().to_string(),
            context: item.example.context().to_string(),
            expected_output: item.example.expected_output().to_string(),
            embedding: item.embedding.clone().filter(|v| !v.is_empty()),
        }
    }
}

/// Assemble the artifact from embedded examples, stamped with the current local time.
pub fn build_output(model: &str, items: &[EmbeddedExample]) -> TrainingOutput {
    TrainingOutput {
        metadata: OutputMetadata {
            model: model.to_string(),
            training_date: Local::now().format(TRAINING_DATE_FORMAT).to_string(),
            examples_count: items.len(),
            topics_covered: TOPICS_COVERED.iter().map(|t| (*t).to_string()).collect(),
        },
        training_examples: items.iter().map(OutputExample::from).collect(),
        training_prompts: items.iter().map(|i| render_prompt(&i.example)).collect(),
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// What was written to disk.
#[derive(Debug, Clone, Serialize)]
pub struct WriteReport {
    pub path: PathBuf,
    pub size_bytes: usize,
    pub sha256: String,
}

/// Serialize `output` as indented JSON and write it to `path`.
///
/// Writes to a hidden temp file in the same directory, then renames it over
/// `path`, replacing any previous artifact. Missing parent directories are
/// created.
#[instrument(skip_all, fields(path = %path.display(), examples = output.training_examples.len()))]
pub fn write_output(path: &Path, output: &TrainingOutput) -> Result<WriteReport> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| TrainerError::validation(format!("JSON serialization failed: {e}")))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| TrainerError::io(&dir, e))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| TrainerError::validation(format!("not a file path: {}", path.display())))?
        .to_string_lossy();
    let temp = dir.join(format!(".{file_name}.tmp"));

    std::fs::write(&temp, &json).map_err(|e| TrainerError::io(&temp, e))?;
    if let Err(e) = std::fs::rename(&temp, path) {
        let _ = std::fs::remove_file(&temp);
        return Err(TrainerError::io(path, e));
    }

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    let sha256 = format!("{:x}", hasher.finalize());

    debug!(size = json.len(), "wrote training output");
    info!(%sha256, "training data saved");

    Ok(WriteReport {
        path: path.to_path_buf(),
        size_bytes: json.len(),
        sha256,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
