//! Core domain types: the knowledge-base document and the examples built from it.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Knowledge base
// ---------------------------------------------------------------------------

/// Record category names, in build order.
pub const CATEGORY_TOPICS: &str = "training_data";
pub const CATEGORY_STRATEGIES: &str = "trading_strategies";
pub const CATEGORY_FLASH_LOANS: &str = "flash_loan_strategies";
pub const CATEGORY_MEV: &str = "mev_techniques";

/// The knowledge-base document read from disk.
///
/// Items stay as raw JSON so that a missing field is reported by the example
/// builder against the exact record, instead of failing the whole load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    /// Knowledge topics (`topic`, `content`).
    #[serde(default, deserialize_with = "null_as_empty")]
    pub training_data: Vec<Value>,

    /// Trading strategies (`name`, `description`, `execution`, `tools`, `risk`).
    #[serde(default, deserialize_with = "null_as_empty")]
    pub trading_strategies: Vec<Value>,

    /// Flash-loan protocols (`protocol`, `description`, `use_cases`, `fees`, `requirements`).
    #[serde(default, deserialize_with = "null_as_empty")]
    pub flash_loan_strategies: Vec<Value>,

    /// MEV techniques (`technique`, `description`, `implementation`, `tools`, `ethics`).
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mev_techniques: Vec<Value>,
}

impl KnowledgeBase {
    /// True when none of the four categories has a record.
    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }

    /// Total number of records across all categories.
    pub fn record_count(&self) -> usize {
        self.training_data.len()
            + self.trading_strategies.len()
            + self.flash_loan_strategies.len()
            + self.mev_techniques.len()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// TrainingExample
// ---------------------------------------------------------------------------

/// A question paired with the factual context that answers it.
///
/// Built once by the example builder and only read afterwards.
/// `expected_output` always equals `context`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingExample {
    input_text: String,
    context: String,
    expected_output: String,
}

impl TrainingExample {
    pub fn new(input_text: impl Into<String>, context: impl Into<String>) -> Self {
        let context = context.into();
        Self {
            input_text: input_text.into(),
            expected_output: context.clone(),
            context,
        }
    }

    /// Question posed to the assistant.
    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    /// Factual body; also the text that gets embedded.
    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }
}

/// An example together with its embedding, or `None` when generation failed.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedExample {
    pub example: TrainingExample,
    pub embedding: Option<Vec<f64>>,
}
