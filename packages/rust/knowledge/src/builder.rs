//! Turns knowledge-base records into question/context training examples.
//!
//! Categories are processed in a fixed order (topics, trading strategies,
//! flash loans, MEV techniques); records keep their source order inside each.

use serde_json::{Map, Value};
use tracing::debug;

use defi_trainer_shared::{
    CATEGORY_FLASH_LOANS, CATEGORY_MEV, CATEGORY_STRATEGIES, CATEGORY_TOPICS, KnowledgeBase,
    Result, TrainerError, TrainingExample,
};

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// The four record categories of a knowledge-base document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Topic,
    TradingStrategy,
    FlashLoan,
    MevTechnique,
}

impl Category {
    /// All categories in build order.
    pub const ALL: [Category; 4] = [
        Self::Topic,
        Self::TradingStrategy,
        Self::FlashLoan,
        Self::MevTechnique,
    ];

    /// Document key holding this category's records.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Topic => CATEGORY_TOPICS,
            Self::TradingStrategy => CATEGORY_STRATEGIES,
            Self::FlashLoan => CATEGORY_FLASH_LOANS,
            Self::MevTechnique => CATEGORY_MEV,
        }
    }

    fn records<'a>(&self, kb: &'a KnowledgeBase) -> &'a [Value] {
        match self {
            Self::Topic => &kb.training_data,
            Self::TradingStrategy => &kb.trading_strategies,
            Self::FlashLoan => &kb.flash_loan_strategies,
            Self::MevTechnique => &kb.mev_techniques,
        }
    }

    fn render(&self, record: &Record<'_>) -> Result<TrainingExample> {
        match self {
            Self::Topic => {
                let topic = record.text("topic")?;
                let content = record.text("content")?;
                Ok(TrainingExample::new(
                    format!("What do you know about {topic}?"),
                    content,
                ))
            }
            Self::TradingStrategy => {
                let name = record.text("name")?;
                let context = format!(
                    "Strategy: {name}\n\
                     Description: {}\n\
                     Execution: {}\n\
                     Tools: {}\n\
                     Risks: {}",
                    record.text("description")?,
                    record.text("execution")?,
                    record.list("tools")?,
                    record.text("risk")?,
                );
                Ok(TrainingExample::new(
                    format!("How does {name} work on Solana?"),
                    context.trim(),
                ))
            }
            Self::FlashLoan => {
                let protocol = record.text("protocol")?;
                let context = format!(
                    "Protocol: {protocol}\n\
                     Description: {}\n\
                     Use Cases: {}\n\
                     Fees: {}\n\
                     Requirements: {}",
                    record.text("description")?,
                    record.list("use_cases")?,
                    record.text("fees")?,
                    record.text("requirements")?,
                );
                Ok(TrainingExample::new(
                    format!("Tell me about flash loans on {protocol}"),
                    context.trim(),
                ))
            }
            Self::MevTechnique => {
                let technique = record.text("technique")?;
                let context = format!(
                    "Technique: {technique}\n\
                     Description: {}\n\
                     Implementation: {}\n\
                     Tools: {}\n\
                     Ethics: {}",
                    record.text("description")?,
                    record.text("implementation")?,
                    record.list("tools")?,
                    record.text("ethics")?,
                );
                Ok(TrainingExample::new(
                    format!("Explain {technique} in DeFi"),
                    context.trim(),
                ))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Record field access
// ---------------------------------------------------------------------------

/// A single record with its position, for error reporting.
struct Record<'a> {
    category: &'static str,
    index: usize,
    fields: &'a Map<String, Value>,
}

impl<'a> Record<'a> {
    fn new(category: Category, index: usize, value: &'a Value) -> Result<Self> {
        let fields = value.as_object().ok_or(TrainerError::InvalidField {
            category: category.key(),
            index,
            field: "<record>",
            expected: "an object",
        })?;
        Ok(Self {
            category: category.key(),
            index,
            fields,
        })
    }

    fn get(&self, field: &'static str) -> Result<&'a Value> {
        match self.fields.get(field) {
            Some(Value::Null) | None => Err(TrainerError::MissingField {
                category: self.category,
                index: self.index,
                field,
            }),
            Some(value) => Ok(value),
        }
    }

    fn invalid(&self, field: &'static str, expected: &'static str) -> TrainerError {
        TrainerError::InvalidField {
            category: self.category,
            index: self.index,
            field,
            expected,
        }
    }

    /// Scalar field rendered as text. Numbers and booleans are accepted.
    fn text(&self, field: &'static str) -> Result<String> {
        match self.get(field)? {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            _ => Err(self.invalid(field, "a string")),
        }
    }

    /// List-of-strings field joined with `", "`.
    fn list(&self, field: &'static str) -> Result<String> {
        let items = self
            .get(field)?
            .as_array()
            .ok_or_else(|| self.invalid(field, "a list of strings"))?;

        let parts = items
            .iter()
            .map(|item| item.as_str().ok_or_else(|| self.invalid(field, "a list of strings")))
            .collect::<Result<Vec<_>>>()?;

        Ok(parts.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Build training examples from every record in the knowledge base.
///
/// A missing or malformed field on any record fails the whole build; no
/// partial output is returned.
pub fn build_examples(kb: &KnowledgeBase) -> Result<Vec<TrainingExample>> {
    let mut examples = Vec::with_capacity(kb.record_count());

    for category in Category::ALL {
        let records = category.records(kb);
        for (index, value) in records.iter().enumerate() {
            let record = Record::new(category, index, value)?;
            examples.push(category.render(&record)?);
        }
        debug!(category = category.key(), count = records.len(), "category processed");
    }

    Ok(examples)
}
