//! Knowledge-base loading and example building.
//!
//! The knowledge base is a JSON document describing Solana DeFi topics,
//! trading strategies, flash-loan protocols, and MEV techniques. Loading
//! never fails the run: a missing or malformed file yields an empty
//! [`KnowledgeBase`] and the caller treats that as "no data".

mod builder;

use std::path::Path;

use tracing::{error, info, instrument};

use defi_trainer_shared::{KnowledgeBase, Result, TrainerError};

pub use builder::{Category, build_examples};

/// Read and decode a knowledge-base document, reporting why it failed.
pub fn try_load(path: &Path) -> Result<KnowledgeBase> {
    let bytes = std::fs::read(path).map_err(|e| TrainerError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        if e.is_data() {
            TrainerError::validation(format!("unexpected document layout: {e}"))
        } else {
            e.into()
        }
    })
}

/// Load a knowledge-base document, degrading to an empty one on failure.
///
/// A missing file and a decode error are both logged and both produce
/// [`KnowledgeBase::default()`].
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load(path: &Path) -> KnowledgeBase {
    match try_load(path) {
        Ok(kb) => {
            info!(records = kb.record_count(), "knowledge base loaded");
            kb
        }
        Err(TrainerError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            error!("training data file not found");
            KnowledgeBase::default()
        }
        Err(TrainerError::Parse {
            message,
            line,
            column,
        }) => {
            error!(line, column, "invalid JSON in training data: {message}");
            KnowledgeBase::default()
        }
        Err(TrainerError::Validation { message }) => {
            error!("training data does not match the knowledge-base schema: {message}");
            KnowledgeBase::default()
        }
        Err(e) => {
            error!(error = %e, "failed to read training data");
            KnowledgeBase::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dt-knowledge-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn load_missing_file_returns_empty() {
        let path = temp_dir().join("does-not-exist.json");
        let kb = load(&path);
        assert!(kb.is_empty());
        assert!(matches!(try_load(&path), Err(TrainerError::Io { .. })));
    }

    #[test]
    fn load_invalid_json_returns_empty() {
        let dir = temp_dir();
        let path = dir.join("broken.json");
        std::fs::write(&path, "{\"training_data\": [").unwrap();

        assert!(load(&path).is_empty());
        assert!(matches!(try_load(&path), Err(TrainerError::Parse { .. })));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_wrong_top_level_shape_returns_empty() {
        let dir = temp_dir();
        let path = dir.join("array.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        assert!(load(&path).is_empty());
        assert!(matches!(try_load(&path), Err(TrainerError::Validation { .. })));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn category_that_is_not_a_list_is_a_layout_error() {
        let dir = temp_dir();
        let path = dir.join("object.json");
        std::fs::write(&path, r#"{"training_data": {"topic": "Rent"}}"#).unwrap();

        match try_load(&path) {
            Err(TrainerError::Validation { message }) => {
                assert!(message.starts_with("unexpected document layout"), "{message}");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
        assert!(load(&path).is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_valid_document() {
        let dir = temp_dir();
        let path = dir.join("kb.json");
        std::fs::write(
            &path,
            r#"{"training_data": [{"topic": "Rent", "content": "Accounts pay rent."}]}"#,
        )
        .unwrap();

        let kb = load(&path);
        assert_eq!(kb.record_count(), 1);
        assert_eq!(kb.training_data[0]["topic"], "Rent");

        let examples = build_examples(&kb).unwrap();
        assert_eq!(examples[0].context(), "Accounts pay rent.");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
