//! Import pipeline for raw conversation exports
//!
//! Takes heterogeneous, tree-structured chat exports and deterministically
//! produces ordered, validated, flat conversations ready for rating,
//! comparison, and export.
//!
//! ```text
//! raw JSON text
//!      │
//!      ▼
//! ┌───────────────┐    ┌──────────────────────────┐    ┌───────────────┐
//! │  Validator    │ ─► │  Resolver                │ ─► │  Assembler    │
//! │ (shape rules) │    │ (extract + normalize ts, │    │ (metadata +   │
//! └───────────────┘    │  stable sort)            │    │  legacy view) │
//!                      └──────────────────────────┘    └───────────────┘
//! ```
//!
//! ## Batch semantics
//!
//! A file may hold one conversation object or an array of them. Array
//! elements are processed independently: one malformed element is reported
//! in the [`ImportReport`] and never aborts the rest of the batch. A
//! single-object input has no batch to recover into, so its validation
//! failure propagates, as does text that is not JSON at all.
//!
//! ## Error handling
//!
//! Structural problems surface as [`ValidationError`]s naming the failure
//! kind and offending node. Per-field oddities inside an otherwise valid
//! conversation (unparseable timestamp, missing role) are normalized with
//! documented defaults instead of failing - lossy but total.
//!
//! [`ValidationError`]: crate::error::ValidationError

mod assemble;
mod content;
mod raw;
mod resolve;
mod timestamp;
mod validate;

pub use assemble::to_legacy_format;
pub use content::extract_content;
pub use raw::{RawContent, RawConversation, RawMessage, RawNode};
pub use resolve::resolve_messages;
pub use timestamp::{normalize_epoch_ms, normalize_timestamp};
pub use validate::validate_conversation;

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::ParsedConversation;

/// One rejected element of an import batch.
#[derive(Debug)]
pub struct ImportFailure {
    /// Position of the element in the input (0 for single-object input)
    pub index: usize,
    /// Why the element was rejected
    pub error: Error,
}

/// Outcome of importing one file or text blob.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Successfully parsed conversations, in input order
    pub conversations: Vec<ParsedConversation>,
    /// Per-element failures, in input order
    pub failures: Vec<ImportFailure>,
}

impl ImportReport {
    /// Number of elements the input contained.
    pub fn total(&self) -> usize {
        self.conversations.len() + self.failures.len()
    }

    /// Whether every element imported cleanly.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn merge(&mut self, other: ImportReport) {
        self.conversations.extend(other.conversations);
        self.failures.extend(other.failures);
    }
}

/// Parse one conversation value: validate, resolve, assemble.
///
/// This is the single-record entrypoint; it surfaces the full
/// [`ValidationError`](crate::error::ValidationError) taxonomy directly.
pub fn parse_conversation(value: Value) -> Result<ParsedConversation> {
    parse_with_path(value, None)
}

fn parse_with_path(value: Value, file_path: Option<&str>) -> Result<ParsedConversation> {
    validate_conversation(&value)?;
    let raw: RawConversation = serde_json::from_value(value.clone())?;
    let messages = resolve_messages(&raw.mapping);
    Ok(assemble::assemble(
        &raw,
        value,
        messages,
        file_path.map(str::to_string),
    ))
}

/// Import conversations from a JSON text blob.
///
/// The text must be valid JSON ([`Error::Syntax`] otherwise): either a
/// single conversation object or an array of them. Elements are imported
/// independently per the batch rule above.
pub fn import_content(text: &str) -> Result<ImportReport> {
    import_inner(text, None)
}

/// Import conversations from a file, stamping each with its source path.
pub fn import_file(path: &Path) -> Result<ImportReport> {
    let text = std::fs::read_to_string(path)?;
    let source = path.to_string_lossy();
    import_inner(&text, Some(source.as_ref()))
}

fn import_inner(text: &str, file_path: Option<&str>) -> Result<ImportReport> {
    let value: Value = serde_json::from_str(text).map_err(Error::Syntax)?;

    let mut report = ImportReport::default();
    match value {
        Value::Array(items) => {
            for (index, element) in items.into_iter().enumerate() {
                match parse_with_path(element, file_path) {
                    Ok(conversation) => report.conversations.push(conversation),
                    Err(error) => {
                        tracing::warn!(index, error = %error, "conversation rejected during import");
                        report.failures.push(ImportFailure { index, error });
                    }
                }
            }
        }
        single => {
            report
                .conversations
                .push(parse_with_path(single, file_path)?);
        }
    }

    Ok(report)
}

/// Import every export file under a directory.
///
/// Files are imported independently; a file that cannot be read or parsed
/// contributes a single failure entry instead of stopping the walk.
pub fn import_dir(dir: &Path) -> Result<ImportReport> {
    let mut report = ImportReport::default();
    for (index, path) in discover_exports(dir)?.iter().enumerate() {
        match import_file(path) {
            Ok(file_report) => report.merge(file_report),
            Err(error) => {
                tracing::warn!(path = %path.display(), error = %error, "export file rejected");
                report.failures.push(ImportFailure { index, error });
            }
        }
    }
    Ok(report)
}

/// Find export files (`*.json`) under a directory, recursively.
pub fn discover_exports(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = dir.join("**").join("*.json");
    let entries = glob::glob(&pattern.to_string_lossy())
        .map_err(|e| Error::Config(format!("invalid export glob pattern: {}", e)))?;

    let mut files: Vec<PathBuf> = entries.flatten().filter(|p| p.is_file()).collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use serde_json::json;

    fn valid_conversation() -> Value {
        json!({
            "id": "conv-1",
            "title": "T",
            "mapping": {
                "n1": {"id": "n1", "message": {
                    "author": {"role": "user"},
                    "content": {"content_type": "text", "parts": ["Hi"]},
                    "create_time": 1000
                }}
            }
        })
    }

    #[test]
    fn single_object_is_a_one_element_batch() {
        let text = valid_conversation().to_string();
        let report = import_content(&text).unwrap();
        assert_eq!(report.conversations.len(), 1);
        assert!(report.is_clean());
        assert_eq!(report.conversations[0].id, "conv-1");
    }

    #[test]
    fn non_json_input_is_a_syntax_error() {
        let err = import_content("this is not json").unwrap_err();
        assert!(matches!(err, Error::Syntax(_)));
    }

    #[test]
    fn batch_failures_do_not_abort_the_batch() {
        let text = json!([valid_conversation(), {"mapping": {"a": {"id": "a"}}}]).to_string();
        let report = import_content(&text).unwrap();

        assert_eq!(report.conversations.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);
        assert_eq!(
            report.failures[0].error.as_validation(),
            Some(&ValidationError::MissingTitle)
        );
        assert_eq!(report.total(), 2);
    }

    #[test]
    fn parse_conversation_surfaces_validation_errors() {
        let err = parse_conversation(json!({"title": "x", "mapping": {}})).unwrap_err();
        assert_eq!(err.as_validation(), Some(&ValidationError::EmptyMapping));
    }

    #[test]
    fn single_malformed_object_propagates_its_validation_error() {
        let err = import_content(&json!({"title": "x", "mapping": {}}).to_string()).unwrap_err();
        assert_eq!(err.as_validation(), Some(&ValidationError::EmptyMapping));
    }

    #[test]
    fn discover_exports_finds_nested_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("2024");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("a.json"), "{}").unwrap();
        std::fs::write(nested.join("b.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let files = discover_exports(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files
            .iter()
            .all(|p| p.extension().and_then(|e| e.to_str()) == Some("json")));
    }

    #[test]
    fn import_file_stamps_the_source_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        std::fs::write(&path, valid_conversation().to_string()).unwrap();

        let report = import_file(&path).unwrap();
        assert_eq!(report.conversations.len(), 1);
        assert_eq!(
            report.conversations[0].metadata.file_path.as_deref(),
            Some(path.to_string_lossy().as_ref())
        );
    }
}
