//! # convograde-core
//!
//! Core library for convograde - import, rate, and AI-compare
//! conversational transcripts.
//!
//! This library provides:
//! - The import pipeline: validation, normalization, and ordering of raw
//!   tree-structured chat exports into flat conversations
//! - Survey templates and ratings (human and AI)
//! - LLM-backed comparison ratings over the same templates
//! - Combined export dataset assembly
//! - Configuration and logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use convograde_core::import;
//! use std::path::Path;
//!
//! let report = import::import_file(Path::new("export.json")).expect("readable JSON export");
//! for conversation in &report.conversations {
//!     println!("{}: {} messages", conversation.title, conversation.messages.len());
//! }
//! for failure in &report.failures {
//!     eprintln!("item {} rejected: {}", failure.index, failure.error);
//! }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result, ValidationError};
pub use import::{ImportFailure, ImportReport};
pub use types::*;

// Public modules
pub mod compare;
pub mod config;
pub mod dataset;
pub mod error;
pub mod import;
pub mod logging;
pub mod rating;
pub mod types;
