//! mdc-merge: deterministic merge engine for Cursor rule documents
//!
//! Aggregates upstream-approved change operations (additions, replacements,
//! whole-file creations) into `.mdc` rule documents — markdown files with a
//! `description:`/`globs:` frontmatter block — without ever corrupting
//! existing content.
//!
//! # Architecture
//!
//! Every operation compiles down to a [`plan::SpanEdit`]: a byte-span
//! replacement against the pristine document body. Intelligence lives in
//! span acquisition (the [`anchor`] resolver and the [`plan`] module's
//! conflict policy), not in application — the [`writer`] is a dumb splicer
//! that applies edits last-span-first.
//!
//! # Guarantees
//!
//! - All spans resolve against the original, unmodified body; offsets never
//!   compound
//! - Overlapping operations settle deterministically: the last operation in
//!   batch order wins
//! - Failures degrade per operation or per document, never per batch
//! - Identical corpus + identical batch = byte-identical output
//!
//! # Example
//!
//! ```
//! use mdc_merge::{merge_batch, Operation, OperationKind};
//! use std::collections::BTreeMap;
//!
//! let corpus = BTreeMap::new();
//! let batch = vec![Operation {
//!     kind: OperationKind::CreateFile,
//!     target_path: ".cursor/rules/testing.mdc".to_string(),
//!     content: "# Testing Standards\n".to_string(),
//!     anchor: None,
//!     text_to_replace: None,
//!     file_description: Some("Testing conventions".to_string()),
//!     file_globs: Some(vec!["tests/**".to_string()]),
//! }];
//!
//! let outcome = merge_batch(&corpus, &batch);
//! assert!(outcome.documents.contains_key(".cursor/rules/testing.mdc"));
//! ```

pub mod anchor;
pub mod batch;
pub mod document;
pub mod engine;
pub mod plan;
pub mod writer;

// Re-exports
pub use anchor::{locate, Span};
pub use batch::{
    load_from_path, load_from_str, Batch, BatchError, BatchFormat, Operation, OperationKind,
    ValidationError, ValidationIssue,
};
pub use document::{DocumentError, RuleDocument};
pub use engine::{merge_batch, DocumentIssue, MergeOutcome, OperationOutcome};
pub use plan::{EditPlan, OpStatus, SpanEdit};
