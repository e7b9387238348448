//! Batch orchestration: group operations by target path and drive the
//! resolver, planner, and writer per document.
//!
//! The engine is synchronous, performs no I/O, and never aborts the batch:
//! failures degrade to per-operation skip statuses or per-document errors,
//! and every other document still processes. Given the same corpus and the
//! same operation list in the same order, output is byte-identical.

use crate::batch::{Operation, OperationKind};
use crate::document::DocumentError;
use crate::plan::{plan, OpStatus};
use crate::writer;
use crate::RuleDocument;
use std::collections::BTreeMap;

/// Application result for one operation, in batch input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOutcome {
    pub index: usize,
    pub target_path: String,
    pub status: OpStatus,
}

/// A corpus document the engine had to exclude from the batch.
#[derive(Debug)]
pub struct DocumentIssue {
    pub path: String,
    pub error: DocumentError,
}

/// The full result of one merge pass.
///
/// `documents` holds the final serialized text for every path that was
/// created or received at least one applied edit or frontmatter change;
/// untouched documents are omitted. `operations` carries one outcome per
/// input operation for the surrounding workflow to report back to reviewers.
#[derive(Debug, Default)]
#[must_use = "MergeOutcome carries the documents to persist and the statuses to report"]
pub struct MergeOutcome {
    pub documents: BTreeMap<String, String>,
    pub operations: Vec<OperationOutcome>,
    pub document_errors: Vec<DocumentIssue>,
}

/// Merge an ordered operation batch into the existing corpus.
///
/// `corpus` maps document path to raw serialized text as currently
/// persisted. The call is infallible by design: it always returns a result
/// set plus per-operation outcomes, leaving presentation of failures to the
/// caller.
pub fn merge_batch(corpus: &BTreeMap<String, String>, batch: &[Operation]) -> MergeOutcome {
    let mut by_path: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (index, op) in batch.iter().enumerate() {
        by_path.entry(op.target_path.as_str()).or_default().push(index);
    }

    let mut outcome = MergeOutcome::default();
    let mut statuses = vec![OpStatus::SkippedInvalidTarget; batch.len()];

    for (path, indices) in by_path {
        merge_document(path, &indices, corpus, batch, &mut statuses, &mut outcome);
    }

    outcome.operations = batch
        .iter()
        .enumerate()
        .map(|(index, op)| OperationOutcome {
            index,
            target_path: op.target_path.clone(),
            status: statuses[index],
        })
        .collect();

    outcome
}

/// Process every operation targeting one path. Failures stay local to this
/// document.
fn merge_document(
    path: &str,
    indices: &[usize],
    corpus: &BTreeMap<String, String>,
    batch: &[Operation],
    statuses: &mut [OpStatus],
    outcome: &mut MergeOutcome,
) {
    let (mut doc, created, edit_indices): (RuleDocument, bool, &[usize]) =
        match corpus.get(path) {
            Some(text) => match RuleDocument::parse(path, text) {
                Ok(doc) => (doc, false, indices),
                Err(error) => {
                    for &index in indices {
                        statuses[index] = OpStatus::SkippedMalformedDocument;
                    }
                    outcome.document_errors.push(DocumentIssue {
                        path: path.to_string(),
                        error,
                    });
                    return;
                }
            },
            None => {
                // The document must be initiated by a create_file; anything
                // queued before it has no valid target.
                let create_pos = indices
                    .iter()
                    .position(|&i| batch[i].kind == OperationKind::CreateFile);
                let Some(create_pos) = create_pos else {
                    return;
                };
                for &index in &indices[..create_pos] {
                    statuses[index] = OpStatus::SkippedInvalidTarget;
                }
                let create_index = indices[create_pos];
                statuses[create_index] = OpStatus::Applied;
                let doc = writer::create_document(path, &batch[create_index]);
                (doc, true, &indices[create_pos + 1..])
            }
        };

    let planner_ops: Vec<(usize, &Operation)> =
        edit_indices.iter().map(|&i| (i, &batch[i])).collect();
    let (edit_plan, planned) = plan(&doc.body, &planner_ops);
    for (index, status) in planned {
        statuses[index] = status;
    }

    let edit_count = edit_plan.edits.len();
    doc.body = writer::apply_plan(&doc.body, &edit_plan);

    let applied: Vec<&Operation> = indices
        .iter()
        .filter(|&&i| statuses[i].is_applied())
        .map(|&i| &batch[i])
        .collect();
    let frontmatter_changed = writer::merge_frontmatter(&mut doc, applied);
    if created {
        writer::ensure_defaults(&mut doc);
    }

    if created || edit_count > 0 || frontmatter_changed {
        outcome.documents.insert(path.to_string(), doc.serialize());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(kind: OperationKind, path: &str) -> Operation {
        Operation {
            kind,
            target_path: path.to_string(),
            content: String::new(),
            anchor: None,
            text_to_replace: None,
            file_description: None,
            file_globs: None,
        }
    }

    fn corpus(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(path, text)| (path.to_string(), text.to_string()))
            .collect()
    }

    const STYLE_DOC: &str =
        "---\ndescription: Style rules\nglobs: \"*.py\"\n---\n\n## Style\n- Use black\n";

    #[test]
    fn create_then_edit_in_one_batch() {
        let batch = vec![
            Operation {
                content: "# Testing Standards\n".to_string(),
                file_description: Some("Testing conventions".to_string()),
                file_globs: Some(vec!["tests/**".to_string()]),
                ..op(OperationKind::CreateFile, "rules/testing.mdc")
            },
            Operation {
                content: "- Integration tests required\n".to_string(),
                anchor: Some("# Testing Standards".to_string()),
                ..op(OperationKind::Addition, "rules/testing.mdc")
            },
        ];
        let outcome = merge_batch(&corpus(&[]), &batch);
        assert!(outcome.operations.iter().all(|o| o.status.is_applied()));
        let text = &outcome.documents["rules/testing.mdc"];
        assert_eq!(
            text,
            "---\ndescription: Testing conventions\nglobs: \"tests/**\"\n---\n\n# Testing Standards\n- Integration tests required\n"
        );
    }

    #[test]
    fn edit_before_create_has_no_valid_target() {
        let batch = vec![
            Operation {
                content: "- too early\n".to_string(),
                ..op(OperationKind::Addition, "rules/new.mdc")
            },
            Operation {
                content: "# New\n".to_string(),
                file_description: Some("New rules".to_string()),
                file_globs: Some(vec!["*".to_string()]),
                ..op(OperationKind::CreateFile, "rules/new.mdc")
            },
        ];
        let outcome = merge_batch(&corpus(&[]), &batch);
        assert_eq!(outcome.operations[0].status, OpStatus::SkippedInvalidTarget);
        assert_eq!(outcome.operations[1].status, OpStatus::Applied);
        assert!(!outcome.documents["rules/new.mdc"].contains("too early"));
    }

    #[test]
    fn edit_on_missing_document_is_invalid_target() {
        let batch = vec![Operation {
            content: "- text\n".to_string(),
            ..op(OperationKind::Addition, "rules/ghost.mdc")
        }];
        let outcome = merge_batch(&corpus(&[]), &batch);
        assert_eq!(outcome.operations[0].status, OpStatus::SkippedInvalidTarget);
        assert!(outcome.documents.is_empty());
    }

    #[test]
    fn repeated_create_degrades_to_append() {
        let batch = vec![
            Operation {
                content: "# Standards\n".to_string(),
                file_description: Some("first".to_string()),
                ..op(OperationKind::CreateFile, "rules/s.mdc")
            },
            Operation {
                content: "- second body\n".to_string(),
                file_description: Some("second".to_string()),
                ..op(OperationKind::CreateFile, "rules/s.mdc")
            },
        ];
        let outcome = merge_batch(&corpus(&[]), &batch);
        assert!(outcome.operations.iter().all(|o| o.status.is_applied()));
        let text = &outcome.documents["rules/s.mdc"];
        assert!(text.contains("description: second"));
        assert!(text.contains("# Standards\n- second body\n"));
    }

    #[test]
    fn malformed_document_is_isolated() {
        let corpus = corpus(&[
            ("rules/bad.mdc", "no frontmatter here\n"),
            ("rules/good.mdc", STYLE_DOC),
        ]);
        let batch = vec![
            Operation {
                content: "- for the bad file\n".to_string(),
                ..op(OperationKind::Addition, "rules/bad.mdc")
            },
            Operation {
                content: "- for the good file\n".to_string(),
                ..op(OperationKind::Addition, "rules/good.mdc")
            },
        ];
        let outcome = merge_batch(&corpus, &batch);
        assert_eq!(
            outcome.operations[0].status,
            OpStatus::SkippedMalformedDocument
        );
        assert_eq!(outcome.operations[1].status, OpStatus::Applied);
        assert_eq!(outcome.document_errors.len(), 1);
        assert_eq!(outcome.document_errors[0].path, "rules/bad.mdc");
        assert!(outcome.documents.contains_key("rules/good.mdc"));
        assert!(!outcome.documents.contains_key("rules/bad.mdc"));
    }

    #[test]
    fn untouched_documents_are_omitted_from_output() {
        let corpus = corpus(&[("rules/style.mdc", STYLE_DOC)]);
        let batch = vec![Operation {
            text_to_replace: Some("nowhere to be found".to_string()),
            content: "- replacement\n".to_string(),
            ..op(OperationKind::Replacement, "rules/style.mdc")
        }];
        let outcome = merge_batch(&corpus, &batch);
        assert_eq!(
            outcome.operations[0].status,
            OpStatus::SkippedAnchorNotFound
        );
        assert!(outcome.documents.is_empty());
    }

    #[test]
    fn metadata_only_operation_rewrites_frontmatter() {
        let corpus = corpus(&[("rules/style.mdc", STYLE_DOC)]);
        let batch = vec![Operation {
            file_globs: Some(vec!["*.py".to_string(), "*.ts".to_string()]),
            ..op(OperationKind::Addition, "rules/style.mdc")
        }];
        let outcome = merge_batch(&corpus, &batch);
        assert_eq!(outcome.operations[0].status, OpStatus::Applied);
        let text = &outcome.documents["rules/style.mdc"];
        assert!(text.contains("globs: \"*.py\", \"*.ts\"\n"));
        assert!(text.ends_with("## Style\n- Use black\n"));
    }

    #[test]
    fn empty_batch_produces_empty_outcome() {
        let corpus = corpus(&[("rules/style.mdc", STYLE_DOC)]);
        let outcome = merge_batch(&corpus, &[]);
        assert!(outcome.documents.is_empty());
        assert!(outcome.operations.is_empty());
        assert!(outcome.document_errors.is_empty());
    }

    #[test]
    fn deterministic_output_for_identical_input() {
        let corpus = corpus(&[("rules/style.mdc", STYLE_DOC)]);
        let batch = vec![Operation {
            content: "- Line length 100\n".to_string(),
            anchor: Some("- Use black".to_string()),
            ..op(OperationKind::Addition, "rules/style.mdc")
        }];
        let first = merge_batch(&corpus, &batch);
        let second = merge_batch(&corpus, &batch);
        assert_eq!(first.documents, second.documents);
        assert_eq!(first.operations, second.operations);
    }
}
