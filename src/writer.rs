//! Document writing: apply a linearized edit plan and merge frontmatter.
//!
//! Edits apply from the last span to the first against a mutable copy of the
//! body, so earlier offsets stay valid while rightmost edits land first.

use crate::batch::Operation;
use crate::document::RuleDocument;
use crate::plan::EditPlan;

/// Splice the plan's edits into a copy of `body`, rightmost first.
pub fn apply_plan(body: &str, plan: &EditPlan) -> String {
    let mut out = body.to_string();
    for edit in plan.edits.iter().rev() {
        out.replace_range(edit.start..edit.end, &edit.text);
    }
    out
}

/// Merge frontmatter overrides from applied operations, in batch order.
///
/// A non-empty `file_description` overwrites the current one (last writer
/// wins, consistent with the span overlap policy); `file_globs` unions into
/// the existing list preserving first-seen order. Returns whether anything
/// changed.
pub fn merge_frontmatter<'a, I>(doc: &mut RuleDocument, applied: I) -> bool
where
    I: IntoIterator<Item = &'a Operation>,
{
    let mut changed = false;
    for op in applied {
        if let Some(description) = &op.file_description {
            if !description.is_empty() && doc.description != *description {
                doc.description = description.clone();
                changed = true;
            }
        }
        if let Some(globs) = &op.file_globs {
            for glob in globs {
                if doc.push_glob(glob) {
                    changed = true;
                }
            }
        }
    }
    changed
}

/// Synthesize a new document from the initiating `create_file` operation.
///
/// Frontmatter defaults are not filled in here: later operations in the same
/// batch may still supply them, so [`ensure_defaults`] runs after the merge.
pub fn create_document(path: &str, op: &Operation) -> RuleDocument {
    RuleDocument {
        path: path.to_string(),
        description: op.file_description.clone().unwrap_or_default(),
        globs: op.file_globs.clone().unwrap_or_default(),
        body: op.content.clone(),
    }
}

/// Fall back to a wildcard glob when no operation targeting a new file
/// supplied one.
pub fn ensure_defaults(doc: &mut RuleDocument) {
    if doc.globs.is_empty() {
        doc.globs.push("*".to_string());
    }
}
