//! Merge planning: resolve every operation against the pristine document
//! body, settle overlaps, and linearize the surviving edits.
//!
//! All span lookups run against the original, unmodified body so coordinates
//! stay stable and offsets never compound. Conflict policy: the last
//! operation in batch input order wins; an anchored addition whose anchor is
//! about to disappear inside a replaced span is dropped. Operation type
//! carries no priority, batch order is the sole tie-break signal.

use crate::anchor::{locate, Span};
use crate::batch::{Operation, OperationKind};
use std::fmt;

/// One resolved edit: replace `[start, end)` with `text`.
/// Insertions have `start == end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanEdit {
    pub start: usize,
    pub end: usize,
    pub text: String,
    /// Index of the originating operation in the batch
    pub op_index: usize,
}

/// Linearized, conflict-resolved edits for one document, sorted ascending by
/// position. Consumed by the writer, then discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use = "an EditPlan does nothing until the writer applies it"]
pub struct EditPlan {
    pub edits: Vec<SpanEdit>,
}

impl EditPlan {
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

/// Application status of a single operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "OpStatus should be reported back to the workflow"]
pub enum OpStatus {
    Applied,
    SkippedAnchorNotFound,
    SkippedOverlap,
    SkippedInvalidTarget,
    SkippedMalformedDocument,
}

impl OpStatus {
    pub fn is_applied(&self) -> bool {
        matches!(self, OpStatus::Applied)
    }
}

impl fmt::Display for OpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpStatus::Applied => write!(f, "applied"),
            OpStatus::SkippedAnchorNotFound => write!(f, "skipped: anchor_not_found"),
            OpStatus::SkippedOverlap => write!(f, "skipped: overlapped"),
            OpStatus::SkippedInvalidTarget => write!(f, "skipped: invalid_target"),
            OpStatus::SkippedMalformedDocument => write!(f, "skipped: malformed_document"),
        }
    }
}

enum Candidate {
    Replace {
        index: usize,
        span: Span,
        text: String,
    },
    Insert {
        index: usize,
        at: usize,
        anchored: bool,
        text: String,
    },
}

impl Candidate {
    fn index(&self) -> usize {
        match self {
            Candidate::Replace { index, .. } | Candidate::Insert { index, .. } => *index,
        }
    }
}

/// Build the edit plan for one document.
///
/// `ops` is the slice of (batch index, operation) pairs targeting this
/// document, in batch order. A `create_file` here is one that arrived after
/// the document already existed (or was created earlier in the batch); it
/// degrades to an append plus a frontmatter merge.
///
/// Returns the plan and one status per input operation, in batch order. No
/// failure here is fatal: unresolved or superseded operations degrade to
/// skip statuses and every other operation still applies.
pub fn plan(body: &str, ops: &[(usize, &Operation)]) -> (EditPlan, Vec<(usize, OpStatus)>) {
    let mut statuses: Vec<(usize, OpStatus)> = Vec::with_capacity(ops.len());
    let mut candidates: Vec<Candidate> = Vec::new();

    for &(index, op) in ops {
        match op.kind {
            OperationKind::Replacement => {
                let target = op.text_to_replace.as_deref().unwrap_or("");
                match locate(body, target) {
                    Some(span) => candidates.push(Candidate::Replace {
                        index,
                        span,
                        text: op.content.clone(),
                    }),
                    None => statuses.push((index, OpStatus::SkippedAnchorNotFound)),
                }
            }
            OperationKind::Addition | OperationKind::CreateFile => {
                if op.content.is_empty() {
                    // Metadata-only operation: no span edit, frontmatter
                    // merge happens downstream
                    statuses.push((index, OpStatus::Applied));
                    continue;
                }
                let anchor = match op.kind {
                    OperationKind::Addition => op.anchor.as_deref(),
                    _ => None,
                };
                match anchor {
                    Some(text) => match locate(body, text) {
                        Some(span) => {
                            // An anchor ending at a line boundary puts the
                            // content on its own fresh line instead of
                            // splitting the boundary newline
                            let (at, text) =
                                if body.as_bytes().get(span.end) == Some(&b'\n') {
                                    let mut text = op.content.clone();
                                    if !text.ends_with('\n') {
                                        text.push('\n');
                                    }
                                    (span.end + 1, text)
                                } else {
                                    (span.end, format!("\n{}", op.content))
                                };
                            candidates.push(Candidate::Insert {
                                index,
                                at,
                                anchored: true,
                                text,
                            });
                        }
                        None => statuses.push((index, OpStatus::SkippedAnchorNotFound)),
                    },
                    None => {
                        let text = if !body.is_empty() && !body.ends_with('\n') {
                            format!("\n{}", op.content)
                        } else {
                            op.content.clone()
                        };
                        candidates.push(Candidate::Insert {
                            index,
                            at: body.len(),
                            anchored: false,
                            text,
                        });
                    }
                }
            }
        }
    }

    // Settle replacement overlaps back to front: a replacement survives only
    // if no later surviving replacement intersects its span.
    let mut surviving_spans: Vec<Span> = Vec::new();
    let mut discarded = vec![false; candidates.len()];
    for (pos, candidate) in candidates.iter().enumerate().rev() {
        if let Candidate::Replace { span, .. } = candidate {
            if surviving_spans.iter().any(|s| s.intersects(span)) {
                discarded[pos] = true;
            } else {
                surviving_spans.push(*span);
            }
        }
    }

    // Drop anchored insertions whose insertion point falls strictly inside
    // a surviving replacement span; their anchor text is about to disappear.
    // An anchor ending exactly at a replacement boundary keeps the
    // insertion, and append-at-end insertions are never dropped.
    for (pos, candidate) in candidates.iter().enumerate() {
        if let Candidate::Insert {
            at,
            anchored: true,
            ..
        } = candidate
        {
            let doomed = surviving_spans
                .iter()
                .any(|r| r.start < *at && *at < r.end);
            if doomed {
                discarded[pos] = true;
            }
        }
    }

    let mut edits: Vec<SpanEdit> = Vec::new();
    for (pos, candidate) in candidates.into_iter().enumerate() {
        if discarded[pos] {
            statuses.push((candidate.index(), OpStatus::SkippedOverlap));
            continue;
        }
        statuses.push((candidate.index(), OpStatus::Applied));
        let edit = match candidate {
            Candidate::Replace { index, span, text } => SpanEdit {
                start: span.start,
                end: span.end,
                text,
                op_index: index,
            },
            Candidate::Insert {
                index, at, text, ..
            } => SpanEdit {
                start: at,
                end: at,
                text,
                op_index: index,
            },
        };
        edits.push(edit);
    }

    // Ascending position; an insertion at a prior edit's end sorts after it,
    // equal-position insertions keep batch order.
    edits.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(a.end.cmp(&b.end))
            .then(a.op_index.cmp(&b.op_index))
    });
    statuses.sort_by_key(|(index, _)| *index);

    (EditPlan { edits }, statuses)
}
