use serde::Deserialize;
use std::fmt;

/// One upstream-approved request to change a rule document.
///
/// Operations are produced by the surrounding classification/drafting
/// workflow, consumed exactly once by the merge engine, and discarded.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Operation {
    pub kind: OperationKind,
    /// Document this operation applies to
    pub target_path: String,
    /// New text to insert, or the replacement for a located span
    #[serde(default)]
    pub content: String,
    /// For additions: snippet of existing text the content is inserted
    /// after. `None` means append at end of body.
    #[serde(default)]
    pub anchor: Option<String>,
    /// For replacements: the snippet of existing text to replace wholesale
    #[serde(default)]
    pub text_to_replace: Option<String>,
    /// Frontmatter override: new description (last applied writer wins)
    #[serde(default)]
    pub file_description: Option<String>,
    /// Frontmatter override: globs to union into the document's list
    #[serde(default)]
    pub file_globs: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Addition,
    Replacement,
    CreateFile,
}

impl Operation {
    pub fn has_frontmatter_fields(&self) -> bool {
        self.file_description.is_some() || self.file_globs.is_some()
    }
}

/// An ordered batch of operations, already filtered to accepted status by
/// the surrounding workflow. Batch order is the sole conflict tie-break
/// signal: later operations supersede earlier ones on overlapping spans.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Batch {
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl Batch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.operations.is_empty() {
            issues.push(ValidationIssue::EmptyBatch);
        }

        for (index, op) in self.operations.iter().enumerate() {
            if op.target_path.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    index,
                    field: "target_path",
                });
            }

            match op.kind {
                OperationKind::Replacement => {
                    if op.text_to_replace.as_deref().unwrap_or("").is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            index,
                            field: "text_to_replace",
                        });
                    }
                    if op.anchor.is_some() {
                        issues.push(ValidationIssue::InvalidCombo {
                            index,
                            message: "replacement does not take an anchor".to_string(),
                        });
                    }
                }
                OperationKind::Addition => {
                    if op.text_to_replace.is_some() {
                        issues.push(ValidationIssue::InvalidCombo {
                            index,
                            message: "addition does not take text_to_replace".to_string(),
                        });
                    }
                    if matches!(op.anchor.as_deref(), Some("")) {
                        issues.push(ValidationIssue::MissingField {
                            index,
                            field: "anchor",
                        });
                    }
                    if op.content.is_empty() && !op.has_frontmatter_fields() {
                        issues.push(ValidationIssue::InvalidCombo {
                            index,
                            message: "addition carries no content and no frontmatter fields"
                                .to_string(),
                        });
                    }
                }
                OperationKind::CreateFile => {
                    if op.anchor.is_some() || op.text_to_replace.is_some() {
                        issues.push(ValidationIssue::InvalidCombo {
                            index,
                            message: "create_file does not take an anchor or text_to_replace"
                                .to_string(),
                        });
                    }
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyBatch,
    MissingField { index: usize, field: &'static str },
    InvalidCombo { index: usize, message: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyBatch => write!(f, "batch contains no operations"),
            ValidationIssue::MissingField { index, field } => {
                write!(f, "operation {index} missing required field '{field}'")
            }
            ValidationIssue::InvalidCombo { index, message } => {
                write!(f, "operation {index} is invalid: {message}")
            }
        }
    }
}
