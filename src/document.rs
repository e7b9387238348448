use thiserror::Error;

/// In-memory representation of one rule document (`.mdc` file).
///
/// Frontmatter (description + glob patterns) is parsed out of the leading
/// `---` block; everything after the closing delimiter is the body, kept as
/// raw text. Headings are just text, so the body is never parsed into an
/// outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDocument {
    /// Corpus-unique identifier, e.g. `.cursor/rules/python-style.mdc`
    pub path: String,
    /// Single-line frontmatter description
    pub description: String,
    /// Ordered, exact-string-deduped glob patterns
    pub globs: Vec<String>,
    /// Document content after the frontmatter block
    pub body: String,
}

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("document {path} does not start with a frontmatter delimiter")]
    MissingFrontmatter { path: String },

    #[error("document {path} has an unterminated frontmatter block")]
    UnterminatedFrontmatter { path: String },
}

impl RuleDocument {
    /// Parse a raw `.mdc` document into its frontmatter and body.
    ///
    /// The frontmatter must be delimited by `---` lines. A single blank line
    /// after the closing delimiter is canonical separation, not body content,
    /// and is stripped; `serialize` re-emits it.
    pub fn parse(path: &str, text: &str) -> Result<Self, DocumentError> {
        let rest = text
            .strip_prefix("---\n")
            .ok_or_else(|| DocumentError::MissingFrontmatter {
                path: path.to_string(),
            })?;

        let (frontmatter, raw_body) = if let Some(body) = rest.strip_prefix("---\n") {
            ("", body)
        } else if let Some(pos) = rest.find("\n---\n") {
            (&rest[..pos], &rest[pos + "\n---\n".len()..])
        } else {
            return Err(DocumentError::UnterminatedFrontmatter {
                path: path.to_string(),
            });
        };

        let mut description = String::new();
        let mut globs = Vec::new();
        for line in frontmatter.lines() {
            if let Some(value) = line.strip_prefix("description:") {
                description = value.trim().to_string();
            } else if let Some(value) = line.strip_prefix("globs:") {
                globs = parse_globs(value);
            }
        }

        let body = raw_body.strip_prefix('\n').unwrap_or(raw_body).to_string();

        Ok(Self {
            path: path.to_string(),
            description,
            globs,
            body,
        })
    }

    /// Serialize to the canonical on-disk format.
    ///
    /// Delimiter, `description:` line, `globs:` line, delimiter, blank line,
    /// body. A trailing newline is always enforced.
    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity(self.body.len() + 64);
        out.push_str("---\n");
        if self.description.is_empty() {
            out.push_str("description:\n");
        } else {
            out.push_str("description: ");
            out.push_str(&self.description);
            out.push('\n');
        }
        if self.globs.is_empty() {
            out.push_str("globs:\n");
        } else {
            out.push_str("globs: ");
            let quoted: Vec<String> = self.globs.iter().map(|g| format!("\"{g}\"")).collect();
            out.push_str(&quoted.join(", "));
            out.push('\n');
        }
        out.push_str("---\n\n");
        out.push_str(&self.body);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }

    /// Append a glob pattern unless an exact-string duplicate is already
    /// present. Returns whether the list changed.
    pub fn push_glob(&mut self, glob: &str) -> bool {
        if self.globs.iter().any(|g| g == glob) {
            return false;
        }
        self.globs.push(glob.to_string());
        true
    }
}

/// Parse the value of a `globs:` line: comma-separated patterns, each
/// optionally double-quoted. Exact-string duplicates are suppressed so the
/// invariant on [`RuleDocument::globs`] holds for parsed input too.
fn parse_globs(value: &str) -> Vec<String> {
    let mut globs: Vec<String> = Vec::new();
    for raw in value.split(',') {
        let glob = raw.trim().trim_matches('"');
        if !glob.is_empty() && !globs.iter().any(|g| g == glob) {
            globs.push(glob.to_string());
        }
    }
    globs
}
