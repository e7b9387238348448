use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use mdc_merge::{load_from_path, merge_batch, MergeOutcome};
use similar::{ChangeTag, TextDiff};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "mdc-merge")]
#[command(about = "Deterministic merge engine for Cursor rule documents", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge a batch of operations into the rules directory
    Apply {
        /// Directory holding the .mdc rule documents
        #[arg(short, long, default_value = ".cursor/rules")]
        rules_dir: PathBuf,

        /// Batch file (.json, .yaml, or .yml) with the operations to merge
        #[arg(short, long)]
        batch: PathBuf,

        /// Dry run - report outcomes without writing any file
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diffs of the resulting documents
        #[arg(short, long)]
        diff: bool,
    },

    /// Run the merge and show diffs without touching any file
    Check {
        /// Directory holding the .mdc rule documents
        #[arg(short, long, default_value = ".cursor/rules")]
        rules_dir: PathBuf,

        /// Batch file (.json, .yaml, or .yml) with the operations to merge
        #[arg(short, long)]
        batch: PathBuf,
    },

    /// Validate a batch file without running the merge
    Validate {
        /// Batch file (.json, .yaml, or .yml)
        batch: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            rules_dir,
            batch,
            dry_run,
            diff,
        } => cmd_apply(&rules_dir, &batch, dry_run, diff),

        Commands::Check { rules_dir, batch } => cmd_apply(&rules_dir, &batch, true, true),

        Commands::Validate { batch } => cmd_validate(&batch),
    }
}

fn cmd_apply(rules_dir: &Path, batch_path: &Path, dry_run: bool, diff: bool) -> Result<()> {
    let batch = load_from_path(batch_path).map_err(|e| anyhow::anyhow!("{e}"))?;
    let corpus = load_corpus(rules_dir)?;

    let outcome = merge_batch(&corpus, &batch.operations);
    report(&outcome, &corpus, diff);

    if !dry_run {
        for (path, text) in &outcome.documents {
            write_document(Path::new(path), text)
                .with_context(|| format!("failed to write {path}"))?;
            println!("{}", format!("wrote {path}").green());
        }
    } else if !outcome.documents.is_empty() {
        println!(
            "{}",
            format!("dry run: {} document(s) would be written", outcome.documents.len()).dimmed()
        );
    }

    if !outcome.document_errors.is_empty() {
        anyhow::bail!(
            "{} corpus document(s) were malformed and excluded",
            outcome.document_errors.len()
        );
    }
    Ok(())
}

fn cmd_validate(batch_path: &Path) -> Result<()> {
    match load_from_path(batch_path) {
        Ok(batch) => {
            println!(
                "{}",
                format!("{}: {} operation(s) ok", batch_path.display(), batch.operations.len())
                    .green()
            );
            Ok(())
        }
        Err(e) => anyhow::bail!("{e}"),
    }
}

/// Load every `.mdc` document under the rules directory, keyed by its path
/// as referenced in operation `target_path` fields. Files are visited in
/// sorted order so the corpus is deterministic.
fn load_corpus(rules_dir: &Path) -> Result<BTreeMap<String, String>> {
    let mut corpus = BTreeMap::new();
    if !rules_dir.exists() {
        return Ok(corpus);
    }

    for entry in WalkDir::new(rules_dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|s| s.to_str()) == Some("mdc")
        {
            let text = fs::read_to_string(entry.path())
                .with_context(|| format!("failed to read {}", entry.path().display()))?;
            corpus.insert(entry.path().to_string_lossy().into_owned(), text);
        }
    }
    Ok(corpus)
}

fn report(outcome: &MergeOutcome, corpus: &BTreeMap<String, String>, diff: bool) {
    for op in &outcome.operations {
        let line = format!("op {} {} -> {}", op.index, op.target_path, op.status);
        if op.status.is_applied() {
            println!("{}", line.green());
        } else {
            println!("{}", line.yellow());
        }
    }

    for issue in &outcome.document_errors {
        eprintln!("{}", format!("error: {}", issue.error).red());
    }

    if diff {
        for (path, new_text) in &outcome.documents {
            let empty = String::new();
            let old_text = corpus.get(path).unwrap_or(&empty);
            print_diff(path, old_text, new_text);
        }
    }
}

fn print_diff(path: &str, old_text: &str, new_text: &str) {
    println!("{}", format!("--- {path}").bold());
    let diff = TextDiff::from_lines(old_text, new_text);
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Delete => print!("{}", format!("-{change}").red()),
            ChangeTag::Insert => print!("{}", format!("+{change}").green()),
            ChangeTag::Equal => print!(" {change}"),
        }
    }
}

/// Atomic write: tempfile in the target directory, fsync, rename.
fn write_document(path: &Path, content: &str) -> Result<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    let parent = match parent {
        Some(p) => {
            fs::create_dir_all(p)?;
            p
        }
        None => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
