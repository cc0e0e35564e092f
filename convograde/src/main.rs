//! convograde - conversation transcript rating CLI
//!
//! Imports chat JSON exports, records manual ratings, and builds the
//! combined export dataset. All semantics live in convograde-core; this
//! binary is file I/O and printing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use convograde_core::dataset::build_dataset;
use convograde_core::import::{self, to_legacy_format, ImportReport};
use convograde_core::rating::{Rating, SurveyTemplate};
use convograde_core::{Config, ParsedConversation};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "convograde")]
#[command(about = "Import, rate, and export conversation transcripts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import conversation exports and print a report
    Import {
        /// Export file, or directory of export files
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Record a manual rating for one conversation
    Rate {
        /// Export file holding the conversation
        input: PathBuf,

        /// Conversation ID (partial match supported)
        #[arg(short, long)]
        conversation: String,

        /// Dimension scores as key=value pairs (repeatable)
        #[arg(short, long = "score", value_name = "KEY=VALUE")]
        scores: Vec<String>,

        /// Free-text notes attached to the rating
        #[arg(long)]
        notes: Option<String>,

        /// Write the rating JSON here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Build the combined export dataset from conversations and ratings
    Export {
        /// Export file, or directory of export files
        input: PathBuf,

        /// Rating files produced by `rate` or `convograde-compare` (repeatable)
        #[arg(short, long = "ratings", value_name = "FILE")]
        ratings: Vec<PathBuf>,

        /// Output file for the dataset JSON
        #[arg(short, long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    Config::ensure_xdg_env();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = convograde_core::logging::init(&config.logging)
        .context("failed to initialize logging")?;

    match cli.command {
        Command::Import { path, format } => cmd_import(&path, &format),
        Command::Rate {
            input,
            conversation,
            scores,
            notes,
            out,
        } => cmd_rate(&input, &conversation, &scores, notes, out.as_deref()),
        Command::Export {
            input,
            ratings,
            out,
        } => cmd_export(&input, &ratings, &out),
    }
}

/// Import a file or a whole directory of export files.
fn load_report(path: &Path) -> Result<ImportReport> {
    let report = if path.is_dir() {
        import::import_dir(path)
    } else {
        import::import_file(path)
    };
    report.with_context(|| format!("failed to import {}", path.display()))
}

/// Machine-readable import summary for `--format json`.
#[derive(Serialize)]
struct ImportSummary {
    imported: Vec<ImportedConversation>,
    failures: Vec<FailureSummary>,
}

#[derive(Serialize)]
struct ImportedConversation {
    id: String,
    title: String,
    messages: usize,
    created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_path: Option<String>,
}

/// Per-failure entry with the distinct error kind and offending node.
#[derive(Serialize)]
struct FailureSummary {
    index: usize,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    node_id: Option<String>,
    message: String,
}

impl FailureSummary {
    fn from(failure: &import::ImportFailure) -> Self {
        let (kind, node_id) = match failure.error.as_validation() {
            Some(v) => (v.kind(), v.node_id().map(str::to_string)),
            None => ("error", None),
        };
        Self {
            index: failure.index,
            kind,
            node_id,
            message: failure.error.to_string(),
        }
    }
}

fn cmd_import(path: &Path, format: &str) -> Result<()> {
    let report = load_report(path)?;

    match format {
        "json" => {
            let summary = ImportSummary {
                imported: report
                    .conversations
                    .iter()
                    .map(|c| {
                        let legacy = to_legacy_format(c);
                        ImportedConversation {
                            id: c.id.clone(),
                            title: c.title.clone(),
                            messages: c.messages.len(),
                            created_at: legacy.created_at,
                            model_version: c.metadata.model_version.clone(),
                            file_path: c.metadata.file_path.clone(),
                        }
                    })
                    .collect(),
                failures: report.failures.iter().map(FailureSummary::from).collect(),
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        _ => {
            for conversation in &report.conversations {
                println!(
                    "  {}  {} message(s)  {}",
                    conversation.id,
                    conversation.messages.len(),
                    conversation.title
                );
            }
            for failure in &report.failures {
                println!("  item {} rejected: {}", failure.index, failure.error);
            }
            println!(
                "Imported {} of {} conversation(s)",
                report.conversations.len(),
                report.total()
            );
        }
    }

    if report.conversations.is_empty() && !report.failures.is_empty() {
        bail!("no conversations could be imported from {}", path.display());
    }
    Ok(())
}

fn cmd_rate(
    input: &Path,
    conversation_id: &str,
    score_args: &[String],
    notes: Option<String>,
    out: Option<&Path>,
) -> Result<()> {
    if score_args.is_empty() {
        bail!("at least one --score KEY=VALUE is required");
    }

    let report = load_report(input)?;
    let conversation = find_conversation(&report.conversations, conversation_id)?;

    let mut scores = BTreeMap::new();
    for arg in score_args {
        let (key, value) = parse_score_arg(arg)?;
        scores.insert(key, value);
    }

    let template = SurveyTemplate::default_template();
    let rating = Rating::new_human(conversation.id.clone(), &template, scores, notes)
        .context("rating rejected")?;

    let json = serde_json::to_string_pretty(&rating)?;
    match out {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Rated {} -> {}", rating.conversation_id, path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn parse_score_arg(arg: &str) -> Result<(String, f64)> {
    let (key, value) = arg
        .split_once('=')
        .with_context(|| format!("score `{}` is not KEY=VALUE", arg))?;
    let value: f64 = value
        .parse()
        .with_context(|| format!("score `{}` has a non-numeric value", arg))?;
    Ok((key.to_string(), value))
}

/// Exact id match first, then unique partial match.
fn find_conversation<'a>(
    conversations: &'a [ParsedConversation],
    id: &str,
) -> Result<&'a ParsedConversation> {
    if let Some(exact) = conversations.iter().find(|c| c.id == id) {
        return Ok(exact);
    }

    let matches: Vec<&ParsedConversation> =
        conversations.iter().filter(|c| c.id.contains(id)).collect();
    match matches.as_slice() {
        [] => bail!("no conversation found matching '{}'", id),
        [single] => Ok(*single),
        many => bail!("'{}' is ambiguous: {} conversations match", id, many.len()),
    }
}

fn cmd_export(input: &Path, rating_files: &[PathBuf], out: &Path) -> Result<()> {
    let report = load_report(input)?;
    if report.conversations.is_empty() {
        bail!("no conversations could be imported from {}", input.display());
    }

    let mut ratings = Vec::new();
    for path in rating_files {
        ratings.extend(read_ratings(path)?);
    }

    let records = build_dataset(&report.conversations, &ratings);
    let json = serde_json::to_string_pretty(&records)?;
    std::fs::write(out, json).with_context(|| format!("failed to write {}", out.display()))?;

    println!(
        "Exported {} record(s) ({} rating file(s)) -> {}",
        records.len(),
        rating_files.len(),
        out.display()
    );
    Ok(())
}

/// A ratings file holds either one rating or an array of them.
fn read_ratings(path: &Path) -> Result<Vec<Rating>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read ratings file {}", path.display()))?;

    if let Ok(many) = serde_json::from_str::<Vec<Rating>>(&text) {
        return Ok(many);
    }
    let single: Rating = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a rating or rating array", path.display()))?;
    Ok(vec![single])
}
