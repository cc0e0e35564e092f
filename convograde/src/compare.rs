//! convograde-compare - generate AI comparison ratings for exports
//!
//! Runs the configured LLM over imported conversations with the same
//! survey template a human rater uses, and writes the resulting ratings
//! as JSON for `convograde export`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use convograde_core::compare::{build_prompt, compare_with_client, create_llm_client};
use convograde_core::import;
use convograde_core::rating::{Rating, SurveyTemplate};
use convograde_core::{Config, ParsedConversation};
use indicatif::ProgressBar;

#[derive(Parser)]
#[command(name = "convograde-compare")]
#[command(about = "Generate AI comparison ratings for conversation exports")]
#[command(version)]
struct Args {
    /// Export file, or directory of export files
    input: PathBuf,

    /// Conversation ID to compare (partial match supported).
    /// All imported conversations when omitted.
    #[arg(short, long)]
    conversation: Option<String>,

    /// Write the ratings JSON here instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Print the prompts that would be sent, without calling the LLM
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = convograde_core::logging::init(&config.logging)
        .context("failed to initialize logging")?;

    let report = if args.input.is_dir() {
        import::import_dir(&args.input)
    } else {
        import::import_file(&args.input)
    }
    .with_context(|| format!("failed to import {}", args.input.display()))?;

    for failure in &report.failures {
        eprintln!("skipping item {}: {}", failure.index, failure.error);
    }

    let conversations = filter_conversations(report.conversations, args.conversation.as_deref())?;
    if conversations.is_empty() {
        bail!("no conversations to compare in {}", args.input.display());
    }

    let template = SurveyTemplate::default_template();

    if args.dry_run {
        for conversation in &conversations {
            println!("--- {} ---", conversation.id);
            println!("{}", build_prompt(conversation, &template));
        }
        return Ok(());
    }

    let llm = config
        .llm
        .context("no [llm] section in config; add one to run comparisons")?;
    let client = create_llm_client(&llm).context("failed to create LLM client")?;

    println!("Comparing {} conversation(s)...", conversations.len());
    let progress = ProgressBar::new(conversations.len() as u64);

    let mut ratings: Vec<Rating> = Vec::new();
    for conversation in &conversations {
        match compare_with_client(conversation, &template, &llm, client.as_ref()) {
            Ok(rating) => ratings.push(rating),
            Err(e) => {
                tracing::warn!(conversation = %conversation.id, error = %e, "comparison failed");
                eprintln!("comparison failed for {}: {}", conversation.id, e);
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    if ratings.is_empty() {
        bail!("no comparisons succeeded");
    }

    let json = serde_json::to_string_pretty(&ratings)?;
    match args.out {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {} rating(s) -> {}", ratings.len(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn filter_conversations(
    conversations: Vec<ParsedConversation>,
    id: Option<&str>,
) -> Result<Vec<ParsedConversation>> {
    let Some(id) = id else {
        return Ok(conversations);
    };

    let matches: Vec<ParsedConversation> = conversations
        .into_iter()
        .filter(|c| c.id == id || c.id.contains(id))
        .collect();
    if matches.is_empty() {
        bail!("no conversation found matching '{}'", id);
    }
    Ok(matches)
}
