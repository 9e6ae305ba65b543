//! Sync command implementation.
//!
//! Loads records from the document database (or a JSON export), turns them
//! into tokens, and reconciles them into a collection of the local store.

use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use super::open_storage;
use crate::cli::SyncArgs;
use crate::config::{load_config, Settings};
use crate::error::{Error, Result};
use crate::model::Token;
use crate::source::{DocumentSource, FileSource, NotionSource, RecordQuery};
use crate::sync::{sync_collection, Progress, ProgressSink, SyncOptions, SyncSummary};
use crate::tokens::{FieldMapping, TokenTransformer};

/// Progress sink that reports through the log.
struct LogProgress;

impl ProgressSink for LogProgress {
    fn on_progress(&mut self, progress: Progress) {
        info!(
            stage = %progress.stage,
            done = progress.done,
            total = progress.total,
            "Sync progress"
        );
    }
}

/// Everything a run needs besides the source.
struct Plan<'a> {
    args: &'a SyncArgs,
    mapping: FieldMapping,
    collection: String,
    options: SyncOptions,
    db_path: Option<&'a PathBuf>,
    actor: Option<&'a str>,
    json: bool,
}

/// Execute the sync command.
///
/// # Errors
///
/// Returns batch-level failures only; per-token failures are reported in
/// the printed summary.
pub fn execute(
    args: &SyncArgs,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let settings = load_config()?;
    let plan = Plan {
        args,
        mapping: settings.field_mapping(&args.mappings)?,
        collection: settings.collection(args.collection.as_deref()),
        options: SyncOptions {
            overwrite_existing: args.overwrite,
            prune_unmatched: args.prune,
            progress_interval: settings.progress_interval(),
        },
        db_path,
        actor,
        json,
    };

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;

    if let Some(input) = &args.input {
        let source = FileSource::open(input)?;
        info!(path = %input.display(), records = source.len(), "Loaded record file");
        rt.block_on(run(&source, RecordQuery::default(), &plan))
    } else {
        let source = notion_source(&settings);
        let query = RecordQuery::new(settings.database_id(args.database.as_deref())?);
        rt.block_on(run(&source, query, &plan))
    }
}

fn notion_source(settings: &Settings) -> NotionSource {
    let config = settings.notion_config();
    if config.token.is_none() {
        info!(base_url = %config.base_url, "No token configured, relying on proxy authentication");
    }
    NotionSource::new(config)
}

async fn run<S: DocumentSource>(source: &S, query: RecordQuery, plan: &Plan<'_>) -> Result<()> {
    let query = match &plan.args.sort {
        Some(field) => query.sorted_by(field),
        None => query,
    };

    let records = source.query_records(&query).await?;
    info!(records = records.len(), "Fetched records");
    if records.is_empty() {
        return Err(Error::EmptyBatch);
    }

    let tokens = TokenTransformer::new(&plan.mapping)
        .transform(&records, source)
        .await;

    if plan.args.dry_run {
        return print_tokens(&tokens, plan.json);
    }

    let mut storage = open_storage(plan.db_path, plan.actor)?;
    let summary = sync_collection(
        &mut storage,
        &plan.collection,
        &tokens,
        &plan.options,
        &mut LogProgress,
    )
    .await?;

    print_summary(&plan.collection, &summary, plan.json)
}

fn print_tokens(tokens: &[Token], json: bool) -> Result<()> {
    if json {
        let output = serde_json::json!({
            "dry_run": true,
            "count": tokens.len(),
            "tokens": tokens,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("{} ({} tokens, nothing written)", "Dry run".bold(), tokens.len());
    println!();
    for token in tokens {
        let description = token
            .description
            .as_deref()
            .map(|d| format!("  {}", d.dimmed()))
            .unwrap_or_default();
        println!(
            "  {:<40} {:<8} {}{description}",
            token.full_name(),
            token.token_type.as_str(),
            token.value
        );
    }
    Ok(())
}

fn print_summary(collection: &str, summary: &SyncSummary, json: bool) -> Result<()> {
    if json {
        let output = serde_json::json!({
            "success": !summary.has_failures(),
            "collection": collection,
            "summary": summary,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    let heading = format!("Synced '{collection}': {summary}");
    if summary.has_failures() {
        println!("{}", heading.yellow().bold());
    } else {
        println!("{}", heading.green().bold());
    }
    println!();
    println!("  Created:  {}", summary.created);
    println!("  Updated:  {}", summary.overwritten);
    println!("  Skipped:  {}", summary.skipped);
    println!("  Deleted:  {}", summary.deleted);
    println!("  Failed:   {}", summary.failed);

    if !summary.errors.is_empty() {
        println!();
        println!("{}", "Failures".red().bold());
        for error in &summary.errors {
            println!("  {} {}: {}", "✗".red(), error.name.bold(), error.reason);
        }
    }

    if !summary.warnings.is_empty() {
        println!();
        println!("{}", "Warnings".yellow().bold());
        for warning in &summary.warnings {
            println!("  {} {warning}", "!".yellow());
        }
    }

    Ok(())
}
