//! Sync subcommand: move source items into the destination store.
//!
//! Each named source is written to the collection with the same alias
//! (`[collections] sleep = "..."`). Tracker exports come in through
//! `--input <source>=<file>`; commits come from the commit search API unless
//! an input file is given. `mirror:<bucket>` copies a collection bucket onto
//! a calendar.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use lifelog_core::integrations::GitHubCommitFeed;
use lifelog_core::registry::Origin;
use lifelog_core::sources::{
    BodyWeightSource, CalendarMirrorSource, CodingSource, FileFeed, SleepSource, WorkoutSource,
};
use lifelog_core::storage::credentials;
use lifelog_core::sync::{
    CalendarSink, CollectionSink, DestinationStore, DryRunSink, RawFeed, SyncJob, SyncOrchestrator,
    SyncRunResult, SyncSink, SyncSource,
};
use lifelog_core::{Config, ConfigError};
use tracing::info;

use super::{google_store, notion_store, print_json, today, CliResult, WindowArgs};

const SOURCES: &str = "sleep, workouts, body_weight, coding, mirror:<bucket>";

#[derive(Args)]
pub struct SyncArgs {
    /// Sources to sync (sleep, workouts, body_weight, coding, mirror:<bucket>)
    #[arg(required = true)]
    pub sources: Vec<String>,
    #[command(flatten)]
    pub window: WindowArgs,
    /// Raw export for a source, as <source>=<path>; repeatable
    #[arg(long, value_name = "SOURCE=FILE")]
    pub input: Vec<String>,
    /// Calendar alias that mirror sources write to
    #[arg(long, default_value = "mirror")]
    pub calendar: String,
    /// Check for existing records but write nothing
    #[arg(long)]
    pub dry_run: bool,
}

fn parse_inputs(raw: &[String]) -> Result<BTreeMap<String, PathBuf>, ConfigError> {
    raw.iter()
        .map(|entry| {
            entry
                .split_once('=')
                .map(|(name, path)| (name.to_string(), PathBuf::from(path)))
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: "--input".into(),
                    message: format!("expected <source>=<file>, got '{entry}'"),
                })
        })
        .collect()
}

fn wrap<S: SyncSink + 'static>(sink: S, dry_run: bool) -> Box<dyn SyncSink> {
    if dry_run {
        Box::new(DryRunSink::new(sink))
    } else {
        Box::new(sink)
    }
}

/// Everything needed to build jobs, resolved before any request is made.
struct Plan {
    sources: Vec<Box<dyn SyncSource>>,
    sinks: Vec<Box<dyn SyncSink>>,
}

fn plan(args: &SyncArgs, config: &Config) -> Result<Plan, Box<dyn std::error::Error>> {
    let tz = config.tz()?;
    let inputs = parse_inputs(&args.input)?;
    let file_feed = |name: &str| -> Result<Arc<dyn RawFeed>, ConfigError> {
        inputs
            .get(name)
            .map(|path| Arc::new(FileFeed::new(path.clone())) as Arc<dyn RawFeed>)
            .ok_or_else(|| ConfigError::MissingKey(format!("--input {name}=<file>")))
    };

    let notion: Arc<dyn DestinationStore> = Arc::new(notion_store(config)?);
    let mut plan = Plan {
        sources: Vec::new(),
        sinks: Vec::new(),
    };

    for name in &args.sources {
        let name = name.as_str();
        let source: Box<dyn SyncSource> = match name {
            "sleep" => Box::new(SleepSource::new(
                file_feed(name)?,
                tz,
                config.late_wake_threshold_hour,
            )),
            "workouts" => Box::new(WorkoutSource::new(file_feed(name)?)),
            "body_weight" => Box::new(BodyWeightSource::new(file_feed(name)?, tz)),
            "coding" => {
                let feed: Arc<dyn RawFeed> = match file_feed(name) {
                    Ok(feed) => feed,
                    Err(_) => Arc::new(GitHubCommitFeed::new(
                        config.require("github.author")?,
                        credentials::get("github_token")?,
                        &config.github.api_base,
                    )?),
                };
                Box::new(CodingSource::new(feed, tz))
            }
            other => match other.strip_prefix("mirror:") {
                Some(bucket_id) => {
                    let (source, sink) = mirror(bucket_id, args, config, &notion)?;
                    plan.sources.push(source);
                    plan.sinks.push(sink);
                    continue;
                }
                None => {
                    return Err(format!("Unknown source: {other}. Valid sources: {SOURCES}").into())
                }
            },
        };
        let collection = config.collection(name)?;
        let sink = wrap(CollectionSink::new(notion.clone(), collection), args.dry_run);
        plan.sources.push(source);
        plan.sinks.push(sink);
    }
    Ok(plan)
}

fn mirror(
    bucket_id: &str,
    args: &SyncArgs,
    config: &Config,
    notion: &Arc<dyn DestinationStore>,
) -> Result<(Box<dyn SyncSource>, Box<dyn SyncSink>), Box<dyn std::error::Error>> {
    let registry = config.registry()?;
    let bucket = registry
        .bucket(bucket_id)
        .ok_or_else(|| format!("Unknown bucket: {bucket_id}"))?;
    let Origin::Collection {
        collection,
        date_property,
        title_property,
        hours_property,
        ..
    } = &bucket.origin
    else {
        return Err(format!("Bucket {bucket_id} is already a calendar").into());
    };

    let mut source = CalendarMirrorSource::new(
        format!("mirror:{bucket_id}"),
        notion.clone(),
        config.collection(collection)?,
        date_property.clone(),
    )
    .with_title_property(title_property.clone());
    if let Some(hours) = hours_property {
        source = source.with_hours_property(hours.clone());
    }

    let calendar_id = config.calendar(&args.calendar)?;
    let google = Arc::new(google_store(config)?);
    let sink = CalendarSink::new(google, calendar_id)
        .with_padding_days(config.sync.fetch_padding_days);
    Ok((Box::new(source), wrap(sink, args.dry_run)))
}

fn print_human(results: &[SyncRunResult], dry_run: bool) {
    if dry_run {
        println!("Dry run: nothing was written.");
    }
    for result in results {
        if let Some(err) = &result.fetch_error {
            println!("{}: fetch failed: {err}", result.source);
            continue;
        }
        println!(
            "{}: {} created, {} skipped, {} errors",
            result.source,
            result.created.len(),
            result.skipped.len(),
            result.errors.len()
        );
        for record in &result.errors {
            println!(
                "  {}: {}",
                record.external_id,
                record.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}

pub async fn run(args: SyncArgs, json: bool) -> CliResult {
    let config = Config::load()?;
    let today = today(&config)?;
    let resolved = args.window.selector(today).resolve(today)?;
    let plan = plan(&args, &config)?;
    info!(sources = plan.sources.len(), window = %resolved.window, dry_run = args.dry_run, "starting sync");

    let jobs: Vec<SyncJob<'_>> = plan
        .sources
        .iter()
        .zip(&plan.sinks)
        .map(|(source, sink)| SyncJob::new(source.as_ref(), sink.as_ref()))
        .collect();
    let orchestrator = SyncOrchestrator::new(config.backoff());
    let results = orchestrator.run_many(&jobs, &resolved.window).await;

    if json {
        print_json(&results)
    } else {
        println!("Window: {}", resolved.window);
        print_human(&results, args.dry_run);
        Ok(())
    }
}
