use std::sync::Arc;

use chrono::Datelike;
use clap::{Args, Subcommand};
use lifelog_core::recap::{
    EventCollector, MonthWeekResolver, RecapAction as Written, RecapReport, RecapService,
    RecapWriter,
};
use lifelog_core::registry::Origin;
use lifelog_core::sync::{CalendarStore, DestinationStore, MemoryStore};
use lifelog_core::{Aggregator, Categorizer, Config};

use super::{google_store, notion_store, print_json, today, CliResult, WindowArgs};

#[derive(Args)]
pub struct RecapOptions {
    /// Summary groups to include, comma separated (default: all)
    #[arg(long, value_delimiter = ',')]
    pub groups: Vec<String>,
    /// Compute and print without writing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Subcommand)]
pub enum RecapAction {
    /// Recap one week (default: last week)
    Week {
        #[command(flatten)]
        window: WindowArgs,
        #[command(flatten)]
        options: RecapOptions,
    },
    /// Recap one calendar month
    Month {
        /// Month (1-12)
        month: u32,
        /// Year (default: current year)
        #[arg(long)]
        year: Option<i32>,
        #[command(flatten)]
        options: RecapOptions,
    },
}

fn service(
    config: &Config,
    options: &RecapOptions,
) -> Result<RecapService, Box<dyn std::error::Error>> {
    let registry = Arc::new(config.registry()?);

    let selected = registry.select(&options.groups)?;
    let needs_calendar = registry
        .buckets_for(&selected)
        .iter()
        .any(|b| matches!(b.origin, Origin::Calendar { .. }));

    let notion: Arc<dyn DestinationStore> = Arc::new(notion_store(config)?);
    // Without calendar buckets the store is never asked, so no token is needed.
    let calendars: Arc<dyn CalendarStore> = if needs_calendar {
        Arc::new(google_store(config)?)
    } else {
        Arc::new(MemoryStore::new())
    };

    let collector = EventCollector::new(notion.clone(), calendars, config.tz()?)
        .with_aliases(config.collections.clone(), config.calendars.clone())
        .with_padding_days(config.sync.fetch_padding_days);
    let weeks = RecapWriter::new(notion.clone(), config.collection("week_recaps")?);
    let months = RecapWriter::new(notion.clone(), config.collection("month_recaps")?);

    Ok(RecapService::new(
        collector,
        Aggregator::new(Categorizer::new(registry)),
        weeks,
        months,
        MonthWeekResolver::new(notion),
    )
    .dry_run(options.dry_run))
}

fn print_human(report: &RecapReport) {
    println!("{} ({})", report.title, report.window.window);
    match &report.written {
        Some(w) if w.action == Written::Created => println!("Created recap {}", w.record_id),
        Some(w) => println!("Updated recap {}", w.record_id),
        None => println!("Dry run: nothing was written."),
    }
    for (category, totals) in &report.aggregate.per_category {
        let mut line = format!("  {category}: {} days", totals.days);
        if let Some(sessions) = totals.sessions {
            line.push_str(&format!(", {sessions} sessions"));
        }
        if let Some(hours) = totals.hours_total {
            line.push_str(&format!(", {hours} hours"));
        }
        println!("{line}");
    }
    if let Some(weeks) = &report.weeks {
        println!("  weeks ({:?}): {}", weeks.source, weeks.weeks.len());
    }
    for error in &report.bucket_errors {
        println!("  {} failed: {}", error.bucket, error.message);
    }
}

pub async fn run(action: RecapAction, json: bool) -> CliResult {
    let config = Config::load()?;
    let report = match &action {
        RecapAction::Week { window, options } => {
            let today = today(&config)?;
            let service = service(&config, options)?;
            service
                .week_recap(window.selector(today), today, &options.groups)
                .await?
        }
        RecapAction::Month {
            month,
            year,
            options,
        } => {
            let year = match year {
                Some(year) => *year,
                None => today(&config)?.year(),
            };
            let service = service(&config, options)?;
            service.month_recap(*month, year, &options.groups).await?
        }
    };

    if json {
        print_json(&report)
    } else {
        print_human(&report);
        Ok(())
    }
}
