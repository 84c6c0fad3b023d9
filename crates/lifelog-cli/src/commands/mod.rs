pub mod auth;
pub mod config;
pub mod recap;
pub mod registry;
pub mod sync;
pub mod week;

use chrono::{NaiveDate, Utc};
use clap::Args;
use lifelog_core::calendar::WindowSelector;
use lifelog_core::storage::credentials;
use lifelog_core::integrations::{GoogleCalendarStore, NotionStore};
use lifelog_core::Config;
use serde::Serialize;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Which window a command works on. Defaults to last week.
#[derive(Args, Debug, Clone, Default)]
pub struct WindowArgs {
    /// The week containing today
    #[arg(long, conflicts_with_all = ["week", "month", "start"])]
    pub this_week: bool,
    /// Week number (1-53)
    #[arg(long, conflicts_with_all = ["month", "start"])]
    pub week: Option<u32>,
    /// Calendar month (1-12)
    #[arg(long, conflicts_with = "start")]
    pub month: Option<u32>,
    /// Year for --week or --month (default: current year)
    #[arg(long)]
    pub year: Option<i32>,
    /// First day of an explicit range (YYYY-MM-DD)
    #[arg(long, requires = "end")]
    pub start: Option<NaiveDate>,
    /// Last day of an explicit range (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    pub end: Option<NaiveDate>,
}

impl WindowArgs {
    pub fn selector(&self, today: NaiveDate) -> WindowSelector {
        use chrono::Datelike;
        let year = self.year.unwrap_or_else(|| today.year());
        if self.this_week {
            WindowSelector::ThisWeek
        } else if let Some(week) = self.week {
            WindowSelector::Week { week, year }
        } else if let Some(month) = self.month {
            WindowSelector::Month { month, year }
        } else if let (Some(start), Some(end)) = (self.start, self.end) {
            WindowSelector::Range { start, end }
        } else {
            WindowSelector::LastWeek
        }
    }
}

/// Today's civil date in the configured zone.
pub fn today(config: &Config) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    let tz = config.tz()?;
    Ok(Utc::now().with_timezone(&tz).date_naive())
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn notion_store(config: &Config) -> Result<NotionStore, Box<dyn std::error::Error>> {
    let token = credentials::require("notion_token")?;
    Ok(NotionStore::new(token, &config.notion.api_base)?)
}

pub fn google_store(config: &Config) -> Result<GoogleCalendarStore, Box<dyn std::error::Error>> {
    let token = credentials::require("google_token")?;
    Ok(GoogleCalendarStore::new(token, &config.google.api_base)?)
}
