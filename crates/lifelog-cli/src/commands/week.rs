use chrono::{Datelike, NaiveDate, Utc};
use clap::Subcommand;
use lifelog_core::calendar::{month_to_weeks, week_number_of, week_window};
use serde_json::json;

use super::{print_json, CliResult};

#[derive(Subcommand)]
pub enum WeekAction {
    /// Dates of week N
    Window {
        /// Week number (1-53)
        week: u32,
        /// Year (default: current year)
        #[arg(long)]
        year: Option<i32>,
    },
    /// Week number of a date
    Number {
        /// Date (YYYY-MM-DD)
        date: NaiveDate,
        /// Year the numbering is relative to (default: the date's year)
        #[arg(long)]
        year: Option<i32>,
    },
    /// Weeks overlapping a month
    Month {
        /// Month (1-12)
        month: u32,
        /// Year (default: current year)
        #[arg(long)]
        year: Option<i32>,
    },
}

fn current_year() -> i32 {
    Utc::now().year()
}

pub fn run(action: WeekAction, json: bool) -> CliResult {
    match action {
        WeekAction::Window { week, year } => {
            let year = year.unwrap_or_else(current_year);
            let window = week_window(week, year)?;
            if json {
                print_json(&json!({ "week": week, "year": year, "start": window.start, "end": window.end }))?;
            } else {
                println!("Week {week} {year}: {window}");
            }
        }
        WeekAction::Number { date, year } => {
            let year = year.unwrap_or(date.year());
            let week = week_number_of(date, year)?;
            if json {
                print_json(&json!({ "date": date, "context_year": year, "week": week }))?;
            } else {
                println!("{week}");
            }
        }
        WeekAction::Month { month, year } => {
            let year = year.unwrap_or_else(current_year);
            let weeks = month_to_weeks(month, year)?;
            if json {
                print_json(&weeks)?;
            } else {
                for window in weeks {
                    println!("{window}");
                }
            }
        }
    }
    Ok(())
}
