//! Week and month recaps: collect, aggregate, write.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use super::collector::{BucketError, EventCollector};
use super::months::{MonthWeekResolver, MonthWeeks, WeekSource, WEEKS_RELATION_PROPERTY};
use super::writer::{RecapWriter, WrittenRecap};
use crate::aggregate::{AggregateResult, Aggregator};
use crate::calendar::{Period, ResolvedWindow, TimeWindow, WindowSelector};
use crate::error::{CoreError, ValidationError};

/// Everything a recap run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecapReport {
    pub title: String,
    pub window: ResolvedWindow,
    pub aggregate: AggregateResult,
    /// `None` on a dry run.
    pub written: Option<WrittenRecap>,
    pub bucket_errors: Vec<BucketError>,
    /// Weeks of a month recap and where they came from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weeks: Option<MonthWeeks>,
}

pub struct RecapService {
    collector: EventCollector,
    aggregator: Aggregator,
    weeks: RecapWriter,
    months: RecapWriter,
    resolver: MonthWeekResolver,
    dry_run: bool,
}

impl RecapService {
    pub fn new(
        collector: EventCollector,
        aggregator: Aggregator,
        weeks: RecapWriter,
        months: RecapWriter,
        resolver: MonthWeekResolver,
    ) -> Self {
        Self {
            collector,
            aggregator,
            weeks,
            months,
            resolver,
            dry_run: false,
        }
    }

    /// Compute but never write.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    async fn build(
        &self,
        resolved: ResolvedWindow,
        groups: &[String],
        writer: &RecapWriter,
    ) -> Result<RecapReport, CoreError> {
        let registry = self.aggregator.categorizer().registry().clone();
        let selected = registry.select(groups)?;
        let buckets = registry.buckets_for(&selected);

        let collected = self.collector.collect(&buckets, &resolved.window).await?;
        let aggregate = self
            .aggregator
            .aggregate(&collected.events, &resolved.window, &selected);

        let title = resolved.title();
        let written = if self.dry_run {
            None
        } else {
            let values = aggregate.metric_values(&selected);
            Some(writer.upsert(&title, &resolved.window, values).await?)
        };

        info!(
            %title,
            categories = aggregate.per_category.len(),
            bucket_errors = collected.errors.len(),
            dry_run = self.dry_run,
            "recap complete"
        );
        Ok(RecapReport {
            title,
            window: resolved,
            aggregate,
            written,
            bucket_errors: collected.errors,
            weeks: None,
        })
    }

    /// Recap of the week picked by `selector`.
    pub async fn week_recap(
        &self,
        selector: WindowSelector,
        today: NaiveDate,
        groups: &[String],
    ) -> Result<RecapReport, CoreError> {
        let resolved = selector.resolve(today)?;
        if !matches!(resolved.period, Period::Week { .. }) {
            return Err(ValidationError::InvalidValue {
                field: "window".into(),
                message: "a week recap needs a week window".into(),
            }
            .into());
        }
        self.build(resolved, groups, &self.weeks).await
    }

    /// Recap of a month, linked to the week recaps it spans.
    pub async fn month_recap(
        &self,
        month: u32,
        year: i32,
        groups: &[String],
    ) -> Result<RecapReport, CoreError> {
        let resolved = ResolvedWindow {
            window: TimeWindow::month(month, year)?,
            period: Period::Month { month, year },
        };
        let mut report = self.build(resolved, groups, &self.months).await?;

        let record_id = report.written.as_ref().map(|w| w.record_id.clone());
        let weeks = self
            .resolver
            .resolve(month, year, record_id.as_deref())
            .await?;

        if let (Some(record_id), WeekSource::Computed) = (&record_id, weeks.source) {
            self.link_weeks(record_id, &weeks).await;
        }
        report.weeks = Some(weeks);
        Ok(report)
    }

    /// Relate the month record to the week recaps that already exist.
    async fn link_weeks(&self, record_id: &str, weeks: &MonthWeeks) {
        let mut related = Vec::new();
        for week in &weeks.weeks {
            let title = match WindowSelector::ThisWeek.resolve(week.start) {
                Ok(resolved) => resolved.title(),
                Err(e) => {
                    warn!(week = %week, error = %e, "cannot number week");
                    continue;
                }
            };
            match self.weeks.find(&title).await {
                Ok(Some(id)) => related.push(id),
                Ok(None) => {}
                Err(e) => warn!(%title, error = %e, "week recap lookup failed"),
            }
        }
        if related.is_empty() {
            return;
        }
        if let Err(e) = self
            .months
            .link(record_id, WEEKS_RELATION_PROPERTY, related)
            .await
        {
            warn!(record = %record_id, error = %e, "linking weeks failed");
        }
    }
}
