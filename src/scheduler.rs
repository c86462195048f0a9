use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info};

use crate::api::{fetch_all_crimes, FactionApi};
use crate::config::{ReportMode, Targets};
use crate::error::Result;
use crate::models::{Member, ReportKind};
use crate::report::{render_report, NO_MATCHING_MEMBERS};
use crate::select::{member_ids, select_members};
use crate::sink::ReportSink;
use crate::stats::StatisticsIndex;

pub type Clock = fn() -> DateTime<FixedOffset>;

pub fn local_now() -> DateTime<FixedOffset> {
    let now = Local::now();
    now.with_timezone(now.offset())
}

/// Newest last-action timestamp on the roster, skipping members the API
/// reports without one.
fn latest_activity(roster: &[Member]) -> Option<i64> {
    roster
        .iter()
        .map(|member| member.last_action.timestamp)
        .filter(|timestamp| *timestamp > 0)
        .max()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub members: usize,
    pub crimes: usize,
    pub reports: usize,
    pub rows: usize,
}

pub struct ReportRunner<A, S> {
    api: A,
    sink: S,
    mode: ReportMode,
    targets: Targets,
    clock: Clock,
}

impl<A: FactionApi, S: ReportSink> ReportRunner<A, S> {
    pub fn new(api: A, sink: S, mode: ReportMode, targets: Targets, clock: Clock) -> Self {
        Self {
            api,
            sink,
            mode,
            targets,
            clock,
        }
    }

    /// Fetches, reduces, renders and emits every report the mode asks for.
    ///
    /// Fetch errors abort the pass. A sink failure for one report is logged
    /// and the remaining reports are still emitted; the first such failure is
    /// returned once all of them were attempted.
    pub async fn run_pass(&self) -> Result<PassSummary> {
        let roster = self.api.fetch_members().await?;
        let kinds = self.mode.kinds();
        let selections: Vec<(ReportKind, Vec<Member>)> = kinds
            .iter()
            .map(|kind| (*kind, select_members(&roster, *kind)))
            .collect();
        info!(
            members = roster.len(),
            latest_activity = latest_activity(&roster),
            mode = ?self.mode,
            "fetched roster"
        );

        let mut summary = PassSummary {
            members: roster.len(),
            ..PassSummary::default()
        };

        let filter = match selections.as_slice() {
            [(kind, selection)] => {
                if selection.is_empty() {
                    info!(report = kind.label(), "no matching members");
                    let lines = vec![NO_MATCHING_MEMBERS.to_string()];
                    self.sink
                        .emit(*kind, self.targets.for_kind(*kind), &lines)
                        .await?;
                    summary.rows = lines.len();
                    return Ok(summary);
                }
                Some(member_ids(selection))
            }
            _ => None,
        };

        let crimes = fetch_all_crimes(&self.api).await?;
        summary.crimes = crimes.len();
        let index = StatisticsIndex::build(&crimes, filter.as_ref());
        info!(crimes = crimes.len(), entries = index.len(), "built participation index");

        let generated_at = (self.clock)();
        let mut first_failure = None;
        for (kind, selection) in &selections {
            let lines = render_report(selection, &index, generated_at);
            let target = self.targets.for_kind(*kind);
            match self.sink.emit(*kind, target, &lines).await {
                Ok(()) => {
                    summary.reports += 1;
                    summary.rows += lines.len();
                }
                Err(err) => {
                    error!(report = kind.label(), range = target, error = %err, "emit failed");
                    first_failure.get_or_insert(err);
                }
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(summary),
        }
    }

    /// Runs one pass now and, with a non-zero `interval`, keeps running one
    /// per period until the process exits. Passes never overlap: a slow pass
    /// delays the next tick.
    pub async fn run(&self, interval: Option<Duration>) {
        self.run_logged().await;

        let Some(period) = interval.filter(|period| !period.is_zero()) else {
            return;
        };
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.run_logged().await;
        }
    }

    async fn run_logged(&self) {
        let started = std::time::Instant::now();
        match self.run_pass().await {
            Ok(summary) => info!(
                members = summary.members,
                reports = summary.reports,
                rows = summary.rows,
                crimes = summary.crimes,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "report pass finished"
            ),
            Err(err) => error!(error = %err, "report pass failed"),
        }
    }
}
