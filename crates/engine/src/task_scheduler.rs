// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduled-task due-time computation (§4.10's jobs side of the cron sync
//! story; the task store itself lives in `patze-storage`).
//!
//! No cron crate appears anywhere in this codebase family, so rather than
//! pull in an ungrounded dependency this module hand-rolls a minimal
//! evaluator covering the subset of cron syntax actually needed: `*`,
//! `*/step`, and comma-separated explicit values per field. Ranges (`a-b`)
//! are not supported; an expression using one is rejected rather than
//! silently mis-evaluated.

use chrono::{DateTime, Duration, Timelike, Datelike, Utc};

use patze_core::{Schedule, ScheduledTask, TaskStatus};

/// Upper bound on how far ahead the cron evaluator will search for a match,
/// so a malformed or never-matching expression can't spin forever.
const CRON_SEARCH_LIMIT_MINUTES: i64 = 366 * 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CronField {
    Any,
    Step(u32),
    List,
}

fn parse_field(raw: &str, values: &mut Vec<u32>) -> Option<CronField> {
    if raw == "*" {
        return Some(CronField::Any);
    }
    if let Some(step) = raw.strip_prefix("*/") {
        return step.parse().ok().map(CronField::Step);
    }
    for part in raw.split(',') {
        values.push(part.parse().ok()?);
    }
    Some(CronField::List)
}

fn field_matches(field: &CronField, values: &[u32], candidate: u32) -> bool {
    match field {
        CronField::Any => true,
        CronField::Step(step) => *step != 0 && candidate % step == 0,
        CronField::List => values.contains(&candidate),
    }
}

struct CronExpr {
    minute: (CronField, Vec<u32>),
    hour: (CronField, Vec<u32>),
    day_of_month: (CronField, Vec<u32>),
    month: (CronField, Vec<u32>),
    day_of_week: (CronField, Vec<u32>),
}

fn parse_cron(expr: &str) -> Option<CronExpr> {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    if fields.len() != 5 {
        return None;
    }
    let mut parse = |raw: &str| -> Option<(CronField, Vec<u32>)> {
        let mut values = Vec::new();
        let field = parse_field(raw, &mut values)?;
        Some((field, values))
    };
    Some(CronExpr {
        minute: parse(fields[0])?,
        hour: parse(fields[1])?,
        day_of_month: parse(fields[2])?,
        month: parse(fields[3])?,
        day_of_week: parse(fields[4])?,
    })
}

fn cron_matches(cron: &CronExpr, ts: DateTime<Utc>) -> bool {
    field_matches(&cron.minute.0, &cron.minute.1, ts.minute())
        && field_matches(&cron.hour.0, &cron.hour.1, ts.hour())
        && field_matches(&cron.day_of_month.0, &cron.day_of_month.1, ts.day())
        && field_matches(&cron.month.0, &cron.month.1, ts.month())
        && field_matches(&cron.day_of_week.0, &cron.day_of_week.1, ts.weekday().num_days_from_sunday())
}

fn next_cron_run(expr: &str, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let cron = parse_cron(expr)?;
    let mut candidate = (after + Duration::minutes(1))
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))?;
    for _ in 0..CRON_SEARCH_LIMIT_MINUTES {
        if cron_matches(&cron, candidate) {
            return Some(candidate);
        }
        candidate += Duration::minutes(1);
    }
    None
}

/// The next time `task` should fire after `now`, or `None` if it has no
/// further runs scheduled (a fired one-shot `at`, or an unparseable cron).
pub fn schedule_next_run_at(task: &ScheduledTask, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match &task.schedule {
        Schedule::At { at } => {
            if !task.runs.is_empty() {
                None
            } else {
                Some(*at)
            }
        }
        Schedule::Every { interval_ms } => {
            if *interval_ms == 0 {
                return None;
            }
            let interval = Duration::milliseconds(*interval_ms as i64);
            let anchor = task.runs.last().map(|r| r.finished_at).unwrap_or(task.created_at);
            let mut next = anchor + interval;
            while next <= now {
                next += interval;
            }
            Some(next)
        }
        Schedule::Cron { expr } => next_cron_run(expr, now),
    }
}

/// Enabled tasks whose `nextRunAt` has arrived, in their given order.
pub fn due_tasks(tasks: &[ScheduledTask], now: DateTime<Utc>) -> Vec<&ScheduledTask> {
    tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Enabled)
        .filter(|t| t.next_run_at.is_some_and(|next| next <= now))
        .collect()
}

#[cfg(test)]
#[path = "task_scheduler_tests.rs"]
mod tests;
