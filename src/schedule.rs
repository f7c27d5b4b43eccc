use chrono::{Duration as ChronoDuration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoStatus {
    NotStarted,
    InProgress,
    Completed,
    Rewatch,
}

impl VideoStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VideoStatus::NotStarted => "Not Started",
            VideoStatus::InProgress => "In Progress",
            VideoStatus::Completed => "Completed",
            VideoStatus::Rewatch => "Rewatch",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Not Started" => Some(VideoStatus::NotStarted),
            "In Progress" => Some(VideoStatus::InProgress),
            "Completed" => Some(VideoStatus::Completed),
            "Rewatch" => Some(VideoStatus::Rewatch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleError {
    pub code: String,
    pub message: String,
}

impl ScheduleError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Scheduler input: identity plus an immutable duration. Order is the
/// caller's; the packer never reorders.
#[derive(Debug, Clone)]
pub struct ScheduleItem {
    pub id: String,
    pub duration_seconds: i64,
}

/// Scheduler output, produced fresh on every run and applied by overwriting
/// each video's scheduled date in full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub item_id: String,
    pub date: NaiveDate,
}

/// Greedy day packer shared by both scheduling modes.
///
/// Walks items in order keeping a running day total. When the next item would
/// push a non-empty day past the budget, the cursor advances one day and the
/// total resets. An item that alone exceeds the budget still lands on the
/// current day if it is empty, so the first item always gets `start_date`
/// and an oversized item fills a day by itself rather than looping.
/// A zero budget is legal here (target-date mode can derive it): every
/// positive-duration item then opens a fresh day, while zero-duration items
/// accumulate without forcing an advance.
fn pack(items: &[ScheduleItem], daily_budget_seconds: i64, start_date: NaiveDate) -> Vec<Assignment> {
    let mut out = Vec::with_capacity(items.len());
    let mut day_cursor = start_date;
    let mut day_total: i64 = 0;

    for item in items {
        if day_total > 0 && day_total + item.duration_seconds > daily_budget_seconds {
            day_cursor = day_cursor + ChronoDuration::days(1);
            day_total = 0;
        }
        out.push(Assignment {
            item_id: item.id.clone(),
            date: day_cursor,
        });
        day_total += item.duration_seconds;
    }

    out
}

/// Assign each item to a day so that no day's cumulative duration exceeds
/// `daily_budget_seconds`, except for singleton overflow (one item bigger
/// than the whole budget placed alone). The first item always gets
/// `start_date`; assigned dates are non-decreasing in item order.
pub fn by_daily_budget(
    items: &[ScheduleItem],
    daily_budget_seconds: i64,
    start_date: NaiveDate,
) -> Result<Vec<Assignment>, ScheduleError> {
    if daily_budget_seconds <= 0 {
        return Err(ScheduleError::new(
            "invalid_budget",
            format!("daily budget must be positive, got {}", daily_budget_seconds),
        ));
    }
    Ok(pack(items, daily_budget_seconds, start_date))
}

/// Derive a per-day budget from the total duration spread over the inclusive
/// day span, then pack with the same rule as [`by_daily_budget`].
///
/// The derived budget is floor(total / days): it never overshoots the
/// duration/days ratio, which biases the packer toward spilling slightly past
/// `end_date` rather than under-filling days. The end date is a best-effort
/// target, not a deadline. A derived budget of zero (tiny total duration,
/// large day span) is deliberately not clamped: each positive-duration item
/// then lands on its own successive day.
pub fn by_target_date(
    items: &[ScheduleItem],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<Assignment>, ScheduleError> {
    if end_date < start_date {
        return Err(ScheduleError::new(
            "invalid_date_range",
            format!("end date {} is before start date {}", end_date, start_date),
        ));
    }
    let total_duration: i64 = items.iter().map(|i| i.duration_seconds).sum();
    let total_days = (end_date - start_date).num_days() + 1;
    let derived_budget = total_duration / total_days;
    Ok(pack(items, derived_budget, start_date))
}

/// Analyzer input: one playlist's videos as a consistent snapshot.
#[derive(Debug, Clone)]
pub struct VideoSnapshot {
    pub id: String,
    pub title: String,
    pub duration_seconds: i64,
    pub status: VideoStatus,
    pub scheduled_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSummary {
    pub total: usize,
    pub completed: usize,
    pub percentage: f64,
}

pub fn completion_summary(items: &[VideoSnapshot]) -> CompletionSummary {
    let total = items.len();
    let completed = items
        .iter()
        .filter(|v| v.status == VideoStatus::Completed)
        .count();
    let percentage = if total == 0 {
        0.0
    } else {
        round2(100.0 * completed as f64 / total as f64)
    };
    CompletionSummary {
        total,
        completed,
        percentage,
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchTimeSummary {
    pub total_seconds: i64,
    pub completed_seconds: i64,
    pub remaining_seconds: i64,
}

pub fn watch_time_summary(items: &[VideoSnapshot]) -> WatchTimeSummary {
    let total_seconds: i64 = items.iter().map(|v| v.duration_seconds).sum();
    let completed_seconds: i64 = items
        .iter()
        .filter(|v| v.status == VideoStatus::Completed)
        .map(|v| v.duration_seconds)
        .sum();
    WatchTimeSummary {
        total_seconds,
        completed_seconds,
        remaining_seconds: total_seconds - completed_seconds,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchStreak {
    pub current_streak: i64,
    pub max_streak: i64,
}

/// Streaks are measured over the set of distinct scheduled dates of
/// Completed videos (same-day completions dedup to one day). The current
/// streak is the length of the run ending at the latest watched date, but
/// only while that date is `today` or yesterday; one missed day after that
/// and it resets to zero, while the max streak keeps the historical best.
pub fn watch_streak(items: &[VideoSnapshot], today: NaiveDate) -> WatchStreak {
    let mut dates: Vec<NaiveDate> = items
        .iter()
        .filter(|v| v.status == VideoStatus::Completed)
        .filter_map(|v| v.scheduled_date)
        .collect();
    dates.sort();
    dates.dedup();

    if dates.is_empty() {
        return WatchStreak {
            current_streak: 0,
            max_streak: 0,
        };
    }

    let mut max_streak: i64 = 1;
    let mut run: i64 = 1;
    for pair in dates.windows(2) {
        if pair[1] == pair[0] + ChronoDuration::days(1) {
            run += 1;
            max_streak = max_streak.max(run);
        } else {
            run = 1;
        }
    }

    let last = dates[dates.len() - 1];
    let current_streak = if last == today || last == today - ChronoDuration::days(1) {
        run
    } else {
        0
    };

    WatchStreak {
        current_streak,
        max_streak,
    }
}

#[derive(Debug, Clone)]
pub struct CalendarDay<'a> {
    pub date: NaiveDate,
    pub videos: Vec<&'a VideoSnapshot>,
}

/// Group scheduled videos by date, ascending. Videos without a scheduled
/// date are excluded.
pub fn calendar_view(items: &[VideoSnapshot]) -> Vec<CalendarDay<'_>> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&VideoSnapshot>> = BTreeMap::new();
    for v in items {
        if let Some(d) = v.scheduled_date {
            by_date.entry(d).or_default().push(v);
        }
    }
    by_date
        .into_iter()
        .map(|(date, videos)| CalendarDay { date, videos })
        .collect()
}
