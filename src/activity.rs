use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use uuid::Uuid;

use crate::models::{ActivitySnapshot, SessionRecord, TrendPoint, UserCategory, WindowCounts};

/// Truncates an instant to the start of its UTC calendar day.
pub fn day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Lower bound for the session fetch: start of the trailing 30-day window.
pub fn monthly_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    day_start(now) - Duration::days(30)
}

/// Counts distinct users with at least one session at or after `window_start`,
/// optionally restricted to one category. A user with five sessions in the
/// window counts once.
pub fn count_unique_users(
    records: &[SessionRecord],
    window_start: DateTime<Utc>,
    category: Option<UserCategory>,
) -> usize {
    let mut seen: HashSet<Uuid> = HashSet::new();

    for record in records {
        if record.started_at < window_start {
            continue;
        }
        if let Some(wanted) = category {
            if record.category != wanted {
                continue;
            }
        }
        seen.insert(record.user_id);
    }

    seen.len()
}

fn window_counts(records: &[SessionRecord], window_start: DateTime<Utc>) -> WindowCounts {
    let total = count_unique_users(records, window_start, None);
    let parents = count_unique_users(records, window_start, Some(UserCategory::Parent));

    // Learners are derived by subtraction so total == learners + parents
    // holds for every window regardless of how the two counts were taken.
    WindowCounts {
        window_start,
        total,
        learners: total - parents,
        parents,
    }
}

/// Computes DAU/WAU/MAU unique-user counts over the trailing 1/7/30-day
/// windows anchored at the start of `now`'s UTC day.
pub fn compute_snapshot(records: &[SessionRecord], now: DateTime<Utc>) -> ActivitySnapshot {
    let today = day_start(now);

    ActivitySnapshot {
        daily: window_counts(records, today),
        weekly: window_counts(records, today - Duration::days(7)),
        monthly: window_counts(records, today - Duration::days(30)),
    }
}

fn build_trend(
    records: &[SessionRecord],
    now: DateTime<Utc>,
    periods: usize,
    period_days: i64,
) -> Vec<TrendPoint> {
    // Buckets tile backwards from the end of today so the newest bucket
    // always contains `now`. Each bucket is half-open: [start, end).
    let upper = day_start(now) + Duration::days(1);
    let mut points = Vec::with_capacity(periods);

    for i in (0..periods).rev() {
        let start = upper - Duration::days(period_days * (i as i64 + 1));
        let end = start + Duration::days(period_days);

        let mut learners: HashSet<Uuid> = HashSet::new();
        let mut parents: HashSet<Uuid> = HashSet::new();

        for record in records {
            if record.started_at < start || record.started_at >= end {
                continue;
            }
            match record.category {
                UserCategory::Learner => learners.insert(record.user_id),
                UserCategory::Parent => parents.insert(record.user_id),
            };
        }

        points.push(TrendPoint {
            period_start: start.date_naive(),
            learners: learners.len(),
            parents: parents.len(),
            total: learners.len() + parents.len(),
        });
    }

    points
}

/// One `TrendPoint` per calendar day for the last `days` days, oldest first.
pub fn build_daily_trend(
    records: &[SessionRecord],
    now: DateTime<Utc>,
    days: usize,
) -> Vec<TrendPoint> {
    build_trend(records, now, days, 1)
}

/// One `TrendPoint` per 7-day bucket for the last `weeks` weeks, oldest
/// first, labeled by each bucket's start date.
pub fn build_weekly_trend(
    records: &[SessionRecord],
    now: DateTime<Utc>,
    weeks: usize,
) -> Vec<TrendPoint> {
    build_trend(records, now, weeks, 7)
}
