use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{ActivitySnapshot, TrendPoint, WindowCounts};

fn write_window(output: &mut String, label: &str, window: &WindowCounts) {
    let _ = writeln!(
        output,
        "- {}: {} active users ({} learners, {} parents) since {}",
        label,
        window.total,
        window.learners,
        window.parents,
        window.window_start.format("%Y-%m-%d")
    );
}

fn write_trend(output: &mut String, heading: &str, points: &[TrendPoint]) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## {heading}");

    if points.iter().all(|point| point.total == 0) {
        let _ = writeln!(output, "No sessions recorded for this window.");
        return;
    }

    for point in points {
        let _ = writeln!(
            output,
            "- {}: {} total ({} learners, {} parents)",
            point.period_start, point.total, point.learners, point.parents
        );
    }
}

pub fn build_report(
    snapshot: &ActivitySnapshot,
    daily: &[TrendPoint],
    weekly: &[TrendPoint],
    generated_at: DateTime<Utc>,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Active User Report");
    let _ = writeln!(
        output,
        "Generated {}",
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Active Users");

    write_window(&mut output, "Daily", &snapshot.daily);
    write_window(&mut output, "Weekly", &snapshot.weekly);
    write_window(&mut output, "Monthly", &snapshot.monthly);

    write_trend(&mut output, "Daily Trend", daily);
    write_trend(&mut output, "Weekly Trend", weekly);

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity;
    use crate::models::{SessionRecord, UserCategory};
    use chrono::TimeZone;
    use uuid::Uuid;

    fn build(records: &[SessionRecord]) -> String {
        let now = Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap();
        let snapshot = activity::compute_snapshot(records, now);
        let daily = activity::build_daily_trend(records, now, 7);
        let weekly = activity::build_weekly_trend(records, now, 4);
        build_report(&snapshot, &daily, &weekly, now)
    }

    #[test]
    fn empty_report_uses_empty_state_lines() {
        let report = build(&[]);
        assert!(report.contains("# Active User Report"));
        assert!(report.contains("- Daily: 0 active users (0 learners, 0 parents)"));
        assert!(report.contains("No sessions recorded for this window."));
    }

    #[test]
    fn report_lists_counts_and_trend_rows() {
        let records = vec![SessionRecord {
            user_id: Uuid::new_v4(),
            started_at: Utc.with_ymd_and_hms(2026, 3, 15, 9, 0, 0).unwrap(),
            category: UserCategory::Parent,
        }];

        let report = build(&records);
        assert!(report.contains("- Daily: 1 active users (0 learners, 1 parents)"));
        assert!(report.contains("- 2026-03-15: 1 total (0 learners, 1 parents)"));
    }
}
