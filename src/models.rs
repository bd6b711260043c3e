use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Whether a session belongs to a parent account or a learner account.
///
/// The profile flag is a nullable boolean; only an explicit `true` marks a
/// parent. `false` and a missing flag both read as learner, so an unknown
/// flag never inflates the parent count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCategory {
    Learner,
    Parent,
}

impl UserCategory {
    pub fn from_flag(is_parent: Option<bool>) -> Self {
        match is_parent {
            Some(true) => UserCategory::Parent,
            Some(false) | None => UserCategory::Learner,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub user_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub category: UserCategory,
}

/// Unique-user counts for one trailing window starting at `window_start`.
#[derive(Debug, Clone, Serialize)]
pub struct WindowCounts {
    pub window_start: DateTime<Utc>,
    pub total: usize,
    pub learners: usize,
    pub parents: usize,
}

/// DAU/WAU/MAU counts computed from one pass over the session rows.
#[derive(Debug, Clone, Serialize)]
pub struct ActivitySnapshot {
    pub daily: WindowCounts,
    pub weekly: WindowCounts,
    pub monthly: WindowCounts,
}

/// Unique-user counts for a single day or week, labeled by its start date.
#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub period_start: NaiveDate,
    pub learners: usize,
    pub parents: usize,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_true_is_parent() {
        assert_eq!(UserCategory::from_flag(Some(true)), UserCategory::Parent);
    }

    #[test]
    fn false_and_missing_both_default_to_learner() {
        assert_eq!(UserCategory::from_flag(Some(false)), UserCategory::Learner);
        assert_eq!(UserCategory::from_flag(None), UserCategory::Learner);
    }
}
