use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{SessionRecord, UserCategory};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let users = vec![
        (
            Uuid::parse_str("8f6f2b35-67a1-4c51-9a7e-1d2b9e0c44aa")?,
            "Noa Fischer",
            "noa.fischer@example.com",
            Some(false),
        ),
        (
            Uuid::parse_str("2b1d9c0e-5a44-47f3-b0cf-9f3f6a21d713")?,
            "Priya Raman",
            "priya.raman@example.com",
            Some(true),
        ),
        (
            Uuid::parse_str("c4a6e7d8-0b12-4f3a-8c55-7e9d1f2a3b4c")?,
            "Tomas Alves",
            "tomas.alves@example.com",
            None,
        ),
    ];

    for (id, name, email, is_parent) in users {
        sqlx::query(
            r#"
            INSERT INTO activity_insights.users (id, display_name, email, is_parent)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE
            SET display_name = EXCLUDED.display_name, is_parent = EXCLUDED.is_parent
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(is_parent)
        .fetch_one(pool)
        .await?;
    }

    let now = Utc::now();
    let sessions = vec![
        ("seed-001", "noa.fischer@example.com", now - chrono::Duration::hours(2)),
        ("seed-002", "noa.fischer@example.com", now - chrono::Duration::days(1)),
        ("seed-003", "priya.raman@example.com", now - chrono::Duration::days(3)),
        ("seed-004", "tomas.alves@example.com", now - chrono::Duration::days(10)),
        ("seed-005", "priya.raman@example.com", now - chrono::Duration::days(26)),
    ];

    for (source_key, email, started_at) in sessions {
        let user_id: Uuid =
            sqlx::query("SELECT id FROM activity_insights.users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?
                .get("id");

        sqlx::query(
            r#"
            INSERT INTO activity_insights.sessions (id, user_id, started_at, source_key)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(started_at)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Fetches session rows starting at or after `since`, joined to the profile
/// flag that decides each row's category. Rows that fail to decode are
/// dropped individually so one bad row never loses the whole window.
pub async fn fetch_sessions(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> anyhow::Result<Vec<SessionRecord>> {
    let rows = sqlx::query(
        "SELECT s.user_id, s.started_at, u.is_parent \
         FROM activity_insights.sessions s \
         JOIN activity_insights.users u ON u.id = s.user_id \
         WHERE s.started_at >= $1",
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    let mut sessions = Vec::new();

    for row in rows {
        let user_id: Uuid = match row.try_get("user_id") {
            Ok(value) => value,
            Err(_) => continue,
        };
        let started_at: DateTime<Utc> = match row.try_get("started_at") {
            Ok(value) => value,
            Err(_) => continue,
        };
        let is_parent: Option<bool> = row.try_get("is_parent").unwrap_or(None);

        sessions.push(SessionRecord {
            user_id,
            started_at,
            category: UserCategory::from_flag(is_parent),
        });
    }

    Ok(sessions)
}

pub struct ImportOutcome {
    pub inserted: usize,
    pub skipped: usize,
}

#[derive(serde::Deserialize)]
struct CsvRow {
    display_name: String,
    email: String,
    is_parent: Option<bool>,
    started_at: String,
    source_key: Option<String>,
}

struct ParsedRow {
    display_name: String,
    email: String,
    is_parent: Option<bool>,
    started_at: DateTime<Utc>,
    source_key: Option<String>,
}

/// Per-row import decision. A row that fails to deserialize (for example an
/// unrecognized `is_parent` value) or carries an unparseable timestamp is
/// excluded, not fatal; the rest of the batch still imports.
fn parse_row(result: Result<CsvRow, csv::Error>) -> Option<ParsedRow> {
    let row = result.ok()?;
    let started_at = DateTime::parse_from_rfc3339(&row.started_at)
        .ok()?
        .with_timezone(&Utc);

    Some(ParsedRow {
        display_name: row.display_name,
        email: row.email,
        is_parent: row.is_parent,
        started_at,
        source_key: row.source_key,
    })
}

pub async fn import_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
) -> anyhow::Result<ImportOutcome> {
    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;
    let mut skipped = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = match parse_row(result) {
            Some(row) => row,
            None => {
                skipped += 1;
                continue;
            }
        };

        let user_id: Uuid = sqlx::query(
            r#"
            INSERT INTO activity_insights.users (id, display_name, email, is_parent)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE
            SET display_name = EXCLUDED.display_name, is_parent = EXCLUDED.is_parent
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.display_name)
        .bind(&row.email)
        .bind(row.is_parent)
        .fetch_one(pool)
        .await?
        .get("id");

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO activity_insights.sessions (id, user_id, started_at, source_key)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(row.started_at)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(ImportOutcome { inserted, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserCategory;
    use chrono::TimeZone;

    fn parse_all(data: &str) -> (Vec<ParsedRow>, usize) {
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let mut rows = Vec::new();
        let mut skipped = 0usize;

        for result in reader.deserialize::<CsvRow>() {
            match parse_row(result) {
                Some(row) => rows.push(row),
                None => skipped += 1,
            }
        }

        (rows, skipped)
    }

    #[test]
    fn malformed_rows_are_skipped_not_fatal() {
        let data = "display_name,email,is_parent,started_at,source_key\n\
                    Noa Fischer,noa@example.com,false,2026-03-14T09:00:00Z,row-1\n\
                    Priya Raman,priya@example.com,unknown,2026-03-14T10:00:00Z,row-2\n\
                    Tomas Alves,tomas@example.com,true,not-a-timestamp,row-3\n\
                    Mara Okafor,mara@example.com,,2026-03-15T08:30:00Z,row-4\n";

        let (rows, skipped) = parse_all(data);

        assert_eq!(skipped, 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].email, "noa@example.com");
        assert_eq!(rows[1].email, "mara@example.com");
    }

    #[test]
    fn rows_after_a_malformed_one_still_parse() {
        let data = "display_name,email,is_parent,started_at,source_key\n\
                    Priya Raman,priya@example.com,maybe,2026-03-14T10:00:00Z,row-1\n\
                    Noa Fischer,noa@example.com,true,2026-03-14T11:00:00Z,row-2\n";

        let (rows, skipped) = parse_all(data);

        assert_eq!(skipped, 1);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].email, "noa@example.com");
    }

    #[test]
    fn parsed_timestamps_normalize_to_utc() {
        let data = "display_name,email,is_parent,started_at,source_key\n\
                    Noa Fischer,noa@example.com,false,2026-03-14T09:00:00+02:00,row-1\n";

        let (rows, skipped) = parse_all(data);

        assert_eq!(skipped, 0);
        assert_eq!(
            rows[0].started_at,
            Utc.with_ymd_and_hms(2026, 3, 14, 7, 0, 0).unwrap()
        );
    }

    #[test]
    fn missing_flag_rows_read_as_learners() {
        let data = "display_name,email,is_parent,started_at,source_key\n\
                    Mara Okafor,mara@example.com,,2026-03-15T08:30:00Z,\n";

        let (rows, _) = parse_all(data);

        assert_eq!(rows[0].is_parent, None);
        assert_eq!(
            UserCategory::from_flag(rows[0].is_parent),
            UserCategory::Learner
        );
        assert_eq!(rows[0].source_key, None);
    }
}
