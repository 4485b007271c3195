//! SQLite storage for the mock backend's complaint ledger.
//!
//! Schema:
//!
//! - `complaints`: one row per complaint, keyed by owner and complaint id
//! - `seeded_users`: users whose demo complaints have already been inserted
//!
//! Timestamps are stored as Unix milliseconds (UTC).

use chrono::{TimeZone, Utc};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use crate::model::{Complaint, ComplaintStatus, Priority};

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Create a new storage instance and initialize the schema.
    ///
    /// # Arguments
    ///
    /// * `database_url` - SQLite connection string (e.g., "sqlite:airwatch.db" or "sqlite::memory:")
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let in_memory = database_url.contains(":memory:");

        // An in-memory database lives and dies with its one connection.
        let mut options = SqlitePoolOptions::new().max_connections(if in_memory { 1 } else { 5 });
        if in_memory {
            options = options.idle_timeout(None).max_lifetime(None);
        }

        let pool = options.connect(database_url).await?;

        let storage = Self { pool };
        storage.initialize_schema().await?;

        Ok(storage)
    }

    /// Create the database schema if it doesn't exist.
    async fn initialize_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS complaints (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                complaint_id TEXT NOT NULL,
                category TEXT NOT NULL,
                description TEXT NOT NULL,
                status TEXT NOT NULL,
                priority TEXT NOT NULL,
                submitted_at INTEGER NOT NULL,
                officer_assigned TEXT NOT NULL,
                UNIQUE (user_id, complaint_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Listing is always per user, newest first
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_complaints_user_submitted
            ON complaints(user_id, submitted_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS seeded_users (
                user_id TEXT PRIMARY KEY
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a complaint owned by `user_id`.
    ///
    /// Returns `false` without writing if the user already owns a complaint
    /// with the same id.
    pub async fn insert_complaint(&self, user_id: &str, complaint: &Complaint) -> anyhow::Result<bool> {
        let result = insert_query(user_id, complaint)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// List a user's complaints, newest first.
    ///
    /// Complaints submitted in the same millisecond are ordered by id, so the
    /// result is stable across calls.
    pub async fn list_complaints(&self, user_id: &str) -> anyhow::Result<Vec<Complaint>> {
        let rows = sqlx::query(
            r#"
            SELECT complaint_id, category, description, status, priority, submitted_at, officer_assigned
            FROM complaints
            WHERE user_id = ?
            ORDER BY submitted_at DESC, complaint_id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(complaint_from_row).collect()
    }

    /// Number of complaints stored for a user.
    pub async fn count_complaints(&self, user_id: &str) -> anyhow::Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as total
            FROM complaints
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("total"))
    }

    /// Insert `complaints` for `user_id` unless that user was seeded before.
    ///
    /// The seed marker and the rows are written in one transaction, so a
    /// concurrent listing sees either none or all of them. Returns `true` if
    /// this call did the seeding.
    pub async fn seed_complaints(&self, user_id: &str, complaints: &[Complaint]) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;

        let marked = sqlx::query(
            r#"
            INSERT OR IGNORE INTO seeded_users (user_id) VALUES (?)
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if marked.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        for complaint in complaints {
            insert_query(user_id, complaint).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}

fn insert_query<'q>(
    user_id: &'q str,
    complaint: &'q Complaint,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO complaints
            (user_id, complaint_id, category, description, status, priority, submitted_at, officer_assigned)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(&complaint.complaint_id)
    .bind(&complaint.category)
    .bind(&complaint.description)
    .bind(complaint.status.label())
    .bind(complaint.priority.label())
    .bind(complaint.submitted_at.timestamp_millis())
    .bind(&complaint.officer_assigned)
}

fn complaint_from_row(row: &SqliteRow) -> anyhow::Result<Complaint> {
    let status: String = row.get("status");
    let priority: String = row.get("priority");
    let submitted_ms: i64 = row.get("submitted_at");

    Ok(Complaint {
        complaint_id: row.get("complaint_id"),
        category: row.get("category"),
        description: row.get("description"),
        status: ComplaintStatus::from_label(&status)
            .ok_or_else(|| anyhow::anyhow!("unknown complaint status '{}'", status))?,
        priority: Priority::from_label(&priority)
            .ok_or_else(|| anyhow::anyhow!("unknown complaint priority '{}'", priority))?,
        submitted_at: Utc
            .timestamp_millis_opt(submitted_ms)
            .single()
            .ok_or_else(|| anyhow::anyhow!("invalid timestamp {}", submitted_ms))?,
        officer_assigned: row.get("officer_assigned"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};
    use tokio_test::{assert_err, assert_ok};

    fn complaint(id: &str, submitted_at: DateTime<Utc>) -> Complaint {
        Complaint {
            complaint_id: id.to_string(),
            category: "Waste Burning".to_string(),
            description: "Garbage burning at night".to_string(),
            status: ComplaintStatus::Submitted,
            priority: Priority::High,
            submitted_at,
            officer_assigned: "Unassigned".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let storage = Storage::new("sqlite::memory:").await.unwrap();
        let now = Utc::now();

        storage
            .insert_complaint("USR1", &complaint("CMP1000", now))
            .await
            .unwrap();

        let listed = storage.list_complaints("USR1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].complaint_id, "CMP1000");
        assert_eq!(listed[0].priority, Priority::High);
        assert_eq!(listed[0].status, ComplaintStatus::Submitted);
        assert_eq!(
            listed[0].submitted_at.timestamp_millis(),
            now.timestamp_millis()
        );
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_stable() {
        let storage = Storage::new("sqlite::memory:").await.unwrap();
        let now = Utc::now();

        storage
            .insert_complaint("USR1", &complaint("CMP3000", now - Duration::days(3)))
            .await
            .unwrap();
        storage
            .insert_complaint("USR1", &complaint("CMP2000", now))
            .await
            .unwrap();
        storage
            .insert_complaint("USR1", &complaint("CMP1000", now))
            .await
            .unwrap();

        let ids: Vec<_> = storage
            .list_complaints("USR1")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.complaint_id)
            .collect();
        assert_eq!(ids, vec!["CMP1000", "CMP2000", "CMP3000"]);

        let again: Vec<_> = storage
            .list_complaints("USR1")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.complaint_id)
            .collect();
        assert_eq!(ids, again);
    }

    #[tokio::test]
    async fn test_complaints_are_per_user() {
        let storage = Storage::new("sqlite::memory:").await.unwrap();
        let now = Utc::now();

        storage
            .insert_complaint("USR1", &complaint("CMP2001", now))
            .await
            .unwrap();
        storage
            .insert_complaint("USR2", &complaint("CMP2001", now))
            .await
            .unwrap();

        assert_eq!(storage.count_complaints("USR1").await.unwrap(), 1);
        assert_eq!(storage.count_complaints("USR2").await.unwrap(), 1);
        assert_eq!(storage.count_complaints("USR3").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_not_inserted() {
        let storage = Storage::new("sqlite::memory:").await.unwrap();

        assert_ok!(storage.insert_complaint("USR1", &complaint("CMP4242", Utc::now())).await);
        let again = storage
            .insert_complaint("USR1", &complaint("CMP4242", Utc::now()))
            .await
            .unwrap();
        assert!(!again);
        assert!(
            storage
                .insert_complaint("USR2", &complaint("CMP4242", Utc::now()))
                .await
                .unwrap()
        );
        assert_eq!(storage.count_complaints("USR1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_seed_complaints_once() {
        let storage = Storage::new("sqlite::memory:").await.unwrap();
        let now = Utc::now();
        let seed = [complaint("CMP2001", now), complaint("CMP2002", now)];

        assert!(assert_ok!(storage.seed_complaints("USR1", &seed).await));
        assert!(!assert_ok!(storage.seed_complaints("USR1", &seed).await));
        assert_eq!(storage.count_complaints("USR1").await.unwrap(), 2);

        assert!(assert_ok!(storage.seed_complaints("USR2", &seed[..1]).await));
        assert_eq!(storage.count_complaints("USR2").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_seed_leaves_no_marker() {
        let storage = Storage::new("sqlite::memory:").await.unwrap();
        sqlx::query("DROP TABLE complaints")
            .execute(&storage.pool)
            .await
            .unwrap();

        assert_err!(storage.seed_complaints("USR1", &[complaint("CMP2001", Utc::now())]).await);

        storage.initialize_schema().await.unwrap();
        assert!(assert_ok!(storage.seed_complaints("USR1", &[complaint("CMP2001", Utc::now())]).await));
    }
}
