//! SQLite-backed face gallery, capture log and activity log.

use std::path::Path;

use chrono::{DateTime, Duration, NaiveTime, SecondsFormat, Utc};
use homeguard_core::{CaptureVerdict, EnrolledIdentity, FaceDescriptor};
use rusqlite::{params, OptionalExtension, Row};
use thiserror::Error;
use tokio_rusqlite::Connection;

use crate::models::{
    ActivityAction, ActivityEntry, CaptureRecord, CaptureStats, IdentitySummary, NewCapture,
};
use crate::schema::ensure_schema;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database: {0}")]
    Database(#[from] tokio_rusqlite::Error),
    #[error("descriptor encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Async handle to the homeguard database. Cheap to clone.
#[derive(Clone)]
pub struct FaceStore {
    conn: Connection,
}

impl FaceStore {
    /// Open (or create) the database file at `path`.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path).await?;
        Self::init(conn).await
    }

    /// Open a private in-memory database.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.call(|conn| {
            ensure_schema(conn)?;
            Ok(())
        })
        .await?;
        Ok(Self { conn })
    }

    /// Store a new, already-normalized face for `user`.
    pub async fn enroll(
        &self,
        user: &str,
        name: &str,
        descriptor: &FaceDescriptor,
        description: &str,
    ) -> Result<EnrolledIdentity, StoreError> {
        let encoded = serde_json::to_string(descriptor)?;
        let id = uuid::Uuid::new_v4().to_string();
        let created_at = Utc::now();

        let (row_id, row_user, row_name, row_desc) = (
            id.clone(),
            user.to_string(),
            name.to_string(),
            description.to_string(),
        );
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO faces (id, user, name, descriptor, description, active, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
                    params![row_id, row_user, row_name, encoded, row_desc, sql_time(created_at)],
                )?;
                Ok(())
            })
            .await?;

        tracing::info!(user, identity = %id, name, "face enrolled");

        Ok(EnrolledIdentity {
            id,
            display_name: name.to_string(),
            descriptor: descriptor.clone(),
            active: true,
            last_seen_at: None,
        })
    }

    /// Snapshot of `user`'s active identities, in enrollment order.
    pub async fn active_gallery(&self, user: &str) -> Result<Vec<EnrolledIdentity>, StoreError> {
        let user = user.to_string();
        let gallery = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, descriptor, active, last_seen_at FROM faces
                     WHERE user = ?1 AND active = 1 ORDER BY seq",
                )?;
                let rows = stmt
                    .query_map(params![user], identity_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await?;
        Ok(gallery)
    }

    /// Active identities of `user` for display.
    pub async fn list_identities(&self, user: &str) -> Result<Vec<IdentitySummary>, StoreError> {
        let user = user.to_string();
        let list = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, description, created_at, last_seen_at FROM faces
                     WHERE user = ?1 AND active = 1 ORDER BY seq",
                )?;
                let rows = stmt
                    .query_map(params![user], |row| {
                        Ok(IdentitySummary {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            description: row.get(2)?,
                            created_at: timestamp(row, 3)?,
                            last_seen_at: optional_timestamp(row, 4)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await?;
        Ok(list)
    }

    /// Soft-delete an identity. Returns false if `user` has no such active face.
    pub async fn deactivate(&self, user: &str, id: &str) -> Result<bool, StoreError> {
        let (user, id) = (user.to_string(), id.to_string());
        let changed = self
            .conn
            .call(move |conn| {
                let n = conn.execute(
                    "UPDATE faces SET active = 0 WHERE user = ?1 AND id = ?2 AND active = 1",
                    params![user, id],
                )?;
                Ok(n)
            })
            .await?;
        Ok(changed > 0)
    }

    /// Record that an identity was just recognized.
    pub async fn touch_last_seen(&self, id: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        let id = id.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE faces SET last_seen_at = ?1 WHERE id = ?2",
                    params![sql_time(at), id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Append a capture to `user`'s log.
    pub async fn record_capture(
        &self,
        user: &str,
        capture: NewCapture,
    ) -> Result<CaptureRecord, StoreError> {
        let alert_sent = capture.verdict.should_alert;
        let record = CaptureRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user: user.to_string(),
            detected_at: capture.detected_at,
            motion_confidence: capture.motion_confidence,
            location: capture.location,
            notes: capture.notes,
            verdict: capture.verdict,
            recognized_identity_id: capture.recognized_identity_id,
            alert_sent,
            notified: false,
        };

        let row = record.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO captures (
                        id, user, detected_at, motion_confidence, location, notes,
                        face_detected, face_recognized, recognized_face_id, recognized_face_name,
                        match_confidence, should_alert, alert_sent, notified
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 0)",
                    params![
                        row.id,
                        row.user,
                        sql_time(row.detected_at),
                        row.motion_confidence,
                        row.location,
                        row.notes,
                        row.verdict.face_detected,
                        row.verdict.face_recognized,
                        row.recognized_identity_id,
                        row.verdict.matched_identity_name,
                        row.verdict.match_confidence_percent,
                        row.verdict.should_alert,
                        row.alert_sent,
                    ],
                )?;
                Ok(())
            })
            .await?;

        Ok(record)
    }

    /// Flag a capture whose alert notification reached the notifier.
    pub async fn mark_notified(&self, capture_id: &str) -> Result<(), StoreError> {
        let capture_id = capture_id.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE captures SET notified = 1 WHERE id = ?1",
                    params![capture_id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Permanently delete one of `user`'s captures. Returns false if none matched.
    pub async fn delete_capture(&self, user: &str, capture_id: &str) -> Result<bool, StoreError> {
        let (user, capture_id) = (user.to_string(), capture_id.to_string());
        let deleted = self
            .conn
            .call(move |conn| {
                let n = conn.execute(
                    "DELETE FROM captures WHERE user = ?1 AND id = ?2",
                    params![user, capture_id],
                )?;
                Ok(n)
            })
            .await?;
        Ok(deleted > 0)
    }

    /// Look up a single capture by id.
    pub async fn capture(&self, capture_id: &str) -> Result<Option<CaptureRecord>, StoreError> {
        let capture_id = capture_id.to_string();
        let record = self
            .conn
            .call(move |conn| {
                let record = conn
                    .query_row(
                        &format!("{CAPTURE_COLUMNS} WHERE id = ?1"),
                        params![capture_id],
                        capture_from_row,
                    )
                    .optional()?;
                Ok(record)
            })
            .await?;
        Ok(record)
    }

    /// Most recent captures for `user`, newest first.
    pub async fn recent_captures(
        &self,
        user: &str,
        limit: usize,
    ) -> Result<Vec<CaptureRecord>, StoreError> {
        let user = user.to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let records = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "{CAPTURE_COLUMNS} WHERE user = ?1 ORDER BY seq DESC LIMIT ?2"
                ))?;
                let rows = stmt
                    .query_map(params![user, limit], capture_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await?;
        Ok(records)
    }

    /// Newest capture of `user` detected strictly after `since`, if any.
    pub async fn latest_capture_since(
        &self,
        user: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<CaptureRecord>, StoreError> {
        let user = user.to_string();
        let record = self
            .conn
            .call(move |conn| {
                let record = conn
                    .query_row(
                        &format!(
                            "{CAPTURE_COLUMNS} WHERE user = ?1 AND detected_at > ?2
                             ORDER BY detected_at DESC, seq DESC LIMIT 1"
                        ),
                        params![user, sql_time(since)],
                        capture_from_row,
                    )
                    .optional()?;
                Ok(record)
            })
            .await?;
        Ok(record)
    }

    /// Capture counts for `user` relative to `now`. "Today" starts at midnight UTC.
    pub async fn capture_stats(
        &self,
        user: &str,
        now: DateTime<Utc>,
    ) -> Result<CaptureStats, StoreError> {
        let user = user.to_string();
        let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        let bounds = [
            sql_time(midnight),
            sql_time(midnight + Duration::days(1)),
            sql_time(now - Duration::days(7)),
            sql_time(now - Duration::days(30)),
        ];
        let counts = self
            .conn
            .call(move |conn| {
                let counts = conn.query_row(
                    "SELECT COUNT(*),
                            COALESCE(SUM(detected_at >= ?2 AND detected_at < ?3), 0),
                            COALESCE(SUM(detected_at >= ?4), 0),
                            COALESCE(SUM(detected_at >= ?5), 0)
                     FROM captures WHERE user = ?1",
                    params![user, bounds[0], bounds[1], bounds[2], bounds[3]],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, i64>(2)?,
                            row.get::<_, i64>(3)?,
                        ))
                    },
                )?;
                Ok(counts)
            })
            .await?;

        let count = |n: i64| u64::try_from(n).unwrap_or(0);
        Ok(CaptureStats {
            total: count(counts.0),
            today: count(counts.1),
            last_7_days: count(counts.2),
            last_30_days: count(counts.3),
        })
    }

    /// Append an entry to `user`'s activity log.
    pub async fn log_activity(
        &self,
        user: &str,
        action: ActivityAction,
        details: &str,
        metadata: serde_json::Value,
    ) -> Result<ActivityEntry, StoreError> {
        let entry = ActivityEntry {
            user: user.to_string(),
            action,
            details: details.to_string(),
            metadata,
            created_at: Utc::now(),
        };
        let encoded = serde_json::to_string(&entry.metadata)?;

        let row = entry.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO activity (user, action, details, metadata, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        row.user,
                        row.action.as_str(),
                        row.details,
                        encoded,
                        sql_time(row.created_at)
                    ],
                )?;
                Ok(())
            })
            .await?;

        tracing::debug!(user = %entry.user, action = entry.action.as_str(), "activity logged");
        Ok(entry)
    }

    /// Most recent activity entries for `user`, newest first.
    pub async fn recent_activity(
        &self,
        user: &str,
        limit: usize,
    ) -> Result<Vec<ActivityEntry>, StoreError> {
        let user = user.to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let entries = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT user, action, details, metadata, created_at FROM activity
                     WHERE user = ?1 ORDER BY seq DESC LIMIT ?2",
                )?;
                let rows = stmt
                    .query_map(params![user, limit], activity_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await?;
        // Rows with an action this build does not know are skipped.
        Ok(entries.into_iter().flatten().collect())
    }
}

const CAPTURE_COLUMNS: &str = "SELECT id, user, detected_at, motion_confidence, location, notes,
    face_detected, face_recognized, recognized_face_id, recognized_face_name,
    match_confidence, should_alert, alert_sent, notified FROM captures";

fn identity_from_row(row: &Row<'_>) -> rusqlite::Result<EnrolledIdentity> {
    let id: String = row.get(0)?;
    let raw: String = row.get(2)?;
    // An unreadable descriptor is kept as empty so the matcher skips it.
    let descriptor = serde_json::from_str::<Vec<f32>>(&raw).unwrap_or_else(|e| {
        tracing::warn!(identity = %id, error = %e, "malformed stored descriptor");
        Vec::new()
    });
    Ok(EnrolledIdentity {
        display_name: row.get(1)?,
        descriptor: FaceDescriptor::from_normalized(descriptor),
        active: row.get(3)?,
        last_seen_at: optional_timestamp(row, 4)?,
        id,
    })
}

fn capture_from_row(row: &Row<'_>) -> rusqlite::Result<CaptureRecord> {
    Ok(CaptureRecord {
        id: row.get(0)?,
        user: row.get(1)?,
        detected_at: timestamp(row, 2)?,
        motion_confidence: row.get(3)?,
        location: row.get(4)?,
        notes: row.get(5)?,
        verdict: CaptureVerdict {
            face_detected: row.get(6)?,
            face_recognized: row.get(7)?,
            matched_identity_name: row.get(9)?,
            match_confidence_percent: row.get(10)?,
            should_alert: row.get(11)?,
        },
        recognized_identity_id: row.get(8)?,
        alert_sent: row.get(12)?,
        notified: row.get(13)?,
    })
}

fn activity_from_row(row: &Row<'_>) -> rusqlite::Result<Option<ActivityEntry>> {
    let action: String = row.get(1)?;
    let Some(action) = ActivityAction::parse(&action) else {
        tracing::warn!(action = %action, "unknown activity action");
        return Ok(None);
    };
    let raw: String = row.get(3)?;
    let metadata = serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "malformed activity metadata");
        serde_json::Value::Null
    });
    Ok(Some(ActivityEntry {
        user: row.get(0)?,
        action,
        details: row.get(2)?,
        metadata,
        created_at: timestamp(row, 4)?,
    }))
}

/// Fixed-width UTC timestamp, so text comparison in SQL follows time order.
fn sql_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(idx, &raw)
}

fn optional_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| parse_timestamp(idx, &s)).transpose()
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use homeguard_core::normalize;

    fn verdict(recognized: Option<&str>) -> CaptureVerdict {
        CaptureVerdict {
            face_detected: recognized.is_some(),
            face_recognized: recognized.is_some(),
            matched_identity_name: recognized.map(String::from),
            match_confidence_percent: recognized.map(|_| 91),
            should_alert: recognized.is_none(),
        }
    }

    fn new_capture(recognized: Option<&str>) -> NewCapture {
        NewCapture {
            detected_at: Utc::now(),
            motion_confidence: Some(72),
            location: Some("porch".into()),
            notes: None,
            verdict: verdict(recognized),
            recognized_identity_id: None,
        }
    }

    #[tokio::test]
    async fn test_enroll_then_gallery() {
        let store = FaceStore::open_in_memory().await.unwrap();
        let d = normalize(&[3.0, 4.0]).unwrap();
        let alice = store.enroll("u1", "Alice", &d, "front door").await.unwrap();

        let gallery = store.active_gallery("u1").await.unwrap();
        assert_eq!(gallery.len(), 1);
        assert_eq!(gallery[0].id, alice.id);
        assert_eq!(gallery[0].display_name, "Alice");
        assert_eq!(gallery[0].descriptor, d);
        assert!(gallery[0].active);
        assert!(gallery[0].last_seen_at.is_none());
    }

    #[tokio::test]
    async fn test_gallery_is_per_user_and_ordered() {
        let store = FaceStore::open_in_memory().await.unwrap();
        let d = normalize(&[1.0, 0.0]).unwrap();
        store.enroll("u1", "First", &d, "").await.unwrap();
        store.enroll("u2", "Other", &d, "").await.unwrap();
        store.enroll("u1", "Second", &d, "").await.unwrap();

        let names: Vec<_> = store
            .active_gallery("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.display_name)
            .collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn test_deactivate_hides_identity() {
        let store = FaceStore::open_in_memory().await.unwrap();
        let d = normalize(&[1.0, 0.0]).unwrap();
        let face = store.enroll("u1", "Alice", &d, "").await.unwrap();

        assert!(!store.deactivate("u2", &face.id).await.unwrap());
        assert!(store.deactivate("u1", &face.id).await.unwrap());
        assert!(!store.deactivate("u1", &face.id).await.unwrap());
        assert!(store.active_gallery("u1").await.unwrap().is_empty());
        assert!(store.list_identities("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_touch_last_seen() {
        let store = FaceStore::open_in_memory().await.unwrap();
        let d = normalize(&[1.0, 0.0]).unwrap();
        let face = store.enroll("u1", "Alice", &d, "kitchen").await.unwrap();

        let seen = Utc::now();
        store.touch_last_seen(&face.id, seen).await.unwrap();

        let list = store.list_identities("u1").await.unwrap();
        assert_eq!(list[0].description, "kitchen");
        let stored = list[0].last_seen_at.unwrap();
        assert!((stored - seen).num_milliseconds().abs() < 1);
    }

    #[tokio::test]
    async fn test_malformed_descriptor_loads_as_empty() {
        let store = FaceStore::open_in_memory().await.unwrap();
        store
            .conn
            .call(|conn| {
                conn.execute(
                    "INSERT INTO faces (id, user, name, descriptor, created_at)
                     VALUES ('bad', 'u1', 'Broken', 'not json', '2024-01-01T00:00:00Z')",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let gallery = store.active_gallery("u1").await.unwrap();
        assert_eq!(gallery.len(), 1);
        assert!(gallery[0].descriptor.is_empty());
    }

    #[tokio::test]
    async fn test_capture_log_newest_first() {
        let store = FaceStore::open_in_memory().await.unwrap();
        let first = store.record_capture("u1", new_capture(None)).await.unwrap();
        let second = store
            .record_capture("u1", new_capture(Some("Alice")))
            .await
            .unwrap();
        store.record_capture("u2", new_capture(None)).await.unwrap();

        let recent = store.recent_captures("u1", 10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, second.id);
        assert_eq!(recent[1].id, first.id);
        assert_eq!(recent[0].verdict.matched_identity_name.as_deref(), Some("Alice"));
        assert_eq!(recent[0].motion_confidence, Some(72));
        assert_eq!(recent[1].location.as_deref(), Some("porch"));

        assert_eq!(store.recent_captures("u1", 1).await.unwrap().len(), 1);
    }

    fn capture_at(detected_at: DateTime<Utc>) -> NewCapture {
        NewCapture {
            detected_at,
            ..new_capture(None)
        }
    }

    #[tokio::test]
    async fn test_alert_flag_follows_verdict() {
        let store = FaceStore::open_in_memory().await.unwrap();
        let unknown = store.record_capture("u1", new_capture(None)).await.unwrap();
        let known = store
            .record_capture("u1", new_capture(Some("Alice")))
            .await
            .unwrap();

        assert!(unknown.alert_sent);
        assert!(!unknown.notified);
        assert!(!known.alert_sent);

        let loaded = store.capture(&known.id).await.unwrap().unwrap();
        assert!(!loaded.alert_sent);
        assert!(store.capture("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_notified() {
        let store = FaceStore::open_in_memory().await.unwrap();
        let rec = store.record_capture("u1", new_capture(None)).await.unwrap();

        store.mark_notified(&rec.id).await.unwrap();
        let loaded = store.capture(&rec.id).await.unwrap().unwrap();
        assert!(loaded.notified);
        assert!(loaded.alert_sent);
    }

    #[tokio::test]
    async fn test_delete_capture_is_per_user() {
        let store = FaceStore::open_in_memory().await.unwrap();
        let rec = store.record_capture("u1", new_capture(None)).await.unwrap();

        assert!(!store.delete_capture("u2", &rec.id).await.unwrap());
        assert!(store.delete_capture("u1", &rec.id).await.unwrap());
        assert!(!store.delete_capture("u1", &rec.id).await.unwrap());
        assert!(store.capture(&rec.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_capture_stats_windows() {
        let store = FaceStore::open_in_memory().await.unwrap();
        let now = DateTime::parse_from_rfc3339("2024-06-15T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        for at in [
            now - Duration::hours(1),
            now - Duration::hours(11),
            now - Duration::days(3),
            now - Duration::days(20),
            now - Duration::days(90),
        ] {
            store.record_capture("u1", capture_at(at)).await.unwrap();
        }
        store.record_capture("u2", capture_at(now)).await.unwrap();

        let stats = store.capture_stats("u1", now).await.unwrap();
        assert_eq!(
            stats,
            CaptureStats {
                total: 5,
                today: 2,
                last_7_days: 3,
                last_30_days: 4,
            }
        );

        let empty = store.capture_stats("nobody", now).await.unwrap();
        assert_eq!(empty.total, 0);
        assert_eq!(empty.today, 0);
    }

    #[tokio::test]
    async fn test_latest_capture_since() {
        let store = FaceStore::open_in_memory().await.unwrap();
        let base = DateTime::parse_from_rfc3339("2024-06-15T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        store.record_capture("u1", capture_at(base)).await.unwrap();
        let newer = store
            .record_capture("u1", capture_at(base + Duration::milliseconds(1500)))
            .await
            .unwrap();

        let found = store
            .latest_capture_since("u1", base)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, newer.id);

        let none = store
            .latest_capture_since("u1", base + Duration::seconds(2))
            .await
            .unwrap();
        assert!(none.is_none());
        assert!(store.latest_capture_since("u2", base).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_activity_log_newest_first() {
        let store = FaceStore::open_in_memory().await.unwrap();
        store
            .log_activity("u1", ActivityAction::FaceAdd, "Alice", serde_json::json!({"id": "f1"}))
            .await
            .unwrap();
        store
            .log_activity("u1", ActivityAction::Capture, "", serde_json::json!({}))
            .await
            .unwrap();
        store
            .log_activity("u2", ActivityAction::FaceDelete, "", serde_json::json!({}))
            .await
            .unwrap();

        let entries = store.recent_activity("u1", 10).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, ActivityAction::Capture);
        assert_eq!(entries[1].action, ActivityAction::FaceAdd);
        assert_eq!(entries[1].details, "Alice");
        assert_eq!(entries[1].metadata["id"], "f1");
        assert_eq!(store.recent_activity("u1", 1).await.unwrap().len(), 1);
    }
}
