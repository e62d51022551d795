//! SQLite schema for the face gallery, capture log and activity log.

use rusqlite::Connection;

pub(crate) const SCHEMA_VERSION: i64 = 2;

const CREATE_V1: &str = "
CREATE TABLE IF NOT EXISTS faces (
    seq          INTEGER PRIMARY KEY AUTOINCREMENT,
    id           TEXT NOT NULL UNIQUE,
    user         TEXT NOT NULL,
    name         TEXT NOT NULL,
    descriptor   TEXT NOT NULL, -- JSON array of f32
    description  TEXT NOT NULL DEFAULT '',
    active       INTEGER NOT NULL DEFAULT 1,
    created_at   TEXT NOT NULL,
    last_seen_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_faces_user_active ON faces (user, active);

CREATE TABLE IF NOT EXISTS captures (
    seq                  INTEGER PRIMARY KEY AUTOINCREMENT,
    id                   TEXT NOT NULL UNIQUE,
    user                 TEXT NOT NULL,
    detected_at          TEXT NOT NULL,
    motion_confidence    INTEGER,
    location             TEXT,
    notes                TEXT,
    face_detected        INTEGER NOT NULL,
    face_recognized      INTEGER NOT NULL,
    recognized_face_id   TEXT,
    recognized_face_name TEXT,
    match_confidence     INTEGER,
    should_alert         INTEGER NOT NULL,
    alert_sent           INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_captures_user ON captures (user, seq);
";

const MIGRATE_V2: &str = "
ALTER TABLE captures ADD COLUMN notified INTEGER NOT NULL DEFAULT 0;
CREATE INDEX IF NOT EXISTS idx_captures_user_detected ON captures (user, detected_at);

CREATE TABLE IF NOT EXISTS activity (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT,
    user       TEXT NOT NULL,
    action     TEXT NOT NULL,
    details    TEXT NOT NULL DEFAULT '',
    metadata   TEXT NOT NULL DEFAULT '{}', -- JSON object
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_activity_user ON activity (user, seq);
";

/// Create or migrate tables and stamp the schema version.
pub(crate) fn ensure_schema(conn: &mut Connection) -> rusqlite::Result<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if version >= SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    if version < 1 {
        tx.execute_batch(CREATE_V1)?;
    }
    if version < 2 {
        tx.execute_batch(MIGRATE_V2)?;
    }
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;

    tracing::info!(from = version, to = SCHEMA_VERSION, "homeguard db schema updated");
    Ok(())
}
