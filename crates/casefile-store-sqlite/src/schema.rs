//! SQL schema for the casefile SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision for future migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS cases (
    case_id       TEXT PRIMARY KEY,
    owner         TEXT NOT NULL,
    platform      TEXT NOT NULL,
    username      TEXT NOT NULL,
    description   TEXT,
    status        TEXT NOT NULL,   -- 'active' | 'completed'
    risk_score    REAL NOT NULL DEFAULT 0,
    risk_level    TEXT NOT NULL DEFAULT 'low',
    evidence_hash TEXT,            -- hex SHA-256 over the snapshot log
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    completed_at  TEXT
);

-- Snapshots are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS snapshots (
    case_id       TEXT NOT NULL REFERENCES cases(case_id),
    sequence      INTEGER NOT NULL,
    snapshot_json TEXT NOT NULL,
    recorded_at   TEXT NOT NULL,
    PRIMARY KEY (case_id, sequence)
);

-- One row per analysis run; the highest version is current.
CREATE TABLE IF NOT EXISTS analyses (
    case_id     TEXT NOT NULL REFERENCES cases(case_id),
    version     INTEGER NOT NULL,
    result_json TEXT NOT NULL,
    risk_score  REAL NOT NULL,
    risk_level  TEXT NOT NULL,
    snapshots   INTEGER NOT NULL,
    analyzed_at TEXT NOT NULL,
    PRIMARY KEY (case_id, version)
);

CREATE TABLE IF NOT EXISTS reports (
    report_id        TEXT PRIMARY KEY,
    case_id          TEXT NOT NULL REFERENCES cases(case_id),
    owner            TEXT NOT NULL,
    created_at       TEXT NOT NULL,
    envelope_version INTEGER NOT NULL,
    kdf_memory_kib   INTEGER NOT NULL,
    kdf_iterations   INTEGER NOT NULL,
    kdf_parallelism  INTEGER NOT NULL,
    salt             BLOB NOT NULL,
    nonce            BLOB NOT NULL,
    ciphertext       BLOB NOT NULL,
    integrity_tag    BLOB NOT NULL,
    evidence_hash    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS audit_events (
    event_id     TEXT PRIMARY KEY,
    actor        TEXT NOT NULL,
    action       TEXT NOT NULL,
    case_id      TEXT,
    report_id    TEXT,
    details_json TEXT NOT NULL DEFAULT 'null',
    recorded_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS cases_owner_idx   ON cases(owner);
CREATE INDEX IF NOT EXISTS reports_case_idx  ON reports(case_id);
CREATE INDEX IF NOT EXISTS audit_case_idx    ON audit_events(case_id);

PRAGMA user_version = 1;
";
