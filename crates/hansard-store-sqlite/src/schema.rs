//! SQL schema for the Hansard SQLite store.
//!
//! Executed once at connection startup. Primary keys are the upstream
//! system's numeric ids, so every write is an upsert-by-primary-key and
//! re-running a sync is safe.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS sessions (
    session_id  INTEGER PRIMARY KEY,
    name        TEXT NOT NULL,
    start_date  TEXT NOT NULL,    -- YYYY-MM-DD
    end_date    TEXT,             -- NULL while the session is ongoing
    is_current  INTEGER NOT NULL DEFAULT 0
);

-- session_id and introduced_session_id are deliberately not
-- FK-constrained: a carry-over bill may name a session older than the
-- hand-maintained session table.
CREATE TABLE IF NOT EXISTS bills (
    bill_id               INTEGER PRIMARY KEY,
    short_title           TEXT NOT NULL,
    long_title            TEXT NOT NULL DEFAULT '',
    session_id            INTEGER NOT NULL,
    introduced_session_id INTEGER NOT NULL,
    originating_house     TEXT NOT NULL,   -- 'Commons' | 'Lords'
    current_house         TEXT NOT NULL,
    is_withdrawn          INTEGER NOT NULL DEFAULT 0,
    is_defeated           INTEGER NOT NULL DEFAULT 0,
    is_act                INTEGER NOT NULL DEFAULT 0,
    last_update           TEXT NOT NULL    -- ISO 8601 UTC
);

-- Stage ids are globally unique upstream, not scoped to the bill.
CREATE TABLE IF NOT EXISTS bill_stages (
    stage_id      INTEGER PRIMARY KEY,
    bill_id       INTEGER NOT NULL REFERENCES bills(bill_id),
    stage_type_id INTEGER NOT NULL,
    description   TEXT NOT NULL,
    house         TEXT NOT NULL,
    sort_order    INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS stage_sittings (
    sitting_id INTEGER PRIMARY KEY,
    stage_id   INTEGER NOT NULL REFERENCES bill_stages(stage_id),
    bill_id    INTEGER NOT NULL REFERENCES bills(bill_id),
    date       TEXT              -- YYYY-MM-DD, NULL when not yet scheduled
);

CREATE TABLE IF NOT EXISTS amendments (
    amendment_id         INTEGER PRIMARY KEY,
    stage_id             INTEGER NOT NULL REFERENCES bill_stages(stage_id),
    number               TEXT,
    line                 TEXT,
    amendment_type       TEXT,
    decision             TEXT NOT NULL DEFAULT 'NoDecision',
    decision_explanation TEXT,
    summary              TEXT,            -- upstream lines, newline-joined
    marshalled_list_text TEXT,
    d_num                TEXT
);

CREATE TABLE IF NOT EXISTS members (
    member_id     INTEGER PRIMARY KEY,
    name          TEXT NOT NULL,
    display_name  TEXT NOT NULL,
    party         TEXT NOT NULL,
    party_colour  TEXT,
    house         TEXT NOT NULL,
    member_from   TEXT NOT NULL,
    thumbnail_url TEXT
);

-- Sponsor sets are replaced wholesale per amendment on every sync;
-- no UPDATE is ever issued against this table.
CREATE TABLE IF NOT EXISTS amendment_sponsors (
    amendment_id INTEGER NOT NULL REFERENCES amendments(amendment_id),
    member_id    INTEGER NOT NULL REFERENCES members(member_id),
    is_lead      INTEGER NOT NULL DEFAULT 0,
    sort_order   INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (amendment_id, member_id)
);

CREATE TABLE IF NOT EXISTS sync_logs (
    sync_log_id  TEXT PRIMARY KEY,
    sync_type    TEXT NOT NULL,   -- 'full' | 'incremental'
    status       TEXT NOT NULL,   -- 'running' | 'completed' | 'failed'
    started_at   TEXT NOT NULL,
    completed_at TEXT,            -- NULL until terminal
    error        TEXT,
    stats        TEXT             -- JSON-serialised SyncStats
);

CREATE INDEX IF NOT EXISTS bills_session_idx     ON bills(session_id);
CREATE INDEX IF NOT EXISTS bills_update_idx      ON bills(last_update);
CREATE INDEX IF NOT EXISTS stages_bill_idx       ON bill_stages(bill_id);
CREATE INDEX IF NOT EXISTS sittings_stage_idx    ON stage_sittings(stage_id);
CREATE INDEX IF NOT EXISTS amendments_stage_idx  ON amendments(stage_id);
CREATE INDEX IF NOT EXISTS sponsors_member_idx   ON amendment_sponsors(member_id);
CREATE INDEX IF NOT EXISTS sync_logs_status_idx  ON sync_logs(status);
";
