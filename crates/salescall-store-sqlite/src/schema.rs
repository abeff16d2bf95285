//! SQL schema for the sales call record store.
//!
//! The schema is a list of numbered migrations. `PRAGMA user_version` holds
//! the last one applied; see `migrate.rs` for the runner.

/// Version reached once every migration in [`MIGRATIONS`] has run.
pub const SCHEMA_VERSION: i64 = 2;

pub struct Migration {
  pub version: i64,
  pub name:    &'static str,
  pub sql:     &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
  Migration { version: 1, name: "base schema", sql: BASE_SCHEMA },
  Migration { version: 2, name: "channels and record types", sql: CHANNELS },
];

// Every timestamp column holds `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')`:
// RFC 3339 UTC with milliseconds. `encode_dt` writes the same shape so that
// text comparison orders timestamps correctly.

const BASE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS salespersons (
    id          INTEGER PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

-- One aggregate row per salesperson per day.
CREATE TABLE IF NOT EXISTS daily_call_records (
    id                      INTEGER PRIMARY KEY,
    salesperson_id          INTEGER NOT NULL REFERENCES salespersons(id),
    upload_date             TEXT    NOT NULL,   -- YYYY-MM-DD
    total_calls             INTEGER NOT NULL DEFAULT 0 CHECK (total_calls >= 0),
    effective_calls         INTEGER NOT NULL DEFAULT 0 CHECK (effective_calls >= 0),
    average_score           REAL    CHECK (average_score IS NULL
                                           OR (average_score >= 0 AND average_score <= 100)),
    summary_analysis        TEXT,
    improvement_suggestions TEXT,
    processed_files         INTEGER NOT NULL DEFAULT 0,
    created_at              TEXT    NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at              TEXT    NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    UNIQUE (salesperson_id, upload_date)
);

-- Written once by ingestion; no UPDATE is ever issued against this table.
-- salesperson_id duplicates daily_call_records.salesperson_id for direct lookups.
CREATE TABLE IF NOT EXISTS call_details (
    id                INTEGER PRIMARY KEY,
    daily_record_id   INTEGER NOT NULL REFERENCES daily_call_records(id) ON DELETE CASCADE,
    salesperson_id    INTEGER NOT NULL REFERENCES salespersons(id),
    original_filename TEXT,
    company_name      TEXT,
    contact_person    TEXT,
    phone_number      TEXT,
    score             REAL    CHECK (score IS NULL OR (score >= 0 AND score <= 100)),
    is_effective      INTEGER NOT NULL DEFAULT 0 CHECK (is_effective IN (0, 1)),
    conversation_text TEXT,
    analysis_text     TEXT,
    suggestions       TEXT,
    created_at        TEXT    NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_daily_call_records_salesperson  ON daily_call_records(salesperson_id);
CREATE INDEX IF NOT EXISTS idx_daily_call_records_upload_date  ON daily_call_records(upload_date);
CREATE INDEX IF NOT EXISTS idx_call_details_daily_record       ON call_details(daily_record_id);
CREATE INDEX IF NOT EXISTS idx_call_details_salesperson        ON call_details(salesperson_id);
CREATE INDEX IF NOT EXISTS idx_call_details_effective_company  ON call_details(is_effective, company_name);

-- Every update stamps the current time, including one that writes
-- updated_at itself. Recursive triggers are off, so the inner UPDATE does not
-- re-fire these.
CREATE TRIGGER IF NOT EXISTS salespersons_refresh_updated_at
AFTER UPDATE ON salespersons
FOR EACH ROW
BEGIN
    UPDATE salespersons
       SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
     WHERE id = NEW.id;
END;

CREATE TRIGGER IF NOT EXISTS daily_call_records_refresh_updated_at
AFTER UPDATE ON daily_call_records
FOR EACH ROW
BEGIN
    UPDATE daily_call_records
       SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
     WHERE id = NEW.id;
END;

-- Writing a day's record counts as activity for its salesperson.
CREATE TRIGGER IF NOT EXISTS daily_call_records_touch_salesperson_after_insert
AFTER INSERT ON daily_call_records
FOR EACH ROW
BEGIN
    UPDATE salespersons
       SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
     WHERE id = NEW.salesperson_id;
END;

CREATE TRIGGER IF NOT EXISTS daily_call_records_touch_salesperson_after_update
AFTER UPDATE ON daily_call_records
FOR EACH ROW
BEGIN
    UPDATE salespersons
       SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
     WHERE id = NEW.salesperson_id;
END;
";

const CHANNELS: &str = "
ALTER TABLE daily_call_records ADD COLUMN audio_calls           INTEGER NOT NULL DEFAULT 0;
ALTER TABLE daily_call_records ADD COLUMN audio_effective_calls INTEGER NOT NULL DEFAULT 0;
ALTER TABLE daily_call_records ADD COLUMN image_calls           INTEGER NOT NULL DEFAULT 0;
ALTER TABLE daily_call_records ADD COLUMN image_effective_calls INTEGER NOT NULL DEFAULT 0;

ALTER TABLE call_details ADD COLUMN record_type TEXT NOT NULL DEFAULT 'audio'
    CHECK (record_type IN ('audio', 'image'));

CREATE INDEX IF NOT EXISTS idx_call_details_salesperson_created
    ON call_details(salesperson_id, created_at);

-- The denormalized salesperson_id must agree with the daily record's.
-- Only fires when both referenced rows exist; dangling references are left
-- to the foreign-key checks.
CREATE TRIGGER IF NOT EXISTS call_details_salesperson_matches_record
BEFORE INSERT ON call_details
FOR EACH ROW
WHEN EXISTS (SELECT 1 FROM salespersons WHERE id = NEW.salesperson_id)
 AND EXISTS (SELECT 1 FROM daily_call_records
              WHERE id = NEW.daily_record_id
                AND salesperson_id IS NOT NEW.salesperson_id)
BEGIN
    SELECT RAISE(ABORT, 'call detail salesperson does not match its daily record');
END;
";

/// Seed statement run with the base schema. Conflicts on the unique name are
/// skipped, so re-running it changes nothing.
pub const SEED_SALESPERSONS: &str = "
INSERT INTO salespersons (name) VALUES
    ('张三'), ('李四'), ('王五'), ('赵六'), ('钱七'),
    ('孙八'), ('周九'), ('吴十'), ('郑一'), ('冯二')
ON CONFLICT (name) DO NOTHING;
";

/// Number of rows in [`SEED_SALESPERSONS`].
pub const SEED_COUNT: usize = 10;

/// Removes every object the migrations create, children first.
pub const DROP_ALL: &str = "
DROP TRIGGER IF EXISTS call_details_salesperson_matches_record;
DROP TRIGGER IF EXISTS daily_call_records_touch_salesperson_after_update;
DROP TRIGGER IF EXISTS daily_call_records_touch_salesperson_after_insert;
DROP TRIGGER IF EXISTS daily_call_records_refresh_updated_at;
DROP TRIGGER IF EXISTS salespersons_refresh_updated_at;
DROP TABLE IF EXISTS call_details;
DROP TABLE IF EXISTS daily_call_records;
DROP TABLE IF EXISTS salespersons;
";

// ─── Expected catalogue, checked by `verify_schema` ─────────────────────────

pub const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
  ("salespersons", &["id", "name", "created_at", "updated_at"]),
  ("daily_call_records", &[
    "id",
    "salesperson_id",
    "upload_date",
    "total_calls",
    "effective_calls",
    "average_score",
    "summary_analysis",
    "improvement_suggestions",
    "processed_files",
    "audio_calls",
    "audio_effective_calls",
    "image_calls",
    "image_effective_calls",
    "created_at",
    "updated_at",
  ]),
  ("call_details", &[
    "id",
    "daily_record_id",
    "salesperson_id",
    "original_filename",
    "company_name",
    "contact_person",
    "phone_number",
    "score",
    "is_effective",
    "conversation_text",
    "analysis_text",
    "suggestions",
    "record_type",
    "created_at",
  ]),
];

pub const REQUIRED_INDEXES: &[&str] = &[
  "idx_daily_call_records_salesperson",
  "idx_daily_call_records_upload_date",
  "idx_call_details_daily_record",
  "idx_call_details_salesperson",
  "idx_call_details_effective_company",
  "idx_call_details_salesperson_created",
];

pub const REQUIRED_TRIGGERS: &[&str] = &[
  "salespersons_refresh_updated_at",
  "daily_call_records_refresh_updated_at",
  "daily_call_records_touch_salesperson_after_insert",
  "daily_call_records_touch_salesperson_after_update",
  "call_details_salesperson_matches_record",
];
