//! SQL schema for the census SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS imports (
    id  INTEGER PRIMARY KEY AUTOINCREMENT
);

CREATE TABLE IF NOT EXISTS citizens (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    citizen_id  INTEGER NOT NULL,    -- batch-local id, unique per import only
    town        TEXT    NOT NULL,
    street      TEXT    NOT NULL,
    building    TEXT    NOT NULL,
    apartment   INTEGER NOT NULL,
    name        TEXT    NOT NULL,
    birth_date  TEXT    NOT NULL,    -- ISO 8601 calendar date
    gender      TEXT    NOT NULL,    -- 'male' | 'female'
    import_id   INTEGER NOT NULL REFERENCES imports(id),
    UNIQUE (import_id, citizen_id)   -- first write wins under OR IGNORE
);

-- Directed rows modelling an undirected relationship. Symmetry — (A,B)
-- stored iff (B,A) stored — is an application invariant: the write paths
-- always touch both directions, and no raw edge write is exposed. Edges
-- only ever connect citizens of the same import.
CREATE TABLE IF NOT EXISTS relatives (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    citizen_id  INTEGER NOT NULL REFERENCES citizens(id),
    relative_id INTEGER NOT NULL REFERENCES citizens(id),
    UNIQUE (citizen_id, relative_id)
);

CREATE INDEX IF NOT EXISTS citizens_import_idx    ON citizens(import_id);
CREATE INDEX IF NOT EXISTS relatives_citizen_idx  ON relatives(citizen_id);
CREATE INDEX IF NOT EXISTS relatives_relative_idx ON relatives(relative_id);

PRAGMA user_version = 1;
";
