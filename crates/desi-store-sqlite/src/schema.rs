//! SQL schema for the knowledge-base SQLite store.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// `rowid` keeps insertion order; an upsert of an existing id updates the row
/// in place and so keeps its position.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS kb (
    id          TEXT PRIMARY KEY,
    templates   TEXT NOT NULL DEFAULT '[]',   -- JSON array of strings
    answer      TEXT NOT NULL DEFAULT ''
);

PRAGMA user_version = 1;
";
