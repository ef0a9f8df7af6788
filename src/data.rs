use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub type DBConnection = Arc<Mutex<Connection>>;

/// Creates the schema on first launch. Every statement is idempotent so the
/// server can be restarted against an existing database file.
pub fn init_schema(connection: &Connection) -> rusqlite::Result<()> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
             id INTEGER PRIMARY KEY,
             username TEXT NOT NULL UNIQUE,
             password_hash TEXT NOT NULL,
             created_at TEXT NOT NULL
         );
         CREATE TABLE IF NOT EXISTS sessions (
             id INTEGER PRIMARY KEY,
             user_id INTEGER NOT NULL,
             token_hash TEXT NOT NULL UNIQUE,
             expires_at TEXT NOT NULL,
             last_used_at TEXT NOT NULL
         );
         CREATE TABLE IF NOT EXISTS goals (
             id INTEGER PRIMARY KEY,
             user_id INTEGER NOT NULL,
             week_key TEXT NOT NULL,
             text TEXT NOT NULL,
             checked INTEGER NOT NULL DEFAULT 0,
             position INTEGER NOT NULL
         );
         CREATE TABLE IF NOT EXISTS sub_items (
             id INTEGER PRIMARY KEY,
             goal_id INTEGER NOT NULL,
             parent_id INTEGER,
             kind TEXT NOT NULL,
             text TEXT NOT NULL,
             checked INTEGER NOT NULL DEFAULT 0,
             position INTEGER NOT NULL
         );
         CREATE INDEX IF NOT EXISTS idx_goals_user_week ON goals (user_id, week_key);
         CREATE INDEX IF NOT EXISTS idx_sub_items_goal ON sub_items (goal_id);
         CREATE INDEX IF NOT EXISTS idx_sub_items_parent ON sub_items (parent_id);
         CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions (user_id);",
    )
}
