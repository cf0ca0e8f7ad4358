//! Database migrations for the classroom content schema
//!
//! Versioned migrations applied atomically and tracked in the
//! content_schema_version table. The hierarchy tables (posts, comments,
//! attachments) are single-table-per-variant with a `type` discriminator
//! column constrained to the known tags.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current schema version for the content store
pub const CURRENT_CONTENT_SCHEMA_VERSION: i32 = 1;

/// Migration descriptor
pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub up_sql: &'static str,
}

/// All available migrations in order
pub fn get_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial classroom content schema",
        up_sql: r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS content_schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            );

            -- Classrooms, joinable by code
            CREATE TABLE IF NOT EXISTS classrooms (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                unit_code TEXT,
                description TEXT,
                created_at INTEGER NOT NULL
            );

            -- Memberships, one per (classroom, user)
            CREATE TABLE IF NOT EXISTS members (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                classroom_id INTEGER NOT NULL,
                user_id TEXT NOT NULL,
                role TEXT NOT NULL CHECK(role IN ('Facilitator', 'Student')),
                created_at INTEGER NOT NULL,
                UNIQUE (classroom_id, user_id),
                FOREIGN KEY (classroom_id) REFERENCES classrooms(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_members_user ON members(user_id);

            -- Content nodes: posts and assignments in one table
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                author_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                type TEXT NOT NULL CHECK(type IN ('Post', 'Assignment')),
                due_date INTEGER,
                total_points INTEGER,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (author_id) REFERENCES members(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id);
            CREATE INDEX IF NOT EXISTS idx_posts_type ON posts(type);

            -- Comment nodes: post comments and assignment submissions
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL,
                author_id INTEGER NOT NULL,
                body TEXT NOT NULL,
                type TEXT NOT NULL CHECK(type IN ('PostComment', 'AssignmentSubmission')),
                created_at INTEGER NOT NULL,
                FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
                FOREIGN KEY (author_id) REFERENCES members(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id);

            -- Grades, one-to-one with submissions
            CREATE TABLE IF NOT EXISTS grades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                comment_id INTEGER NOT NULL UNIQUE,
                points INTEGER NOT NULL,
                comments TEXT,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (comment_id) REFERENCES comments(id) ON DELETE CASCADE
            );

            -- Attachments, owned by exactly one parent node
            CREATE TABLE IF NOT EXISTS attachments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL CHECK(type IN (
                    'PostAttachment',
                    'PostCommentAttachment',
                    'AssignmentSubmissionAttachment'
                )),
                post_id INTEGER,
                comment_id INTEGER,
                submission_id INTEGER,
                title TEXT NOT NULL,
                original_file_name TEXT NOT NULL,
                stored_file_name TEXT NOT NULL,
                storage_path TEXT NOT NULL,
                mime_type TEXT NOT NULL,
                size INTEGER,
                created_at INTEGER NOT NULL,
                CHECK (
                    (post_id IS NOT NULL) + (comment_id IS NOT NULL)
                        + (submission_id IS NOT NULL) = 1
                ),
                FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
                FOREIGN KEY (comment_id) REFERENCES comments(id) ON DELETE CASCADE,
                FOREIGN KEY (submission_id) REFERENCES comments(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_attachments_post ON attachments(post_id);

            -- Video sessions, audit trail for live rooms
            CREATE TABLE IF NOT EXISTS video_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                classroom_id INTEGER NOT NULL,
                owner_id INTEGER NOT NULL,
                code TEXT NOT NULL UNIQUE,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (classroom_id) REFERENCES classrooms(id) ON DELETE CASCADE,
                FOREIGN KEY (owner_id) REFERENCES members(id) ON DELETE CASCADE
            );

            -- Best-effort join records
            CREATE TABLE IF NOT EXISTS session_participants (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id INTEGER NOT NULL,
                member_id INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (session_id) REFERENCES video_sessions(id) ON DELETE CASCADE,
                FOREIGN KEY (member_id) REFERENCES members(id) ON DELETE CASCADE
            );
        "#,
    }]
}

/// Apply every pending migration
pub fn migrate(pool: &Pool<SqliteConnectionManager>) -> Result<(), rusqlite::Error> {
    let conn = pool
        .get()
        .map_err(|e| rusqlite::Error::InvalidParameterName(format!("pool: {}", e)))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS content_schema_version (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM content_schema_version",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    for migration in get_migrations() {
        if migration.version <= current {
            continue;
        }

        tracing::info!(
            version = migration.version,
            description = migration.description,
            "applying content schema migration"
        );

        conn.execute_batch(migration.up_sql)?;

        let applied_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;
        conn.execute(
            "INSERT INTO content_schema_version (version, applied_at) VALUES (?, ?)",
            params![migration.version, applied_at],
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_pool() -> Pool<SqliteConnectionManager> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        Pool::builder().max_size(1).build(manager).unwrap()
    }

    #[test]
    fn test_migrations_apply_cleanly() {
        let pool = memory_pool();
        migrate(&pool).unwrap();

        let conn = pool.get().unwrap();
        let version: i32 = conn
            .query_row(
                "SELECT MAX(version) FROM content_schema_version",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(version, CURRENT_CONTENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let pool = memory_pool();
        migrate(&pool).unwrap();
        migrate(&pool).unwrap();
    }

    #[test]
    fn test_attachment_owner_check_constraint() {
        let pool = memory_pool();
        migrate(&pool).unwrap();

        let conn = pool.get().unwrap();
        // No owner reference set: the CHECK must reject the row.
        let result = conn.execute(
            "INSERT INTO attachments
                (type, title, original_file_name, stored_file_name, storage_path,
                 mime_type, size, created_at)
             VALUES ('PostAttachment', 't', 'o', 's', '/p', 'text/plain', 1, 0)",
            [],
        );
        assert!(result.is_err());
    }
}
