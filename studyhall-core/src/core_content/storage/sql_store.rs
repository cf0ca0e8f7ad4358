//! SQL-backed storage for the classroom content model
//!
//! All multi-row writes go through explicit transactions; single-row decode
//! goes through the model's tag constructors so an unknown discriminator
//! surfaces as an integrity error instead of a defaulted variant.

use crate::core_model::{
    Attachment, AttachmentId, AttachmentOwner, Classroom, ClassroomId, ClassroomMember, Comment,
    CommentId, CommentKind, FileMeta, Grade, GradeId, MemberId, MemberRole, ParticipantId, Post,
    PostId, PostKind, SessionId, Timestamp, UserId, VideoSession, VideoSessionParticipant,
};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Row};
use std::path::Path;

use super::super::error::ContentError;
use super::migrations;

type MemberRaw = (i64, i64, String, String, i64);
type PostRaw = (i64, i64, String, String, String, Option<i64>, Option<i64>, i64);
type CommentRaw = (
    i64,
    i64,
    i64,
    String,
    String,
    i64,
    Option<i64>,
    Option<i64>,
    Option<String>,
    Option<i64>,
);
type AttachmentRaw = (
    i64,
    String,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    String,
    String,
    String,
    String,
    String,
    Option<i64>,
    i64,
);

/// Row content for one attachment insert, metadata plus stored location
#[derive(Debug, Clone)]
pub struct AttachmentRecord {
    pub meta: FileMeta,
    pub stored_file_name: String,
    pub storage_path: String,
}

/// SQL store over a pooled sqlite database
pub struct ContentSqlStore {
    pool: Pool<SqliteConnectionManager>,
}

// Only unique/primary-key violations count; a FK or CHECK failure must not
// masquerade as a duplicate.
fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e.sqlite_error(),
        Some(err) if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

impl ContentSqlStore {
    /// Create a store over an existing pool, applying pending migrations
    pub fn new(pool: Pool<SqliteConnectionManager>) -> Result<Self, ContentError> {
        migrations::migrate(&pool)?;
        Ok(Self { pool })
    }

    /// Open (or create) a database file and build a pooled store over it
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::new(manager)?;
        Self::new(pool)
    }

    /// In-memory store for tests
    pub fn memory() -> Result<Self, ContentError> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        // A single connection so every handle sees the same in-memory db.
        let pool = Pool::builder().max_size(1).build(manager)?;
        Self::new(pool)
    }

    // ===== Classrooms =====

    /// Insert a classroom and its creator's facilitator membership atomically
    pub fn create_classroom_with_facilitator(
        &self,
        code: &str,
        name: &str,
        unit_code: Option<&str>,
        description: Option<&str>,
        creator: &UserId,
    ) -> Result<(Classroom, ClassroomMember), ContentError> {
        let now = Timestamp::now();
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO classrooms (code, name, unit_code, description, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![code, name, unit_code, description, now.as_millis() as i64],
        )?;
        let classroom_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO members (classroom_id, user_id, role, created_at)
             VALUES (?, ?, ?, ?)",
            params![
                classroom_id,
                creator.as_str(),
                MemberRole::Facilitator.as_tag(),
                now.as_millis() as i64
            ],
        )?;
        let member_id = tx.last_insert_rowid();

        tx.commit()?;

        let classroom = Classroom {
            id: ClassroomId::new(classroom_id),
            code: code.to_string(),
            name: name.to_string(),
            unit_code: unit_code.map(str::to_string),
            description: description.map(str::to_string),
            created_at: now,
        };
        let member = ClassroomMember {
            id: MemberId::new(member_id),
            classroom_id: classroom.id,
            user_id: creator.clone(),
            role: MemberRole::Facilitator,
            created_at: now,
        };
        Ok((classroom, member))
    }

    pub fn classroom_by_code(&self, code: &str) -> Result<Option<Classroom>, ContentError> {
        let conn = self.pool.get()?;
        let classroom = conn
            .query_row(
                "SELECT id, code, name, unit_code, description, created_at
                 FROM classrooms WHERE code = ?",
                params![code],
                Self::decode_classroom,
            )
            .optional()?;
        Ok(classroom)
    }

    pub fn classroom_by_id(&self, id: ClassroomId) -> Result<Option<Classroom>, ContentError> {
        let conn = self.pool.get()?;
        let classroom = conn
            .query_row(
                "SELECT id, code, name, unit_code, description, created_at
                 FROM classrooms WHERE id = ?",
                params![id.as_i64()],
                Self::decode_classroom,
            )
            .optional()?;
        Ok(classroom)
    }

    pub fn update_classroom(&self, classroom: &Classroom) -> Result<(), ContentError> {
        let conn = self.pool.get()?;
        // The join code is immutable once assigned; it is not updatable here.
        conn.execute(
            "UPDATE classrooms SET name = ?, unit_code = ?, description = ? WHERE id = ?",
            params![
                classroom.name,
                classroom.unit_code,
                classroom.description,
                classroom.id.as_i64()
            ],
        )?;
        Ok(())
    }

    /// Delete a classroom; cascades through members, content and sessions.
    /// Returns false when no such row existed.
    pub fn delete_classroom(&self, id: ClassroomId) -> Result<bool, ContentError> {
        let conn = self.pool.get()?;
        let affected = conn.execute(
            "DELETE FROM classrooms WHERE id = ?",
            params![id.as_i64()],
        )?;
        Ok(affected > 0)
    }

    // ===== Members =====

    pub fn insert_member(
        &self,
        classroom_id: ClassroomId,
        user_id: &UserId,
        role: MemberRole,
    ) -> Result<ClassroomMember, ContentError> {
        let now = Timestamp::now();
        let conn = self.pool.get()?;
        let result = conn.execute(
            "INSERT INTO members (classroom_id, user_id, role, created_at)
             VALUES (?, ?, ?, ?)",
            params![
                classroom_id.as_i64(),
                user_id.as_str(),
                role.as_tag(),
                now.as_millis() as i64
            ],
        );

        match result {
            Ok(_) => Ok(ClassroomMember {
                id: MemberId::new(conn.last_insert_rowid()),
                classroom_id,
                user_id: user_id.clone(),
                role,
                created_at: now,
            }),
            Err(e) if is_unique_violation(&e) => {
                Err(ContentError::Conflict("duplicate classroom membership"))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn member_of(
        &self,
        classroom_id: ClassroomId,
        user_id: &UserId,
    ) -> Result<Option<ClassroomMember>, ContentError> {
        let conn = self.pool.get()?;
        let member = conn
            .query_row(
                "SELECT id, classroom_id, user_id, role, created_at
                 FROM members WHERE classroom_id = ? AND user_id = ?",
                params![classroom_id.as_i64(), user_id.as_str()],
                Self::decode_member_raw,
            )
            .optional()?;
        member.map(Self::finish_member).transpose()
    }

    pub fn member_by_id(&self, id: MemberId) -> Result<Option<ClassroomMember>, ContentError> {
        let conn = self.pool.get()?;
        let member = conn
            .query_row(
                "SELECT id, classroom_id, user_id, role, created_at
                 FROM members WHERE id = ?",
                params![id.as_i64()],
                Self::decode_member_raw,
            )
            .optional()?;
        member.map(Self::finish_member).transpose()
    }

    /// A user's memberships, facilitator roles first, newest first within a
    /// role
    pub fn memberships_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ClassroomMember>, ContentError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, classroom_id, user_id, role, created_at
             FROM members WHERE user_id = ?
             ORDER BY role ASC, created_at DESC",
        )?;
        let rows = stmt.query_map(params![user_id.as_str()], Self::decode_member_raw)?;
        rows.map(|row| Self::finish_member(row?))
            .collect::<Result<Vec<_>, _>>()
    }

    pub fn members_of_classroom(
        &self,
        classroom_id: ClassroomId,
    ) -> Result<Vec<ClassroomMember>, ContentError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, classroom_id, user_id, role, created_at
             FROM members WHERE classroom_id = ? ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![classroom_id.as_i64()], Self::decode_member_raw)?;
        rows.map(|row| Self::finish_member(row?))
            .collect::<Result<Vec<_>, _>>()
    }

    pub fn delete_member(&self, id: MemberId) -> Result<bool, ContentError> {
        let conn = self.pool.get()?;
        let affected = conn.execute("DELETE FROM members WHERE id = ?", params![id.as_i64()])?;
        Ok(affected > 0)
    }

    // ===== Content nodes =====

    pub fn insert_post(
        &self,
        author: MemberId,
        title: &str,
        body: &str,
        kind: &PostKind,
    ) -> Result<Post, ContentError> {
        let now = Timestamp::now();
        let (tag, due_date, total_points) = match kind {
            PostKind::Post => ("Post", None, None),
            PostKind::Assignment(detail) => (
                "Assignment",
                detail.due_date.map(|t| t.as_millis() as i64),
                Some(detail.total_points as i64),
            ),
        };

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO posts (author_id, title, body, type, due_date, total_points, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                author.as_i64(),
                title,
                body,
                tag,
                due_date,
                total_points,
                now.as_millis() as i64
            ],
        )?;

        Ok(Post {
            id: PostId::new(conn.last_insert_rowid()),
            author,
            title: title.to_string(),
            body: body.to_string(),
            created_at: now,
            kind: kind.clone(),
        })
    }

    pub fn post_by_id(&self, id: PostId) -> Result<Option<Post>, ContentError> {
        let conn = self.pool.get()?;
        let row = conn
            .query_row(
                "SELECT id, author_id, title, body, type, due_date, total_points, created_at
                 FROM posts WHERE id = ?",
                params![id.as_i64()],
                Self::decode_post_raw,
            )
            .optional()?;
        row.map(Self::finish_post).transpose()
    }

    /// Content nodes of one classroom filtered by variant tag, newest first
    pub fn posts_for_classroom(
        &self,
        classroom_id: ClassroomId,
        tag: &str,
    ) -> Result<Vec<Post>, ContentError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT p.id, p.author_id, p.title, p.body, p.type, p.due_date, p.total_points,
                    p.created_at
             FROM posts p
             JOIN members m ON m.id = p.author_id
             WHERE m.classroom_id = ? AND p.type = ?
             ORDER BY p.created_at DESC",
        )?;
        let rows = stmt.query_map(params![classroom_id.as_i64(), tag], Self::decode_post_raw)?;
        rows.map(|row| Self::finish_post(row?))
            .collect::<Result<Vec<_>, _>>()
    }

    /// The classroom a post belongs to, via its author's membership
    pub fn classroom_of_post(&self, id: PostId) -> Result<Option<ClassroomId>, ContentError> {
        let conn = self.pool.get()?;
        let classroom_id: Option<i64> = conn
            .query_row(
                "SELECT m.classroom_id FROM posts p
                 JOIN members m ON m.id = p.author_id
                 WHERE p.id = ?",
                params![id.as_i64()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(classroom_id.map(ClassroomId::new))
    }

    pub fn update_post(&self, post: &Post) -> Result<(), ContentError> {
        let (due_date, total_points) = match &post.kind {
            PostKind::Post => (None, None),
            PostKind::Assignment(detail) => (
                detail.due_date.map(|t| t.as_millis() as i64),
                Some(detail.total_points as i64),
            ),
        };
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE posts SET title = ?, body = ?, due_date = ?, total_points = ? WHERE id = ?",
            params![post.title, post.body, due_date, total_points, post.id.as_i64()],
        )?;
        Ok(())
    }

    pub fn delete_post(&self, id: PostId) -> Result<bool, ContentError> {
        let conn = self.pool.get()?;
        let affected = conn.execute("DELETE FROM posts WHERE id = ?", params![id.as_i64()])?;
        Ok(affected > 0)
    }

    // ===== Comment nodes =====

    pub fn insert_comment(
        &self,
        post_id: PostId,
        author: MemberId,
        body: &str,
        tag: &str,
    ) -> Result<Comment, ContentError> {
        let now = Timestamp::now();
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO comments (post_id, author_id, body, type, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                post_id.as_i64(),
                author.as_i64(),
                body,
                tag,
                now.as_millis() as i64
            ],
        )?;

        let kind = CommentKind::from_row(tag, None)?;
        Ok(Comment {
            id: CommentId::new(conn.last_insert_rowid()),
            post_id,
            author,
            body: body.to_string(),
            created_at: now,
            kind,
        })
    }

    pub fn comment_by_id(&self, id: CommentId) -> Result<Option<Comment>, ContentError> {
        let conn = self.pool.get()?;
        let row = conn
            .query_row(
                "SELECT c.id, c.post_id, c.author_id, c.body, c.type, c.created_at,
                        g.id, g.points, g.comments, g.created_at
                 FROM comments c
                 LEFT JOIN grades g ON g.comment_id = c.id
                 WHERE c.id = ?",
                params![id.as_i64()],
                Self::decode_comment_raw,
            )
            .optional()?;
        row.map(Self::finish_comment).transpose()
    }

    pub fn comments_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, ContentError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.post_id, c.author_id, c.body, c.type, c.created_at,
                    g.id, g.points, g.comments, g.created_at
             FROM comments c
             LEFT JOIN grades g ON g.comment_id = c.id
             WHERE c.post_id = ?
             ORDER BY c.created_at ASC",
        )?;
        let rows = stmt.query_map(params![post_id.as_i64()], Self::decode_comment_raw)?;
        rows.map(|row| Self::finish_comment(row?))
            .collect::<Result<Vec<_>, _>>()
    }

    pub fn delete_comment(&self, id: CommentId) -> Result<bool, ContentError> {
        let conn = self.pool.get()?;
        let affected = conn.execute("DELETE FROM comments WHERE id = ?", params![id.as_i64()])?;
        Ok(affected > 0)
    }

    // ===== Grades =====

    /// Insert a grade; a second grade on the same submission is a conflict
    pub fn insert_grade(
        &self,
        comment_id: CommentId,
        points: u32,
        comments: Option<&str>,
    ) -> Result<Grade, ContentError> {
        let now = Timestamp::now();
        let conn = self.pool.get()?;
        let result = conn.execute(
            "INSERT INTO grades (comment_id, points, comments, created_at)
             VALUES (?, ?, ?, ?)",
            params![
                comment_id.as_i64(),
                points as i64,
                comments,
                now.as_millis() as i64
            ],
        );

        match result {
            Ok(_) => Ok(Grade {
                id: GradeId::new(conn.last_insert_rowid()),
                points,
                comments: comments.map(str::to_string),
                created_at: now,
            }),
            Err(e) if is_unique_violation(&e) => {
                Err(ContentError::Conflict("submission is already graded"))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite an existing grade (the audited revision path)
    pub fn update_grade(
        &self,
        comment_id: CommentId,
        points: u32,
        comments: Option<&str>,
    ) -> Result<Grade, ContentError> {
        let conn = self.pool.get()?;
        let affected = conn.execute(
            "UPDATE grades SET points = ?, comments = ? WHERE comment_id = ?",
            params![points as i64, comments, comment_id.as_i64()],
        )?;
        if affected == 0 {
            return Err(ContentError::NotFound("grade"));
        }

        conn.query_row(
            "SELECT id, points, comments, created_at FROM grades WHERE comment_id = ?",
            params![comment_id.as_i64()],
            Self::decode_grade,
        )
        .map_err(Into::into)
    }

    /// All grades earned by one user across classrooms, newest first
    pub fn grades_for_user(&self, user_id: &UserId) -> Result<Vec<Grade>, ContentError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT g.id, g.points, g.comments, g.created_at
             FROM grades g
             JOIN comments c ON c.id = g.comment_id
             JOIN members m ON m.id = c.author_id
             WHERE m.user_id = ?
             ORDER BY g.created_at DESC",
        )?;
        let rows = stmt.query_map(params![user_id.as_str()], Self::decode_grade)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ===== Attachments =====

    /// Insert a batch of attachments under one owner in one transaction
    pub fn insert_attachments(
        &self,
        owner: AttachmentOwner,
        records: &[AttachmentRecord],
    ) -> Result<Vec<Attachment>, ContentError> {
        let now = Timestamp::now();
        let (post_id, comment_id, submission_id) = match owner {
            AttachmentOwner::Post(id) => (Some(id.as_i64()), None, None),
            AttachmentOwner::Comment(id) => (None, Some(id.as_i64()), None),
            AttachmentOwner::Submission(id) => (None, None, Some(id.as_i64())),
        };

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let mut inserted = Vec::with_capacity(records.len());

        for record in records {
            tx.execute(
                "INSERT INTO attachments
                    (type, post_id, comment_id, submission_id, title, original_file_name,
                     stored_file_name, storage_path, mime_type, size, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    owner.tag(),
                    post_id,
                    comment_id,
                    submission_id,
                    record.stored_file_name,
                    record.meta.original_file_name,
                    record.stored_file_name,
                    record.storage_path,
                    record.meta.mime_type,
                    record.meta.size as i64,
                    now.as_millis() as i64
                ],
            )?;

            inserted.push(Attachment {
                id: AttachmentId::new(tx.last_insert_rowid()),
                owner,
                title: record.stored_file_name.clone(),
                original_file_name: record.meta.original_file_name.clone(),
                stored_file_name: record.stored_file_name.clone(),
                storage_path: record.storage_path.clone(),
                mime_type: record.meta.mime_type.clone(),
                size: record.meta.size,
                created_at: now,
            });
        }

        tx.commit()?;
        Ok(inserted)
    }

    pub fn attachment_by_id(&self, id: AttachmentId) -> Result<Option<Attachment>, ContentError> {
        let conn = self.pool.get()?;
        let row = conn
            .query_row(
                "SELECT id, type, post_id, comment_id, submission_id, title,
                        original_file_name, stored_file_name, storage_path, mime_type, size,
                        created_at
                 FROM attachments WHERE id = ?",
                params![id.as_i64()],
                Self::decode_attachment_raw,
            )
            .optional()?;
        row.map(Self::finish_attachment).transpose()
    }

    pub fn attachments_for_owner(
        &self,
        owner: AttachmentOwner,
    ) -> Result<Vec<Attachment>, ContentError> {
        let (column, id) = match owner {
            AttachmentOwner::Post(id) => ("post_id", id.as_i64()),
            AttachmentOwner::Comment(id) => ("comment_id", id.as_i64()),
            AttachmentOwner::Submission(id) => ("submission_id", id.as_i64()),
        };
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, type, post_id, comment_id, submission_id, title,
                    original_file_name, stored_file_name, storage_path, mime_type, size,
                    created_at
             FROM attachments WHERE {} = ? ORDER BY created_at ASC",
            column
        ))?;
        let rows = stmt.query_map(params![id], Self::decode_attachment_raw)?;
        rows.map(|row| Self::finish_attachment(row?))
            .collect::<Result<Vec<_>, _>>()
    }

    pub fn delete_attachment(&self, id: AttachmentId) -> Result<bool, ContentError> {
        let conn = self.pool.get()?;
        let affected =
            conn.execute("DELETE FROM attachments WHERE id = ?", params![id.as_i64()])?;
        Ok(affected > 0)
    }

    /// Storage paths of every attachment under a classroom, for byte cleanup
    /// ahead of a cascading delete
    pub fn attachment_paths_for_classroom(
        &self,
        classroom_id: ClassroomId,
    ) -> Result<Vec<String>, ContentError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT a.storage_path
             FROM attachments a
             LEFT JOIN comments c ON c.id = COALESCE(a.comment_id, a.submission_id)
             JOIN posts p ON p.id = COALESCE(a.post_id, c.post_id)
             JOIN members m ON m.id = p.author_id
             WHERE m.classroom_id = ?",
        )?;
        let rows = stmt.query_map(params![classroom_id.as_i64()], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Storage paths of every attachment under a post's subtree
    pub fn attachment_paths_for_post(&self, post_id: PostId) -> Result<Vec<String>, ContentError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT a.storage_path
             FROM attachments a
             LEFT JOIN comments c ON c.id = COALESCE(a.comment_id, a.submission_id)
             WHERE a.post_id = ? OR c.post_id = ?",
        )?;
        let rows = stmt.query_map(params![post_id.as_i64(), post_id.as_i64()], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ===== Video sessions =====

    pub fn insert_video_session(
        &self,
        classroom_id: ClassroomId,
        owner: MemberId,
        code: &str,
    ) -> Result<VideoSession, ContentError> {
        let now = Timestamp::now();
        let conn = self.pool.get()?;
        let result = conn.execute(
            "INSERT INTO video_sessions (classroom_id, owner_id, code, created_at)
             VALUES (?, ?, ?, ?)",
            params![
                classroom_id.as_i64(),
                owner.as_i64(),
                code,
                now.as_millis() as i64
            ],
        );

        match result {
            Ok(_) => Ok(VideoSession {
                id: SessionId::new(conn.last_insert_rowid()),
                classroom_id,
                owner,
                code: code.to_string(),
                created_at: now,
            }),
            Err(e) if is_unique_violation(&e) => {
                Err(ContentError::Conflict("duplicate session code"))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn video_session_by_code(
        &self,
        code: &str,
    ) -> Result<Option<VideoSession>, ContentError> {
        let conn = self.pool.get()?;
        let session = conn
            .query_row(
                "SELECT id, classroom_id, owner_id, code, created_at
                 FROM video_sessions WHERE code = ?",
                params![code],
                |row| {
                    Ok(VideoSession {
                        id: SessionId::new(row.get(0)?),
                        classroom_id: ClassroomId::new(row.get(1)?),
                        owner: MemberId::new(row.get(2)?),
                        code: row.get(3)?,
                        created_at: Timestamp::from_millis(row.get::<_, i64>(4)? as u64),
                    })
                },
            )
            .optional()?;
        Ok(session)
    }

    pub fn insert_session_participant(
        &self,
        session_id: SessionId,
        member_id: MemberId,
    ) -> Result<VideoSessionParticipant, ContentError> {
        let now = Timestamp::now();
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO session_participants (session_id, member_id, created_at)
             VALUES (?, ?, ?)",
            params![session_id.as_i64(), member_id.as_i64(), now.as_millis() as i64],
        )?;
        Ok(VideoSessionParticipant {
            id: ParticipantId::new(conn.last_insert_rowid()),
            session_id,
            member_id,
            created_at: now,
        })
    }

    pub fn participants_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<VideoSessionParticipant>, ContentError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, session_id, member_id, created_at
             FROM session_participants WHERE session_id = ? ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![session_id.as_i64()], |row| {
            Ok(VideoSessionParticipant {
                id: ParticipantId::new(row.get(0)?),
                session_id: SessionId::new(row.get(1)?),
                member_id: MemberId::new(row.get(2)?),
                created_at: Timestamp::from_millis(row.get::<_, i64>(3)? as u64),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ===== Row decoding =====

    fn decode_classroom(row: &Row<'_>) -> Result<Classroom, rusqlite::Error> {
        Ok(Classroom {
            id: ClassroomId::new(row.get(0)?),
            code: row.get(1)?,
            name: row.get(2)?,
            unit_code: row.get(3)?,
            description: row.get(4)?,
            created_at: Timestamp::from_millis(row.get::<_, i64>(5)? as u64),
        })
    }

    // Tag decoding happens outside the rusqlite closure so integrity errors
    // keep their own type instead of being shoehorned into rusqlite::Error.
    fn decode_member_raw(row: &Row<'_>) -> Result<MemberRaw, rusqlite::Error> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
    }

    fn finish_member(
        (id, classroom_id, user_id, role, created_at): MemberRaw,
    ) -> Result<ClassroomMember, ContentError> {
        Ok(ClassroomMember {
            id: MemberId::new(id),
            classroom_id: ClassroomId::new(classroom_id),
            user_id: UserId::new(user_id),
            role: MemberRole::from_tag(&role)?,
            created_at: Timestamp::from_millis(created_at as u64),
        })
    }

    fn decode_post_raw(row: &Row<'_>) -> Result<PostRaw, rusqlite::Error> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
        ))
    }

    fn finish_post(
        (id, author_id, title, body, tag, due_date, total_points, created_at): PostRaw,
    ) -> Result<Post, ContentError> {
        let kind = PostKind::from_row(
            &tag,
            due_date.map(|ms| Timestamp::from_millis(ms as u64)),
            total_points.map(|p| p as u32),
        )?;
        Ok(Post {
            id: PostId::new(id),
            author: MemberId::new(author_id),
            title,
            body,
            created_at: Timestamp::from_millis(created_at as u64),
            kind,
        })
    }

    fn decode_comment_raw(row: &Row<'_>) -> Result<CommentRaw, rusqlite::Error> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
            row.get(8)?,
            row.get(9)?,
        ))
    }

    fn finish_comment(raw: CommentRaw) -> Result<Comment, ContentError> {
        let (id, post_id, author_id, body, tag, created_at, g_id, g_points, g_comments, g_created) =
            raw;
        let grade = match (g_id, g_points, g_created) {
            (Some(id), Some(points), Some(created)) => Some(Grade {
                id: GradeId::new(id),
                points: points as u32,
                comments: g_comments,
                created_at: Timestamp::from_millis(created as u64),
            }),
            _ => None,
        };
        let kind = CommentKind::from_row(&tag, grade)?;
        Ok(Comment {
            id: CommentId::new(id),
            post_id: PostId::new(post_id),
            author: MemberId::new(author_id),
            body,
            created_at: Timestamp::from_millis(created_at as u64),
            kind,
        })
    }

    fn decode_grade(row: &Row<'_>) -> Result<Grade, rusqlite::Error> {
        Ok(Grade {
            id: GradeId::new(row.get(0)?),
            points: row.get::<_, i64>(1)? as u32,
            comments: row.get(2)?,
            created_at: Timestamp::from_millis(row.get::<_, i64>(3)? as u64),
        })
    }

    fn decode_attachment_raw(row: &Row<'_>) -> Result<AttachmentRaw, rusqlite::Error> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
            row.get(8)?,
            row.get(9)?,
            row.get(10)?,
            row.get(11)?,
        ))
    }

    fn finish_attachment(raw: AttachmentRaw) -> Result<Attachment, ContentError> {
        let (
            id,
            tag,
            post_id,
            comment_id,
            submission_id,
            title,
            original_file_name,
            stored_file_name,
            storage_path,
            mime_type,
            size,
            created_at,
        ) = raw;
        let owner = AttachmentOwner::from_row(
            &tag,
            post_id.map(PostId::new),
            comment_id.map(CommentId::new),
            submission_id.map(CommentId::new),
        )?;
        Ok(Attachment {
            id: AttachmentId::new(id),
            owner,
            title,
            original_file_name,
            stored_file_name,
            storage_path,
            mime_type,
            size: size.unwrap_or(0) as u64,
            created_at: Timestamp::from_millis(created_at as u64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_model::AssignmentDetail;

    fn store() -> ContentSqlStore {
        ContentSqlStore::memory().unwrap()
    }

    fn seeded(store: &ContentSqlStore) -> (Classroom, ClassroomMember) {
        store
            .create_classroom_with_facilitator(
                "Q7X2PL",
                "Algorithms 201",
                Some("ALG201"),
                Some("Sorting and searching"),
                &UserId::new("fiona"),
            )
            .unwrap()
    }

    #[test]
    fn test_classroom_and_facilitator_created_atomically() {
        let store = store();
        let (classroom, member) = seeded(&store);

        assert_eq!(classroom.code, "Q7X2PL");
        assert_eq!(member.role, MemberRole::Facilitator);
        assert_eq!(member.classroom_id, classroom.id);

        let found = store.classroom_by_code("Q7X2PL").unwrap().unwrap();
        assert_eq!(found.id, classroom.id);
    }

    #[test]
    fn test_duplicate_membership_is_conflict() {
        let store = store();
        let (classroom, _) = seeded(&store);

        store
            .insert_member(classroom.id, &UserId::new("sam"), MemberRole::Student)
            .unwrap();
        let err = store
            .insert_member(classroom.id, &UserId::new("sam"), MemberRole::Student)
            .unwrap_err();
        assert!(matches!(err, ContentError::Conflict(_)));
    }

    #[test]
    fn test_post_round_trip_preserves_variant() {
        let store = store();
        let (_, member) = seeded(&store);

        let assignment = store
            .insert_post(
                member.id,
                "Problem set one",
                "Solve every exercise.",
                &PostKind::Assignment(AssignmentDetail {
                    due_date: Some(Timestamp::from_millis(42)),
                    total_points: 100,
                }),
            )
            .unwrap();

        let loaded = store.post_by_id(assignment.id).unwrap().unwrap();
        assert!(loaded.is_assignment());
        assert_eq!(loaded.assignment().unwrap().total_points, 100);
        assert_eq!(
            loaded.assignment().unwrap().due_date,
            Some(Timestamp::from_millis(42))
        );
    }

    #[test]
    fn test_posts_filtered_by_tag() {
        let store = store();
        let (classroom, member) = seeded(&store);

        store
            .insert_post(member.id, "Week one notes", "Read chapter one.", &PostKind::Post)
            .unwrap();
        store
            .insert_post(
                member.id,
                "Problem set one",
                "Solve every exercise.",
                &PostKind::Assignment(AssignmentDetail {
                    due_date: None,
                    total_points: 50,
                }),
            )
            .unwrap();

        let posts = store.posts_for_classroom(classroom.id, "Post").unwrap();
        let assignments = store
            .posts_for_classroom(classroom.id, "Assignment")
            .unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(assignments.len(), 1);
        assert!(assignments[0].is_assignment());
    }

    #[test]
    fn test_grade_uniqueness() {
        let store = store();
        let (_, member) = seeded(&store);
        let assignment = store
            .insert_post(
                member.id,
                "Problem set one",
                "Solve every exercise.",
                &PostKind::Assignment(AssignmentDetail {
                    due_date: None,
                    total_points: 100,
                }),
            )
            .unwrap();
        let submission = store
            .insert_comment(
                assignment.id,
                member.id,
                "Here is my work.",
                "AssignmentSubmission",
            )
            .unwrap();

        store.insert_grade(submission.id, 87, None).unwrap();
        let err = store.insert_grade(submission.id, 90, None).unwrap_err();
        assert!(matches!(err, ContentError::Conflict(_)));

        let loaded = store.comment_by_id(submission.id).unwrap().unwrap();
        assert_eq!(loaded.grade().unwrap().points, 87);
    }

    #[test]
    fn test_foreign_key_failure_is_not_a_conflict() {
        let store = store();
        seeded(&store);

        // Grading a submission that no longer exists trips the FK, which must
        // surface as a storage error rather than "already graded".
        let err = store.insert_grade(CommentId::new(999), 50, None).unwrap_err();
        assert!(matches!(err, ContentError::Storage(_)));
    }

    #[test]
    fn test_classroom_delete_cascades() {
        let store = store();
        let (classroom, member) = seeded(&store);
        let post = store
            .insert_post(member.id, "Week one notes", "Read chapter one.", &PostKind::Post)
            .unwrap();

        assert!(store.delete_classroom(classroom.id).unwrap());
        assert!(store.post_by_id(post.id).unwrap().is_none());
        assert!(store.member_by_id(member.id).unwrap().is_none());

        // Second delete finds nothing.
        assert!(!store.delete_classroom(classroom.id).unwrap());
    }

    #[test]
    fn test_attachment_batch_and_paths() {
        let store = store();
        let (classroom, member) = seeded(&store);
        let post = store
            .insert_post(member.id, "Week one notes", "Read chapter one.", &PostKind::Post)
            .unwrap();

        let records = vec![
            AttachmentRecord {
                meta: FileMeta {
                    original_file_name: "a.pdf".to_string(),
                    mime_type: "application/pdf".to_string(),
                    size: 3,
                },
                stored_file_name: "u1.pdf".to_string(),
                storage_path: "/files/u1.pdf".to_string(),
            },
            AttachmentRecord {
                meta: FileMeta {
                    original_file_name: "b.pdf".to_string(),
                    mime_type: "application/pdf".to_string(),
                    size: 3,
                },
                stored_file_name: "u2.pdf".to_string(),
                storage_path: "/files/u2.pdf".to_string(),
            },
        ];
        let inserted = store
            .insert_attachments(AttachmentOwner::Post(post.id), &records)
            .unwrap();
        assert_eq!(inserted.len(), 2);

        let mut paths = store.attachment_paths_for_classroom(classroom.id).unwrap();
        paths.sort();
        assert_eq!(paths, vec!["/files/u1.pdf", "/files/u2.pdf"]);
    }

    #[test]
    fn test_memberships_facilitators_first() {
        let store = store();
        let (classroom, _) = seeded(&store);
        let (other, _) = store
            .create_classroom_with_facilitator(
                "ZZTOP1",
                "History 101",
                None,
                None,
                &UserId::new("sam"),
            )
            .unwrap();
        store
            .insert_member(classroom.id, &UserId::new("sam"), MemberRole::Student)
            .unwrap();

        let memberships = store.memberships_for_user(&UserId::new("sam")).unwrap();
        assert_eq!(memberships.len(), 2);
        assert_eq!(memberships[0].role, MemberRole::Facilitator);
        assert_eq!(memberships[0].classroom_id, other.id);
        assert_eq!(memberships[1].role, MemberRole::Student);
    }
}
