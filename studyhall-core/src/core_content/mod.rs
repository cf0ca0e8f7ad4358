/*
    core_content - Classroom content operations

    The write path for everything a classroom holds:
    - Classrooms, join codes and memberships
    - Posts, assignments, comments and submissions
    - Attachment storage and cleanup
    - Grading
    - Video session rows for the live coordinator
*/

pub mod code;
pub mod error;
pub mod files;
pub mod mail;
pub mod payload;
pub mod service;
pub mod storage;

#[cfg(test)]
pub mod tests;

pub use error::ContentError;
pub use files::{FileStore, LocalFileStore, StoredFile};
pub use mail::{LogMailer, MailSender, Notification};
pub use payload::{AssignmentDraft, ClassroomDraft, CommentDraft, GradeDraft, PostDraft, Upload};
pub use service::ClassroomService;
pub use storage::ContentSqlStore;
