//! Content Type Model
//!
//! Closed tagged unions for the classroom content hierarchy:
//!
//! - **Post / Assignment**: the two content node variants
//! - **PostComment / Submission**: the two comment node variants
//! - **Attachment**: a file reference owned by exactly one parent node
//!
//! The persisted form is single-table-per-hierarchy with an explicit `type`
//! discriminator column. Decoding is total over the known tags; an unknown
//! tag or a variant missing its required fields surfaces as an
//! [`IntegrityError`] rather than a silent default.

pub mod attachment;
pub mod classroom;
pub mod comment;
pub mod post;
pub mod types;

pub use attachment::{Attachment, AttachmentOwner, FileMeta};
pub use classroom::{
    Classroom, ClassroomMember, GlobalRole, IntegrityError, MemberRole, VideoSession,
    VideoSessionParticipant,
};
pub use comment::{Comment, CommentKind, Grade};
pub use post::{AssignmentDetail, Post, PostKind, MAX_TOTAL_POINTS};
pub use types::{
    AttachmentId, ClassroomId, CommentId, GradeId, MemberId, ParticipantId, PostId, SessionId,
    Timestamp, UserId,
};
