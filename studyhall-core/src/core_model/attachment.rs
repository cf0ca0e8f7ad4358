//! Attachments: file references owned by exactly one content or comment node

use super::classroom::IntegrityError;
use super::types::{AttachmentId, CommentId, PostId, Timestamp};
use serde::{Deserialize, Serialize};

/// The owning parent of an attachment
///
/// Exactly one owner exists per attachment; the sum type makes the invariant
/// structural, and the schema backs it with a CHECK over the three nullable
/// foreign keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachmentOwner {
    /// Owned by a post or assignment
    Post(PostId),

    /// Owned by a discussion comment
    Comment(CommentId),

    /// Owned by an assignment submission
    Submission(CommentId),
}

impl AttachmentOwner {
    /// The canonical discriminator written to the `type` column
    pub fn tag(&self) -> &'static str {
        match self {
            AttachmentOwner::Post(_) => "PostAttachment",
            AttachmentOwner::Comment(_) => "PostCommentAttachment",
            AttachmentOwner::Submission(_) => "AssignmentSubmissionAttachment",
        }
    }

    /// Reassemble the owner from the tag and the three nullable columns
    pub fn from_row(
        tag: &str,
        post_id: Option<PostId>,
        comment_id: Option<CommentId>,
        submission_id: Option<CommentId>,
    ) -> Result<Self, IntegrityError> {
        let owners_set =
            post_id.is_some() as u8 + comment_id.is_some() as u8 + submission_id.is_some() as u8;
        if owners_set != 1 {
            return Err(IntegrityError::MalformedRow {
                column: "attachments",
                detail: format!("{} owner references set, expected exactly 1", owners_set),
            });
        }

        match (tag, post_id, comment_id, submission_id) {
            ("PostAttachment", Some(id), None, None) => Ok(AttachmentOwner::Post(id)),
            ("PostCommentAttachment", None, Some(id), None) => Ok(AttachmentOwner::Comment(id)),
            ("AssignmentSubmissionAttachment", None, None, Some(id)) => {
                Ok(AttachmentOwner::Submission(id))
            }
            ("PostAttachment", ..) | ("PostCommentAttachment", ..)
            | ("AssignmentSubmissionAttachment", ..) => Err(IntegrityError::MalformedRow {
                column: "attachments.type",
                detail: format!("tag '{}' does not match the set owner column", tag),
            }),
            (other, ..) => Err(IntegrityError::UnknownTag {
                column: "attachments.type",
                tag: other.to_string(),
            }),
        }
    }
}

/// Metadata describing an uploaded file, prior to storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMeta {
    /// Name the file had on the uploader's machine
    pub original_file_name: String,

    /// Declared media type
    pub mime_type: String,

    /// Size in bytes
    pub size: u64,
}

/// A stored file reference owned by exactly one parent node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    /// Unique identifier
    pub id: AttachmentId,

    /// Owning parent
    pub owner: AttachmentOwner,

    /// Display title (defaults to the stored file name)
    pub title: String,

    /// Name the file had on the uploader's machine
    pub original_file_name: String,

    /// Name under which the bytes were stored
    pub stored_file_name: String,

    /// Path in the file store
    pub storage_path: String,

    /// Declared media type
    pub mime_type: String,

    /// Size in bytes
    pub size: u64,

    /// When the attachment row was created
    pub created_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_tag_round_trip() {
        let owners = [
            AttachmentOwner::Post(PostId::new(1)),
            AttachmentOwner::Comment(CommentId::new(2)),
            AttachmentOwner::Submission(CommentId::new(3)),
        ];
        for owner in owners {
            let (post, comment, submission) = match owner {
                AttachmentOwner::Post(id) => (Some(id), None, None),
                AttachmentOwner::Comment(id) => (None, Some(id), None),
                AttachmentOwner::Submission(id) => (None, None, Some(id)),
            };
            let decoded =
                AttachmentOwner::from_row(owner.tag(), post, comment, submission).unwrap();
            assert_eq!(decoded, owner);
        }
    }

    #[test]
    fn test_zero_owners_is_malformed() {
        let err = AttachmentOwner::from_row("PostAttachment", None, None, None).unwrap_err();
        assert!(matches!(err, IntegrityError::MalformedRow { .. }));
    }

    #[test]
    fn test_two_owners_is_malformed() {
        let err = AttachmentOwner::from_row(
            "PostAttachment",
            Some(PostId::new(1)),
            Some(CommentId::new(2)),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, IntegrityError::MalformedRow { .. }));
    }

    #[test]
    fn test_tag_owner_mismatch_is_malformed() {
        let err =
            AttachmentOwner::from_row("PostAttachment", None, Some(CommentId::new(2)), None)
                .unwrap_err();
        assert!(matches!(err, IntegrityError::MalformedRow { .. }));
    }

    #[test]
    fn test_unknown_tag_is_fatal() {
        let err =
            AttachmentOwner::from_row("Thumbnail", Some(PostId::new(1)), None, None).unwrap_err();
        assert!(matches!(err, IntegrityError::UnknownTag { .. }));
    }
}
