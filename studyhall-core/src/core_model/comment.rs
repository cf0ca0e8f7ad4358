//! Comment nodes: post comments and assignment submissions

use super::classroom::IntegrityError;
use super::types::{CommentId, GradeId, MemberId, PostId, Timestamp};
use serde::{Deserialize, Serialize};

/// A comment node attached to a content node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier
    pub id: CommentId,

    /// The content node this comment is attached to
    pub post_id: PostId,

    /// Authoring membership
    pub author: MemberId,

    /// Comment body
    pub body: String,

    /// When the comment was created
    pub created_at: Timestamp,

    /// Variant data
    pub kind: CommentKind,
}

/// The two comment node variants
///
/// A comment's tag always mirrors the tag of its target: comments on plain
/// posts are `PostComment`, comments on assignments are `Submission`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CommentKind {
    /// Discussion comment on a post or assignment body
    PostComment,

    /// Graded work handed in against an assignment
    Submission {
        /// At most one grade, terminal once assigned
        grade: Option<Grade>,
    },
}

/// A one-to-one scored outcome attached to a submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grade {
    /// Unique identifier
    pub id: GradeId,

    /// Points awarded, within `[0, assignment.total_points]`
    pub points: u32,

    /// Optional feedback from the grader
    pub comments: Option<String>,

    /// When the grade was assigned
    pub created_at: Timestamp,
}

impl Comment {
    /// The canonical discriminator written to the `type` column
    pub fn tag(&self) -> &'static str {
        match self.kind {
            CommentKind::PostComment => "PostComment",
            CommentKind::Submission { .. } => "AssignmentSubmission",
        }
    }

    pub fn is_submission(&self) -> bool {
        matches!(self.kind, CommentKind::Submission { .. })
    }

    /// Grade on this submission, if any
    pub fn grade(&self) -> Option<&Grade> {
        match &self.kind {
            CommentKind::Submission { grade } => grade.as_ref(),
            CommentKind::PostComment => None,
        }
    }
}

impl CommentKind {
    /// Reassemble a variant from its persisted tag and (optional) grade row
    ///
    /// A grade joined onto a plain post comment is an integrity error, as is
    /// any unknown tag.
    pub fn from_row(tag: &str, grade: Option<Grade>) -> Result<Self, IntegrityError> {
        match tag {
            "PostComment" => {
                if grade.is_some() {
                    return Err(IntegrityError::MalformedRow {
                        column: "comments.type",
                        detail: "PostComment row joined to a grade".to_string(),
                    });
                }
                Ok(CommentKind::PostComment)
            }
            "AssignmentSubmission" => Ok(CommentKind::Submission { grade }),
            other => Err(IntegrityError::UnknownTag {
                column: "comments.type",
                tag: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grade(points: u32) -> Grade {
        Grade {
            id: GradeId::new(1),
            points,
            comments: None,
            created_at: Timestamp::now(),
        }
    }

    #[test]
    fn test_classify_post_comment() {
        let kind = CommentKind::from_row("PostComment", None).unwrap();
        assert!(matches!(kind, CommentKind::PostComment));
    }

    #[test]
    fn test_classify_submission_with_grade() {
        let kind = CommentKind::from_row("AssignmentSubmission", Some(grade(87))).unwrap();
        match kind {
            CommentKind::Submission { grade } => assert_eq!(grade.unwrap().points, 87),
            CommentKind::PostComment => panic!("expected submission"),
        }
    }

    #[test]
    fn test_grade_on_post_comment_is_malformed() {
        let err = CommentKind::from_row("PostComment", Some(grade(1))).unwrap_err();
        assert!(matches!(err, IntegrityError::MalformedRow { .. }));
    }

    #[test]
    fn test_unknown_tag_is_fatal() {
        let err = CommentKind::from_row("Reply", None).unwrap_err();
        assert!(matches!(err, IntegrityError::UnknownTag { .. }));
    }
}
