//! Content nodes: posts and assignments as one closed tagged union

use super::classroom::IntegrityError;
use super::types::{MemberId, PostId, Timestamp};
use serde::{Deserialize, Serialize};

/// Highest number of points an assignment can be worth
pub const MAX_TOTAL_POINTS: u32 = 100;

/// A content node authored by a classroom member
///
/// The persisted form is a single table with a `type` discriminator column;
/// decoding selects the variant from the tag and treats anything else as a
/// data-integrity failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier
    pub id: PostId,

    /// Authoring membership
    pub author: MemberId,

    /// Title, at least 8 characters
    pub title: String,

    /// Body, at least 10 characters
    pub body: String,

    /// When the node was created
    pub created_at: Timestamp,

    /// Variant data
    pub kind: PostKind,
}

/// The two content node variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PostKind {
    /// Plain content
    Post,

    /// Gradeable content with an optional submission window
    Assignment(AssignmentDetail),
}

/// Fields carried only by the Assignment variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentDetail {
    /// Submissions close at this instant when set
    pub due_date: Option<Timestamp>,

    /// Upper bound for grades on submissions, within 0..=100
    pub total_points: u32,
}

impl Post {
    /// The canonical discriminator written to the `type` column
    pub fn tag(&self) -> &'static str {
        match self.kind {
            PostKind::Post => "Post",
            PostKind::Assignment(_) => "Assignment",
        }
    }

    pub fn is_assignment(&self) -> bool {
        matches!(self.kind, PostKind::Assignment(_))
    }

    /// Assignment detail, if this node is an assignment
    pub fn assignment(&self) -> Option<&AssignmentDetail> {
        match &self.kind {
            PostKind::Assignment(detail) => Some(detail),
            PostKind::Post => None,
        }
    }
}

impl PostKind {
    /// Reassemble a variant from its persisted tag and columns
    ///
    /// An Assignment row without `total_points` and any unknown tag are hard
    /// integrity errors; a plain Post carrying assignment columns is likewise
    /// rejected rather than silently ignored.
    pub fn from_row(
        tag: &str,
        due_date: Option<Timestamp>,
        total_points: Option<u32>,
    ) -> Result<Self, IntegrityError> {
        match tag {
            "Post" => {
                if due_date.is_some() || total_points.is_some() {
                    return Err(IntegrityError::MalformedRow {
                        column: "posts.type",
                        detail: "Post row carries assignment columns".to_string(),
                    });
                }
                Ok(PostKind::Post)
            }
            "Assignment" => {
                let total_points = total_points.ok_or(IntegrityError::MalformedRow {
                    column: "posts.total_points",
                    detail: "Assignment row without total_points".to_string(),
                })?;
                Ok(PostKind::Assignment(AssignmentDetail {
                    due_date,
                    total_points,
                }))
            }
            other => Err(IntegrityError::UnknownTag {
                column: "posts.type",
                tag: other.to_string(),
            }),
        }
    }
}

impl AssignmentDetail {
    /// Whether a submission arriving at `now` is still inside the window
    pub fn accepts_submissions_at(&self, now: Timestamp) -> bool {
        match self.due_date {
            Some(due) => now <= due,
            None => true,
        }
    }
}
