//! Classroom and membership data structures

use super::types::{ClassroomId, MemberId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A code-joinable group of members and their content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classroom {
    /// Unique identifier
    pub id: ClassroomId,

    /// Short human-shareable join code, immutable once assigned
    pub code: String,

    /// Human-readable name
    pub name: String,

    /// Unit code (e.g. "ALG201")
    pub unit_code: Option<String>,

    /// Optional description
    pub description: Option<String>,

    /// When the classroom was created
    pub created_at: Timestamp,
}

/// A user's role within one classroom, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberRole {
    Facilitator,
    Student,
}

impl MemberRole {
    pub fn as_tag(&self) -> &'static str {
        match self {
            MemberRole::Facilitator => "Facilitator",
            MemberRole::Student => "Student",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self, IntegrityError> {
        match tag {
            "Facilitator" => Ok(MemberRole::Facilitator),
            "Student" => Ok(MemberRole::Student),
            other => Err(IntegrityError::UnknownTag {
                column: "members.role",
                tag: other.to_string(),
            }),
        }
    }
}

/// Application-wide role resolved by the identity collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobalRole {
    User,
    Admin,
}

/// One user's membership in one classroom
///
/// At most one membership exists per (classroom, user) pair; the schema
/// enforces this with a unique index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassroomMember {
    /// Unique identifier
    pub id: MemberId,

    /// Owning classroom
    pub classroom_id: ClassroomId,

    /// The member's user identity
    pub user_id: UserId,

    /// Role, fixed at creation
    pub role: MemberRole,

    /// When the membership was created
    pub created_at: Timestamp,
}

impl ClassroomMember {
    pub fn is_facilitator(&self) -> bool {
        self.role == MemberRole::Facilitator
    }
}

/// A live, code-identified signaling room tied to a classroom
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSession {
    /// Unique identifier
    pub id: super::types::SessionId,

    /// Owning classroom
    pub classroom_id: ClassroomId,

    /// The facilitator member who opened the session
    pub owner: MemberId,

    /// Short unique room code
    pub code: String,

    /// When the session was created
    pub created_at: Timestamp,
}

/// Best-effort audit row for a session join
///
/// Not the source of truth for who is currently connected; the live set
/// exists only in the coordinator's in-memory room membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSessionParticipant {
    pub id: super::types::ParticipantId,
    pub session_id: super::types::SessionId,
    pub member_id: MemberId,
    pub created_at: Timestamp,
}

/// A persisted row failed to decode into the closed type model
///
/// Raised when a discriminator column carries a tag the model does not
/// know, or a variant is missing a field its tag requires. Never recovered
/// from by defaulting.
#[derive(Debug, Clone, Error)]
pub enum IntegrityError {
    #[error("unknown tag '{tag}' in {column}")]
    UnknownTag { column: &'static str, tag: String },

    #[error("{column}: {detail}")]
    MalformedRow {
        column: &'static str,
        detail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_role_tag_round_trip() {
        for role in [MemberRole::Facilitator, MemberRole::Student] {
            assert_eq!(MemberRole::from_tag(role.as_tag()).unwrap(), role);
        }
    }

    #[test]
    fn test_member_role_unknown_tag_is_integrity_error() {
        let err = MemberRole::from_tag("Teacher").unwrap_err();
        assert!(matches!(err, IntegrityError::UnknownTag { .. }));
    }

    #[test]
    fn test_is_facilitator() {
        let member = ClassroomMember {
            id: MemberId::new(1),
            classroom_id: ClassroomId::new(1),
            user_id: UserId::new("alice"),
            role: MemberRole::Facilitator,
            created_at: Timestamp::now(),
        };
        assert!(member.is_facilitator());
    }
}
