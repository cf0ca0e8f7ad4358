//! Authorization Policy
//!
//! Pure allow/deny decisions for classroom actions. No I/O: the caller loads
//! the actor's membership (or `None`) and the facts an action needs, then
//! asks for a [`Decision`].
//!
//! Rules apply in precedence order, first match wins:
//!
//! 1. Global administrators are always allowed.
//! 2. Actions that require membership are denied without one.
//! 3. Updating or deleting a content node requires being its author.
//! 4. Creating an assignment requires the facilitator role.
//! 5. Grading requires being the assignment's author.
//! 6. Removing a member requires a facilitator, and never targets another
//!    facilitator.
//! 7. Creating a video session requires the facilitator role.
//! 8. Viewing classroom content is open to any member.
//!
//! Deny is the default for everything else.

use crate::core_model::{ClassroomMember, GlobalRole, MemberRole, UserId};
use serde::{Deserialize, Serialize};

/// The authenticated identity asking to act
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub global_role: GlobalRole,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, global_role: GlobalRole) -> Self {
        Actor {
            user_id: UserId::new(user_id),
            global_role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.global_role == GlobalRole::Admin
    }
}

/// An action a policy decision is requested for
///
/// Variants carry the facts the rule needs and nothing else, so decisions
/// stay a pure function of their arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Read classroom content (rule 8)
    View,

    /// Author a plain post
    CreatePost,

    /// Author an assignment (rule 4)
    CreateAssignment,

    /// Comment on a post or submit against an assignment
    Comment,

    /// Update a content node authored by `author` (rule 3)
    Update { author: UserId },

    /// Delete a content node authored by `author` (rule 3)
    Delete { author: UserId },

    /// Grade a submission on an assignment authored by `assignment_author`
    /// (rule 5)
    Grade { assignment_author: UserId },

    /// Remove the membership of a member holding `target_role` (rule 6)
    RemoveMember { target_role: MemberRole },

    /// Open a video session (rule 7)
    CreateVideoSession,

    /// Join an existing video session
    JoinVideoSession,
}

/// Outcome of a policy check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        *self == Decision::Allow
    }
}

/// Decide whether `actor`, holding `membership` in the target classroom, may
/// perform `action`.
pub fn authorize(actor: &Actor, membership: Option<&ClassroomMember>, action: &Action) -> Decision {
    // Rule 1: administrators are audited, not blocked.
    if actor.is_admin() {
        return Decision::Allow;
    }

    // Rule 2: every remaining action is classroom-scoped.
    let member = match membership {
        Some(member) => member,
        None => return Decision::Deny,
    };

    match action {
        Action::Update { author } | Action::Delete { author } => {
            if &actor.user_id == author {
                Decision::Allow
            } else {
                Decision::Deny
            }
        }
        Action::CreateAssignment => {
            if member.is_facilitator() {
                Decision::Allow
            } else {
                Decision::Deny
            }
        }
        Action::Grade { assignment_author } => {
            if &actor.user_id == assignment_author {
                Decision::Allow
            } else {
                Decision::Deny
            }
        }
        Action::RemoveMember { target_role } => {
            if member.is_facilitator() && *target_role != MemberRole::Facilitator {
                Decision::Allow
            } else {
                Decision::Deny
            }
        }
        Action::CreateVideoSession => {
            if member.is_facilitator() {
                Decision::Allow
            } else {
                Decision::Deny
            }
        }
        Action::View | Action::CreatePost | Action::Comment | Action::JoinVideoSession => {
            Decision::Allow
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_model::{ClassroomId, MemberId, Timestamp};

    fn member(user: &str, role: MemberRole) -> ClassroomMember {
        ClassroomMember {
            id: MemberId::new(1),
            classroom_id: ClassroomId::new(1),
            user_id: UserId::new(user),
            role,
            created_at: Timestamp::now(),
        }
    }

    fn facilitator(user: &str) -> ClassroomMember {
        member(user, MemberRole::Facilitator)
    }

    fn student(user: &str) -> ClassroomMember {
        member(user, MemberRole::Student)
    }

    #[test]
    fn test_admin_always_allowed() {
        let admin = Actor::new("root", GlobalRole::Admin);
        for action in [
            Action::View,
            Action::CreateAssignment,
            Action::Delete {
                author: UserId::new("someone-else"),
            },
            Action::RemoveMember {
                target_role: MemberRole::Facilitator,
            },
        ] {
            assert_eq!(authorize(&admin, None, &action), Decision::Allow);
        }
    }

    #[test]
    fn test_non_member_denied() {
        let actor = Actor::new("alice", GlobalRole::User);
        assert_eq!(authorize(&actor, None, &Action::View), Decision::Deny);
        assert_eq!(authorize(&actor, None, &Action::CreatePost), Decision::Deny);
    }

    #[test]
    fn test_update_requires_authorship() {
        let actor = Actor::new("alice", GlobalRole::User);
        let membership = facilitator("alice");

        let own = Action::Update {
            author: UserId::new("alice"),
        };
        let other = Action::Update {
            author: UserId::new("bob"),
        };
        assert_eq!(authorize(&actor, Some(&membership), &own), Decision::Allow);
        // Membership alone is insufficient, facilitator or not.
        assert_eq!(authorize(&actor, Some(&membership), &other), Decision::Deny);
    }

    #[test]
    fn test_student_cannot_create_assignment() {
        let actor = Actor::new("sam", GlobalRole::User);
        let membership = student("sam");
        assert_eq!(
            authorize(&actor, Some(&membership), &Action::CreateAssignment),
            Decision::Deny
        );
        assert_eq!(
            authorize(&actor, Some(&membership), &Action::CreatePost),
            Decision::Allow
        );
    }

    #[test]
    fn test_grading_restricted_to_assignment_author() {
        let owner = Actor::new("fiona", GlobalRole::User);
        let other_facilitator = Actor::new("franz", GlobalRole::User);
        let action = Action::Grade {
            assignment_author: UserId::new("fiona"),
        };

        assert_eq!(
            authorize(&owner, Some(&facilitator("fiona")), &action),
            Decision::Allow
        );
        // A facilitator who did not author the assignment may not grade it.
        assert_eq!(
            authorize(&other_facilitator, Some(&facilitator("franz")), &action),
            Decision::Deny
        );
    }

    #[test]
    fn test_member_removal_rules() {
        let actor = Actor::new("fiona", GlobalRole::User);
        let remove_student = Action::RemoveMember {
            target_role: MemberRole::Student,
        };
        let remove_facilitator = Action::RemoveMember {
            target_role: MemberRole::Facilitator,
        };

        assert_eq!(
            authorize(&actor, Some(&facilitator("fiona")), &remove_student),
            Decision::Allow
        );
        assert_eq!(
            authorize(&actor, Some(&facilitator("fiona")), &remove_facilitator),
            Decision::Deny
        );
        assert_eq!(
            authorize(&actor, Some(&student("fiona")), &remove_student),
            Decision::Deny
        );
    }

    #[test]
    fn test_video_session_rules() {
        let actor = Actor::new("fiona", GlobalRole::User);
        assert_eq!(
            authorize(&actor, Some(&facilitator("fiona")), &Action::CreateVideoSession),
            Decision::Allow
        );
        assert_eq!(
            authorize(&actor, Some(&student("fiona")), &Action::CreateVideoSession),
            Decision::Deny
        );
        assert_eq!(
            authorize(&actor, Some(&student("fiona")), &Action::JoinVideoSession),
            Decision::Allow
        );
    }

    #[test]
    fn test_any_member_may_view() {
        let actor = Actor::new("sam", GlobalRole::User);
        assert_eq!(
            authorize(&actor, Some(&student("sam")), &Action::View),
            Decision::Allow
        );
    }
}
