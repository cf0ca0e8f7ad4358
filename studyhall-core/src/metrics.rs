//! Metric registration for observability

use metrics::{describe_counter, describe_gauge};

/// Register descriptions for every metric the crate emits
pub fn init_metrics() {
    // Content service
    describe_counter!("content.classrooms.created", "Classrooms created");
    describe_counter!("content.classrooms.deleted", "Classrooms deleted");
    describe_counter!("content.members.joined", "Memberships created via join code");
    describe_counter!("content.posts.created", "Plain posts created");
    describe_counter!("content.assignments.created", "Assignments created");
    describe_counter!("content.comments.created", "Comments and submissions created");
    describe_counter!("content.submissions.created", "Assignment submissions recorded");
    describe_counter!(
        "content.submissions.compensated",
        "Submissions rolled back after a failed attachment batch"
    );
    describe_counter!("content.grades.recorded", "Grades recorded");
    describe_counter!("content.grades.revised", "Grades revised through the audited path");
    describe_counter!("content.attachments.created", "Attachment rows created");
    describe_counter!("content.sessions.created", "Video session rows created");

    // Signaling coordinator
    describe_counter!("signal.sessions.created", "Live sessions opened");
    describe_counter!("signal.sessions.joined", "Session room joins");
    describe_gauge!("signal.clients.connected", "Currently connected signaling clients");
}
