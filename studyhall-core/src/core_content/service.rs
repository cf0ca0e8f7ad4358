//! Classroom content service
//!
//! The single mutator of content rows. Every operation validates its payload
//! and checks policy before touching the store, so a rejected call leaves no
//! side effects. Multi-entity writes either run in one sqlite transaction or
//! follow the two-phase submission path, which compensates by deleting the
//! submission when its attachment batch fails.

use crate::core_model::{
    AssignmentDetail, Attachment, AttachmentId, AttachmentOwner, Classroom, ClassroomId,
    ClassroomMember, Comment, CommentId, CommentKind, Grade, MemberId, MemberRole, Post, PostId,
    PostKind, SessionId, Timestamp, UserId, VideoSession, VideoSessionParticipant,
};
use crate::core_policy::{authorize, Action, Actor};
use metrics::counter;
use std::sync::Arc;
use tracing::{info, warn};

use super::code::{generate_code, CODE_RETRY_BUDGET};
use super::error::ContentError;
use super::files::{FileStore, StoredFile};
use super::mail::{MailSender, Notification};
use super::payload::{AssignmentDraft, ClassroomDraft, CommentDraft, GradeDraft, PostDraft, Upload};
use super::storage::{AttachmentRecord, ContentSqlStore};

type CodeGenerator = Box<dyn Fn() -> String + Send + Sync>;

/// Orchestrates classroom content operations over injected collaborators
pub struct ClassroomService {
    store: ContentSqlStore,
    files: Arc<dyn FileStore>,
    mailer: Arc<dyn MailSender>,
    code_gen: CodeGenerator,
}

impl ClassroomService {
    pub fn new(
        store: ContentSqlStore,
        files: Arc<dyn FileStore>,
        mailer: Arc<dyn MailSender>,
    ) -> Self {
        Self {
            store,
            files,
            mailer,
            code_gen: Box::new(generate_code),
        }
    }

    /// Swap the join-code source; defaults to the random generator
    pub fn with_code_generator(
        mut self,
        code_gen: impl Fn() -> String + Send + Sync + 'static,
    ) -> Self {
        self.code_gen = Box::new(code_gen);
        self
    }

    // ===== Classrooms =====

    /// Create a classroom; the creator becomes its first facilitator
    pub fn create_classroom(
        &self,
        actor: &Actor,
        draft: ClassroomDraft,
    ) -> Result<(Classroom, ClassroomMember), ContentError> {
        draft.validate()?;

        for _ in 0..CODE_RETRY_BUDGET {
            let code = (self.code_gen)();
            if self.store.classroom_by_code(&code)?.is_some() {
                continue;
            }

            let created = self.store.create_classroom_with_facilitator(
                &code,
                &draft.name,
                draft.unit_code.as_deref(),
                draft.description.as_deref(),
                &actor.user_id,
            )?;

            counter!("content.classrooms.created").increment(1);
            info!(code = %created.0.code, name = %created.0.name, "classroom created");
            return Ok(created);
        }

        Err(ContentError::CodeGenerationExhausted)
    }

    /// Join a classroom by its share code as a student
    pub fn join_classroom(
        &self,
        actor: &Actor,
        code: &str,
    ) -> Result<ClassroomMember, ContentError> {
        let classroom = self
            .store
            .classroom_by_code(code)?
            .ok_or(ContentError::NotFound("classroom"))?;

        let member =
            self.store
                .insert_member(classroom.id, &actor.user_id, MemberRole::Student)?;

        counter!("content.members.joined").increment(1);
        info!(code = %classroom.code, user = %actor.user_id, "member joined classroom");
        self.mailer.send(Notification {
            recipient: actor.user_id.clone(),
            subject: format!("Welcome to {}", classroom.name),
            body: format!("You joined '{}' with code {}.", classroom.name, classroom.code),
        });

        Ok(member)
    }

    /// Classrooms a user belongs to, facilitated classrooms first
    pub fn memberships_for_user(
        &self,
        actor: &Actor,
        user_id: &UserId,
    ) -> Result<Vec<ClassroomMember>, ContentError> {
        if !actor.is_admin() && &actor.user_id != user_id {
            return Err(ContentError::Forbidden("memberships are private"));
        }
        self.store.memberships_for_user(user_id)
    }

    /// Look up a classroom by its share code; the caller must be a member
    pub fn find_classroom(&self, actor: &Actor, code: &str) -> Result<Classroom, ContentError> {
        let classroom = self
            .store
            .classroom_by_code(code)?
            .ok_or(ContentError::NotFound("classroom"))?;
        let membership = self.membership(actor, classroom.id)?;
        self.check(actor, membership.as_ref(), &Action::View, "classroom access")?;
        Ok(classroom)
    }

    pub fn get_classroom(
        &self,
        actor: &Actor,
        id: ClassroomId,
    ) -> Result<Classroom, ContentError> {
        let classroom = self
            .store
            .classroom_by_id(id)?
            .ok_or(ContentError::NotFound("classroom"))?;
        let membership = self.membership(actor, id)?;
        self.check(actor, membership.as_ref(), &Action::View, "classroom access")?;
        Ok(classroom)
    }

    /// Update classroom details; the share code never changes
    pub fn update_classroom(
        &self,
        actor: &Actor,
        id: ClassroomId,
        draft: ClassroomDraft,
    ) -> Result<Classroom, ContentError> {
        draft.validate()?;
        let mut classroom = self
            .store
            .classroom_by_id(id)?
            .ok_or(ContentError::NotFound("classroom"))?;
        self.require_facilitator(actor, id, "only a facilitator may update the classroom")?;

        classroom.name = draft.name;
        classroom.unit_code = draft.unit_code;
        classroom.description = draft.description;
        self.store.update_classroom(&classroom)?;
        Ok(classroom)
    }

    /// Delete a classroom, its content and its stored attachment bytes
    pub fn delete_classroom(&self, actor: &Actor, id: ClassroomId) -> Result<(), ContentError> {
        let classroom = self
            .store
            .classroom_by_id(id)?
            .ok_or(ContentError::NotFound("classroom"))?;
        self.require_facilitator(actor, id, "only a facilitator may delete the classroom")?;

        // Collect paths before the cascade erases the rows that hold them.
        let paths = self.store.attachment_paths_for_classroom(id)?;
        if !self.store.delete_classroom(id)? {
            return Err(ContentError::NotFound("classroom"));
        }

        for path in &paths {
            if let Err(e) = self.files.delete(path) {
                warn!(path = %path, error = %e, "orphaned attachment bytes after classroom delete");
            }
        }

        counter!("content.classrooms.deleted").increment(1);
        info!(code = %classroom.code, attachments = paths.len(), "classroom deleted");
        Ok(())
    }

    /// Remove a member from a classroom
    pub fn remove_member(
        &self,
        actor: &Actor,
        classroom_id: ClassroomId,
        member_id: MemberId,
    ) -> Result<(), ContentError> {
        let target = self
            .store
            .member_by_id(member_id)?
            .filter(|m| m.classroom_id == classroom_id)
            .ok_or(ContentError::NotFound("member"))?;

        let membership = self.membership(actor, classroom_id)?;
        self.check(
            actor,
            membership.as_ref(),
            &Action::RemoveMember {
                target_role: target.role,
            },
            "member removal",
        )?;

        if !self.store.delete_member(member_id)? {
            return Err(ContentError::NotFound("member"));
        }

        info!(classroom = classroom_id.as_i64(), user = %target.user_id, "member removed");
        self.mailer.send(Notification {
            recipient: target.user_id,
            subject: "Classroom membership removed".to_string(),
            body: "Your membership was removed by a facilitator.".to_string(),
        });
        Ok(())
    }

    // ===== Content nodes =====

    /// Author a plain post in a classroom
    pub fn create_post(
        &self,
        actor: &Actor,
        classroom_id: ClassroomId,
        draft: PostDraft,
    ) -> Result<Post, ContentError> {
        draft.validate()?;
        let author = self.require_author(actor, classroom_id, &Action::CreatePost)?;
        let post = self
            .store
            .insert_post(author.id, &draft.title, &draft.body, &PostKind::Post)?;
        counter!("content.posts.created").increment(1);
        Ok(post)
    }

    /// Author an assignment in a classroom, facilitators only
    pub fn create_assignment(
        &self,
        actor: &Actor,
        classroom_id: ClassroomId,
        draft: AssignmentDraft,
    ) -> Result<Post, ContentError> {
        draft.validate()?;
        let author = self.require_author(actor, classroom_id, &Action::CreateAssignment)?;
        let kind = PostKind::Assignment(AssignmentDetail {
            due_date: draft.due_date,
            total_points: draft.total_points,
        });
        let post = self
            .store
            .insert_post(author.id, &draft.title, &draft.body, &kind)?;
        counter!("content.assignments.created").increment(1);
        Ok(post)
    }

    pub fn posts_for_classroom(
        &self,
        actor: &Actor,
        classroom_id: ClassroomId,
    ) -> Result<Vec<Post>, ContentError> {
        self.require_view(actor, classroom_id)?;
        self.store.posts_for_classroom(classroom_id, "Post")
    }

    pub fn assignments_for_classroom(
        &self,
        actor: &Actor,
        classroom_id: ClassroomId,
    ) -> Result<Vec<Post>, ContentError> {
        self.require_view(actor, classroom_id)?;
        self.store.posts_for_classroom(classroom_id, "Assignment")
    }

    pub fn get_post(&self, actor: &Actor, id: PostId) -> Result<Post, ContentError> {
        let (post, classroom_id) = self.locate_post(id)?;
        self.require_view(actor, classroom_id)?;
        Ok(post)
    }

    pub fn get_assignment(&self, actor: &Actor, id: PostId) -> Result<Post, ContentError> {
        let post = self.get_post(actor, id)?;
        if !post.is_assignment() {
            return Err(ContentError::NotFound("assignment"));
        }
        Ok(post)
    }

    /// Update a post's title and body; assignment details are untouched
    pub fn update_post(
        &self,
        actor: &Actor,
        id: PostId,
        draft: PostDraft,
    ) -> Result<Post, ContentError> {
        draft.validate()?;
        let (mut post, classroom_id) = self.locate_post(id)?;
        let author = self.author_user(post.author)?;
        let membership = self.membership(actor, classroom_id)?;
        self.check(
            actor,
            membership.as_ref(),
            &Action::Update { author },
            "post update",
        )?;

        post.title = draft.title;
        post.body = draft.body;
        self.store.update_post(&post)?;
        Ok(post)
    }

    /// Delete a post and everything hanging off it
    pub fn delete_post(&self, actor: &Actor, id: PostId) -> Result<(), ContentError> {
        let (post, classroom_id) = self.locate_post(id)?;
        let author = self.author_user(post.author)?;
        let membership = self.membership(actor, classroom_id)?;
        self.check(
            actor,
            membership.as_ref(),
            &Action::Delete { author },
            "post delete",
        )?;

        let paths = self.store.attachment_paths_for_post(id)?;
        if !self.store.delete_post(id)? {
            return Err(ContentError::NotFound("post"));
        }
        for path in &paths {
            if let Err(e) = self.files.delete(path) {
                warn!(path = %path, error = %e, "orphaned attachment bytes after post delete");
            }
        }
        Ok(())
    }

    // ===== Comments and submissions =====

    /// Comment under a content node; the comment's variant mirrors the
    /// target's (a comment under an assignment is a submission)
    pub fn add_comment(
        &self,
        actor: &Actor,
        post_id: PostId,
        draft: CommentDraft,
    ) -> Result<Comment, ContentError> {
        draft.validate()?;
        let (post, classroom_id) = self.locate_post(post_id)?;

        if let Some(detail) = post.assignment() {
            if !detail.accepts_submissions_at(Timestamp::now()) {
                return Err(ContentError::SubmissionWindowClosed);
            }
        }

        let author = self.require_author(actor, classroom_id, &Action::Comment)?;
        let tag = if post.is_assignment() {
            "AssignmentSubmission"
        } else {
            "PostComment"
        };
        let comment = self
            .store
            .insert_comment(post_id, author.id, &draft.body, tag)?;
        counter!("content.comments.created").increment(1);
        Ok(comment)
    }

    pub fn comments_for_post(
        &self,
        actor: &Actor,
        post_id: PostId,
    ) -> Result<Vec<Comment>, ContentError> {
        let (_, classroom_id) = self.locate_post(post_id)?;
        self.require_view(actor, classroom_id)?;
        self.store.comments_for_post(post_id)
    }

    /// Submit against an assignment: the submission row, then its attachment
    /// batch. A failed batch deletes the submission before the error is
    /// surfaced, so no orphan submission survives.
    pub fn add_submission(
        &self,
        actor: &Actor,
        assignment_id: PostId,
        draft: CommentDraft,
        uploads: Vec<Upload>,
    ) -> Result<(Comment, Vec<Attachment>), ContentError> {
        draft.validate()?;
        for upload in &uploads {
            upload.validate()?;
        }

        let (post, classroom_id) = self.locate_post(assignment_id)?;
        let detail = post
            .assignment()
            .ok_or(ContentError::NotFound("assignment"))?;
        if !detail.accepts_submissions_at(Timestamp::now()) {
            return Err(ContentError::SubmissionWindowClosed);
        }

        let author = self.require_author(actor, classroom_id, &Action::Comment)?;
        let submission =
            self.store
                .insert_comment(assignment_id, author.id, &draft.body, "AssignmentSubmission")?;

        if uploads.is_empty() {
            counter!("content.submissions.created").increment(1);
            return Ok((submission, Vec::new()));
        }

        match self.store_attachment_batch(AttachmentOwner::Submission(submission.id), &uploads) {
            Ok(attachments) => {
                counter!("content.submissions.created").increment(1);
                info!(
                    submission = submission.id.as_i64(),
                    attachments = attachments.len(),
                    "submission recorded"
                );
                Ok((submission, attachments))
            }
            Err(e) => {
                // Compensation: the submission must not outlive its batch.
                if let Err(del) = self.store.delete_comment(submission.id) {
                    warn!(
                        submission = submission.id.as_i64(),
                        error = %del,
                        "compensating delete failed, orphan submission left behind"
                    );
                }
                counter!("content.submissions.compensated").increment(1);
                Err(ContentError::PartialWrite(format!(
                    "submission rolled back: {}",
                    e
                )))
            }
        }
    }

    // ===== Grades =====

    /// Grade a submission; only the assignment's author may grade, and a
    /// graded submission stays graded
    pub fn grade_submission(
        &self,
        actor: &Actor,
        submission_id: CommentId,
        draft: GradeDraft,
    ) -> Result<Grade, ContentError> {
        let (submission, assignment, classroom_id) = self.locate_submission(submission_id)?;
        // Authorization first, so a caller who may not grade cannot tell a
        // graded submission from an ungraded one.
        self.authorize_grading(actor, &assignment, classroom_id, &draft)?;
        if submission.grade().is_some() {
            return Err(ContentError::Conflict("submission is already graded"));
        }

        let grade =
            self.store
                .insert_grade(submission_id, draft.points, draft.comments.as_deref())?;
        counter!("content.grades.recorded").increment(1);

        let submitter = self
            .store
            .member_by_id(submission.author)?
            .ok_or(ContentError::NotFound("member"))?;
        self.mailer.send(Notification {
            recipient: submitter.user_id,
            subject: format!("Graded: {}", assignment.title),
            body: format!("Your submission received {} points.", grade.points),
        });
        Ok(grade)
    }

    /// Deliberately revise an existing grade; leaves an audit line
    pub fn revise_grade(
        &self,
        actor: &Actor,
        submission_id: CommentId,
        draft: GradeDraft,
    ) -> Result<Grade, ContentError> {
        let (submission, assignment, classroom_id) = self.locate_submission(submission_id)?;
        self.authorize_grading(actor, &assignment, classroom_id, &draft)?;
        let previous = submission
            .grade()
            .ok_or(ContentError::NotFound("grade"))?
            .points;

        let grade =
            self.store
                .update_grade(submission_id, draft.points, draft.comments.as_deref())?;
        info!(
            submission = submission_id.as_i64(),
            grader = %actor.user_id,
            previous_points = previous,
            points = grade.points,
            "grade revised"
        );
        counter!("content.grades.revised").increment(1);
        Ok(grade)
    }

    /// A user's grades across classrooms, newest first
    pub fn grades_for_user(
        &self,
        actor: &Actor,
        user_id: &UserId,
    ) -> Result<Vec<Grade>, ContentError> {
        if !actor.is_admin() && &actor.user_id != user_id {
            return Err(ContentError::Forbidden("grades are private"));
        }
        self.store.grades_for_user(user_id)
    }

    // ===== Attachments =====

    /// Attach files to a content node, all-or-nothing
    pub fn add_attachments(
        &self,
        actor: &Actor,
        owner: AttachmentOwner,
        uploads: Vec<Upload>,
    ) -> Result<Vec<Attachment>, ContentError> {
        if uploads.is_empty() {
            return Err(ContentError::Validation("no files to attach".to_string()));
        }
        for upload in &uploads {
            upload.validate()?;
        }

        let (owner_author, classroom_id) = self.locate_owner(owner)?;
        let author = self.author_user(owner_author)?;
        let membership = self.membership(actor, classroom_id)?;
        self.check(
            actor,
            membership.as_ref(),
            &Action::Update { author },
            "attachment upload",
        )?;

        let attachments = self.store_attachment_batch(owner, &uploads)?;
        counter!("content.attachments.created").increment(attachments.len() as u64);
        Ok(attachments)
    }

    pub fn get_attachment(
        &self,
        actor: &Actor,
        id: AttachmentId,
    ) -> Result<Attachment, ContentError> {
        let attachment = self
            .store
            .attachment_by_id(id)?
            .ok_or(ContentError::NotFound("attachment"))?;
        let (_, classroom_id) = self.locate_owner(attachment.owner)?;
        self.require_view(actor, classroom_id)?;
        Ok(attachment)
    }

    /// Delete an attachment: the row first, then the stored bytes. A failed
    /// byte deletion is logged and the operation still succeeds.
    pub fn delete_attachment(&self, actor: &Actor, id: AttachmentId) -> Result<(), ContentError> {
        let attachment = self
            .store
            .attachment_by_id(id)?
            .ok_or(ContentError::NotFound("attachment"))?;
        let (owner_author, classroom_id) = self.locate_owner(attachment.owner)?;
        let author = self.author_user(owner_author)?;
        let membership = self.membership(actor, classroom_id)?;
        self.check(
            actor,
            membership.as_ref(),
            &Action::Delete { author },
            "attachment delete",
        )?;

        if !self.store.delete_attachment(id)? {
            return Err(ContentError::NotFound("attachment"));
        }
        if let Err(e) = self.files.delete(&attachment.storage_path) {
            warn!(
                path = %attachment.storage_path,
                error = %e,
                "orphaned attachment bytes after delete"
            );
        }
        Ok(())
    }

    // ===== Video sessions =====

    /// Persist a live session row; facilitators only
    pub fn create_video_session(
        &self,
        actor: &Actor,
        classroom_id: ClassroomId,
        code: &str,
    ) -> Result<VideoSession, ContentError> {
        let membership = self.membership(actor, classroom_id)?;
        self.check(
            actor,
            membership.as_ref(),
            &Action::CreateVideoSession,
            "session creation",
        )?;
        let owner = membership.ok_or(ContentError::Forbidden(
            "classroom membership required to host a session",
        ))?;

        let session = self
            .store
            .insert_video_session(classroom_id, owner.id, code)?;
        counter!("content.sessions.created").increment(1);
        Ok(session)
    }

    /// Look up a live session by code; with an actor, verify membership
    pub fn find_video_session(
        &self,
        actor: Option<&Actor>,
        code: &str,
    ) -> Result<VideoSession, ContentError> {
        let session = self
            .store
            .video_session_by_code(code)?
            .ok_or(ContentError::NotFound("session"))?;
        if let Some(actor) = actor {
            let membership = self.membership(actor, session.classroom_id)?;
            self.check(
                actor,
                membership.as_ref(),
                &Action::JoinVideoSession,
                "session access",
            )?;
        }
        Ok(session)
    }

    /// Join audit rows for a session, oldest first
    pub fn participants_for_session(
        &self,
        actor: &Actor,
        session: &VideoSession,
    ) -> Result<Vec<VideoSessionParticipant>, ContentError> {
        let membership = self.membership(actor, session.classroom_id)?;
        self.check(actor, membership.as_ref(), &Action::View, "session access")?;
        self.store.participants_for_session(session.id)
    }

    /// Best-effort join audit row
    pub fn record_participant(
        &self,
        session_id: SessionId,
        member_id: MemberId,
    ) -> Result<VideoSessionParticipant, ContentError> {
        self.store.insert_session_participant(session_id, member_id)
    }

    /// The acting user's membership in a session's classroom
    pub fn session_membership(
        &self,
        actor: &Actor,
        session: &VideoSession,
    ) -> Result<Option<ClassroomMember>, ContentError> {
        self.membership(actor, session.classroom_id)
    }

    // ===== Internal helpers =====

    fn membership(
        &self,
        actor: &Actor,
        classroom_id: ClassroomId,
    ) -> Result<Option<ClassroomMember>, ContentError> {
        self.store.member_of(classroom_id, &actor.user_id)
    }

    fn check(
        &self,
        actor: &Actor,
        membership: Option<&ClassroomMember>,
        action: &Action,
        what: &'static str,
    ) -> Result<(), ContentError> {
        if authorize(actor, membership, action).is_allowed() {
            Ok(())
        } else {
            Err(ContentError::Forbidden(what))
        }
    }

    fn require_view(&self, actor: &Actor, classroom_id: ClassroomId) -> Result<(), ContentError> {
        if self.store.classroom_by_id(classroom_id)?.is_none() {
            return Err(ContentError::NotFound("classroom"));
        }
        let membership = self.membership(actor, classroom_id)?;
        self.check(actor, membership.as_ref(), &Action::View, "classroom access")
    }

    /// Authorization plus authorship: even an admin needs a member row to
    /// author content, because every node hangs off a membership
    fn require_author(
        &self,
        actor: &Actor,
        classroom_id: ClassroomId,
        action: &Action,
    ) -> Result<ClassroomMember, ContentError> {
        if self.store.classroom_by_id(classroom_id)?.is_none() {
            return Err(ContentError::NotFound("classroom"));
        }
        let membership = self.membership(actor, classroom_id)?;
        self.check(actor, membership.as_ref(), action, "content authorship")?;
        membership.ok_or(ContentError::Forbidden(
            "classroom membership required to author content",
        ))
    }

    fn require_facilitator(
        &self,
        actor: &Actor,
        classroom_id: ClassroomId,
        what: &'static str,
    ) -> Result<(), ContentError> {
        if actor.is_admin() {
            return Ok(());
        }
        match self.membership(actor, classroom_id)? {
            Some(member) if member.is_facilitator() => Ok(()),
            _ => Err(ContentError::Forbidden(what)),
        }
    }

    fn author_user(&self, member_id: MemberId) -> Result<UserId, ContentError> {
        Ok(self
            .store
            .member_by_id(member_id)?
            .ok_or(ContentError::NotFound("member"))?
            .user_id)
    }

    fn locate_post(&self, id: PostId) -> Result<(Post, ClassroomId), ContentError> {
        let post = self
            .store
            .post_by_id(id)?
            .ok_or(ContentError::NotFound("post"))?;
        let classroom_id = self
            .store
            .classroom_of_post(id)?
            .ok_or(ContentError::NotFound("classroom"))?;
        Ok((post, classroom_id))
    }

    fn locate_submission(&self, id: CommentId) -> Result<(Comment, Post, ClassroomId), ContentError> {
        let submission = self
            .store
            .comment_by_id(id)?
            .filter(|c| matches!(c.kind, CommentKind::Submission { .. }))
            .ok_or(ContentError::NotFound("submission"))?;
        let (assignment, classroom_id) = self.locate_post(submission.post_id)?;
        Ok((submission, assignment, classroom_id))
    }

    fn authorize_grading(
        &self,
        actor: &Actor,
        assignment: &Post,
        classroom_id: ClassroomId,
        draft: &GradeDraft,
    ) -> Result<(), ContentError> {
        let detail = assignment
            .assignment()
            .ok_or(ContentError::NotFound("assignment"))?;
        draft.validate(detail.total_points)?;

        let assignment_author = self.author_user(assignment.author)?;
        let membership = self.membership(actor, classroom_id)?;
        self.check(
            actor,
            membership.as_ref(),
            &Action::Grade { assignment_author },
            "grading",
        )
    }

    /// Owning node's author and classroom for one attachment owner
    fn locate_owner(
        &self,
        owner: AttachmentOwner,
    ) -> Result<(MemberId, ClassroomId), ContentError> {
        match owner {
            AttachmentOwner::Post(post_id) => {
                let (post, classroom_id) = self.locate_post(post_id)?;
                Ok((post.author, classroom_id))
            }
            AttachmentOwner::Comment(comment_id) | AttachmentOwner::Submission(comment_id) => {
                let comment = self
                    .store
                    .comment_by_id(comment_id)?
                    .ok_or(ContentError::NotFound("comment"))?;
                let classroom_id = self
                    .store
                    .classroom_of_post(comment.post_id)?
                    .ok_or(ContentError::NotFound("classroom"))?;
                Ok((comment.author, classroom_id))
            }
        }
    }

    /// Write bytes, then insert the rows in one transaction. Any failure
    /// cleans up every stored file before the error escapes.
    fn store_attachment_batch(
        &self,
        owner: AttachmentOwner,
        uploads: &[Upload],
    ) -> Result<Vec<Attachment>, ContentError> {
        let mut stored: Vec<StoredFile> = Vec::with_capacity(uploads.len());
        for upload in uploads {
            match self.files.save(&upload.meta, &upload.bytes) {
                Ok(file) => stored.push(file),
                Err(e) => {
                    self.discard_stored(&stored);
                    return Err(e);
                }
            }
        }

        let records: Vec<AttachmentRecord> = uploads
            .iter()
            .zip(&stored)
            .map(|(upload, file)| AttachmentRecord {
                meta: upload.meta.clone(),
                stored_file_name: file.stored_file_name.clone(),
                storage_path: file.path.clone(),
            })
            .collect();

        match self.store.insert_attachments(owner, &records) {
            Ok(attachments) => Ok(attachments),
            Err(e) => {
                self.discard_stored(&stored);
                Err(e)
            }
        }
    }

    fn discard_stored(&self, stored: &[StoredFile]) {
        for file in stored {
            if let Err(e) = self.files.delete(&file.path) {
                warn!(path = %file.path, error = %e, "failed to discard stored bytes");
            }
        }
    }
}
