//! Shared fixtures for the content service tests

use crate::core_content::files::{FileStore, LocalFileStore};
use crate::core_content::mail::testing::RecordingMailer;
use crate::core_content::payload::{AssignmentDraft, ClassroomDraft, CommentDraft, PostDraft, Upload};
use crate::core_content::storage::ContentSqlStore;
use crate::core_content::ClassroomService;
use crate::core_model::{Classroom, ClassroomMember, FileMeta, GlobalRole, Post, Timestamp};
use crate::core_policy::Actor;
use std::sync::Arc;
use tempfile::TempDir;

pub struct Harness {
    pub service: ClassroomService,
    pub mailer: Arc<RecordingMailer>,
    pub files_dir: TempDir,
}

pub fn harness() -> Harness {
    let files_dir = tempfile::tempdir().unwrap();
    let files = Arc::new(LocalFileStore::new(files_dir.path()).unwrap());
    harness_with_files(files, files_dir)
}

pub fn harness_with_files(files: Arc<dyn FileStore>, files_dir: TempDir) -> Harness {
    let mailer = Arc::new(RecordingMailer::default());
    let service = ClassroomService::new(
        ContentSqlStore::memory().unwrap(),
        files,
        mailer.clone(),
    );
    Harness {
        service,
        mailer,
        files_dir,
    }
}

pub fn user(name: &str) -> Actor {
    Actor::new(name, GlobalRole::User)
}

pub fn admin(name: &str) -> Actor {
    Actor::new(name, GlobalRole::Admin)
}

pub fn classroom_draft(name: &str) -> ClassroomDraft {
    ClassroomDraft {
        name: name.to_string(),
        unit_code: None,
        description: None,
    }
}

pub fn post_draft() -> PostDraft {
    PostDraft {
        title: "Week one notes".to_string(),
        body: "Read chapters one and two before class.".to_string(),
    }
}

pub fn assignment_draft(due_date: Option<Timestamp>) -> AssignmentDraft {
    AssignmentDraft {
        title: "Problem set one".to_string(),
        body: "Solve every exercise and show your work.".to_string(),
        due_date,
        total_points: 100,
    }
}

pub fn comment_draft() -> CommentDraft {
    CommentDraft {
        body: "Here is my completed work.".to_string(),
    }
}

pub fn upload(name: &str, bytes: &[u8]) -> Upload {
    Upload {
        meta: FileMeta {
            original_file_name: name.to_string(),
            mime_type: "application/pdf".to_string(),
            size: bytes.len() as u64,
        },
        bytes: bytes.to_vec(),
    }
}

/// A classroom created by `fiona` with `sam` joined as a student
pub fn classroom_with_student(h: &Harness) -> (Classroom, ClassroomMember, ClassroomMember) {
    let (classroom, facilitator) = h
        .service
        .create_classroom(&user("fiona"), classroom_draft("Algorithms 201"))
        .unwrap();
    let student = h
        .service
        .join_classroom(&user("sam"), &classroom.code)
        .unwrap();
    (classroom, facilitator, student)
}

/// An open assignment authored by `fiona` in a classroom `sam` attends
pub fn open_assignment(h: &Harness) -> (Classroom, Post) {
    let (classroom, _, _) = classroom_with_student(h);
    let assignment = h
        .service
        .create_assignment(&user("fiona"), classroom.id, assignment_draft(None))
        .unwrap();
    (classroom, assignment)
}
