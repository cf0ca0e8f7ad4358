//! Posting, commenting and attachment scenarios

use super::support::*;
use crate::core_content::payload::PostDraft;
use crate::core_content::ContentError;
use crate::core_model::{AttachmentOwner, CommentKind};

#[test]
fn test_short_title_rejected_without_side_effects() {
    let h = harness();
    let (classroom, _, _) = classroom_with_student(&h);

    let err = h
        .service
        .create_post(
            &user("fiona"),
            classroom.id,
            PostDraft {
                title: "Notes".to_string(),
                body: "Read chapters one and two.".to_string(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, ContentError::Validation(_)));
    assert!(h
        .service
        .posts_for_classroom(&user("fiona"), classroom.id)
        .unwrap()
        .is_empty());
}

#[test]
fn test_student_cannot_create_assignment() {
    let h = harness();
    let (classroom, _, _) = classroom_with_student(&h);
    let err = h
        .service
        .create_assignment(&user("sam"), classroom.id, assignment_draft(None))
        .unwrap_err();
    assert!(matches!(err, ContentError::Forbidden(_)));
}

#[test]
fn test_listings_are_tag_filtered() {
    let h = harness();
    let (classroom, _, _) = classroom_with_student(&h);
    h.service
        .create_post(&user("fiona"), classroom.id, post_draft())
        .unwrap();
    h.service
        .create_assignment(&user("fiona"), classroom.id, assignment_draft(None))
        .unwrap();

    let posts = h
        .service
        .posts_for_classroom(&user("sam"), classroom.id)
        .unwrap();
    let assignments = h
        .service
        .assignments_for_classroom(&user("sam"), classroom.id)
        .unwrap();
    assert_eq!(posts.len(), 1);
    assert!(!posts[0].is_assignment());
    assert_eq!(assignments.len(), 1);
    assert!(assignments[0].is_assignment());
}

#[test]
fn test_comment_variant_mirrors_target() {
    let h = harness();
    let (classroom, _, _) = classroom_with_student(&h);
    let post = h
        .service
        .create_post(&user("fiona"), classroom.id, post_draft())
        .unwrap();
    let assignment = h
        .service
        .create_assignment(&user("fiona"), classroom.id, assignment_draft(None))
        .unwrap();

    let on_post = h
        .service
        .add_comment(&user("sam"), post.id, comment_draft())
        .unwrap();
    let on_assignment = h
        .service
        .add_comment(&user("sam"), assignment.id, comment_draft())
        .unwrap();

    assert!(matches!(on_post.kind, CommentKind::PostComment));
    assert!(matches!(on_assignment.kind, CommentKind::Submission { .. }));
}

#[test]
fn test_update_post_is_author_only() {
    let h = harness();
    let (classroom, _, _) = classroom_with_student(&h);
    let post = h
        .service
        .create_post(&user("fiona"), classroom.id, post_draft())
        .unwrap();

    let err = h
        .service
        .update_post(
            &user("sam"),
            post.id,
            PostDraft {
                title: "Defaced title".to_string(),
                body: "Not the original body.".to_string(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, ContentError::Forbidden(_)));

    let updated = h
        .service
        .update_post(
            &user("fiona"),
            post.id,
            PostDraft {
                title: "Week one notes (rev)".to_string(),
                body: "Read chapters one through three.".to_string(),
            },
        )
        .unwrap();
    assert_eq!(updated.title, "Week one notes (rev)");
}

#[test]
fn test_attachment_batch_validates_all_metadata_up_front() {
    let h = harness();
    let (classroom, _, _) = classroom_with_student(&h);
    let post = h
        .service
        .create_post(&user("fiona"), classroom.id, post_draft())
        .unwrap();

    let mut bad = upload("b.pdf", b"bbb");
    bad.meta.size = 999;
    let err = h
        .service
        .add_attachments(
            &user("fiona"),
            AttachmentOwner::Post(post.id),
            vec![upload("a.pdf", b"aaa"), bad],
        )
        .unwrap_err();
    assert!(matches!(err, ContentError::Validation(_)));

    // Nothing was written, rows or bytes.
    assert_eq!(std::fs::read_dir(h.files_dir.path()).unwrap().count(), 0);
}

#[test]
fn test_attachments_only_by_node_author() {
    let h = harness();
    let (classroom, _, _) = classroom_with_student(&h);
    let post = h
        .service
        .create_post(&user("fiona"), classroom.id, post_draft())
        .unwrap();

    let err = h
        .service
        .add_attachments(
            &user("sam"),
            AttachmentOwner::Post(post.id),
            vec![upload("a.pdf", b"aaa")],
        )
        .unwrap_err();
    assert!(matches!(err, ContentError::Forbidden(_)));
}

#[test]
fn test_delete_attachment_row_then_bytes() {
    let h = harness();
    let (classroom, _, _) = classroom_with_student(&h);
    let post = h
        .service
        .create_post(&user("fiona"), classroom.id, post_draft())
        .unwrap();
    let attachments = h
        .service
        .add_attachments(
            &user("fiona"),
            AttachmentOwner::Post(post.id),
            vec![upload("a.pdf", b"aaa")],
        )
        .unwrap();
    let attachment = &attachments[0];

    h.service
        .delete_attachment(&user("fiona"), attachment.id)
        .unwrap();
    assert!(!std::path::Path::new(&attachment.storage_path).is_file());

    let err = h
        .service
        .delete_attachment(&user("fiona"), attachment.id)
        .unwrap_err();
    assert!(matches!(err, ContentError::NotFound("attachment")));
}

#[test]
fn test_get_attachment_requires_membership() {
    let h = harness();
    let (classroom, _, _) = classroom_with_student(&h);
    let post = h
        .service
        .create_post(&user("fiona"), classroom.id, post_draft())
        .unwrap();
    let attachments = h
        .service
        .add_attachments(
            &user("fiona"),
            AttachmentOwner::Post(post.id),
            vec![upload("a.pdf", b"aaa")],
        )
        .unwrap();

    let err = h
        .service
        .get_attachment(&user("eve"), attachments[0].id)
        .unwrap_err();
    assert!(matches!(err, ContentError::Forbidden(_)));

    let fetched = h
        .service
        .get_attachment(&user("sam"), attachments[0].id)
        .unwrap();
    assert_eq!(fetched.original_file_name, "a.pdf");
}
