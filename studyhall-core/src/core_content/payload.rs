//! Input payloads and their structural validation
//!
//! Every draft validates itself before the service touches the store, so
//! validation failures never leave side effects.

use crate::core_model::{FileMeta, Timestamp, MAX_TOTAL_POINTS};

use super::error::ContentError;

/// Minimum title length for posts, assignments and classroom names
pub const MIN_TITLE_LEN: usize = 8;

/// Minimum body length for posts and comments
pub const MIN_BODY_LEN: usize = 10;

/// Payload for creating or updating a classroom
#[derive(Debug, Clone)]
pub struct ClassroomDraft {
    pub name: String,
    pub unit_code: Option<String>,
    pub description: Option<String>,
}

impl ClassroomDraft {
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.name.chars().count() < MIN_TITLE_LEN {
            return Err(ContentError::Validation(format!(
                "classroom name must be at least {} characters",
                MIN_TITLE_LEN
            )));
        }
        Ok(())
    }
}

/// Payload for creating or updating a plain post
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub body: String,
}

impl PostDraft {
    pub fn validate(&self) -> Result<(), ContentError> {
        validate_title_and_body(&self.title, &self.body)
    }
}

/// Payload for creating or updating an assignment
#[derive(Debug, Clone)]
pub struct AssignmentDraft {
    pub title: String,
    pub body: String,
    pub due_date: Option<Timestamp>,
    pub total_points: u32,
}

impl AssignmentDraft {
    pub fn validate(&self) -> Result<(), ContentError> {
        validate_title_and_body(&self.title, &self.body)?;
        if self.total_points > MAX_TOTAL_POINTS {
            return Err(ContentError::Validation(format!(
                "total points must be within 0..={}",
                MAX_TOTAL_POINTS
            )));
        }
        Ok(())
    }
}

/// Payload for a comment or submission body
#[derive(Debug, Clone)]
pub struct CommentDraft {
    pub body: String,
}

impl CommentDraft {
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.body.chars().count() < MIN_BODY_LEN {
            return Err(ContentError::Validation(format!(
                "body must be at least {} characters",
                MIN_BODY_LEN
            )));
        }
        Ok(())
    }
}

/// Payload for grading a submission
#[derive(Debug, Clone)]
pub struct GradeDraft {
    pub points: u32,
    pub comments: Option<String>,
}

impl GradeDraft {
    /// Range check against the owning assignment's total
    pub fn validate(&self, total_points: u32) -> Result<(), ContentError> {
        if self.points > total_points {
            return Err(ContentError::Validation(format!(
                "points must be within 0..={}",
                total_points
            )));
        }
        Ok(())
    }
}

/// An uploaded file: metadata plus the bytes to store
#[derive(Debug, Clone)]
pub struct Upload {
    pub meta: FileMeta,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.meta.original_file_name.trim().is_empty() {
            return Err(ContentError::Validation(
                "attachment is missing a file name".to_string(),
            ));
        }
        if self.meta.mime_type.trim().is_empty() {
            return Err(ContentError::Validation(
                "attachment is missing a media type".to_string(),
            ));
        }
        if self.bytes.len() as u64 != self.meta.size {
            return Err(ContentError::Validation(format!(
                "attachment '{}' declares {} bytes but carries {}",
                self.meta.original_file_name,
                self.meta.size,
                self.bytes.len()
            )));
        }
        Ok(())
    }
}

fn validate_title_and_body(title: &str, body: &str) -> Result<(), ContentError> {
    if title.chars().count() < MIN_TITLE_LEN {
        return Err(ContentError::Validation(format!(
            "title must be at least {} characters",
            MIN_TITLE_LEN
        )));
    }
    if body.chars().count() < MIN_BODY_LEN {
        return Err(ContentError::Validation(format!(
            "body must be at least {} characters",
            MIN_BODY_LEN
        )));
    }
    Ok(())
}
