//! Mail collaborator
//!
//! Fire-and-forget notifications. The core never blocks on delivery and a
//! failed send is never a content-operation failure; implementations log and
//! move on.

use crate::core_model::UserId;

/// A notification handed to the mail collaborator
#[derive(Debug, Clone)]
pub struct Notification {
    pub recipient: UserId,
    pub subject: String,
    pub body: String,
}

/// Narrow contract for outbound notifications
pub trait MailSender: Send + Sync {
    /// Hand off `notification` for delivery; must not block or fail the caller
    fn send(&self, notification: Notification);
}

/// Sender that records the handoff in the log and drops the message
///
/// The default wiring until a real delivery backend is injected.
pub struct LogMailer;

impl MailSender for LogMailer {
    fn send(&self, notification: Notification) {
        tracing::info!(
            recipient = %notification.recipient,
            subject = %notification.subject,
            "mail notification queued"
        );
    }
}
