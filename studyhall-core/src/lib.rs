/*
    studyhall-core - Classroom learning management core

    The content model, authorization policy, content service and real-time
    session coordinator behind a classroom application. Callers bring an
    authenticated actor; this crate decides what they may do and does it.
*/

pub mod config;
pub mod core_content;
pub mod core_model;
pub mod core_policy;
pub mod core_signal;
pub mod logging;
pub mod metrics;

pub use config::{Config, ConfigError};
pub use core_content::{ClassroomService, ContentError, ContentSqlStore, LocalFileStore, LogMailer};
pub use core_policy::{authorize, Action, Actor, Decision};
pub use core_signal::{SessionCoordinator, SignalError, SignalEvent};
pub use logging::{init_logging, LogConfig};
pub use metrics::init_metrics;
