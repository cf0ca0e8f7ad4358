/*
    core_signal - Real-time session coordination

    Routes signaling events among clients scoped to a classroom or a live
    session:
    - Classroom event channels and session rooms
    - Join-order broadcast within a room
    - Deterministic leave broadcast on disconnect
*/

pub mod coordinator;
pub mod error;
pub mod events;

mod room;

pub use coordinator::SessionCoordinator;
pub use error::SignalError;
pub use events::{ClientId, CreateSessionRequest, JoinSessionRequest, SignalEvent};
