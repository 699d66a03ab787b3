//! Actors owning long-lived background work
//!
//! Each actor runs as an independent tokio task and is controlled through a
//! cloneable handle wrapping an mpsc command channel.
//!
//! ## Actor Types
//!
//! - **SupervisorActor**: owns detached runs (HTTP and timer triggered), joins
//!   them, and records faults that escaped a run
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: mpsc command channel per actor
//! 2. **Request/Response**: oneshot channels for queries and shutdown

pub mod messages;
pub mod supervisor;
