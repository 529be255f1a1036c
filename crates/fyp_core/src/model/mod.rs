//! Domain model for portal users, projects and tasks.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own pure invariants (field validation, status transitions) so every
//!   caller gets the same rules regardless of storage.
//!
//! # Invariants
//! - Every domain object is identified by a stable UUID.
//! - Credentials only ever exist in hashed form inside the core.
//! - Project status leaves `Pending` exactly once.

pub mod credential;
pub mod project;
pub mod task;
pub mod user;
