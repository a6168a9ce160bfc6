//! Database repositories module
//!
//! This module contains all repository implementations for data access.
//! Each public operation is exactly one unit-of-work on the store gateway.

pub mod activity;
pub mod participation;
pub mod student;
pub mod user;

// Re-export repositories
pub use activity::ActivityRepository;
pub use participation::ParticipationRepository;
pub use student::StudentRepository;
pub use user::UserRepository;
