//! Data models module
//!
//! This module contains the entities persisted by the repositories. Entities
//! reference each other by id only; no entity performs I/O.

pub mod activity;
pub mod participation;
pub mod student;
pub mod user;

// Re-export commonly used models
pub use activity::{Activity, ActivitySearch, ActivityStatus, ActivityType};
pub use participation::Participation;
pub use student::{AcademicLevel, Student, StudentStatus};
pub use user::{User, UserRole, UserStatus};
