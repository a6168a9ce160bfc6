//! Test helpers module
//!
//! This module provides utilities and helpers for testing the activity tracker:
//! a throwaway on-disk database, entity builders and a recording notifier.

#![allow(dead_code)]

pub mod database_helper;
pub mod test_data;

pub use database_helper::*;
pub use test_data::*;
