//! Test suite for share-everything
//!
//! This module organizes all tests

pub mod common;
pub mod property;
