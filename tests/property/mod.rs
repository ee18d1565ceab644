//! Property-based tests

pub mod conversation_proptest;
pub mod query_proptest;
