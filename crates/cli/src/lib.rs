//! bkt CLI library
//!
//! Exposes the session loop and executors so integration tests can drive a
//! whole session against an in-memory store.

pub mod commands;
pub mod exit_code;
pub mod output;
pub mod session;
