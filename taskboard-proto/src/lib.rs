//! Shared data model and persisted format for `TaskBoard`.

pub mod board;
pub mod codec;
pub mod user;
