//! `TaskBoard` — per-user task lists with keyed local persistence.

pub mod app;
pub mod board;
pub mod config;
pub mod session;
pub mod storage;
