// File: ./src/lib.rs
// Crate root library declaration and module exports.
pub mod cli;
pub mod config;
pub mod context;
pub mod controller;
pub mod model;
pub mod projector;
pub mod recurrence;
pub mod storage;
pub mod store;
pub mod sync;
