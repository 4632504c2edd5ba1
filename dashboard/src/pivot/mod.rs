//! FILENAME: dashboard/src/pivot/mod.rs
pub mod commands;
pub mod types;

// Re-export commands so they are easy to access from main.rs
pub use commands::*;
pub use types::*;
