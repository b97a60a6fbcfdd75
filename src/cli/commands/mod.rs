//! Subcommand handlers
//!
//! Capability commands take a loaded `CommandContext`; `config` works
//! without one so a broken configuration can still be inspected.

pub mod analyze;
pub mod chat;
pub mod config;
pub mod recipe;
pub mod status;
