// Discord layer - commands and the glue between poise and the core services.

#[path = "commands/command_catalog.rs"]
pub mod commands;

// Re-export command types for convenience
pub use commands::{Context, Data, Error};
