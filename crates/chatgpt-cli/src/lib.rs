// Library interface for chatgpt-cli so integration tests can reach the
// command parser.

pub mod commands;

pub use commands::{handle_command, CommandResult};
