/// Result of processing a slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// Quit the application.
    Quit,
    /// Start a fresh conversation under a new id.
    NewConversation,
    /// Forget the current conversation's history.
    Reset,
    /// Forget every conversation.
    ResetAll,
    /// Switch the current conversation to another model.
    ModelChanged(String),
    /// Show conversation id, model and history length.
    ShowStatus,
    /// Not a command - treat as regular input.
    NotACommand,
}

pub fn handle_command(input: &str) -> CommandResult {
    let input = input.trim();
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Quit,
        "/new" => CommandResult::NewConversation,
        "/reset" => CommandResult::Reset,
        "/reset-all" => CommandResult::ResetAll,
        "/status" => CommandResult::ShowStatus,
        "/model" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /model <model-name>\nExample: /model gpt-3.5-turbo".into())
            } else {
                CommandResult::ModelChanged(arg.to_string())
            }
        }
        "/version" => CommandResult::Message(format!("chatgpt v{}", env!("CARGO_PKG_VERSION"))),

        // Unknown command
        _ => {
            if input.starts_with('/') {
                CommandResult::Message(format!("Unknown command: {cmd}. Type /help for commands."))
            } else {
                CommandResult::NotACommand
            }
        }
    }
}

fn show_help() -> CommandResult {
    let help_text = "\
ChatGPT CLI Commands:
  /help, /h          Show this help
  /quit, /exit, /q   Quit
  /new               Start a new conversation
  /reset             Clear the current conversation
  /reset-all         Clear every conversation
  /model <name>      Switch the current conversation's model
  /status            Show the current conversation
  /version           Show version";
    CommandResult::Message(help_text.to_string())
}
