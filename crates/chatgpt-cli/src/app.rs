use anyhow::Result;
use chatgpt_core::constants::models;
use chatgpt_core::{AskConfig, Client, ConversationConfig, Message};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use chatgpt_cli::{handle_command, CommandResult};

fn new_conversation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Ask a single question outside any conversation and print the answer.
pub async fn run_single_prompt(client: &Client, model: &str, prompt: &str) -> Result<()> {
    let request = if models::is_chat_model(model) {
        AskConfig::chat(model, vec![Message::user(prompt)])
    } else {
        AskConfig::prompt(model, prompt)
    };
    let request =
        request.with_max_request_response_tokens(client.config().max_request_response_tokens);

    let answer = client.ask(&request).await?;
    println!("{answer}");
    Ok(())
}

/// Line-oriented chat bound to one conversation id at a time.
pub async fn run_repl(client: Client, settings: ConversationConfig, user: Option<String>) -> Result<()> {
    let mut id = new_conversation_id();
    client.get_or_create_conversation(&id, settings.clone());
    eprintln!("Conversation {id}. Type /help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match handle_command(line) {
            CommandResult::Quit => break,
            CommandResult::Message(msg) => println!("{msg}"),
            CommandResult::NewConversation => {
                id = new_conversation_id();
                client.get_or_create_conversation(&id, settings.clone());
                println!("Started conversation {id}");
            }
            CommandResult::Reset => {
                client.reset_conversation(&id);
                client.get_or_create_conversation(&id, settings.clone());
                println!("Conversation cleared.");
            }
            CommandResult::ResetAll => {
                client.reset_conversations();
                client.get_or_create_conversation(&id, settings.clone());
                println!("All conversations cleared.");
            }
            CommandResult::ModelChanged(model) => {
                client.get_or_create_conversation(&id, settings.clone());
                match client.change_conversation_model(&id, &model) {
                    Ok(()) => println!("Model: {model}"),
                    Err(e) => tracing::error!(conversation = %id, "model change failed: {e}"),
                }
            }
            CommandResult::ShowStatus => {
                let conversation = client.get_or_create_conversation(&id, settings.clone());
                println!(
                    "Conversation: {}\nModel: {}\nMessages: {}\nLive conversations: {}",
                    conversation.id(),
                    conversation.model(),
                    conversation.len(),
                    client.conversations().len()
                );
            }
            CommandResult::NotACommand => {
                // Expired conversations come back empty under the same id.
                client.get_or_create_conversation(&id, settings.clone());
                match client.ask_conversation(&id, line, user.as_deref()).await {
                    Ok(answer) => println!("{answer}\n"),
                    Err(e) => tracing::error!(conversation = %id, "ask failed: {e}"),
                }
            }
        }
    }

    Ok(())
}
