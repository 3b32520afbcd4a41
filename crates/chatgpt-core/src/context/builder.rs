use super::message::Message;
use crate::constants::{defaults, prompt::END_OF_TEXT};

/// Builds the flattened prompt sent to text completion models.
///
/// The prompt is the context header, as many of the most recent history
/// messages as fit under `max_length`, and a trailer that hands the turn to
/// the assistant. Lengths are byte counts, not model tokens.
pub struct PromptBuilder {
    context: String,
    date: String,
    assistant_name: String,
    max_length: usize,
}

impl PromptBuilder {
    pub fn new(context: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            date: date.into(),
            assistant_name: defaults::ASSISTANT_NAME.to_string(),
            max_length: 0,
        }
    }

    pub fn with_assistant_name(mut self, name: impl Into<String>) -> Self {
        self.assistant_name = name.into();
        self
    }

    /// Upper bound for the prompt window. Zero means unbounded.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn header(&self) -> String {
        format!("{}\nCurrent date: {}", self.context, self.date)
    }

    pub fn trailer(&self) -> String {
        format!("{}:", self.assistant_name)
    }

    /// Build the prompt from `history` in chronological order.
    ///
    /// History is walked newest-first and the walk stops at the first message
    /// that would reach `max_length`; nothing older than it is included.
    pub fn build(&self, history: &[Message]) -> String {
        let header = self.header();
        let trailer = self.trailer();

        let mut used = header.len() + trailer.len();
        let mut window: Vec<String> = Vec::new();

        for message in history.iter().rev() {
            let rendered = message.render(&self.assistant_name);
            let length = rendered.len() + END_OF_TEXT.len();
            if self.max_length > 0 && used + length >= self.max_length {
                break;
            }
            used += length;
            window.push(rendered);
        }
        window.reverse();

        tracing::debug!(
            included = window.len(),
            dropped = history.len() - window.len(),
            length = used,
            "built prompt window"
        );

        let mut prompt = String::with_capacity(used + END_OF_TEXT.len());
        prompt.push_str(&header);
        prompt.push_str(END_OF_TEXT);
        for rendered in window {
            prompt.push_str(&rendered);
            prompt.push_str(END_OF_TEXT);
        }
        prompt.push_str(&trailer);
        prompt
    }
}
