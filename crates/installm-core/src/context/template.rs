use crate::constants::template::{ASSISTANT, END, STRIP_TOKENS, SYSTEM, USER};
use crate::context::history::{Role, Turn};
use regex::Regex;
use std::sync::OnceLock;

/// Renders a system preamble and the turn history into the single prompt
/// string the backends consume.
pub struct PromptTemplate {
    system_prompt: String,
}

impl PromptTemplate {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
        }
    }

    /// Render every turn in order, then open an assistant block for the reply.
    pub fn render<'a>(&self, turns: impl IntoIterator<Item = &'a Turn>) -> String {
        let mut prompt = String::new();

        if !self.system_prompt.is_empty() {
            push_block(&mut prompt, SYSTEM, &self.system_prompt);
        }

        for turn in turns {
            let tag = match turn.role {
                Role::User => USER,
                Role::Assistant => ASSISTANT,
            };
            push_block(&mut prompt, tag, &turn.text);
        }

        prompt.push_str(ASSISTANT);
        prompt.push('\n');
        prompt
    }
}

fn push_block(prompt: &mut String, tag: &str, text: &str) {
    prompt.push_str(tag);
    prompt.push('\n');
    prompt.push_str(text);
    prompt.push_str(END);
    prompt.push('\n');
}

fn edge_tokens() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let token = STRIP_TOKENS
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let edge = format!(r"(?:\s|{token})+");
        Regex::new(&format!("^{edge}|{edge}$")).expect("escaped token list is a valid regex")
    })
}

/// Clean backend output: remove delimiter tokens and whitespace from both
/// ends. Text inside the reply is left alone.
pub fn clean_output(raw: &str) -> String {
    edge_tokens().replace_all(raw, "").into_owned()
}
