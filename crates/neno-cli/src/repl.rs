//! Interactive REPL.
//!
//! Uses `rustyline` for readline-style editing with persistent history.
//! The conversation is kept in memory for the whole session, so every
//! turn is answered with the previous turns as context.

use anyhow::Result;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use neno_cooperative::{ChatOptions, ChatService};
use neno_core::types::Message;
use neno_core::utils::get_history_path;

use crate::helpers;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// Drops the conversation so far.
const CLEAR_COMMAND: &str = "/clear";

/// Run the interactive REPL loop.
pub async fn run(service: ChatService, options: ChatOptions) -> Result<()> {
    helpers::print_banner(&service.orchestrator().registry().priority());

    let mut editor = create_editor()?;
    let mut conversation: Vec<Message> = Vec::new();

    loop {
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => break,
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_exit_command(trimmed) {
            println!("\nGoodbye! 👋");
            break;
        }

        let _ = editor.add_history_entry(&input);

        if trimmed.eq_ignore_ascii_case(CLEAR_COMMAND) {
            conversation.clear();
            println!("(conversation cleared)\n");
            continue;
        }

        debug!(turns = conversation.len(), input = trimmed, "processing input");
        conversation.push(Message::user(trimmed));

        if !options.stream {
            helpers::print_thinking();
        }
        let answer = match service.respond(&conversation, &options).await {
            Ok(outcome) => {
                helpers::clear_thinking();
                helpers::print_outcome(outcome).await
            }
            Err(e) => {
                helpers::clear_thinking();
                Err(e.into())
            }
        };

        match answer {
            Ok(text) => conversation.push(Message::assistant(text)),
            Err(e) => {
                // Drop the unanswered turn.
                conversation.pop();
                eprintln!("\n❌ Error: {e:#}\n");
            }
        }
    }

    save_history(&mut editor);

    Ok(())
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// Path to the history file.
fn history_path() -> std::path::PathBuf {
    get_history_path().join("cli_history")
}

/// Check if input is an exit command.
fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
