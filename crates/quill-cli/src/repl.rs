//! Interactive REPL — readline-style chat loop over the session controller.
//!
//! Uses `rustyline` for editing with persistent history. Slash commands
//! manage conversations; anything else is submitted as a chat message.

use anyhow::Result;
use colored::Colorize;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use quill_core::render::Render;

use crate::controller::SessionController;
use crate::helpers;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// Run the interactive REPL loop.
pub async fn run(mut controller: SessionController, renderer: &dyn Render) -> Result<()> {
    helpers::print_banner();

    let mut editor = create_editor()?;

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
            println!("\nGoodbye! ✒");
            break;
        }

        let _ = editor.add_history_entry(&input);

        if trimmed.starts_with('/') {
            handle_command(&mut controller, trimmed);
            continue;
        }

        debug!(input = trimmed, "submitting message");
        helpers::print_thinking();

        let submitted = controller.submit(trimmed).await;
        helpers::clear_thinking();

        if !submitted {
            continue;
        }
        if let Some(reply) = controller
            .active()
            .and_then(|conv| conv.messages.last())
        {
            helpers::print_response(&reply.content, renderer);
        }
    }

    save_history(&mut editor);

    Ok(())
}

/// Handle a slash command.
fn handle_command(controller: &mut SessionController, input: &str) {
    let mut parts = input.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).unwrap_or_default();

    match command {
        "/new" => {
            controller.new_chat();
            println!("{}", "Started a new chat.".dimmed());
        }
        "/list" => list_conversations(controller),
        "/open" => match parse_index(controller, arg) {
            Some(id) => {
                controller.select_conversation(id);
                let title = controller
                    .active()
                    .map(|c| helpers::display_title(&c.title).to_string())
                    .unwrap_or_default();
                println!("{} {}", "Opened:".dimmed(), title);
            }
            None => eprintln!("Usage: /open <number from /list>"),
        },
        "/delete" => match parse_index(controller, arg) {
            Some(id) => {
                controller.delete_conversation(id);
                println!("{}", "Deleted.".dimmed());
            }
            None => eprintln!("Usage: /delete <number from /list>"),
        },
        other => eprintln!("Unknown command: {other}"),
    }
}

/// Print the conversation list, most-recent first.
fn list_conversations(controller: &SessionController) {
    let conversations = controller.store().conversations();
    if conversations.is_empty() {
        println!("{}", "No conversations yet.".dimmed());
        return;
    }

    let active_id = controller.active().map(|c| c.id);
    for (i, conv) in conversations.iter().enumerate() {
        let marker = if Some(conv.id) == active_id { "*" } else { " " };
        println!(
            "{} {:>2}. {}  {}",
            marker,
            i + 1,
            helpers::display_title(&conv.title),
            conv.timestamp
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .dimmed()
        );
    }
}

/// Resolve a 1-based `/list` index into a conversation id.
fn parse_index(controller: &SessionController, arg: &str) -> Option<uuid::Uuid> {
    let index: usize = arg.parse().ok()?;
    controller
        .store()
        .conversations()
        .get(index.checked_sub(1)?)
        .map(|c| c.id)
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
    quill_core::utils::get_data_path()
        .join("history")
        .join("cli_history")
}

/// Check if input is an exit command.
fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
