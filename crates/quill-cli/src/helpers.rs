//! Shared CLI helpers — response printing, version banner.

use colored::Colorize;

use quill_core::render::Render;
use quill_core::types::PLACEHOLDER_TITLE;

/// Print an assistant response to stdout through the rendering seam.
pub fn print_response(response: &str, renderer: &dyn Render) {
    println!();
    println!("{}", "✒ Quill".cyan().bold());
    if response.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{}", renderer.render(response));
    }
    println!();
}

/// Print the banner shown at REPL start.
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "✒ Quill".cyan().bold(), version.dimmed());
    println!(
        "{}",
        "Type a message, \"/new\" for a fresh chat, or \"exit\" to quit.".dimmed()
    );
    println!();
}

/// Print a "thinking" placeholder while a request is in flight.
pub fn print_thinking() {
    eprint!("{}", "⠿ thinking...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

/// Display title for a conversation, falling back to the placeholder.
pub fn display_title(title: &str) -> &str {
    if title.is_empty() {
        PLACEHOLDER_TITLE
    } else {
        title
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
