//! Rendering boundary — markdown in, display-safe text out.
//!
//! The core never interprets markup itself; message content only crosses
//! this seam on the way to a display surface. Implementations must
//! neutralize script-injection vectors when the output is HTML.

/// Renders markdown message content for a display surface.
pub trait Render: Send + Sync {
    /// Render markdown into a display-safe representation.
    fn render(&self, markdown: &str) -> String;
}

/// Passthrough renderer — leaves the markdown untouched.
///
/// Used by the terminal client, where the content is shown verbatim.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainText;

impl Render for PlainText {
    fn render(&self, markdown: &str) -> String {
        markdown.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_identity() {
        let renderer = PlainText;
        assert_eq!(renderer.render("**bold** `code`"), "**bold** `code`");
    }
}
