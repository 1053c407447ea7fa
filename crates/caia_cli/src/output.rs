//! Terminal output helpers.
//!
//! Human-readable output goes to stdout, diagnostics go to stderr through
//! tracing. Raw payloads (JSON exports) are printed with [`Output::print`]
//! so they stay pipeable.

use owo_colors::OwoColorize;

#[derive(Debug, Clone, Copy, Default)]
pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    /// Section heading.
    pub fn section(&self, title: &str) {
        println!();
        println!("{}", title.bold().underline());
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", "✓".bright_green(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", "!".yellow().bold(), message.yellow());
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".bright_red(), message.red());
    }

    /// Labelled line, label emphasised.
    pub fn info(&self, label: &str, value: &str) {
        println!("{} {}", label.bright_cyan(), value);
    }

    /// Aligned key/value pair.
    pub fn kv(&self, key: &str, value: &str) {
        println!("{}", kv_line(key, value));
    }

    pub fn status(&self, message: &str) {
        println!("{message}");
    }

    pub fn list_item(&self, item: &str) {
        println!("  • {item}");
    }

    /// Unstyled output.
    pub fn print(&self, text: &str) {
        println!("{text}");
    }
}

/// Pad before styling: the ANSI wrapper ignores width flags.
fn kv_line(key: &str, value: &str) -> String {
    let label = format!("{:<18}", format!("{key}:"));
    format!("{} {}", label.dimmed(), value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kv_line_pads_label() {
        let line = kv_line("ID", "abc");
        assert!(line.contains(&format!("ID:{}", " ".repeat(15))));
        assert!(line.ends_with(" abc"));

        let long = kv_line("A very long label here", "x");
        assert!(long.contains("A very long label here:"));
    }
}
