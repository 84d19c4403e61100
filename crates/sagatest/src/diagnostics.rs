use colored::Colorize;
use sagaprobe_value::{diff_lines, DiffLine, Value};

/// Formatting capability handed to the expectation engine.
///
/// Implementations decide how the dim/expected/received parts of a message
/// are styled; the layout of diffs is shared.
pub trait Diagnostics {
    fn dim(&self, text: &str) -> String;
    fn expected(&self, text: &str) -> String;
    fn received(&self, text: &str) -> String;

    fn print_expected(&self, value: &Value) -> String {
        self.expected(&value.inspect())
    }

    fn print_received(&self, value: &Value) -> String {
        self.received(&value.inspect())
    }

    /// `Expected:`/`Received:` lines for one-line values, a line diff otherwise.
    fn diff(&self, expected: &Value, received: &Value) -> String {
        let expected_text = expected.pretty();
        let received_text = received.pretty();
        if !expected_text.contains('\n') && !received_text.contains('\n') {
            return format!(
                "Expected: {}\nReceived: {}",
                self.print_expected(expected),
                self.print_received(received)
            );
        }

        let body: Vec<String> = diff_lines(&expected_text, &received_text)
            .into_iter()
            .map(|line| match line {
                DiffLine::Same(text) => format!("  {text}"),
                DiffLine::Expected(text) => self.expected(&format!("- {text}")),
                DiffLine::Received(text) => self.received(&format!("+ {text}")),
            })
            .collect();
        format!(
            "{}\n{}\n\n{}",
            self.expected("- Expected"),
            self.received("+ Received"),
            body.join("\n")
        )
    }
}

/// Uncolored output.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainDiagnostics;

impl Diagnostics for PlainDiagnostics {
    fn dim(&self, text: &str) -> String {
        text.to_string()
    }

    fn expected(&self, text: &str) -> String {
        text.to_string()
    }

    fn received(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Terminal colors: dimmed headers, green expected, red received.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiDiagnostics;

impl Diagnostics for AnsiDiagnostics {
    fn dim(&self, text: &str) -> String {
        text.dimmed().to_string()
    }

    fn expected(&self, text: &str) -> String {
        text.green().to_string()
    }

    fn received(&self, text: &str) -> String {
        text.red().to_string()
    }
}
