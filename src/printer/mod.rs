//! Terminal output for evaluation results and diagnostics.

use owo_colors::OwoColorize;

pub struct TextPrinter {
    pub color: bool,
}

impl TextPrinter {
    /// Fragment output goes to stdout, plain.
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Diagnostics go to stderr, red on a terminal.
    pub fn diagnostic(&self, text: &str) {
        if self.color {
            eprintln!("{}", text.red());
        } else {
            eprintln!("{}", text);
        }
    }
}
