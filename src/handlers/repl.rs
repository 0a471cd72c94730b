//! Interactive REPL over one interpreter session.

use std::fs;
use std::sync::Arc;

use anyhow::Result;
use rustyline::{error::ReadlineError, DefaultEditor};

use crate::config::Config;
use crate::engine::Engine;
use crate::printer::TextPrinter;
use crate::session::Session;

pub struct ReplHandler;

impl ReplHandler {
    /// Runs the read-eval-print loop until `:quit`, `:exit`, Ctrl-C, or
    /// Ctrl-D. The whole loop shares one session, so bindings persist
    /// across lines.
    pub fn run(engine: Arc<dyn Engine>, cfg: &Config, color: bool) -> Result<()> {
        let printer = TextPrinter { color };
        let mut session = Session::create(engine)?;

        let mut editor = DefaultEditor::new()?;
        let history_path = cfg.history_path();
        if let Some(parent) = history_path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let _ = editor.load_history(&history_path);

        loop {
            match editor.readline("mhs> ") {
                Ok(line) => {
                    let fragment = line.trim();
                    if fragment == ":quit" || fragment == ":exit" {
                        break;
                    }
                    if fragment.is_empty() {
                        continue;
                    }
                    editor.add_history_entry(fragment).ok();
                    match session.submit(fragment) {
                        // Definitions print nothing.
                        Ok(output) if output.is_empty() => {}
                        Ok(output) => printer.output(&output),
                        Err(diagnostic) => printer.diagnostic(diagnostic.as_str()),
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }

        let _ = editor.save_history(&history_path);
        session.destroy();
        Ok(())
    }
}
