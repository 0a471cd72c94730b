//! One-shot evaluation: run fragments through a single session and
//! exit.

use std::sync::Arc;

use anyhow::{bail, Result};

use crate::engine::Engine;
use crate::printer::TextPrinter;
use crate::session::Session;

pub struct EvalHandler;

impl EvalHandler {
    /// Evaluates `fragments` in order inside one session. Stops at the
    /// first diagnostic; the session's context is released on that path
    /// too, by drop.
    pub fn run(engine: Arc<dyn Engine>, fragments: &[String], color: bool) -> Result<()> {
        let printer = TextPrinter { color };
        let mut session = Session::create(engine)?;

        for code in fragments {
            match session.submit(code) {
                Ok(output) if output.is_empty() => {}
                Ok(output) => printer.output(&output),
                Err(diagnostic) => {
                    printer.diagnostic(diagnostic.as_str());
                    bail!("fragment rejected by the interpreter");
                }
            }
        }

        session.destroy();
        Ok(())
    }
}
