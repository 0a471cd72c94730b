//! Process-backed engine: one interpreter adapter child per context,
//! newline-delimited JSON over piped stdio.
//!
//! The adapter wraps MicroHs behind a one-request-one-reply protocol:
//! every request is `{"op":"eval","code":...}` on a single line, every
//! reply is `{"status":"ok","output":...}` or
//! `{"status":"error","diagnostic":...}`. Transport faults surface as
//! diagnostics; a wedged context stays wedged until the session that
//! owns it is torn down.

use std::collections::HashMap;
use std::env;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{AllocError, ContextId, Diagnostic, Engine, InitError};

#[derive(Serialize)]
struct EvalRequest<'a> {
    op: &'static str,
    code: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum EvalResponse {
    Ok { output: String },
    Error { diagnostic: String },
}

struct Worker {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

#[derive(Default)]
struct ProcessState {
    next_context: u64,
    workers: HashMap<ContextId, Arc<Mutex<Worker>>>,
}

/// Engine that drives an external interpreter adapter process.
///
/// Each context is one child process, so independent sessions evaluate
/// concurrently while evaluations on one context stay serialized by a
/// per-worker lock.
pub struct ProcessEngine {
    program: PathBuf,
    args: Vec<String>,
    bootstrap: OnceLock<Result<(), InitError>>,
    state: Mutex<ProcessState>,
}

impl ProcessEngine {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            bootstrap: OnceLock::new(),
            state: Mutex::new(ProcessState::default()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ProcessState> {
        self.state.lock().expect("process engine state lock poisoned")
    }
}

impl Engine for ProcessEngine {
    fn init(&self) -> Result<(), InitError> {
        // One-shot: the first session to come up resolves the program,
        // later sessions observe the same outcome. A failed bootstrap
        // is sticky for this engine instance.
        self.bootstrap
            .get_or_init(|| resolve_program(&self.program))
            .clone()
    }

    fn new_context(&self) -> Result<ContextId, AllocError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| {
                AllocError::new(format!(
                    "could not start {}: {err}",
                    self.program.display()
                ))
            })?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AllocError::new("interpreter process exposed no stdio pipes"));
            }
        };

        let mut state = self.lock_state();
        let id = ContextId::from_raw(state.next_context);
        state.next_context += 1;
        state.workers.insert(
            id,
            Arc::new(Mutex::new(Worker {
                child,
                stdin,
                stdout: BufReader::new(stdout),
            })),
        );
        debug!(context = %id, program = %self.program.display(), "spawned interpreter process");
        Ok(id)
    }

    fn eval(&self, context: ContextId, code: &str) -> Result<String, Diagnostic> {
        // Take the worker out from under the table lock, then hold only
        // the per-context lock for the blocking exchange.
        let worker = self.lock_state().workers.get(&context).cloned();
        let Some(worker) = worker else {
            return Err(Diagnostic::from(format!(
                "no live interpreter process for {context}"
            )));
        };
        let mut worker = worker.lock().expect("interpreter worker lock poisoned");
        exchange(&mut worker, code)
    }

    fn free_context(&self, context: ContextId) {
        let Some(worker) = self.lock_state().workers.remove(&context) else {
            warn!(context = %context, "release requested for unknown context");
            return;
        };
        let mut worker = worker.lock().expect("interpreter worker lock poisoned");
        if let Err(err) = worker.child.kill() {
            warn!(context = %context, error = %err, "could not kill interpreter process");
        }
        if let Err(err) = worker.child.wait() {
            warn!(context = %context, error = %err, "could not reap interpreter process");
        }
        debug!(context = %context, "released interpreter context");
    }
}

fn exchange(worker: &mut Worker, code: &str) -> Result<String, Diagnostic> {
    let request = serde_json::to_string(&EvalRequest { op: "eval", code })
        .map_err(|err| Diagnostic::from(format!("could not encode eval request: {err}")))?;

    if let Err(err) = writeln!(worker.stdin, "{request}").and_then(|()| worker.stdin.flush()) {
        warn!(error = %err, "interpreter stdin write failed");
        return Err(Diagnostic::from(format!("interpreter is unreachable: {err}")));
    }

    let mut line = String::new();
    match worker.stdout.read_line(&mut line) {
        Ok(0) => Err(Diagnostic::from("interpreter closed the stream mid-session")),
        Ok(_) => decode_response(&line),
        Err(err) => {
            warn!(error = %err, "interpreter stdout read failed");
            Err(Diagnostic::from(format!(
                "interpreter reply could not be read: {err}"
            )))
        }
    }
}

fn decode_response(line: &str) -> Result<String, Diagnostic> {
    match serde_json::from_str::<EvalResponse>(line.trim()) {
        Ok(EvalResponse::Ok { output }) => Ok(output),
        Ok(EvalResponse::Error { diagnostic }) => Err(Diagnostic::new(diagnostic)),
        Err(err) => Err(Diagnostic::from(format!(
            "malformed interpreter reply: {err}"
        ))),
    }
}

fn resolve_program(program: &Path) -> Result<(), InitError> {
    if program.components().count() > 1 {
        if program.is_file() {
            Ok(())
        } else {
            Err(InitError::new(format!(
                "interpreter program {} does not exist",
                program.display()
            )))
        }
    } else {
        let path = env::var_os("PATH").unwrap_or_default();
        for dir in env::split_paths(&path) {
            if dir.join(program).is_file() {
                return Ok(());
            }
        }
        Err(InitError::new(format!(
            "interpreter program {} not found on PATH",
            program.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn eval_request_serializes_to_one_protocol_record() {
        let value = serde_json::to_value(EvalRequest {
            op: "eval",
            code: "1 + 1",
        })
        .expect("request must encode");
        assert_eq!(value, json!({"op": "eval", "code": "1 + 1"}));
    }

    #[test]
    fn ok_reply_decodes_to_output() {
        let decoded = decode_response(r#"{"status":"ok","output":"2"}"#);
        assert_eq!(decoded, Ok("2".to_string()));
    }

    #[test]
    fn error_reply_decodes_to_diagnostic() {
        let decoded = decode_response(r#"{"status":"error","diagnostic":"parse error on input"}"#);
        assert_eq!(
            decoded.expect_err("error reply").as_str(),
            "parse error on input"
        );
    }

    #[test]
    fn malformed_reply_is_reported_as_diagnostic() {
        let decoded = decode_response("not json at all");
        assert!(decoded
            .expect_err("garbage reply")
            .as_str()
            .starts_with("malformed interpreter reply"));
    }

    #[test]
    fn missing_program_fails_bootstrap_and_stays_failed() {
        let engine = ProcessEngine::new("mhs-engine-test-binary-that-does-not-exist", Vec::new());
        assert!(engine.init().is_err());
        assert!(engine.init().is_err());
    }

    #[test]
    fn explicit_program_path_is_checked_on_disk() {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        assert!(resolve_program(file.path()).is_ok());
        assert!(resolve_program(Path::new("/definitely/not/here/mhs-engine")).is_err());
    }
}
