use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "mhs-repl", about = "Incremental MicroHs evaluation sessions", version)]
pub struct Cli {
    /// Source fragment to evaluate.
    #[arg(value_name = "FRAGMENT")]
    pub fragment: Option<String>,

    /// Start an interactive REPL session.
    #[arg(long, conflicts_with_all = ["fragment", "file"])]
    pub repl: bool,

    /// Evaluate fragments from source files, in order, within one session.
    /// Can be used multiple times: --file defs.hs --file main.hs
    #[arg(long = "file", action = clap::ArgAction::Append, value_name = "PATH")]
    pub file: Vec<String>,

    /// Interpreter adapter binary (overrides MHS_ENGINE_BIN).
    #[arg(long)]
    pub interpreter: Option<String>,

    /// Extra argument passed to the interpreter adapter.
    /// Can be used multiple times: --engine-arg --rts --engine-arg -K64m
    #[arg(long = "engine-arg", action = clap::ArgAction::Append, value_name = "ARG")]
    pub engine_arg: Vec<String>,

    /// Use the built-in deterministic engine instead of an interpreter
    /// process. Meant for trying the session machinery without MicroHs
    /// installed.
    #[arg(long = "mock-engine", conflicts_with_all = ["interpreter", "engine_arg"])]
    pub mock_engine: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
