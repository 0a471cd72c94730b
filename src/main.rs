use std::io::{self, Read};
use std::sync::Arc;

use anyhow::{bail, Result};
use is_terminal::IsTerminal;
use tracing_subscriber::EnvFilter;

use mhs_repl::cli::Cli;
use mhs_repl::config::Config;
use mhs_repl::engine::mock::MockEngine;
use mhs_repl::engine::process::ProcessEngine;
use mhs_repl::engine::Engine;
use mhs_repl::handlers::{eval::EvalHandler, repl::ReplHandler};
use mhs_repl::utils;

fn main() -> Result<()> {
    let args = Cli::parse();

    // Load config
    let cfg = Config::load();
    init_tracing(&cfg);

    // Engine selection: the built-in deterministic engine for dry runs,
    // otherwise the adapter process named by the CLI or config.
    let engine: Arc<dyn Engine> = if args.mock_engine {
        Arc::new(MockEngine::new())
    } else {
        let program = args
            .interpreter
            .clone()
            .unwrap_or_else(|| cfg.engine_bin());
        let mut engine_args = cfg.engine_args();
        engine_args.extend(args.engine_arg.iter().cloned());
        Arc::new(ProcessEngine::new(program, engine_args))
    };

    let color = io::stdout().is_terminal();

    if args.repl {
        if !io::stdin().is_terminal() {
            bail!("--repl requires a terminal; pipe fragments on stdin without --repl instead");
        }
        return ReplHandler::run(engine, &cfg, color);
    }

    // One-shot mode: --file contents first (in order), then piped
    // stdin, then the positional fragment, all within one session.
    let mut fragments = utils::read_sources(&args.file)?;
    if !io::stdin().is_terminal() {
        let mut piped = String::new();
        io::stdin().read_to_string(&mut piped)?;
        if !piped.trim().is_empty() {
            fragments.push(piped);
        }
    }
    if let Some(fragment) = args.fragment.clone() {
        if !fragment.trim().is_empty() {
            fragments.push(fragment);
        }
    }

    if fragments.is_empty() {
        bail!("nothing to evaluate; pass a fragment, pipe one on stdin, use --file, or start --repl");
    }
    EvalHandler::run(engine, &fragments, color)
}

fn init_tracing(cfg: &Config) {
    // RUST_LOG wins over the config key when set.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
