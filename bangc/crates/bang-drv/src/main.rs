//! The `bang` command-line interpreter.
//!
//! Usage: `bang <path> [--tokens] [--ast] [--trace]`. Exit codes: 0 on
//! success, 1/2/3/4 for lexer/parser/semantic/evaluator errors, each
//! printed to stderr in the caret diagnostic format.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Bang language runner
#[derive(Parser, Debug)]
#[command(name = "bang")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Bang language runner", long_about = None)]
struct Cli {
    /// Path to a .bang file
    file: PathBuf,

    /// Print the post-split token groups before running
    #[arg(long)]
    tokens: bool,

    /// Print the parsed block AST before running
    #[arg(long)]
    ast: bool,

    /// Trace statement execution to stderr
    #[arg(long, env = "BANG_TRACE")]
    trace: bool,
}

fn init_tracing(trace: bool) {
    let filter = if trace {
        EnvFilter::new("bang_eval=trace")
    } else {
        EnvFilter::try_from_env("BANG_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: &Cli, source: &str) -> Result<(), bang_drv::BangError> {
    let tokens = bang_drv::tokenize(source)?;
    if cli.tokens {
        print!("{}", bang_drv::dump_token_groups(&tokens));
    }

    let roots = bang_drv::parse(tokens)?;
    if cli.ast {
        println!("{}", bang_drv::dump_ast(&roots));
    }

    bang_drv::analyze(&roots)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    bang_drv::evaluate(&roots, &mut out)?;
    out.flush().ok();
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.trace);

    let source = match std::fs::read_to_string(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))
    {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, &source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err.render(&source));
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
