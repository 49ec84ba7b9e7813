use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use kotoba::config::{DEFAULT_ENTRY_POINT, DEFAULT_MAX_DEPTH};
use kotoba::lexer::Lexer;
use kotoba::logging::init_tracing;
use kotoba::{Config, Interpreter};

/// Runs a kotoba script. Reads the script from stdin when no path is given.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Script to run.
    script: Option<PathBuf>,

    /// Nested evaluation limit before a stack-overflow error.
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Function called after the top-level statements, if defined.
    #[arg(long, default_value = DEFAULT_ENTRY_POINT)]
    entry: String,

    /// Print the token stream and exit.
    #[arg(long)]
    tokens: bool,

    /// Print the parsed syntax tree and exit.
    #[arg(long)]
    ast: bool,
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let args = Args::parse();

    let bytes = match &args.script {
        Some(path) => fs::read(path).with_context(|| format!("Reading {}", path.display()))?,
        None => {
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .context("Reading stdin")?;
            buffer
        }
    };
    // Malformed UTF-8 becomes U+FFFD instead of stopping the run.
    let source = String::from_utf8_lossy(&bytes).into_owned();

    if args.tokens {
        for token in Lexer::new(&source) {
            println!("{:>4}  {}", token.line(), token.kind());
        }
        return Ok(ExitCode::SUCCESS);
    }

    if args.ast {
        return Ok(match kotoba::parse(&source) {
            Ok(program) => {
                println!("{program:#?}");
                ExitCode::SUCCESS
            }
            Err(errors) => {
                eprintln!("{errors}");
                ExitCode::FAILURE
            }
        });
    }

    let module_root = match &args.script {
        Some(path) => path.parent().map(Path::to_path_buf).unwrap_or_default(),
        None => std::env::current_dir().context("Resolving current directory")?,
    };
    let config = Config::default()
        .with_max_depth(args.max_depth)
        .with_entry_point(args.entry)
        .with_module_root(module_root)
        .streaming(true);

    let mut interpreter = Interpreter::with_config(config);
    interpreter.run_source(&source);
    if let Some(message) = interpreter.error_message() {
        eprintln!("{message}");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
