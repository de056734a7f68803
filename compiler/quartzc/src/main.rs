//! The `quartz` command-line front-end.
//!
//! `quartz <input.qtz> [-o <output.mvir>]`
//!
//! On success the module text goes to stdout or the `-o` path and the
//! process exits 0; on failure every diagnostic is rendered with its
//! source position and the process exits non-zero. `QUARTZ_LOG` controls
//! the tracing filter.

use std::fs;
use std::process::ExitCode;

use quartz_diagnostic::emitter::TerminalEmitter;
use quartz_ir::SharedInterner;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum DriverError {
    #[error("usage: quartz <input.qtz> [-o <output.mvir>]")]
    Usage,
    #[error("cannot read `{path}`: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("cannot write `{path}`: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("compilation failed with {0} error(s)")]
    Compilation(usize),
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env("QUARTZ_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(std::env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            // Diagnostics were already rendered for compilation failures.
            if !matches!(error, DriverError::Compilation(_)) {
                eprintln!("error: {error}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), DriverError> {
    let (input, output) = parse_args(&args)?;

    let source = fs::read_to_string(&input).map_err(|source| DriverError::Read {
        path: input.clone(),
        source,
    })?;

    let interner = SharedInterner::new();
    match quartzc::compile(&source, &interner) {
        Ok(text) => match output {
            Some(path) => fs::write(&path, text).map_err(|source| DriverError::Write {
                path,
                source,
            }),
            None => {
                print!("{text}");
                Ok(())
            }
        },
        Err(diagnostics) => {
            let mut emitter = TerminalEmitter::stderr();
            for diagnostic in &diagnostics {
                emitter.emit(diagnostic, &source, &input);
            }
            emitter.flush();
            Err(DriverError::Compilation(diagnostics.len()))
        }
    }
}

fn parse_args(args: &[String]) -> Result<(String, Option<String>), DriverError> {
    let mut input = None;
    let mut output = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "-o" {
            output = Some(iter.next().ok_or(DriverError::Usage)?.clone());
        } else if input.is_none() {
            input = Some(arg.clone());
        } else {
            return Err(DriverError::Usage);
        }
    }

    Ok((input.ok_or(DriverError::Usage)?, output))
}
