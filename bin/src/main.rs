use std::{
    io::{stderr, stdin, stdout, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::Context;
use clap::{error::ErrorKind, Parser};
use errors::{Diagnostics, Reporter, WriteReporter};
use interpreter::Interpreter;
use itertools::Itertools;

const EXIT_USAGE: u8 = 64;
const EXIT_DATA_ERROR: u8 = 65;
const EXIT_SOFTWARE: u8 = 70;

#[derive(Debug, Clone, Copy, PartialEq, clap::ValueEnum)]
enum Emit {
    /// One scanned token per line
    Tokens,
    /// Canonical parenthesized form of the expression
    Ast,
    /// Value of the expression
    Value,
}

/// Evaluates an expression from FILE, or line by line from an interactive prompt.
#[derive(clap::Parser)]
#[command(version)]
struct Args {
    file: Option<PathBuf>,

    /// Pipeline stage whose result is printed
    #[arg(long, value_enum, default_value_t = Emit::Value)]
    emit: Emit,
}

fn run(
    source: &str,
    emit: Emit,
    output: &mut impl Write,
    diagnostics: &mut Diagnostics<impl Reporter>,
) -> anyhow::Result<()> {
    match emit {
        Emit::Value => Interpreter::new().run_source(source, output, diagnostics)?,
        Emit::Tokens => {
            let tokens = scanner::scan(source, diagnostics);
            writeln!(output, "{}", tokens.iter().join("\n"))?;
        }
        Emit::Ast => {
            let tokens = scanner::scan(source, diagnostics);
            if !diagnostics.had_error() {
                if let Ok(expr) = parser::parse(&tokens, diagnostics) {
                    writeln!(output, "{expr}")?;
                }
            }
        }
    }
    Ok(())
}

fn run_file(path: PathBuf, emit: Emit) -> anyhow::Result<ExitCode> {
    let source = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    log::debug!("Running {}", path.display());
    let mut diagnostics = Diagnostics::new(WriteReporter(stderr()));
    run(&source, emit, &mut stdout(), &mut diagnostics)?;

    Ok(ExitCode::from(exit_status(&diagnostics)))
}

/// Static errors take precedence over runtime errors.
fn exit_status(diagnostics: &Diagnostics<impl Reporter>) -> u8 {
    let status = if diagnostics.had_error() {
        EXIT_DATA_ERROR
    } else if diagnostics.had_runtime_error() {
        EXIT_SOFTWARE
    } else {
        0
    };
    log::debug!("Exiting with status {status}");
    status
}

fn run_prompt(emit: Emit) -> anyhow::Result<ExitCode> {
    let mut diagnostics = Diagnostics::new(WriteReporter(stderr()));
    let mut output = stdout();
    loop {
        print!("> ");
        output.flush()?;

        let mut line = String::new();
        if stdin().read_line(&mut line)? == 0 {
            return Ok(ExitCode::SUCCESS);
        }

        diagnostics.reset();
        run(&line, emit, &mut output, &mut diagnostics)?;
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            e.print()?;
            return Ok(ExitCode::from(EXIT_USAGE));
        }
    };

    match args.file {
        Some(file) => run_file(file, args.emit),
        None => run_prompt(args.emit),
    }
}
