use std::{fmt::Display, io::Write};

use cursor::Line;

/// Where on its line a static (scan or parse) error occurred.
#[derive(Debug, Clone, PartialEq)]
pub enum At {
    /// Reported by line only.
    Nowhere,
    End,
    Lexeme(String),
}

impl Display for At {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            At::Nowhere => Ok(()),
            At::End => write!(f, " at end"),
            At::Lexeme(lexeme) => write!(f, " at '{lexeme}'"),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Diagnostic {
    #[error("[line {line}] Error{at}: {message}")]
    Static { line: Line, at: At, message: String },
    #[error("{message}\n[line {line}]")]
    Runtime { line: Line, message: String },
}

impl Diagnostic {
    pub fn line(&self) -> Line {
        match self {
            Diagnostic::Static { line, .. } | Diagnostic::Runtime { line, .. } => *line,
        }
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, Diagnostic::Runtime { .. })
    }
}

/// Sink for diagnostics, kept separate from the evaluation output.
pub trait Reporter {
    fn report(&mut self, diagnostic: &Diagnostic);
}

impl Reporter for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self.push(diagnostic.clone());
    }
}

/// Writes every diagnostic to `W`, one per line.
#[derive(Debug)]
pub struct WriteReporter<W: Write>(pub W);

impl<W: Write> Reporter for WriteReporter<W> {
    fn report(&mut self, diagnostic: &Diagnostic) {
        if let Err(e) = writeln!(self.0, "{diagnostic}") {
            log::error!("Failed to write diagnostic {diagnostic:?}: {e}");
        }
    }
}

/// Error flags of one pipeline run plus the reporter they are forwarded to.
///
/// Callers decide what to do after each stage by looking at [`Diagnostics::had_error`] and
/// [`Diagnostics::had_runtime_error`], and call [`Diagnostics::reset`] between independent runs.
#[derive(Debug, Default)]
pub struct Diagnostics<R> {
    reporter: R,
    had_error: bool,
    had_runtime_error: bool,
}

impl<R: Reporter> Diagnostics<R> {
    pub fn new(reporter: R) -> Self {
        Self { reporter, had_error: false, had_runtime_error: false }
    }

    pub fn report(&mut self, diagnostic: impl Into<Diagnostic>) {
        let diagnostic = diagnostic.into();
        log::debug!("Reporting {diagnostic:?}");
        if diagnostic.is_runtime() {
            self.had_runtime_error = true;
        } else {
            self.had_error = true;
        }
        self.reporter.report(&diagnostic);
    }

    /// Positional error reported by line only.
    pub fn error(&mut self, line: Line, message: impl ToString) {
        self.report(Diagnostic::Static { line, at: At::Nowhere, message: message.to_string() })
    }

    pub fn error_at(&mut self, line: Line, at: At, message: impl ToString) {
        self.report(Diagnostic::Static { line, at, message: message.to_string() })
    }

    pub fn runtime_error(&mut self, line: Line, message: impl ToString) {
        self.report(Diagnostic::Runtime { line, message: message.to_string() })
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    pub fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }
}

impl Diagnostics<Vec<Diagnostic>> {
    /// Diagnostics that keep everything reported in memory.
    pub fn collecting() -> Self {
        Self::new(Vec::new())
    }
}
