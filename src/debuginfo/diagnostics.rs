//! Diagnostics collected while emitting debug information.
//!
//! Not every problem met during emission is fatal. A namespace or local name too long for
//! the debug format is dropped from the output and the routine is still emitted; the
//! compiler is expected to surface a warning for it. This module holds those non-fatal
//! reports.
//!
//! # Architecture
//!
//! Routines are emitted in parallel, so each routine gathers its own [`Diagnostic`]s first.
//! The emitter then appends them to the stream-wide [`Diagnostics`] in routine order, which
//! keeps the report deterministic. [`Diagnostics`] itself is backed by `boxcar::Vec` and
//! accepts concurrent appends without locking, so callers may also share one instance
//! across threads.
//!
//! # Usage Examples
//!
//! ```rust
//! use symscope::debuginfo::diagnostics::{DiagnosticCategory, Diagnostics};
//!
//! let diagnostics = Diagnostics::new();
//! diagnostics.warning(
//!     DiagnosticCategory::Import,
//!     "Import string of 2100 bytes exceeds the limit of 2046 bytes",
//! );
//!
//! assert!(diagnostics.has_warnings());
//! assert!(!diagnostics.has_errors());
//! for entry in diagnostics.iter() {
//!     println!("{entry}");
//! }
//! ```

use std::fmt::{self, Write};

use strum::Display;

use crate::debuginfo::token::Token;

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticSeverity {
    /// Informational, output is unaffected
    Info,
    /// Output was degraded but is still valid
    Warning,
    /// Output for the affected item is missing
    Error,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Info => write!(f, "INFO"),
            DiagnosticSeverity::Warning => write!(f, "WARN"),
            DiagnosticSeverity::Error => write!(f, "ERROR"),
        }
    }
}

/// Which part of the debug information a diagnostic concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum DiagnosticCategory {
    /// Import chains and using strings
    Import,
    /// Local variable names and slots
    Local,
    /// Sequence point tables
    SequencePoint,
    /// Lexical scopes
    Scope,
    /// Closure and lambda maps
    Lambda,
    /// Documents, checksums and embedded sources
    Document,
    /// Anything else
    General,
}

/// A single diagnostic entry
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// How severe the issue is
    pub severity: DiagnosticSeverity,
    /// Which part of the output it concerns
    pub category: DiagnosticCategory,
    /// Human readable description
    pub message: String,
    /// Routine the issue was found in, if any
    pub token: Option<Token>,
}

impl Diagnostic {
    /// Create a new diagnostic without routine context.
    pub fn new(
        severity: DiagnosticSeverity,
        category: DiagnosticCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            token: None,
        }
    }

    /// Create a warning.
    pub fn warning(category: DiagnosticCategory, message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Warning, category, message)
    }

    /// Attach the routine the diagnostic belongs to.
    #[must_use]
    pub fn with_token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)?;

        if let Some(token) = self.token {
            write!(f, " (routine: {token})")?;
        }

        Ok(())
    }
}

/// Thread-safe, append-only collection of [`Diagnostic`]s
#[derive(Debug)]
pub struct Diagnostics {
    entries: boxcar::Vec<Diagnostic>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: boxcar::Vec::new(),
        }
    }

    /// Add an informational entry.
    pub fn info(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(DiagnosticSeverity::Info, category, message));
    }

    /// Add a warning.
    pub fn warning(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::warning(category, message));
    }

    /// Add an error.
    pub fn error(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Error,
            category,
            message,
        ));
    }

    /// Add a prepared entry.
    pub fn push(&self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Number of entries.
    pub fn count(&self) -> usize {
        self.entries.count()
    }

    /// Returns `true` if nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.entries.count() == 0
    }

    /// Returns `true` if any error was reported.
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, d)| d.severity == DiagnosticSeverity::Error)
    }

    /// Returns `true` if any warning was reported.
    pub fn has_warnings(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, d)| d.severity == DiagnosticSeverity::Warning)
    }

    /// Iterate all entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().map(|(_, d)| d)
    }

    /// All warnings.
    pub fn warnings(&self) -> Vec<&Diagnostic> {
        self.iter()
            .filter(|d| d.severity == DiagnosticSeverity::Warning)
            .collect()
    }

    /// All entries of one category.
    pub fn by_category(&self, category: DiagnosticCategory) -> Vec<&Diagnostic> {
        self.iter().filter(|d| d.category == category).collect()
    }

    /// Multi-line summary, one entry per line.
    pub fn summary(&self) -> String {
        let mut output = String::new();
        let warnings = self.warnings().len();
        let errors = self
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
            .count();

        let _ = writeln!(
            output,
            "Diagnostics: {errors} error(s), {warnings} warning(s)"
        );
        for entry in self.iter() {
            let _ = writeln!(output, "  {entry}");
        }

        output
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        for diagnostic in iter {
            self.push(diagnostic);
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn diagnostic_display() {
        let diag = Diagnostic::warning(DiagnosticCategory::Local, "name dropped")
            .with_token(Token::method_def(3));

        assert_eq!(
            diag.to_string(),
            "[WARN] Local: name dropped (routine: 0x06000003)"
        );
    }

    #[test]
    fn counting_and_filtering() {
        let diagnostics = Diagnostics::new();
        assert!(diagnostics.is_empty());

        diagnostics.info(DiagnosticCategory::General, "routine has no body");
        diagnostics.warning(DiagnosticCategory::Import, "import dropped");
        diagnostics.warning(DiagnosticCategory::Local, "local dropped");

        assert_eq!(diagnostics.count(), 3);
        assert!(diagnostics.has_warnings());
        assert!(!diagnostics.has_errors());
        assert_eq!(diagnostics.warnings().len(), 2);
        assert_eq!(diagnostics.by_category(DiagnosticCategory::Import).len(), 1);

        diagnostics.error(DiagnosticCategory::Document, "checksum failed");
        assert!(diagnostics.has_errors());
        assert!(diagnostics.summary().starts_with("Diagnostics: 1 error(s), 2 warning(s)"));
    }

    #[test]
    fn insertion_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.extend(
            (0..5).map(|i| Diagnostic::warning(DiagnosticCategory::Scope, format!("{i}"))),
        );

        let messages: Vec<_> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, ["0", "1", "2", "3", "4"]);
    }

    #[test]
    fn concurrent_push() {
        let diagnostics = Arc::new(Diagnostics::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let diagnostics = Arc::clone(&diagnostics);
                thread::spawn(move || {
                    for i in 0..25 {
                        diagnostics.warning(DiagnosticCategory::General, format!("{t}:{i}"));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(diagnostics.count(), 100);
    }
}
