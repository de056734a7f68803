//! Diagnostic queue for collecting, deduplicating, and sorting diagnostics.
//!
//! All recoverable failures accumulate here; the driver flushes the queue
//! once at the end of a compilation and suppresses code output if any
//! error was recorded.

use crate::Diagnostic;

/// Configuration for diagnostic processing.
#[derive(Clone, Debug)]
pub struct DiagnosticConfig {
    /// Maximum number of errors before stopping (0 = unlimited).
    pub error_limit: usize,
    /// Deduplicate diagnostics with same line and similar content.
    pub deduplicate: bool,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        DiagnosticConfig {
            error_limit: 10,
            deduplicate: true,
        }
    }
}

impl DiagnosticConfig {
    /// Create a config with no limits (for testing).
    pub fn unlimited() -> Self {
        DiagnosticConfig {
            error_limit: 0,
            deduplicate: false,
        }
    }
}

/// Queued diagnostic with position metadata for sorting and deduplication.
#[derive(Clone, Debug)]
struct QueuedDiagnostic {
    diagnostic: Diagnostic,
    line: u32,
    column: u32,
}

/// Queue for collecting, deduplicating, and sorting diagnostics.
#[derive(Clone, Debug)]
pub struct DiagnosticQueue {
    diagnostics: Vec<QueuedDiagnostic>,
    error_count: usize,
    /// Last (line, message prefix) for dedup.
    last_error: Option<(u32, String)>,
    config: DiagnosticConfig,
}

impl Default for DiagnosticQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticQueue {
    /// Create a new diagnostic queue with default configuration.
    pub fn new() -> Self {
        DiagnosticQueue {
            diagnostics: Vec::new(),
            error_count: 0,
            last_error: None,
            config: DiagnosticConfig::default(),
        }
    }

    /// Create a diagnostic queue with custom configuration.
    pub fn with_config(config: DiagnosticConfig) -> Self {
        DiagnosticQueue {
            diagnostics: Vec::new(),
            error_count: 0,
            last_error: None,
            config,
        }
    }

    /// Add a diagnostic to the queue.
    ///
    /// Returns `true` if the diagnostic was added, `false` if it was
    /// filtered by the error limit or deduplication.
    pub fn add(&mut self, diag: Diagnostic, line: u32, column: u32) -> bool {
        if self.config.error_limit > 0 && self.error_count >= self.config.error_limit {
            return false;
        }

        let is_error = diag.is_error();

        if self.config.deduplicate && self.is_duplicate(&diag, line) {
            return false;
        }

        if is_error {
            let prefix = diag.message.chars().take(30).collect();
            self.last_error = Some((line, prefix));
            self.error_count += 1;
        }

        self.diagnostics.push(QueuedDiagnostic { diagnostic: diag, line, column });
        true
    }

    /// Add a diagnostic with position computed from source.
    pub fn add_with_source(&mut self, diag: Diagnostic, source: &str) -> bool {
        let (line, column) = if let Some(span) = diag.primary_span() {
            crate::span_utils::offset_to_line_col(source, span.start)
        } else {
            (1, 1)
        };
        self.add(diag, line, column)
    }

    fn is_duplicate(&self, diag: &Diagnostic, line: u32) -> bool {
        if let Some((last_line, last_prefix)) = &self.last_error {
            if *last_line == line {
                let prefix: String = diag.message.chars().take(30).collect();
                return *last_prefix == prefix;
            }
        }
        false
    }

    /// Check if the error limit has been reached.
    pub fn limit_reached(&self) -> bool {
        self.config.error_limit > 0 && self.error_count >= self.config.error_limit
    }

    /// Get the number of errors collected.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Check whether any error has been recorded.
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Sort by source position and return all collected diagnostics.
    pub fn flush(mut self) -> Vec<Diagnostic> {
        self.diagnostics.sort_by_key(|q| (q.line, q.column));
        self.diagnostics.into_iter().map(|q| q.diagnostic).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use quartz_ir::Span;

    fn diag(msg: &str) -> Diagnostic {
        Diagnostic::error(ErrorCode::E2002)
            .with_message(msg)
            .with_label(Span::new(0, 1), "here")
    }

    #[test]
    fn test_add_and_flush_sorted() {
        let mut queue = DiagnosticQueue::with_config(DiagnosticConfig::unlimited());
        queue.add(diag("second"), 5, 1);
        queue.add(diag("first"), 2, 3);
        queue.add(diag("third"), 5, 9);

        let flushed = queue.flush();
        assert_eq!(flushed[0].message, "first");
        assert_eq!(flushed[1].message, "second");
        assert_eq!(flushed[2].message, "third");
    }

    #[test]
    fn test_error_limit() {
        let mut queue = DiagnosticQueue::with_config(DiagnosticConfig {
            error_limit: 2,
            deduplicate: false,
        });

        assert!(queue.add(diag("one"), 1, 1));
        assert!(queue.add(diag("two"), 2, 1));
        assert!(!queue.add(diag("three"), 3, 1));
        assert!(queue.limit_reached());
        assert_eq!(queue.error_count(), 2);
    }

    #[test]
    fn test_dedup_same_line() {
        let mut queue = DiagnosticQueue::new();

        assert!(queue.add(diag("unresolved reference `x`"), 4, 1));
        assert!(!queue.add(diag("unresolved reference `x`"), 4, 7));
        assert!(queue.add(diag("unresolved reference `x`"), 5, 1));
        assert_eq!(queue.error_count(), 2);
    }
}
