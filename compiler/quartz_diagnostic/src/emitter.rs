//! Terminal Emitter
//!
//! Human-readable diagnostic output with optional ANSI color support.
//! Every label renders its position, the offending source line, and a
//! caret underline beneath the labeled span.

use std::io::{self, IsTerminal, Write};

use crate::span_utils::{line_text, offset_to_line_col};
use crate::{Diagnostic, Label, Severity};

/// Terminal emitter with optional color support.
pub struct TerminalEmitter<W: Write> {
    writer: W,
    colors: bool,
}

impl TerminalEmitter<io::Stderr> {
    /// Create a terminal emitter for stderr with auto-detected color support.
    pub fn stderr() -> Self {
        TerminalEmitter {
            writer: io::stderr(),
            colors: io::stderr().is_terminal(),
        }
    }
}

impl<W: Write> TerminalEmitter<W> {
    /// Create a new terminal emitter.
    pub fn new(writer: W, colors: bool) -> Self {
        TerminalEmitter { writer, colors }
    }

    /// Emit a diagnostic, resolving spans against `source` under `path`.
    pub fn emit(&mut self, diagnostic: &Diagnostic, source: &str, path: &str) {
        // Header: severity[CODE]: message
        self.write_severity(diagnostic.severity);
        self.write_code(diagnostic.code.as_str());
        let _ = writeln!(self.writer, ": {}", diagnostic.message);

        for label in &diagnostic.labels {
            self.write_label(label, source, path);
        }

        for note in &diagnostic.notes {
            let _ = writeln!(self.writer, "  = note: {note}");
        }

        for suggestion in &diagnostic.suggestions {
            let _ = writeln!(self.writer, "  = help: {suggestion}");
        }

        let _ = writeln!(self.writer);
    }

    /// Position line, the source line itself, and a caret underline.
    fn write_label(&mut self, label: &Label, source: &str, path: &str) {
        let (line, col) = offset_to_line_col(source, label.span.start);
        let marker = if label.is_primary { "-->" } else { "   " };
        let _ = writeln!(
            self.writer,
            "  {} {}:{}:{}: {}",
            marker, path, line, col, label.message
        );

        let text = line_text(source, label.span.start);
        let _ = writeln!(self.writer, "  {line:>4} | {text}");

        let pad = " ".repeat(col as usize - 1);
        let remaining = text.len().saturating_sub(col as usize - 1);
        let width = (label.span.len() as usize).min(remaining).max(1);
        let underline = "^".repeat(width);
        let _ = write!(self.writer, "  {:>4} | {pad}", "");
        if self.colors {
            let color = if label.is_primary { "\x1b[1;31m" } else { "\x1b[1;34m" };
            let _ = writeln!(self.writer, "{color}{underline}\x1b[0m");
        } else {
            let _ = writeln!(self.writer, "{underline}");
        }
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) {
        let _ = self.writer.flush();
    }

    fn write_severity(&mut self, severity: Severity) {
        if self.colors {
            let color = match severity {
                Severity::Error => "\x1b[1;31m",   // Bold red
                Severity::Warning => "\x1b[1;33m", // Bold yellow
                Severity::Note => "\x1b[1;36m",    // Bold cyan
            };
            let _ = write!(self.writer, "{color}{severity}\x1b[0m");
        } else {
            let _ = write!(self.writer, "{severity}");
        }
    }

    fn write_code(&mut self, code: &str) {
        if self.colors {
            let _ = write!(self.writer, "\x1b[1m[{code}]\x1b[0m");
        } else {
            let _ = write!(self.writer, "[{code}]");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use quartz_ir::Span;

    fn render(diag: &Diagnostic, source: &str) -> String {
        let mut buf = Vec::new();
        {
            let mut emitter = TerminalEmitter::new(&mut buf, false);
            emitter.emit(diag, source, "demo.qtz");
        }
        String::from_utf8(buf).unwrap_or_default()
    }

    #[test]
    fn test_emit_plain() {
        let diag = Diagnostic::error(ErrorCode::E2002)
            .with_message("unresolved reference `y`")
            .with_label(Span::new(6, 7), "not found in this scope");

        let out = render(&diag, "var x\ny");
        assert!(out.contains("error[E2002]"), "{out}");
        assert!(out.contains("demo.qtz:2:1"), "{out}");
        assert!(out.contains("unresolved reference"), "{out}");
    }

    #[test]
    fn test_emit_shows_source_line_and_caret() {
        let diag = Diagnostic::error(ErrorCode::E2002)
            .with_message("unresolved reference `missing`")
            .with_label(Span::new(10, 17), "not found in this scope");

        let out = render(&diag, "var x\nx = missing\n");
        assert!(out.contains("| x = missing"), "{out}");
        assert!(out.contains("|     ^^^^^^^"), "{out}");
    }

    #[test]
    fn test_caret_width_clamps_to_line() {
        // A span past the end of its line still draws one caret.
        let diag = Diagnostic::error(ErrorCode::E1001)
            .with_message("unexpected token")
            .with_label(Span::new(4, 40), "here");

        let out = render(&diag, "var x");
        assert!(out.contains("| x"), "{out}");
        assert!(out.contains("^"), "{out}");
    }
}
