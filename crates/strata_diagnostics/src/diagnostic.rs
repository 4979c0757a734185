//! The diagnostic record.

use serde::Serialize;
use std::fmt;

use crate::severity::Severity;

/// A stable diagnostic code, e.g. `E0101`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
pub struct DiagnosticCode(pub &'static str);

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One diagnostic for one module.
///
/// Carries no source spans: facts in the toy pipeline are module- and
/// export-grained, so the module plus the message locate the problem.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Diagnostic {
    /// Stable code for filtering and tests.
    pub code: DiagnosticCode,
    /// Severity.
    pub severity: Severity,
    /// The module the diagnostic is about.
    pub module: String,
    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    /// Creates an error diagnostic.
    pub fn error(code: DiagnosticCode, module: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Error,
            module: module.into(),
            message: message.into(),
        }
    }

    /// Creates a warning diagnostic.
    pub fn warning(
        code: DiagnosticCode,
        module: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            severity: Severity::Warning,
            module: module.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {}: {}",
            self.severity, self.code, self.module, self.message
        )
    }
}
