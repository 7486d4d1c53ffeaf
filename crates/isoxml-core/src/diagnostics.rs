//! Non-fatal findings collected during a conversion pass.

use std::fmt;

use isoxml_model::ValidationError;
use serde::Serialize;
use tracing::warn;

/// Category of a data-integrity problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Missing, out-of-range or malformed attribute.
    Structural,
    /// A reference that points at nothing; the referring data is skipped.
    Reference,
    /// Data that admits more than one reading; the first reading is kept.
    Ambiguity,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DiagnosticKind::Structural => "structural",
            DiagnosticKind::Reference => "reference",
            DiagnosticKind::Ambiguity => "ambiguity",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Append-only list of diagnostics owned by one conversion pass.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding and log it.
    pub fn add(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        warn!(%kind, "{message}");
        self.entries.push(Diagnostic { kind, message });
    }

    pub fn structural(&mut self, message: impl Into<String>) {
        self.add(DiagnosticKind::Structural, message);
    }

    pub fn reference(&mut self, message: impl Into<String>) {
        self.add(DiagnosticKind::Reference, message);
    }

    pub fn ambiguity(&mut self, message: impl Into<String>) {
        self.add(DiagnosticKind::Ambiguity, message);
    }

    /// Record codec validation results as structural diagnostics.
    pub fn extend_validation<I>(&mut self, errors: I)
    where
        I: IntoIterator<Item = ValidationError>,
    {
        for error in errors {
            self.structural(error.to_string());
        }
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|entry| entry.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}
