//! Run diagnostics and the transformation report
//!
//! Recoverable problems (anonymous ontologies, bad redirection lines,
//! non-boolean `deprecated` values, ...) never abort a run. They are logged
//! through `tracing` and collected here so callers can inspect them.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// IRI, file or resource the diagnostic is about
    pub subject: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
        };
        write!(f, "[{}] {}: {}", level, self.subject, self.message)
    }
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, subject: impl Into<String>, message: impl Into<String>) {
        let subject = subject.into();
        let message = message.into();
        tracing::info!(subject = %subject, "{}", message);
        self.entries.push(Diagnostic {
            severity: Severity::Info,
            subject,
            message,
        });
    }

    pub fn warn(&mut self, subject: impl Into<String>, message: impl Into<String>) {
        let subject = subject.into();
        let message = message.into();
        tracing::warn!(subject = %subject, "{}", message);
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            subject,
            message,
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

/// One code system that made it into the bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSystemSummary {
    pub id: String,
    pub url: String,
    pub name: String,
    pub concept_count: usize,
}

/// Outcome of a successful [`crate::transform`] run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub ontologies: usize,
    pub code_systems: Vec<CodeSystemSummary>,
    pub diagnostics: Vec<Diagnostic>,
}

impl TransformReport {
    pub fn total_concepts(&self) -> usize {
        self.code_systems.iter().map(|cs| cs.concept_count).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }
}
