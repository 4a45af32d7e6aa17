//! Validation findings for network definitions.
//!
//! Validators return a [`Diagnostics`] value holding zero or more findings
//! instead of appending to a caller-owned list. Each finding carries a
//! severity, a category used for grouping ("energy_type", "reference",
//! "series") and the name of the offending element.
//!
//! # Example
//!
//! ```
//! use emix_core::diagnostics::{Diagnostics, Severity};
//!
//! let mut diag = Diagnostics::new();
//! diag.add_error_with_entity("reference", "DSR type dsr_x of bus b1 not exists in Network DSR", "b1");
//! diag.add_warning("series", "Capacity factor sun has only zeros");
//!
//! assert_eq!(diag.error_count(), 1);
//! assert!(diag.has_errors());
//! ```

use serde::Serialize;

/// Severity level for a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Suspicious but the network can still be optimized
    Warning,
    /// The network must not be handed to the optimizer
    Error,
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Category for grouping (e.g. "energy_type", "reference")
    pub category: String,
    pub message: String,
    /// Name of the offending element
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl DiagnosticIssue {
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            entity: None,
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };

        write!(f, "[{}:{}] {}", severity, self.category, self.message)?;

        if let Some(entity) = &self.entity {
            write!(f, " ({})", entity)?;
        }

        Ok(())
    }
}

/// Collection of findings returned by network validation
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message));
    }

    pub fn add_error(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message));
    }

    pub fn add_error_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message).with_entity(entity));
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// Get issues filtered by category
    pub fn issues_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    /// Error messages in insertion order
    pub fn messages(&self) -> Vec<&str> {
        self.errors().map(|i| i.message.as_str()).collect()
    }

    pub fn summary(&self) -> String {
        let warnings = self.warning_count();
        let errors = self.error_count();

        match (warnings, errors) {
            (0, 0) => "No issues".to_string(),
            (w, 0) => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
            (0, e) => format!("{} error{}", e, if e == 1 { "" } else { "s" }),
            (w, e) => format!(
                "{} warning{}, {} error{}",
                w,
                if w == 1 { "" } else { "s" },
                e,
                if e == 1 { "" } else { "s" }
            ),
        }
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Diagnostics: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_counts() {
        let mut diag = Diagnostics::new();
        diag.add_warning("series", "flat profile");
        diag.add_error("reference", "unknown bus");
        diag.add_error_with_entity("energy_type", "unknown carrier", "bus_A");

        assert_eq!(diag.warning_count(), 1);
        assert_eq!(diag.error_count(), 2);
        assert!(diag.has_errors());
        assert_eq!(diag.issues_by_category("reference").count(), 1);
    }

    #[test]
    fn test_issue_display() {
        let issue = DiagnosticIssue::new(Severity::Error, "reference", "Invalid bus")
            .with_entity("gen_1");

        let display = issue.to_string();
        assert_eq!(display, "[error:reference] Invalid bus (gen_1)");
    }

    #[test]
    fn test_diagnostics_summary() {
        let mut diag = Diagnostics::new();
        assert_eq!(diag.summary(), "No issues");

        diag.add_warning("series", "warning");
        assert_eq!(diag.summary(), "1 warning");

        diag.add_error("reference", "error");
        diag.add_error("reference", "error");
        assert_eq!(diag.summary(), "1 warning, 2 errors");
    }

    #[test]
    fn test_serialization_skips_missing_entity() {
        let mut diag = Diagnostics::new();
        diag.add_error("reference", "dangling line");

        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("\"error\""));
        assert!(!json.contains("entity"));
    }
}
