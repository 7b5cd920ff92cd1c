//! Structural diagnostics. These are data, never control flow: a pass with
//! diagnostics still produces a best-effort report.

use crate::spec::{DeclarationKind, GroupName, HostName, PatternError, Redeclaration};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DiagnosticKind {
    MalformedPattern,
    DanglingReference,
    Cycle,
    DuplicateConflict,
    RedeclarationConflict,
    Orphan,
    InvalidGroupName,
}

impl DiagnosticKind {
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::Orphan | DiagnosticKind::InvalidGroupName => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    /// Groups involved, in the order the message names them.
    pub groups: Vec<GroupName>,
    pub hosts: Vec<HostName>,
    pub message: String,
}

impl Diagnostic {
    fn new(
        kind: DiagnosticKind,
        groups: Vec<GroupName>,
        hosts: Vec<HostName>,
        message: String,
    ) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            groups,
            hosts,
            message,
        }
    }

    pub fn malformed_pattern(group: &str, token: &str, err: &PatternError) -> Self {
        Self::new(
            DiagnosticKind::MalformedPattern,
            vec![group.to_string()],
            Vec::new(),
            format!("group '{}' skips member '{}': {}", group, token, err),
        )
    }

    pub fn dangling_reference(group: &str, child: &str) -> Self {
        Self::new(
            DiagnosticKind::DanglingReference,
            vec![group.to_string(), child.to_string()],
            Vec::new(),
            format!("group '{}' references undeclared group '{}'", group, child),
        )
    }

    /// `path` starts and ends with the same group.
    pub fn cycle(path: Vec<GroupName>) -> Self {
        let message = format!("cycle detected: {}", path.join(" -> "));
        Self::new(DiagnosticKind::Cycle, path, Vec::new(), message)
    }

    pub fn duplicate_conflict(host: &HostName, first: &str, second: &str) -> Self {
        Self::new(
            DiagnosticKind::DuplicateConflict,
            vec![first.to_string(), second.to_string()],
            vec![host.clone()],
            format!(
                "host '{}' is declared in mutually exclusive groups '{}' and '{}'",
                host, first, second
            ),
        )
    }

    pub fn orphan(host: &HostName, scope: &[GroupName]) -> Self {
        Self::new(
            DiagnosticKind::Orphan,
            scope.to_vec(),
            vec![host.clone()],
            format!(
                "host '{}' from {} is not reachable from any root group",
                host,
                scope.join(" + ")
            ),
        )
    }

    pub fn redeclaration(r: &Redeclaration) -> Self {
        let kind = match r.kind {
            DeclarationKind::Members => "members",
            DeclarationKind::Children => "children",
        };
        Self::new(
            DiagnosticKind::RedeclarationConflict,
            vec![r.group.clone()],
            Vec::new(),
            format!(
                "group '{}' {} redeclared with different content: {:?} then {:?}",
                r.group, kind, r.first, r.conflicting
            ),
        )
    }

    pub fn invalid_group_name(group: &str) -> Self {
        Self::new(
            DiagnosticKind::InvalidGroupName,
            vec![group.to_string()],
            Vec::new(),
            format!(
                "group name '{}' should contain only letters, digits and underscores",
                group
            ),
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.kind, self.message)
    }
}

/// Sort into a stable order and drop repeats of the same finding.
pub fn normalize(mut diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    diagnostics.sort();
    diagnostics.dedup_by(|a, b| a.kind == b.kind && a.groups == b.groups && a.hosts == b.hosts);
    diagnostics
}

pub fn worst_severity(diagnostics: &[Diagnostic]) -> Option<Severity> {
    diagnostics.iter().map(|d| d.severity).max()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_by_kind() {
        assert_eq!(DiagnosticKind::Cycle.severity(), Severity::Error);
        assert_eq!(DiagnosticKind::Orphan.severity(), Severity::Warning);
        assert!(Severity::Error > Severity::Warning);
    }

    #[test]
    fn normalize_drops_repeated_findings() {
        let diags = normalize(vec![
            Diagnostic::dangling_reference("c", "z"),
            Diagnostic::invalid_group_name("k8s-workers"),
            Diagnostic::dangling_reference("c", "z"),
        ]);
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].kind, DiagnosticKind::DanglingReference);
        assert_eq!(worst_severity(&diags), Some(Severity::Error));
        assert_eq!(worst_severity(&[]), None);
    }

    #[test]
    fn display_includes_severity_and_kind() {
        let d = Diagnostic::cycle(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(d.to_string(), "error[Cycle]: cycle detected: a -> b -> a");
    }
}
