use crate::diagnostics::{Diagnostic, Severity};

/// One line per diagnostic, then a count line.
pub fn render_diagnostics(diagnostics: &[Diagnostic]) -> String {
    let mut out = String::new();
    for d in diagnostics {
        out.push_str(&d.to_string());
        out.push('\n');
    }
    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    out.push_str(&format!(
        "{} error(s), {} warning(s)\n",
        errors,
        diagnostics.len() - errors
    ));
    out
}
