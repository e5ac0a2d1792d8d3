//! `vero check`: parse every script under the given paths and report errors.

use std::path::{Path, PathBuf};

use serde::Serialize;
use vero_core::ParseError;
use vero_lsp::config::VeroConfig;
use vero_lsp::workspace::{self, WorkspaceError};

/// Parse errors for one file.
#[derive(Debug, Serialize)]
pub(crate) struct FileReport {
    pub path: PathBuf,
    pub errors: Vec<ParseError>,
}

/// Check result across all inputs.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CheckReport {
    pub files_checked: usize,
    pub error_count: usize,
    pub files: Vec<FileReport>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.error_count == 0
    }
}

/// Collect scripts from `paths` (files or directories) and parse each one.
/// Only files with errors are listed in the report.
pub(crate) fn check_paths(paths: &[PathBuf], config: &VeroConfig) -> Result<CheckReport, WorkspaceError> {
    let mut files = Vec::new();
    for path in paths {
        files.extend(workspace::find_script_files(path, config)?);
    }
    files.sort();
    files.dedup();

    let mut report = CheckReport::default();
    for file in files {
        let errors = check_file(&file, config)?;
        report.files_checked += 1;
        if !errors.is_empty() {
            report.error_count += errors.len();
            report.files.push(FileReport { path: file, errors });
        }
    }
    tracing::info!(
        files = report.files_checked,
        errors = report.error_count,
        "check finished"
    );
    Ok(report)
}

fn check_file(path: &Path, config: &VeroConfig) -> Result<Vec<ParseError>, WorkspaceError> {
    let text = workspace::read_script(path)?;
    let result = vero_core::parser::parse_source_with_options(&text, config.parse_options());
    tracing::debug!(path = %path.display(), errors = result.errors.len(), "checked");
    Ok(result.errors)
}

/// `path:line:column: message`, one per error, then a summary line.
pub(crate) fn format_text(report: &CheckReport) -> String {
    let mut out = String::new();
    for file in &report.files {
        for e in &file.errors {
            out.push_str(&format!(
                "{}:{}:{}: {}\n",
                file.path.display(),
                e.line,
                e.column,
                e.message
            ));
        }
    }
    out.push_str(&format!(
        "checked {} file{}, {} error{}",
        report.files_checked,
        if report.files_checked == 1 { "" } else { "s" },
        report.error_count,
        if report.error_count == 1 { "" } else { "s" },
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_only_broken_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("ok.vero"), "PAGE A {\n}\n").expect("write");
        std::fs::write(dir.path().join("bad.vero"), "PAGE {\n}\n").expect("write");
        std::fs::write(dir.path().join("notes.txt"), "PAGE {\n").expect("write");

        let report = check_paths(&[dir.path().to_path_buf()], &VeroConfig::default()).expect("check");
        assert_eq!(report.files_checked, 2);
        assert_eq!(report.error_count, 1);
        assert!(report.files[0].path.ends_with("bad.vero"));

        let text = format_text(&report);
        assert!(text.contains("bad.vero:1:6: "), "{}", text);
        assert!(text.ends_with("checked 2 files, 1 error"), "{}", text);
    }

    #[test]
    fn missing_path_is_an_error() {
        let err = check_paths(&[PathBuf::from("/definitely/not/here")], &VeroConfig::default());
        assert!(matches!(err, Err(WorkspaceError::NotFound(_))));
    }
}
