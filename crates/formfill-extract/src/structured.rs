//! Layout-aware extraction through an external analyzer command.
//!
//! The structured analyzer is an optional heavyweight pipeline (document
//! layout model plus table recognition) that this service drives as a
//! subprocess: the command receives a document path and prints one JSON
//! object on stdout:
//!
//! ```json
//! {"pages": [{"text": "...", "tables": [{"rows": [["a","b"]]},
//!                                       {"html": "<table>...</table>"}]}]}
//! ```
//!
//! Availability is probed once per process and cached; a missing or
//! unconfigured analyzer is a capability flag read by the boundary layer,
//! never an error.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Deserialize;
use tracing::info;

use formfill_core::{BackendError, StructuredBackend, StructuredPage, TableBlock};

static STRUCTURED: OnceCell<Option<Arc<AnalyzerCli>>> = OnceCell::new();

/// Probe for the analyzer, at most once per process lifetime. Subsequent
/// calls return the cached handle; concurrent first calls are race-tolerant
/// (duplicate discovery is wasted work, the final state is consistent).
pub fn probe(configured_cmd: Option<&str>) -> Option<Arc<AnalyzerCli>> {
    STRUCTURED
        .get_or_init(|| {
            let found = AnalyzerCli::discover(configured_cmd);
            match &found {
                Some(cli) => info!(cmd = %cli.display(), "structured analyzer available"),
                None => info!("structured analyzer not configured; structured mode will degrade to raster OCR"),
            }
            found.map(Arc::new)
        })
        .clone()
}

// ── Analyzer wire format ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AnalyzerOutput {
    #[serde(default)]
    pages: Vec<AnalyzerPage>,
}

#[derive(Debug, Deserialize)]
struct AnalyzerPage {
    #[serde(default)]
    text: String,
    #[serde(default)]
    tables: Vec<AnalyzerTable>,
}

/// Typed rows are preferred when the analyzer exposes its cell model;
/// `html` is accepted from analyzers that only render tables as markup.
#[derive(Debug, Deserialize)]
struct AnalyzerTable {
    rows: Option<Vec<Vec<String>>>,
    html: Option<String>,
}

// ── CLI-backed implementation ───────────────────────────────────────────

/// [`StructuredBackend`] that shells out to a configured analyzer command.
#[derive(Debug, Clone)]
pub struct AnalyzerCli {
    program: PathBuf,
    args: Vec<String>,
}

impl AnalyzerCli {
    /// Build from a configured command line (program plus fixed arguments).
    /// Returns `None` when nothing is configured or the program does not
    /// resolve to an executable.
    pub fn discover(configured_cmd: Option<&str>) -> Option<Self> {
        let cmd = configured_cmd?.trim();
        if cmd.is_empty() {
            return None;
        }
        let mut parts = cmd.split_whitespace();
        let program = PathBuf::from(parts.next()?);
        let args: Vec<String> = parts.map(str::to_string).collect();

        let resolved = if program.is_absolute() {
            program.is_file().then_some(program)
        } else {
            resolve_in_path(&program)
        }?;

        Some(Self {
            program: resolved,
            args,
        })
    }

    fn display(&self) -> String {
        let mut s = self.program.display().to_string();
        for arg in &self.args {
            s.push(' ');
            s.push_str(arg);
        }
        s
    }
}

fn resolve_in_path(program: &Path) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

impl StructuredBackend for AnalyzerCli {
    fn analyze(&self, path: &Path) -> Result<Vec<StructuredPage>, BackendError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .output()?;

        if !output.status.success() {
            return Err(BackendError::Extraction(format!(
                "analyzer exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let parsed: AnalyzerOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| BackendError::Extraction(format!("analyzer output not JSON: {e}")))?;

        Ok(parsed
            .pages
            .into_iter()
            .map(|page| StructuredPage {
                text: page.text,
                tables: page
                    .tables
                    .into_iter()
                    .filter_map(|t| match (t.rows, t.html) {
                        (Some(rows), _) => Some(TableBlock::Rows(rows)),
                        (None, Some(html)) => Some(TableBlock::Html(html)),
                        (None, None) => None,
                    })
                    .collect(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_analyzer_is_unavailable() {
        assert!(AnalyzerCli::discover(None).is_none());
        assert!(AnalyzerCli::discover(Some("")).is_none());
        assert!(AnalyzerCli::discover(Some("   ")).is_none());
    }

    #[test]
    fn nonexistent_program_is_unavailable() {
        assert!(AnalyzerCli::discover(Some("/nonexistent/analyzer --json")).is_none());
        assert!(AnalyzerCli::discover(Some("definitely-not-a-real-binary-name")).is_none());
    }

    #[test]
    fn analyzer_output_parses_both_table_shapes() {
        let raw = r#"{"pages":[{"text":"hello","tables":[
            {"rows":[["a","b"],["c","d"]]},
            {"html":"<table><tr><td>x</td></tr></table>"},
            {}
        ]}]}"#;
        let parsed: AnalyzerOutput = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.pages.len(), 1);
        assert_eq!(parsed.pages[0].text, "hello");
        assert_eq!(parsed.pages[0].tables.len(), 3);
        assert!(parsed.pages[0].tables[0].rows.is_some());
        assert!(parsed.pages[0].tables[1].html.is_some());
    }
}
