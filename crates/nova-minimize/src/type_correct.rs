//! Type corrections learned from compiler diagnostics.
//!
//! Each output file is compiled on its own with the reference checker. Every
//! `incompatible types` error names a type the checker found (usually a
//! synthesized stand-in type) and the type it expected there; the map from
//! the former to the latter is handed back to the stub synthesizer, which
//! rewrites its stand-ins accordingly.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use nova_process::{run_command, RunOptions};
use nova_resolve::simple_name;
use serde::{Deserialize, Serialize};

use crate::config::CheckerConfig;
use crate::error::DiagnosticFormatError;

/// Marks the diagnostics the oracle reads.
pub const INCOMPATIBLE_TYPES_MARKER: &str = "error: incompatible types";

/// Simple name of an incorrect type to the simple name that should replace
/// it. Later insertions win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeCorrections(BTreeMap<String, String>);

impl TypeCorrections {
    pub fn insert(&mut self, incorrect: impl Into<String>, correct: impl Into<String>) {
        self.0.insert(incorrect.into(), correct.into());
    }

    pub fn get(&self, incorrect: &str) -> Option<&str> {
        self.0.get(incorrect).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn extend(&mut self, other: TypeCorrections) {
        self.0.extend(other.0);
    }
}

/// Reads one diagnostic line.
///
/// Returns `Ok(None)` for lines without the marker, and the
/// `(incorrect, correct)` simple names otherwise. Two shapes are understood:
///
/// ```text
/// A.java:3: error: incompatible types: Foo cannot be converted to int
/// A.java:3: error: incompatible types: found Foo required int
/// ```
pub fn parse_diagnostic_line(
    line: &str,
) -> Result<Option<(String, String)>, DiagnosticFormatError> {
    if !line.contains(INCOMPATIBLE_TYPES_MARKER) {
        return Ok(None);
    }
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 7 {
        return Err(DiagnosticFormatError {
            line: line.to_string(),
        });
    }

    let (anchor, fallback) = if line.contains("cannot be converted to") {
        ("types:", 4)
    } else {
        ("found", 5)
    };
    let incorrect = tokens
        .iter()
        .position(|token| *token == anchor)
        .and_then(|idx| tokens.get(idx + 1))
        .unwrap_or(&tokens[fallback]);
    let correct = tokens[tokens.len() - 1];

    Ok(Some((
        to_simple_name(incorrect).to_string(),
        to_simple_name(correct).to_string(),
    )))
}

fn to_simple_name(ty: &str) -> &str {
    simple_name(ty.trim_end_matches([',', ';']))
}

/// Scans checker output, recording one correction per marker line.
pub fn scan_output<'l>(
    lines: impl IntoIterator<Item = &'l str>,
    corrections: &mut TypeCorrections,
) -> Result<(), DiagnosticFormatError> {
    for line in lines {
        if let Some((incorrect, correct)) = parse_diagnostic_line(line)? {
            tracing::debug!(
                target: "nova.minimize.type_correct",
                %incorrect,
                %correct,
                "recorded type correction"
            );
            corrections.insert(incorrect, correct);
        }
    }
    Ok(())
}

/// The reference checker invocation.
#[derive(Debug, Clone)]
pub struct TypeChecker {
    program: PathBuf,
    timeout: Duration,
    max_output_bytes: usize,
}

impl TypeChecker {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
            max_output_bytes: RunOptions::default().max_bytes,
        }
    }

    /// Caps the checker output kept per stream.
    pub fn with_max_output_bytes(mut self, max_output_bytes: usize) -> Self {
        self.max_output_bytes = max_output_bytes;
        self
    }

    pub fn from_config(config: &CheckerConfig) -> Self {
        Self::new(config.program.clone(), Duration::from_millis(config.timeout_ms))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Compiles each file under `root` and collects corrections from the
    /// diagnostics.
    ///
    /// A checker that cannot be launched or exceeds its timeout is logged and
    /// the file skipped; only a malformed diagnostic is an error.
    pub fn correct_types(
        &self,
        root: &Path,
        files: &[PathBuf],
    ) -> Result<TypeCorrections, DiagnosticFormatError> {
        let root = match std::path::absolute(root) {
            Ok(root) => root,
            Err(err) => {
                tracing::warn!(
                    target: "nova.minimize.type_correct",
                    root = %root.display(),
                    error = %err,
                    "could not make the output root absolute"
                );
                root.to_path_buf()
            }
        };
        let opts = RunOptions {
            max_bytes: self.max_output_bytes,
            ..RunOptions::default()
        }
        .with_timeout(self.timeout);

        let mut corrections = TypeCorrections::default();
        for file in files {
            let args = vec![
                "-sourcepath".to_string(),
                root.display().to_string(),
                root.join(file).display().to_string(),
            ];
            let result = match run_command(&root, &self.program, &args, &opts) {
                Ok(result) => result,
                Err(err) => {
                    tracing::warn!(
                        target: "nova.minimize.type_correct",
                        program = %self.program.display(),
                        file = %file.display(),
                        error = %err,
                        "failed to launch the type checker"
                    );
                    continue;
                }
            };
            if result.timed_out {
                tracing::warn!(
                    target: "nova.minimize.type_correct",
                    file = %file.display(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "type checker timed out; skipping file"
                );
                continue;
            }
            if result.output.truncated() {
                tracing::warn!(
                    target: "nova.minimize.type_correct",
                    file = %file.display(),
                    max_bytes = self.max_output_bytes,
                    "type checker output truncated; later diagnostics are lost"
                );
            }
            scan_output(result.output.complete_lines(), &mut corrections)?;
        }
        Ok(corrections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pair(incorrect: &str, correct: &str) -> Option<(String, String)> {
        Some((incorrect.to_string(), correct.to_string()))
    }

    #[test]
    fn converted_shape_with_and_without_location_prefix() {
        assert_eq!(
            parse_diagnostic_line(
                "Foo.java:3: error: incompatible types: BarReturnType cannot be converted to int"
            )
            .unwrap(),
            pair("BarReturnType", "int")
        );
        assert_eq!(
            parse_diagnostic_line("error: incompatible types: String cannot be converted to int")
                .unwrap(),
            pair("String", "int")
        );
    }

    #[test]
    fn found_required_shape_reduces_to_simple_names() {
        assert_eq!(
            parse_diagnostic_line(
                "error: incompatible types: found java.lang.String required java.lang.Object"
            )
            .unwrap(),
            pair("String", "Object")
        );
    }

    #[test]
    fn short_marker_lines_are_rejected() {
        let err = parse_diagnostic_line("A.java:1: error: incompatible types").unwrap_err();
        assert_eq!(err.line, "A.java:1: error: incompatible types");
    }

    #[test]
    fn unrelated_lines_are_ignored() {
        assert_eq!(
            parse_diagnostic_line("A.java:1: error: cannot find symbol").unwrap(),
            None
        );
    }

    #[test]
    fn later_lines_win() {
        let mut corrections = TypeCorrections::default();
        scan_output(
            [
                "A.java:1: error: incompatible types: Foo cannot be converted to int",
                "    return x;",
                "A.java:9: error: incompatible types: Foo cannot be converted to long",
            ],
            &mut corrections,
        )
        .unwrap();
        assert_eq!(corrections.len(), 1);
        assert_eq!(corrections.get("Foo"), Some("long"));
    }
}
