use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::finder::FinderOutput;
use crate::type_correct::TypeCorrections;
use crate::used::UnresolvedMember;

/// Summary of one minimization run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimizeReport {
    /// Signatures of the declarations the targets matched.
    pub targets: Vec<String>,
    pub used_classes: Vec<String>,
    pub used_methods: Vec<String>,
    pub used_fields: Vec<String>,
    pub unresolved: Vec<UnresolvedMember>,
    /// Used classes declared nowhere in the sources.
    pub missing_classes: Vec<String>,
    pub files: Vec<FileOutcome>,
    /// Extra rounds run because the stub synthesizer added files.
    pub stub_rounds: usize,
    pub parse_errors: usize,
    pub type_corrections: TypeCorrections,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
    /// Relative to both the input root and the output directory.
    pub path: PathBuf,
    /// `false` when no type survived and the file was not written.
    pub kept: bool,
}

impl MinimizeReport {
    pub(crate) fn from_finder(output: &FinderOutput, missing_classes: Vec<String>) -> Self {
        let used = &output.used;
        Self {
            targets: used.targets.iter().map(ToString::to_string).collect(),
            used_classes: used.classes.iter().map(str::to_string).collect(),
            used_methods: used.methods.iter().map(ToString::to_string).collect(),
            used_fields: used.fields.iter().map(ToString::to_string).collect(),
            unresolved: output.unresolved.iter().cloned().collect(),
            missing_classes,
            ..Self::default()
        }
    }

    pub fn kept_files(&self) -> impl Iterator<Item = &Path> {
        self.files
            .iter()
            .filter(|file| file.kept)
            .map(|file| file.path.as_path())
    }
}
