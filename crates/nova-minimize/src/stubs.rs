//! The seam where declarations for code outside the sources are produced.
//!
//! Synthesizing stand-in classes is left to implementations of
//! [`StubSynthesizer`]; the pipeline only tells them what is missing and
//! feeds their files back into the next round.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::type_correct::TypeCorrections;
use crate::used::{UnresolvedMember, UsedSets};

/// A source file relative to the analyzed root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// What one finder round could not find declarations for.
#[derive(Debug, Clone, Copy)]
pub struct StubRequest<'a> {
    pub used: &'a UsedSets,
    pub unresolved: &'a BTreeSet<UnresolvedMember>,
    /// Used classes with no declaration in the sources.
    pub missing_classes: &'a [String],
}

impl StubRequest<'_> {
    pub fn is_empty(&self) -> bool {
        self.unresolved.is_empty() && self.missing_classes.is_empty()
    }
}

pub trait StubSynthesizer {
    /// Files to add before the next round; replacing a file at the same path
    /// is allowed. Returning nothing ends the rounds.
    fn synthesize(&mut self, request: &StubRequest<'_>) -> Vec<SourceFile>;

    /// Rewritten synthesized files after the checker reported corrections.
    fn apply_type_corrections(&mut self, corrections: &TypeCorrections) -> Vec<SourceFile>;
}

/// Synthesizes nothing; unresolved code is simply pruned.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStubs;

impl StubSynthesizer for NoStubs {
    fn synthesize(&mut self, request: &StubRequest<'_>) -> Vec<SourceFile> {
        if !request.is_empty() {
            tracing::debug!(
                target: "nova.minimize",
                unresolved = request.unresolved.len(),
                missing_classes = request.missing_classes.len(),
                "no stub synthesizer configured"
            );
        }
        Vec::new()
    }

    fn apply_type_corrections(&mut self, _corrections: &TypeCorrections) -> Vec<SourceFile> {
        Vec::new()
    }
}
