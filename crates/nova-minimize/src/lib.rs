//! Minimizes a Java source tree to what a set of target methods needs.
//!
//! A run has three phases:
//! - [`TargetMethodFinder`] walks every compilation unit and records, in
//!   [`UsedSets`], each class, method and field the targets reach.
//! - [`prune_unit`] rewrites each unit against those sets: targets stay byte
//!   for byte, other used methods keep only a stub body, and everything else
//!   goes.
//! - [`TypeChecker`] compiles the output and turns `incompatible types`
//!   diagnostics into [`TypeCorrections`] for the [`StubSynthesizer`].
//!
//! [`minimize`] drives all of it from a [`MinimizeConfig`].

mod config;
mod error;
mod finder;
mod pipeline;
mod pruner;
mod report;
mod stand_in;
mod stubs;
mod target;
mod type_correct;
mod used;

pub use config::{CheckerConfig, MinimizeConfig, CONFIG_FILE_NAME};
pub use error::{ConfigError, DiagnosticFormatError, MinimizeError};
pub use finder::{FinderOutput, TargetMethodFinder};
pub use pipeline::{correct_types_in, load_sources, minimize, minimize_with, parse_targets};
pub use pruner::{default_value, prune_unit, PrunedFile, STUB_BODY};
pub use report::{FileOutcome, MinimizeReport};
pub use stand_in::StandInMethod;
pub use stubs::{NoStubs, SourceFile, StubRequest, StubSynthesizer};
pub use target::TargetSignature;
pub use type_correct::{
    parse_diagnostic_line, TypeChecker, TypeCorrections, INCOMPATIBLE_TYPES_MARKER,
};
pub use used::{MemberKind, UnresolvedMember, UsedClasses, UsedSets};

#[cfg(test)]
mod tests;
