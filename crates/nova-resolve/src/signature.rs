//! Canonical string keys for members and classes.
//!
//! Two declarations are "the same member" exactly when their rendered keys are
//! equal, so every component that records or looks up usages goes through
//! these types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// `a.b.C.foo(int, java.lang.String)`; constructors use the simple type name
/// (`a.b.C.C()`). Independent of formatting and of the return type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MemberSignature {
    pub declaring_type: String,
    pub name: String,
    /// Parameter type descriptions; a trailing varargs parameter renders as
    /// `T...`.
    pub params: Vec<String>,
}

impl MemberSignature {
    pub fn new(
        declaring_type: impl Into<String>,
        name: impl Into<String>,
        params: Vec<String>,
    ) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
            params,
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for MemberSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}({})",
            self.declaring_type,
            self.name,
            self.params.join(", ")
        )
    }
}

/// `a.b.C#field`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldKey {
    pub declaring_type: String,
    pub name: String,
}

impl FieldKey {
    pub fn new(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.declaring_type, self.name)
    }
}

/// Whether a dotted name looks like a class rather than a package: more than
/// one segment, a capitalized final segment and no whitespace.
pub fn is_class_path(path: &str) -> bool {
    if path.chars().any(char::is_whitespace) {
        return false;
    }
    let mut segments = path.split('.');
    let Some(first) = segments.next() else {
        return false;
    };
    if first.is_empty() {
        return false;
    }
    match segments.last() {
        Some(last) => last.chars().next().is_some_and(char::is_uppercase),
        None => false,
    }
}

/// Last dotted segment with any type arguments and array suffixes removed
/// (`java.util.List<java.lang.String>[]` → `List`).
pub fn simple_name(ty: &str) -> &str {
    let base = match ty.find('<') {
        Some(idx) => &ty[..idx],
        None => ty,
    };
    let base = base.trim_end_matches("...").trim_end_matches("[]").trim();
    base.rsplit('.').next().unwrap_or(base)
}

/// The dotted prefix before the last segment (`a.b.C.D` → `a.b.C`).
pub fn enclosing_prefix(qualified: &str) -> Option<&str> {
    qualified.rfind('.').map(|idx| &qualified[..idx])
}

/// Removes every whitespace character; used to compare written types.
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
