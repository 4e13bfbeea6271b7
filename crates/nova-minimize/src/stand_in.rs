//! Source text for stand-in methods added to synthesized classes.

use std::fmt;

use crate::type_correct::TypeCorrections;

/// A method whose body only throws, rendered as Java source.
///
/// Parameters are named `parameter0`, `parameter1`, ... in order. An empty
/// return type renders no return type at all, which is how constructors are
/// written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandInMethod {
    name: String,
    return_type: String,
    params: Vec<String>,
    is_static: bool,
}

impl StandInMethod {
    pub fn new(
        name: impl Into<String>,
        return_type: impl Into<String>,
        params: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            return_type: return_type.into(),
            params: params.into_iter().map(Into::into).collect(),
            is_static: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn return_type(&self) -> &str {
        &self.return_type
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn set_static(&mut self) {
        self.is_static = true;
    }

    pub fn set_return_type(&mut self, return_type: impl Into<String>) {
        self.return_type = return_type.into();
    }

    /// Rewrites the return and parameter types the checker reported as
    /// incompatible. Returns whether anything changed.
    pub fn apply_corrections(&mut self, corrections: &TypeCorrections) -> bool {
        let mut changed = correct(&mut self.return_type, corrections);
        for param in &mut self.params {
            changed |= correct(param, corrections);
        }
        changed
    }
}

fn correct(ty: &mut String, corrections: &TypeCorrections) -> bool {
    match corrections.get(ty) {
        Some(correct) if correct != ty.as_str() => {
            *ty = correct.to_string();
            true
        }
        _ => false,
    }
}

impl fmt::Display for StandInMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\n    public ")?;
        if self.is_static {
            f.write_str("static ")?;
        }
        if !self.return_type.is_empty() {
            write!(f, "{} ", self.return_type)?;
        }
        write!(f, "{}(", self.name)?;
        for (idx, ty) in self.params.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{ty} parameter{idx}")?;
        }
        f.write_str(") {\n        throw new Error();\n    }\n")
    }
}
