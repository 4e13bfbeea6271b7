//! Target method signatures as given on the command line.
//!
//! A target is written `Type#member(P1, P2)`: the fully qualified declaring
//! type, the method name (or the simple type name for a constructor) and the
//! parameter types. Parameters match either the type as written in the source
//! or its resolved, fully qualified description, so `foo(String)` and
//! `foo(java.lang.String)` both name `void foo(String s)`.

use std::fmt;
use std::str::FromStr;

use nova_resolve::{strip_whitespace, MemberSignature};

use crate::error::MinimizeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSignature {
    raw: String,
    pub type_name: String,
    pub member: String,
    /// Whitespace-free parameter types, varargs normalized to `[]`.
    pub params: Vec<String>,
}

impl TargetSignature {
    pub fn parse(text: &str) -> Result<Self, MinimizeError> {
        let invalid = |reason: &str| MinimizeError::InvalidTarget {
            target: text.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = text.trim();
        let Some((type_name, rest)) = trimmed.split_once('#') else {
            return Err(invalid("expected `Type#member(params)`"));
        };
        let type_name = type_name.trim();
        if type_name.is_empty() || !type_name.split('.').all(is_identifier) {
            return Err(invalid("the declaring type is not a qualified name"));
        }

        let Some(open) = rest.find('(') else {
            return Err(invalid("missing parameter list"));
        };
        let Some(inner) = rest[open + 1..].trim_end().strip_suffix(')') else {
            return Err(invalid("parameter list is not closed"));
        };
        let member = rest[..open].trim();
        if !is_identifier(member) {
            return Err(invalid("the member name is not an identifier"));
        }

        let params = if inner.trim().is_empty() {
            Vec::new()
        } else {
            let params: Vec<String> = split_top_level(inner)
                .into_iter()
                .map(normalize_param)
                .collect();
            if params.iter().any(String::is_empty) {
                return Err(invalid("empty parameter type"));
            }
            params
        };

        Ok(Self {
            raw: trimmed.to_string(),
            type_name: type_name.to_string(),
            member: member.to_string(),
            params,
        })
    }

    /// The target as the user wrote it.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether a declaration matches: same declaring type and member name,
    /// and each parameter equal to either its written or its resolved form.
    pub fn matches(
        &self,
        declaring_type: &str,
        member: &str,
        written_params: &[String],
        resolved: &MemberSignature,
    ) -> bool {
        if self.type_name != declaring_type
            || self.member != member
            || self.params.len() != resolved.params.len()
            || self.params.len() != written_params.len()
        {
            return false;
        }
        self.params
            .iter()
            .zip(written_params.iter().zip(&resolved.params))
            .all(|(want, (written, resolved))| {
                *want == normalize_param(written) || *want == normalize_param(resolved)
            })
    }
}

impl FromStr for TargetSignature {
    type Err = MinimizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetSignature::parse(s)
    }
}

impl fmt::Display for TargetSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn normalize_param(param: &str) -> String {
    strip_whitespace(param).replace("...", "[]")
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c == '_' || c == '$' || unicode_ident::is_xid_start(c))
        && chars.all(|c| c == '_' || c == '$' || unicode_ident::is_xid_continue(c))
}

/// Splits on commas outside of `<...>`.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(ty: &str, name: &str, params: &[&str]) -> MemberSignature {
        MemberSignature::new(ty, name, params.iter().map(|p| p.to_string()).collect())
    }

    #[test]
    fn parses_generic_parameters_without_splitting_their_arguments() {
        let target = TargetSignature::parse("com.ex.Foo#put(Map<String, Integer>, int)").unwrap();
        assert_eq!(target.type_name, "com.ex.Foo");
        assert_eq!(target.member, "put");
        assert_eq!(target.params, vec!["Map<String,Integer>", "int"]);
    }

    #[test]
    fn matches_written_or_resolved_parameter_types() {
        let target = TargetSignature::parse("com.ex.Foo#bar(String, int...)").unwrap();
        let resolved = sig("com.ex.Foo", "bar", &["java.lang.String", "int..."]);
        let written = vec!["String".to_string(), "int...".to_string()];
        assert!(target.matches("com.ex.Foo", "bar", &written, &resolved));

        let qualified = TargetSignature::parse("com.ex.Foo#bar(java.lang.String, int[])").unwrap();
        assert!(qualified.matches("com.ex.Foo", "bar", &written, &resolved));

        let other = TargetSignature::parse("com.ex.Foo#bar(Object, int...)").unwrap();
        assert!(!other.matches("com.ex.Foo", "bar", &written, &resolved));
    }

    #[test]
    fn rejects_malformed_targets() {
        for text in ["com.ex.Foo.bar()", "com.ex.Foo#bar", "#bar()", "a.B#(int)", "a.B#f(int,)"] {
            assert!(
                matches!(
                    TargetSignature::parse(text),
                    Err(MinimizeError::InvalidTarget { .. })
                ),
                "{text} should be rejected"
            );
        }
    }
}
