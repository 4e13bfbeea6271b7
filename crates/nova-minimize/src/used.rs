//! The sets the finder fills and the pruner consults.

use std::collections::BTreeSet;

use nova_resolve::{
    enclosing_prefix, is_class_path, is_java_lang_name, FieldKey, MemberSignature,
    SourceUniverse,
};
use serde::{Deserialize, Serialize};

/// Qualified names of every class the kept code refers to, closed under
/// enclosing classes: recording `a.b.Outer.Inner` also records `a.b.Outer`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsedClasses(BTreeSet<String>);

impl UsedClasses {
    /// Records `name` and each dotted prefix that still looks like a class.
    /// Returns whether anything was new.
    pub fn insert(&mut self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        let mut changed = self.0.insert(name.to_string());
        let mut current = name;
        while let Some(prefix) = enclosing_prefix(current) {
            if !is_class_path(prefix) {
                break;
            }
            changed |= self.0.insert(prefix.to_string());
            current = prefix;
        }
        changed
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Everything reachable from the targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedSets {
    /// Declarations matched by a target; kept verbatim.
    pub targets: BTreeSet<MemberSignature>,
    /// Methods and constructors the targets depend on; kept with a stub body.
    pub methods: BTreeSet<MemberSignature>,
    pub fields: BTreeSet<FieldKey>,
    pub classes: UsedClasses,
    /// Packages outside the sources whose on-demand imports must stay: a
    /// used simple name could come from any of them.
    #[serde(default)]
    pub on_demand_packages: BTreeSet<String>,
}

impl UsedSets {
    pub fn uses_member(&self, signature: &MemberSignature) -> bool {
        self.targets.contains(signature) || self.methods.contains(signature)
    }

    /// Used classes with no declaration in the sources, except the implicit
    /// `java.lang` ones.
    pub fn missing_classes(&self, universe: &SourceUniverse<'_>) -> Vec<String> {
        self.classes
            .iter()
            .filter(|name| !universe.contains_type(name))
            .filter(|name| !is_builtin(name))
            .map(str::to_string)
            .collect()
    }
}

pub(crate) fn is_builtin(qualified: &str) -> bool {
    qualified
        .strip_prefix("java.lang.")
        .is_some_and(|rest| rest.split('.').next().is_some_and(is_java_lang_name))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Method,
    Constructor,
    Field,
}

/// A member the targets use whose declaration is outside the sources.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnresolvedMember {
    pub owner: String,
    pub name: String,
    pub kind: MemberKind,
    /// Argument types at the use site; `None` where the argument itself did
    /// not resolve.
    pub arg_types: Vec<Option<String>>,
    /// Accessed through the type rather than an instance.
    pub is_static: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserting_a_nested_class_records_its_enclosing_classes() {
        let mut classes = UsedClasses::default();
        assert!(classes.insert("com.ex.Outer.Middle.Inner"));
        assert_eq!(
            classes.iter().collect::<Vec<_>>(),
            vec!["com.ex.Outer", "com.ex.Outer.Middle", "com.ex.Outer.Middle.Inner"]
        );
        assert!(!classes.insert("com.ex.Outer.Middle"));
    }

    #[test]
    fn package_prefixes_are_not_classes() {
        let mut classes = UsedClasses::default();
        classes.insert("com.ex.Foo");
        classes.insert("Bar");
        assert!(classes.contains("com.ex.Foo"));
        assert!(classes.contains("Bar"));
        assert!(!classes.contains("com.ex"));
        assert_eq!(classes.len(), 2);
    }

    #[test]
    fn java_lang_classes_are_builtin() {
        assert!(is_builtin("java.lang.String"));
        assert!(is_builtin("java.lang.Thread.State"));
        assert!(!is_builtin("java.util.List"));
        assert!(!is_builtin("java.lang.reflect.Method"));
    }
}
