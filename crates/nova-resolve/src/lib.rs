//! Name and member resolution for the Java minimizer.
//!
//! Resolution works over a [`SourceUniverse`]: every compilation unit of one
//! run, indexed by qualified type name. Anything not declared in the universe
//! is an *external* type. External types still resolve (a class path that
//! looks like `a.b.C` is taken at face value), but their members do not: a
//! member lookup that ends outside the sources fails with
//! [`Unresolved::MissingDeclaration`] naming the external owner.
//!
//! Lookups are driven by an explicit [`Scope`] that the caller threads
//! through its traversal; see [`Resolver`] for the lookup order.

mod import_map;
pub mod java_lang;
mod resolver;
pub mod scope;
pub mod signature;
pub mod types;
pub mod universe;

pub use import_map::{
    ImportMap, StaticSingleImport, StaticStarImport, TypeSingleImport, TypeStarImport,
};
pub use java_lang::{is_java_lang_name, qualify_java_lang};
pub use resolver::Resolver;
pub use scope::{ClassKind, Scope};
pub use signature::{
    enclosing_prefix, is_class_path, simple_name, strip_whitespace, FieldKey, MemberSignature,
};
pub use types::{
    AmbiguousType, Receiver, ReferenceType, Resolution, ResolvedField, ResolvedMethod, ResolvedType,
    TypeVariable, Unresolved, ValueDecl,
};
pub use universe::{qualify, SourceUniverse, TypeInfo, UnitInfo};

#[cfg(test)]
mod tests;
