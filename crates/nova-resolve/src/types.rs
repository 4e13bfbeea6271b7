use std::fmt;

use nova_syntax::ast::PrimitiveKind;

use crate::signature::{FieldKey, MemberSignature};

/// Why a resolution failed. Carries the owning type when one is known so
/// callers can keep that type even though the member itself is unknown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Unresolved {
    #[error("cannot resolve type `{0}`")]
    UnknownType(String),
    #[error("`{0}` is a type variable")]
    TypeVariable(String),
    #[error("`{owner}` has no member `{name}`")]
    MemberNotFound { owner: String, name: String },
    #[error("`{owner}.{name}` is declared outside the analyzed sources")]
    MissingDeclaration { owner: String, name: String },
    #[error("`{0}` does not denote a value")]
    NotAValue(String),
    #[error("unsupported construct: {0}")]
    Unsupported(&'static str),
}

impl Unresolved {
    pub fn owner(&self) -> Option<&str> {
        match self {
            Unresolved::MemberNotFound { owner, .. }
            | Unresolved::MissingDeclaration { owner, .. } => Some(owner),
            _ => None,
        }
    }
}

pub type Resolution<T> = Result<T, Unresolved>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundKind {
    Extends,
    Super,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolvedType {
    Primitive(PrimitiveKind),
    Reference(ReferenceType),
    TypeVariable(TypeVariable),
    Array(Box<ResolvedType>),
    Wildcard(Option<(BoundKind, Box<ResolvedType>)>),
    /// A simple name that more than one on-demand import outside the sources
    /// could supply.
    Ambiguous(AmbiguousType),
    Void,
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AmbiguousType {
    pub name: String,
    /// Packages of the candidate on-demand imports, in import order.
    pub packages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceType {
    pub qualified_name: String,
    pub type_args: Vec<ResolvedType>,
}

impl ReferenceType {
    /// A reference type without type arguments.
    pub fn named(qualified_name: &str) -> ReferenceType {
        ReferenceType {
            qualified_name: qualified_name.to_string(),
            type_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeVariable {
    pub name: String,
    /// First declared bound; `None` means `java.lang.Object`.
    pub bound: Option<Box<ResolvedType>>,
}

impl ResolvedType {
    pub fn reference(qualified_name: impl Into<String>) -> ResolvedType {
        ResolvedType::Reference(ReferenceType {
            qualified_name: qualified_name.into(),
            type_args: Vec::new(),
        })
    }

    pub fn string() -> ResolvedType {
        ResolvedType::reference("java.lang.String")
    }

    pub fn object() -> ResolvedType {
        ResolvedType::reference("java.lang.Object")
    }

    pub fn boolean() -> ResolvedType {
        ResolvedType::Primitive(PrimitiveKind::Boolean)
    }

    pub fn int() -> ResolvedType {
        ResolvedType::Primitive(PrimitiveKind::Int)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, ResolvedType::Primitive(_))
    }

    pub fn as_reference(&self) -> Option<&ReferenceType> {
        match self {
            ResolvedType::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    /// Qualified name of a reference type, or of the element type of an array.
    pub fn qualified_name(&self) -> Option<&str> {
        match self {
            ResolvedType::Reference(reference) => Some(&reference.qualified_name),
            ResolvedType::Array(elem) => elem.qualified_name(),
            _ => None,
        }
    }

    /// Element type of an array, peeling one dimension.
    pub fn component(&self) -> Option<&ResolvedType> {
        match self {
            ResolvedType::Array(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn array_of(elem: ResolvedType, dims: usize) -> ResolvedType {
        let mut ty = elem;
        for _ in 0..dims {
            ty = ResolvedType::Array(Box::new(ty));
        }
        ty
    }

    /// Textual description: `int`, `a.b.C<java.lang.String>`, `T`, `int[]`,
    /// `? extends X`.
    pub fn describe(&self) -> String {
        self.to_string()
    }

    /// The type a member lookup on a value of this type searches: type
    /// variables fall back to their bound, boxed names stand in for
    /// primitives.
    pub fn member_owner(&self) -> Option<ResolvedType> {
        match self {
            ResolvedType::Reference(_) => Some(self.clone()),
            ResolvedType::TypeVariable(var) => match &var.bound {
                Some(bound) => bound.member_owner(),
                None => Some(ResolvedType::object()),
            },
            ResolvedType::Wildcard(Some((BoundKind::Extends, bound))) => bound.member_owner(),
            ResolvedType::Wildcard(_) => Some(ResolvedType::object()),
            ResolvedType::Primitive(kind) => Some(ResolvedType::reference(boxed_name(*kind))),
            ResolvedType::Array(_)
            | ResolvedType::Ambiguous(_)
            | ResolvedType::Void
            | ResolvedType::Null => None,
        }
    }

    /// Replaces type variables named in `bindings`.
    pub fn substitute(&self, bindings: &[(String, ResolvedType)]) -> ResolvedType {
        match self {
            ResolvedType::TypeVariable(var) => bindings
                .iter()
                .find(|(name, _)| *name == var.name)
                .map(|(_, ty)| ty.clone())
                .unwrap_or_else(|| self.clone()),
            ResolvedType::Reference(reference) => ResolvedType::Reference(ReferenceType {
                qualified_name: reference.qualified_name.clone(),
                type_args: reference
                    .type_args
                    .iter()
                    .map(|arg| arg.substitute(bindings))
                    .collect(),
            }),
            ResolvedType::Array(elem) => ResolvedType::Array(Box::new(elem.substitute(bindings))),
            ResolvedType::Wildcard(Some((kind, bound))) => {
                ResolvedType::Wildcard(Some((*kind, Box::new(bound.substitute(bindings)))))
            }
            _ => self.clone(),
        }
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedType::Primitive(kind) => f.write_str(kind.keyword()),
            ResolvedType::Reference(reference) => {
                f.write_str(&reference.qualified_name)?;
                if !reference.type_args.is_empty() {
                    f.write_str("<")?;
                    for (idx, arg) in reference.type_args.iter().enumerate() {
                        if idx > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            ResolvedType::TypeVariable(var) => f.write_str(&var.name),
            ResolvedType::Array(elem) => write!(f, "{elem}[]"),
            ResolvedType::Wildcard(None) => f.write_str("?"),
            ResolvedType::Wildcard(Some((BoundKind::Extends, bound))) => {
                write!(f, "? extends {bound}")
            }
            ResolvedType::Wildcard(Some((BoundKind::Super, bound))) => {
                write!(f, "? super {bound}")
            }
            ResolvedType::Ambiguous(ambiguous) => f.write_str(&ambiguous.name),
            ResolvedType::Void => f.write_str("void"),
            ResolvedType::Null => f.write_str("null"),
        }
    }
}

pub fn boxed_name(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Boolean => "java.lang.Boolean",
        PrimitiveKind::Byte => "java.lang.Byte",
        PrimitiveKind::Short => "java.lang.Short",
        PrimitiveKind::Int => "java.lang.Integer",
        PrimitiveKind::Long => "java.lang.Long",
        PrimitiveKind::Char => "java.lang.Character",
        PrimitiveKind::Float => "java.lang.Float",
        PrimitiveKind::Double => "java.lang.Double",
    }
}

pub fn unboxed_kind(qualified_name: &str) -> Option<PrimitiveKind> {
    Some(match qualified_name {
        "java.lang.Boolean" => PrimitiveKind::Boolean,
        "java.lang.Byte" => PrimitiveKind::Byte,
        "java.lang.Short" => PrimitiveKind::Short,
        "java.lang.Integer" => PrimitiveKind::Int,
        "java.lang.Long" => PrimitiveKind::Long,
        "java.lang.Character" => PrimitiveKind::Char,
        "java.lang.Float" => PrimitiveKind::Float,
        "java.lang.Double" => PrimitiveKind::Double,
        _ => return None,
    })
}

/// A method or constructor with its parameter types resolved in the scope of
/// its declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMethod {
    /// Qualified name of the declaring class (`{outer}$anonymous` for members
    /// of anonymous classes).
    pub declaring_type: String,
    pub name: String,
    /// A varargs parameter is stored as its array type.
    pub params: Vec<ResolvedType>,
    pub varargs: bool,
    /// `Void` for constructors.
    pub return_type: Resolution<ResolvedType>,
    pub throws: Vec<ResolvedType>,
    pub is_static: bool,
    pub is_constructor: bool,
}

impl ResolvedMethod {
    /// Whether the declared return type resolved. Type variables count as
    /// resolved.
    pub fn has_resolved_return_type(&self) -> bool {
        match &self.return_type {
            Ok(_) | Err(Unresolved::TypeVariable(_)) => true,
            Err(_) => false,
        }
    }

    pub fn signature(&self) -> MemberSignature {
        let last = self.params.len().saturating_sub(1);
        let params = self
            .params
            .iter()
            .enumerate()
            .map(|(idx, ty)| match (self.varargs && idx == last, ty) {
                (true, ResolvedType::Array(elem)) => format!("{elem}..."),
                _ => ty.describe(),
            })
            .collect();
        MemberSignature::new(self.declaring_type.clone(), self.name.clone(), params)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    pub declaring_type: String,
    pub name: String,
    pub ty: Resolution<ResolvedType>,
    pub is_static: bool,
}

impl ResolvedField {
    pub fn key(&self) -> FieldKey {
        FieldKey::new(self.declaring_type.clone(), self.name.clone())
    }
}

/// What a simple name used as an expression refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueDecl {
    /// Local variable, parameter, or pattern binding.
    Local(Resolution<ResolvedType>),
    Field(ResolvedField),
}

impl ValueDecl {
    pub fn ty(&self) -> Resolution<ResolvedType> {
        match self {
            ValueDecl::Local(ty) => ty.clone(),
            ValueDecl::Field(field) => field.ty.clone(),
        }
    }
}

/// The meaning of an expression used as a receiver (`x` in `x.f`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    Value(ResolvedType),
    Type(ResolvedType),
    Package(String),
}
