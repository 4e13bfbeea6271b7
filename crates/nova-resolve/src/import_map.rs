use nova_syntax::ast::CompilationUnit;
use nova_syntax::Span;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportMap {
    pub type_single: Vec<TypeSingleImport>,
    pub type_star: Vec<TypeStarImport>,
    pub static_single: Vec<StaticSingleImport>,
    pub static_star: Vec<StaticStarImport>,
}

impl ImportMap {
    #[must_use]
    pub fn from_unit(unit: &CompilationUnit) -> Self {
        let mut out = ImportMap::default();

        for import in &unit.imports {
            if import.path.trim().is_empty() {
                continue;
            }

            match (import.is_static, import.is_star) {
                (false, false) => {
                    out.type_single.push(TypeSingleImport {
                        path: import.path.clone(),
                        imported: import.simple_name().to_string(),
                        range: import.range,
                    });
                }
                (false, true) => {
                    out.type_star.push(TypeStarImport {
                        path: import.path.clone(),
                        range: import.range,
                    });
                }
                (true, false) => {
                    let Some((ty, member)) = import.path.rsplit_once('.') else {
                        continue;
                    };
                    out.static_single.push(StaticSingleImport {
                        ty: ty.to_string(),
                        member: member.to_string(),
                        range: import.range,
                    });
                }
                (true, true) => {
                    out.static_star.push(StaticStarImport {
                        ty: import.path.clone(),
                        range: import.range,
                    });
                }
            }
        }

        out
    }

    /// Qualified name a single-type import binds to `simple`, if any.
    pub fn single_type(&self, simple: &str) -> Option<&str> {
        self.type_single
            .iter()
            .find(|import| import.imported == simple)
            .map(|import| import.path.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSingleImport {
    pub path: String,
    pub imported: String,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeStarImport {
    /// `import X.*;` where `X` is either a package or a type whose member
    /// types are imported. The resolver decides which one applies.
    pub path: String,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticSingleImport {
    pub ty: String,
    pub member: String,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticStarImport {
    pub ty: String,
    pub range: Span,
}
