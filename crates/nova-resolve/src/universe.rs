//! Index of every type declared in the analyzed sources.

use std::collections::{BTreeMap, BTreeSet};

use nova_syntax::ast::{Block, CompilationUnit, MemberDecl, Stmt, SwitchCase, TypeDecl};

use crate::import_map::ImportMap;

#[derive(Debug)]
pub struct UnitInfo<'a> {
    pub unit: &'a CompilationUnit,
    pub package: String,
    pub imports: ImportMap,
}

#[derive(Debug)]
pub struct TypeInfo<'a> {
    pub qualified_name: String,
    pub decl: &'a TypeDecl,
    /// Index into [`SourceUniverse::units`].
    pub unit: usize,
    /// Enclosing class for member and local types.
    pub outer: Option<String>,
    /// Declared in a method, constructor or initializer body.
    pub is_local: bool,
}

/// All compilation units of one run, with their types indexed by qualified
/// name. Local classes are indexed as `Enclosing.Local`.
#[derive(Debug, Default)]
pub struct SourceUniverse<'a> {
    units: Vec<UnitInfo<'a>>,
    types: BTreeMap<String, TypeInfo<'a>>,
    packages: BTreeSet<String>,
}

impl<'a> SourceUniverse<'a> {
    pub fn new(units: impl IntoIterator<Item = &'a CompilationUnit>) -> Self {
        let mut universe = SourceUniverse::default();
        for unit in units {
            universe.add_unit(unit);
        }
        universe
    }

    fn add_unit(&mut self, unit: &'a CompilationUnit) {
        let idx = self.units.len();
        let package = unit.package_name().to_string();
        self.units.push(UnitInfo {
            unit,
            package: package.clone(),
            imports: ImportMap::from_unit(unit),
        });

        // Every prefix of the package is a package too (`a`, `a.b`, ...).
        let mut prefix = String::new();
        for segment in package.split('.').filter(|s| !s.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);
            self.packages.insert(prefix.clone());
        }

        for decl in &unit.types {
            let name = qualify(&package, &decl.name);
            self.add_type(name, decl, idx, None, false);
        }
    }

    fn add_type(
        &mut self,
        name: String,
        decl: &'a TypeDecl,
        unit: usize,
        outer: Option<String>,
        is_local: bool,
    ) {
        if self.types.contains_key(&name) {
            tracing::warn!(
                target: "nova.resolve",
                type_name = %name,
                "duplicate type declaration; keeping the first one"
            );
            return;
        }

        self.types.insert(
            name.clone(),
            TypeInfo {
                qualified_name: name.clone(),
                decl,
                unit,
                outer,
                is_local,
            },
        );

        for member in &decl.members {
            match member {
                MemberDecl::Type(nested) => {
                    let nested_name = format!("{name}.{}", nested.name);
                    self.add_type(nested_name, nested, unit, Some(name.clone()), false);
                }
                MemberDecl::Method(method) => {
                    if let Some(body) = &method.body {
                        self.add_local_types(&name, body, unit);
                    }
                }
                MemberDecl::Constructor(ctor) => self.add_local_types(&name, &ctor.body, unit),
                MemberDecl::Initializer(init) => self.add_local_types(&name, &init.body, unit),
                MemberDecl::Field(_) => {}
            }
        }
    }

    fn add_local_types(&mut self, enclosing: &str, block: &'a Block, unit: usize) {
        let mut found = Vec::new();
        collect_local_types(&block.statements, &mut found);
        for decl in found {
            let name = format!("{enclosing}.{}", decl.name);
            self.add_type(name, decl, unit, Some(enclosing.to_string()), true);
        }
    }

    pub fn units(&self) -> &[UnitInfo<'a>] {
        &self.units
    }

    pub fn unit(&self, idx: usize) -> &UnitInfo<'a> {
        &self.units[idx]
    }

    pub fn type_info(&self, qualified_name: &str) -> Option<&TypeInfo<'a>> {
        self.types.get(qualified_name)
    }

    pub fn contains_type(&self, qualified_name: &str) -> bool {
        self.types.contains_key(qualified_name)
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeInfo<'a>> {
        self.types.values()
    }

    pub fn is_package(&self, name: &str) -> bool {
        self.packages.contains(name)
    }
}

pub fn qualify(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{package}.{name}")
    }
}

fn collect_local_types<'a>(statements: &'a [Stmt], out: &mut Vec<&'a TypeDecl>) {
    for stmt in statements {
        collect_in_stmt(stmt, out);
    }
}

fn collect_in_stmt<'a>(stmt: &'a Stmt, out: &mut Vec<&'a TypeDecl>) {
    match stmt {
        Stmt::LocalType(decl) => out.push(&**decl),
        Stmt::Block(block) => collect_local_types(&block.statements, out),
        Stmt::If(stmt) => {
            collect_in_stmt(&stmt.then_branch, out);
            if let Some(else_branch) = &stmt.else_branch {
                collect_in_stmt(else_branch, out);
            }
        }
        Stmt::While(stmt) => collect_in_stmt(&stmt.body, out),
        Stmt::DoWhile(stmt) => collect_in_stmt(&stmt.body, out),
        Stmt::For(stmt) => collect_in_stmt(&stmt.body, out),
        Stmt::ForEach(stmt) => collect_in_stmt(&stmt.body, out),
        Stmt::Labeled(stmt) => collect_in_stmt(&stmt.body, out),
        Stmt::Synchronized(stmt) => collect_local_types(&stmt.body.statements, out),
        Stmt::Try(stmt) => {
            collect_local_types(&stmt.body.statements, out);
            for catch in &stmt.catches {
                collect_local_types(&catch.body.statements, out);
            }
            if let Some(finally) = &stmt.finally {
                collect_local_types(&finally.statements, out);
            }
        }
        Stmt::Switch(stmt) => collect_in_cases(&stmt.cases, out),
        Stmt::LocalVar(_)
        | Stmt::Expr(_)
        | Stmt::Return(_)
        | Stmt::Throw(_)
        | Stmt::Break(_)
        | Stmt::Continue(_)
        | Stmt::Yield(_)
        | Stmt::Assert(_)
        | Stmt::ExplicitCtorCall(_)
        | Stmt::Empty(_) => {}
    }
}

fn collect_in_cases<'a>(cases: &'a [SwitchCase], out: &mut Vec<&'a TypeDecl>) {
    for case in cases {
        collect_local_types(&case.body, out);
    }
}
