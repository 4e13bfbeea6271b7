use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

use nova_syntax::ast::{
    BinaryOp, ConstructorDecl, CtorCallKind, ExplicitCtorCall, Expr, FieldAccessExpr,
    LiteralKind, MemberDecl, MethodCallExpr, MethodDecl, NewExpr, Param, PrimitiveKind, TypeDecl,
    TypeKind, TypeParam, TypeRef, TypeRefKind, TypeSegment, UnaryOp, WildcardBound,
};

use crate::java_lang::qualify_java_lang;
use crate::scope::{ClassKind, Frame, Scope};
use crate::signature::is_class_path;
use crate::types::{
    boxed_name, unboxed_kind, AmbiguousType, BoundKind, Receiver, ReferenceType, Resolution,
    ResolvedField, ResolvedMethod, ResolvedType, TypeVariable, Unresolved, ValueDecl,
};
use crate::universe::{qualify, SourceUniverse};

/// Type-variable bounds are resolved this many levels deep; deeper variables
/// are treated as unbounded (`T extends Comparable<T>`).
const MAX_BOUND_DEPTH: u8 = 2;

/// Source types reachable from one type through declared supertypes.
#[derive(Debug, Default)]
struct Hierarchy {
    /// Source types, the start type first, in breadth-first order.
    source: Vec<String>,
    /// Supertypes outside the sources, in discovery order.
    external: Vec<String>,
    /// `java.lang.Object`, `java.lang.Enum` or `java.lang.Record`.
    implicit: Option<String>,
    /// A declared supertype failed to resolve.
    incomplete: bool,
}

impl Hierarchy {
    fn first_external(&self) -> Option<&str> {
        self.external
            .first()
            .or(self.implicit.as_ref())
            .map(String::as_str)
    }

    fn contains(&self, qualified_name: &str) -> bool {
        self.source.iter().any(|t| t == qualified_name)
            || self.external.iter().any(|t| t == qualified_name)
            || self.implicit.as_deref() == Some(qualified_name)
    }

    /// Whether the hierarchy might contain types we cannot see.
    fn is_open(&self) -> bool {
        self.incomplete || !self.external.is_empty()
    }
}

/// Resolves names, types and members against a [`SourceUniverse`].
///
/// Types outside the universe are never an error by themselves: they resolve
/// to external references without a declaration, and looking up their
/// members yields [`Unresolved::MissingDeclaration`] naming them.
pub struct Resolver<'u, 'a> {
    universe: &'u SourceUniverse<'a>,
    /// Declared supertypes per source type, resolved in the declaring scope.
    supertypes: RefCell<HashMap<String, Vec<Resolution<ResolvedType>>>>,
}

impl<'u, 'a> Resolver<'u, 'a> {
    pub fn new(universe: &'u SourceUniverse<'a>) -> Self {
        Self {
            universe,
            supertypes: RefCell::new(HashMap::new()),
        }
    }

    pub fn universe(&self) -> &'u SourceUniverse<'a> {
        self.universe
    }

    /// The scope a type's own declaration is resolved in: its compilation
    /// unit plus the chain of enclosing classes.
    pub fn scope_for_type(&self, qualified_name: &str) -> Option<Scope<'a>> {
        let info = self.universe.type_info(qualified_name)?;
        let mut chain = vec![info];
        let mut outer = info.outer.as_deref();
        while let Some(name) = outer {
            let Some(enclosing) = self.universe.type_info(name) else {
                break;
            };
            chain.push(enclosing);
            outer = enclosing.outer.as_deref();
        }

        let mut scope = Scope::new(info.unit);
        for ty in chain.iter().rev() {
            scope.push_class(ty.qualified_name.clone(), ClassKind::Named(ty.decl));
        }
        Some(scope)
    }

    // ---------------------------------------------------------------------
    // Types
    // ---------------------------------------------------------------------

    pub fn resolve_type(&self, scope: &Scope<'a>, ty: &TypeRef) -> Resolution<ResolvedType> {
        self.resolve_type_at(scope, ty, 0)
    }

    fn resolve_type_at(
        &self,
        scope: &Scope<'a>,
        ty: &TypeRef,
        depth: u8,
    ) -> Resolution<ResolvedType> {
        match &ty.kind {
            TypeRefKind::Primitive(kind) => Ok(ResolvedType::Primitive(*kind)),
            TypeRefKind::Void => Ok(ResolvedType::Void),
            TypeRefKind::Var => Err(Unresolved::Unsupported("`var` without an initializer type")),
            TypeRefKind::Array(inner) => Ok(ResolvedType::Array(Box::new(
                self.resolve_type_at(scope, inner, depth)?,
            ))),
            TypeRefKind::Wildcard(None) => Ok(ResolvedType::Wildcard(None)),
            TypeRefKind::Wildcard(Some(WildcardBound::Extends(bound))) => {
                let bound = self.resolve_type_at(scope, bound, depth)?;
                Ok(ResolvedType::Wildcard(Some((BoundKind::Extends, Box::new(bound)))))
            }
            TypeRefKind::Wildcard(Some(WildcardBound::Super(bound))) => {
                let bound = self.resolve_type_at(scope, bound, depth)?;
                Ok(ResolvedType::Wildcard(Some((BoundKind::Super, Box::new(bound)))))
            }
            TypeRefKind::Union(_) => Err(Unresolved::Unsupported("union type")),
            TypeRefKind::Intersection(bounds) => match bounds.first() {
                Some(first) => self.resolve_type_at(scope, first, depth),
                None => Err(Unresolved::Unsupported("empty intersection type")),
            },
            TypeRefKind::Named(segments) => self.resolve_named(scope, segments, depth),
        }
    }

    fn resolve_named(
        &self,
        scope: &Scope<'a>,
        segments: &[TypeSegment],
        depth: u8,
    ) -> Resolution<ResolvedType> {
        let dotted = segments
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(".");
        let Some(first) = segments.first() else {
            return Err(Unresolved::UnknownType(dotted));
        };

        let (mut current, consumed) = match self.lookup_type_name(scope, &first.name, depth) {
            Ok(ResolvedType::TypeVariable(var)) if segments.len() == 1 => {
                return Ok(ResolvedType::TypeVariable(var));
            }
            Ok(ResolvedType::Ambiguous(ambiguous)) if segments.len() == 1 => {
                return Ok(ResolvedType::Ambiguous(ambiguous));
            }
            Ok(ResolvedType::Reference(reference)) => (reference.qualified_name, 1),
            Ok(_) => return Err(Unresolved::UnknownType(dotted)),
            Err(_) => self.resolve_qualified_prefix(segments, &dotted)?,
        };

        for segment in &segments[consumed..] {
            current = self
                .nested_type(&current, &segment.name)
                .ok_or_else(|| Unresolved::UnknownType(dotted.clone()))?;
        }

        let type_args = match segments.last().and_then(|s| s.args.as_ref()) {
            Some(args) => args
                .iter()
                .map(|arg| self.resolve_type_at(scope, arg, depth))
                .collect::<Resolution<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(ResolvedType::Reference(ReferenceType {
            qualified_name: current,
            type_args,
        }))
    }

    /// `a.b.C.D` whose first segment is not a type name: find the longest
    /// package prefix naming a source type, or treat the whole path as an
    /// external class.
    fn resolve_qualified_prefix(
        &self,
        segments: &[TypeSegment],
        dotted: &str,
    ) -> Resolution<(String, usize)> {
        let mut candidate = String::new();
        for (idx, segment) in segments.iter().enumerate() {
            if idx > 0 {
                candidate.push('.');
            }
            candidate.push_str(&segment.name);
            if idx > 0 && self.universe.contains_type(&candidate) {
                return Ok((candidate, idx + 1));
            }
        }
        if is_class_path(dotted) {
            Ok((dotted.to_string(), segments.len()))
        } else {
            Err(Unresolved::UnknownType(dotted.to_string()))
        }
    }

    /// Resolves a simple type name. Lookup order: type variables, member and
    /// local types of the enclosing classes, single-type imports, the current
    /// package, on-demand imports of source packages, `java.lang`, on-demand
    /// imports of packages outside the sources. A name more than one of the
    /// latter could supply is [`ResolvedType::Ambiguous`].
    pub fn lookup_type_name(
        &self,
        scope: &Scope<'a>,
        name: &str,
        depth: u8,
    ) -> Resolution<ResolvedType> {
        for frame in scope.frames().rev() {
            match frame {
                Frame::Block(block) => {
                    if let Some(qualified) = block.local_types.get(name) {
                        return Ok(ResolvedType::reference(qualified.clone()));
                    }
                }
                Frame::TypeParams(params) => {
                    if let Some(param) = params.iter().find(|p| p.name == name) {
                        return Ok(self.type_variable(scope, param, depth));
                    }
                }
                Frame::Class(class) => match &class.kind {
                    ClassKind::Named(decl) => {
                        if let Some(param) = decl.type_params.iter().find(|p| p.name == name) {
                            return Ok(self.type_variable(scope, param, depth));
                        }
                        if let Some(member) = self.member_type(&class.name, name) {
                            return Ok(ResolvedType::reference(member));
                        }
                    }
                    ClassKind::Anonymous { super_type, .. } => {
                        let inherited = super_type
                            .as_ref()
                            .and_then(|ty| ty.qualified_name())
                            .and_then(|owner| self.member_type(owner, name));
                        if let Some(member) = inherited {
                            return Ok(ResolvedType::reference(member));
                        }
                    }
                },
            }
        }

        let unit = self.universe.unit(scope.unit());
        if let Some(path) = unit.imports.single_type(name) {
            return Ok(ResolvedType::reference(path));
        }

        let same_package = qualify(&unit.package, name);
        if self.universe.contains_type(&same_package) {
            return Ok(ResolvedType::reference(same_package));
        }

        for star in &unit.imports.type_star {
            let candidate = format!("{}.{name}", star.path);
            if self.universe.contains_type(&candidate) {
                return Ok(ResolvedType::reference(candidate));
            }
        }

        if let Some(qualified) = qualify_java_lang(name) {
            return Ok(ResolvedType::reference(qualified));
        }

        let mut external_stars: Vec<String> = unit
            .imports
            .type_star
            .iter()
            .filter(|star| {
                !self.universe.is_package(&star.path) && !self.universe.contains_type(&star.path)
            })
            .map(|star| star.path.clone())
            .collect();
        external_stars.dedup();
        match external_stars.len() {
            0 => Err(Unresolved::UnknownType(name.to_string())),
            1 => Ok(ResolvedType::reference(format!("{}.{name}", external_stars[0]))),
            _ => Ok(ResolvedType::Ambiguous(AmbiguousType {
                name: name.to_string(),
                packages: external_stars,
            })),
        }
    }

    fn type_variable(&self, scope: &Scope<'a>, param: &TypeParam, depth: u8) -> ResolvedType {
        let bound = if depth < MAX_BOUND_DEPTH {
            param
                .bounds
                .first()
                .and_then(|bound| self.resolve_type_at(scope, bound, depth + 1).ok())
                .map(Box::new)
        } else {
            None
        };
        ResolvedType::TypeVariable(TypeVariable {
            name: param.name.clone(),
            bound,
        })
    }

    /// Member type `name` declared in or inherited by the source type `owner`.
    fn member_type(&self, owner: &str, name: &str) -> Option<String> {
        if !self.universe.contains_type(owner) {
            return None;
        }
        self.hierarchy(owner)
            .source
            .into_iter()
            .map(|ty| format!("{ty}.{name}"))
            .find(|candidate| self.universe.contains_type(candidate))
    }

    /// `owner.name` as a type: a member type for source owners, a guess for
    /// external ones.
    fn nested_type(&self, owner: &str, name: &str) -> Option<String> {
        if self.universe.contains_type(owner) {
            self.member_type(owner, name)
        } else {
            Some(format!("{owner}.{name}"))
        }
    }

    // ---------------------------------------------------------------------
    // Hierarchy
    // ---------------------------------------------------------------------

    fn declared_supertypes(&self, qualified_name: &str) -> Vec<Resolution<ResolvedType>> {
        if let Some(cached) = self.supertypes.borrow().get(qualified_name) {
            return cached.clone();
        }
        let Some(info) = self.universe.type_info(qualified_name) else {
            return Vec::new();
        };

        // Seed the cache so lookups made while resolving the header itself
        // (member types of this very class) terminate.
        self.supertypes
            .borrow_mut()
            .insert(qualified_name.to_string(), Vec::new());

        let resolved: Vec<_> = match self.scope_for_type(qualified_name) {
            Some(scope) => info
                .decl
                .supertypes()
                .map(|ty| {
                    let result = self.resolve_type(&scope, ty);
                    if let Err(err) = &result {
                        tracing::debug!(
                            target: "nova.resolve",
                            type_name = %qualified_name,
                            supertype = %ty,
                            error = %err,
                            "failed to resolve supertype"
                        );
                    }
                    result
                })
                .collect(),
            None => Vec::new(),
        };

        self.supertypes
            .borrow_mut()
            .insert(qualified_name.to_string(), resolved.clone());
        resolved
    }

    /// Successfully resolved declared supertypes of a source type.
    pub fn supertypes(&self, qualified_name: &str) -> Vec<ResolvedType> {
        self.declared_supertypes(qualified_name)
            .into_iter()
            .filter_map(Result::ok)
            .collect()
    }

    /// Types a kept declaration header mentions: resolved supertypes and the
    /// bounds of the class type parameters.
    pub fn header_types(&self, qualified_name: &str) -> Vec<ResolvedType> {
        let mut out = self.supertypes(qualified_name);
        if let (Some(info), Some(scope)) = (
            self.universe.type_info(qualified_name),
            self.scope_for_type(qualified_name),
        ) {
            for param in &info.decl.type_params {
                for bound in &param.bounds {
                    if let Ok(ty) = self.resolve_type(&scope, bound) {
                        out.push(ty);
                    }
                }
            }
        }
        out
    }

    /// The direct superclass, including the implicit ones.
    pub fn superclass(&self, qualified_name: &str) -> Resolution<ResolvedType> {
        let Some(info) = self.universe.type_info(qualified_name) else {
            return Ok(ResolvedType::object());
        };
        match info.decl.kind {
            TypeKind::Class if !info.decl.extends.is_empty() => self
                .declared_supertypes(qualified_name)
                .into_iter()
                .next()
                .unwrap_or_else(|| Ok(ResolvedType::object())),
            kind => Ok(ResolvedType::reference(implicit_supertype(kind))),
        }
    }

    fn hierarchy(&self, start: &str) -> Hierarchy {
        let mut out = Hierarchy::default();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([start.to_string()]);

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let Some(info) = self.universe.type_info(&current) else {
                continue;
            };
            out.source.push(current.clone());

            let has_superclass = info.decl.kind == TypeKind::Class && !info.decl.extends.is_empty();
            if !has_superclass && out.implicit.is_none() {
                out.implicit = Some(implicit_supertype(info.decl.kind).to_string());
            }

            for supertype in self.declared_supertypes(&current) {
                match supertype {
                    Ok(ty) => match ty.qualified_name() {
                        Some(name) if self.universe.contains_type(name) => {
                            queue.push_back(name.to_string());
                        }
                        Some(name) => {
                            if !out.external.iter().any(|e| e == name) {
                                out.external.push(name.to_string());
                            }
                        }
                        None => {}
                    },
                    Err(_) => out.incomplete = true,
                }
            }
        }

        out
    }

    /// Whether `sub` is `sup` or one of its known subtypes.
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        sub == sup || sup == "java.lang.Object" || self.hierarchy(sub).contains(sup)
    }

    // ---------------------------------------------------------------------
    // Declarations
    // ---------------------------------------------------------------------

    fn param_type(&self, scope: &Scope<'a>, param: &Param) -> Resolution<ResolvedType> {
        let ty = self.resolve_type(scope, &param.full_type())?;
        Ok(if param.is_varargs {
            ResolvedType::Array(Box::new(ty))
        } else {
            ty
        })
    }

    /// Resolves a method declaration. `scope` must already contain the
    /// method's own type parameters.
    pub fn resolve_method_decl(
        &self,
        scope: &Scope<'a>,
        declaring_type: &str,
        decl: &MethodDecl,
    ) -> Resolution<ResolvedMethod> {
        let params = decl
            .params
            .iter()
            .map(|param| self.param_type(scope, param))
            .collect::<Resolution<Vec<_>>>()?;
        Ok(ResolvedMethod {
            declaring_type: declaring_type.to_string(),
            name: decl.name.clone(),
            params,
            varargs: decl.params.last().is_some_and(|p| p.is_varargs),
            return_type: self.resolve_type(scope, &decl.return_ty),
            throws: decl
                .throws
                .iter()
                .filter_map(|ty| self.resolve_type(scope, ty).ok())
                .collect(),
            is_static: decl.modifiers.is_static(),
            is_constructor: false,
        })
    }

    /// Resolves a constructor declared in `owner`. Compact record
    /// constructors take the record components as parameters.
    pub fn resolve_constructor_decl(
        &self,
        scope: &Scope<'a>,
        declaring_type: &str,
        owner: &TypeDecl,
        decl: &ConstructorDecl,
    ) -> Resolution<ResolvedMethod> {
        let params: &[Param] = if decl.is_compact {
            &owner.record_components
        } else {
            &decl.params
        };
        let resolved = params
            .iter()
            .map(|param| self.param_type(scope, param))
            .collect::<Resolution<Vec<_>>>()?;
        Ok(ResolvedMethod {
            declaring_type: declaring_type.to_string(),
            name: owner.name.clone(),
            params: resolved,
            varargs: params.last().is_some_and(|p| p.is_varargs),
            return_type: Ok(ResolvedType::Void),
            throws: decl
                .throws
                .iter()
                .filter_map(|ty| self.resolve_type(scope, ty).ok())
                .collect(),
            is_static: false,
            is_constructor: true,
        })
    }

    fn implicit_constructor(
        &self,
        scope: &Scope<'a>,
        declaring_type: &str,
        owner: &TypeDecl,
    ) -> Resolution<ResolvedMethod> {
        let params = owner
            .record_components
            .iter()
            .map(|param| self.param_type(scope, param))
            .collect::<Resolution<Vec<_>>>()?;
        Ok(ResolvedMethod {
            declaring_type: declaring_type.to_string(),
            name: owner.name.clone(),
            params,
            varargs: owner.record_components.last().is_some_and(|p| p.is_varargs),
            return_type: Ok(ResolvedType::Void),
            throws: Vec::new(),
            is_static: false,
            is_constructor: true,
        })
    }

    /// Methods named `name` declared directly in a source type, including the
    /// implicit members of records and enums.
    fn declared_methods(&self, qualified_name: &str, name: Option<&str>) -> Vec<ResolvedMethod> {
        let (Some(info), Some(mut scope)) = (
            self.universe.type_info(qualified_name),
            self.scope_for_type(qualified_name),
        ) else {
            return Vec::new();
        };
        let decl = info.decl;
        let wanted = |candidate: &str| name.map_or(true, |n| n == candidate);

        let mut out = Vec::new();
        for member in &decl.members {
            let MemberDecl::Method(method) = member else {
                continue;
            };
            if !wanted(&method.name) {
                continue;
            }
            let depth = scope.depth();
            scope.push_type_params(&method.type_params);
            match self.resolve_method_decl(&scope, qualified_name, method) {
                Ok(resolved) => out.push(resolved),
                Err(err) => tracing::debug!(
                    target: "nova.resolve",
                    method = %method.name,
                    type_name = %qualified_name,
                    error = %err,
                    "skipping method with unresolved parameters"
                ),
            }
            scope.truncate(depth);
        }

        if decl.kind == TypeKind::Record {
            for component in &decl.record_components {
                let explicit = out
                    .iter()
                    .any(|m| m.name == component.name && m.params.is_empty());
                if !wanted(&component.name) || explicit {
                    continue;
                }
                out.push(ResolvedMethod {
                    declaring_type: qualified_name.to_string(),
                    name: component.name.clone(),
                    params: Vec::new(),
                    varargs: false,
                    return_type: self.param_type(&scope, component),
                    throws: Vec::new(),
                    is_static: false,
                    is_constructor: false,
                });
            }
        }

        if decl.kind == TypeKind::Enum {
            let this = ResolvedType::reference(qualified_name);
            if wanted("values") {
                out.push(ResolvedMethod {
                    declaring_type: qualified_name.to_string(),
                    name: "values".to_string(),
                    params: Vec::new(),
                    varargs: false,
                    return_type: Ok(ResolvedType::Array(Box::new(this.clone()))),
                    throws: Vec::new(),
                    is_static: true,
                    is_constructor: false,
                });
            }
            if wanted("valueOf") {
                out.push(ResolvedMethod {
                    declaring_type: qualified_name.to_string(),
                    name: "valueOf".to_string(),
                    params: vec![ResolvedType::string()],
                    varargs: false,
                    return_type: Ok(this),
                    throws: Vec::new(),
                    is_static: true,
                    is_constructor: false,
                });
            }
        }

        out
    }

    /// Every method of a source type and its source supertypes.
    pub fn all_methods(&self, qualified_name: &str) -> Vec<ResolvedMethod> {
        self.hierarchy(qualified_name)
            .source
            .iter()
            .flat_map(|ty| self.declared_methods(ty, None))
            .collect()
    }

    fn declared_constructors(&self, qualified_name: &str) -> Vec<ResolvedMethod> {
        let (Some(info), Some(scope)) = (
            self.universe.type_info(qualified_name),
            self.scope_for_type(qualified_name),
        ) else {
            return Vec::new();
        };
        let decl = info.decl;

        let mut out = Vec::new();
        let mut declared_any = false;
        for member in &decl.members {
            let MemberDecl::Constructor(ctor) = member else {
                continue;
            };
            declared_any = true;
            let mut scope = scope.clone();
            scope.push_type_params(&ctor.type_params);
            match self.resolve_constructor_decl(&scope, qualified_name, decl, ctor) {
                Ok(resolved) => out.push(resolved),
                Err(err) => tracing::debug!(
                    target: "nova.resolve",
                    type_name = %qualified_name,
                    error = %err,
                    "skipping constructor with unresolved parameters"
                ),
            }
        }

        let needs_implicit = match decl.kind {
            TypeKind::Record => true,
            _ => !declared_any,
        };
        if needs_implicit {
            if let Ok(implicit) = self.implicit_constructor(&scope, qualified_name, decl) {
                let duplicate = out.iter().any(|c| c.params == implicit.params);
                if !duplicate {
                    out.push(implicit);
                }
            }
        }
        out
    }

    // ---------------------------------------------------------------------
    // Member lookup
    // ---------------------------------------------------------------------

    /// Finds the most specific applicable method `name` on a reference type,
    /// searching its source hierarchy.
    pub fn find_method(
        &self,
        owner: &ReferenceType,
        name: &str,
        args: &[Option<ResolvedType>],
    ) -> Resolution<ResolvedMethod> {
        let qualified = &owner.qualified_name;
        if !self.universe.contains_type(qualified) {
            return Err(Unresolved::MissingDeclaration {
                owner: qualified.clone(),
                name: name.to_string(),
            });
        }

        let hierarchy = self.hierarchy(qualified);
        let candidates = hierarchy
            .source
            .iter()
            .flat_map(|ty| self.declared_methods(ty, Some(name)));
        match self.most_specific(candidates, args) {
            Some(method) => Ok(self.substitute_receiver(owner, method)),
            None => Err(match hierarchy.first_external() {
                Some(external) => Unresolved::MissingDeclaration {
                    owner: external.to_string(),
                    name: name.to_string(),
                },
                None => Unresolved::MemberNotFound {
                    owner: qualified.clone(),
                    name: name.to_string(),
                },
            }),
        }
    }

    /// A method of `owner` (or its source supertypes) with the given name and
    /// parameter count, regardless of argument types.
    pub fn find_overridden(
        &self,
        owner: &ReferenceType,
        name: &str,
        arity: usize,
    ) -> Resolution<ResolvedMethod> {
        let qualified = &owner.qualified_name;
        if !self.universe.contains_type(qualified) {
            return Err(Unresolved::MissingDeclaration {
                owner: qualified.clone(),
                name: name.to_string(),
            });
        }
        let hierarchy = self.hierarchy(qualified);
        hierarchy
            .source
            .iter()
            .flat_map(|ty| self.declared_methods(ty, Some(name)))
            .find(|m| m.params.len() == arity)
            .ok_or_else(|| match hierarchy.first_external() {
                Some(external) => Unresolved::MissingDeclaration {
                    owner: external.to_string(),
                    name: name.to_string(),
                },
                None => Unresolved::MemberNotFound {
                    owner: qualified.clone(),
                    name: name.to_string(),
                },
            })
    }

    pub fn find_constructor(
        &self,
        qualified_name: &str,
        args: &[Option<ResolvedType>],
    ) -> Resolution<ResolvedMethod> {
        let simple = qualified_name.rsplit('.').next().unwrap_or(qualified_name);
        if !self.universe.contains_type(qualified_name) {
            return Err(Unresolved::MissingDeclaration {
                owner: qualified_name.to_string(),
                name: simple.to_string(),
            });
        }
        self.most_specific(self.declared_constructors(qualified_name), args)
            .ok_or_else(|| Unresolved::MemberNotFound {
                owner: qualified_name.to_string(),
                name: simple.to_string(),
            })
    }

    fn most_specific(
        &self,
        candidates: impl IntoIterator<Item = ResolvedMethod>,
        args: &[Option<ResolvedType>],
    ) -> Option<ResolvedMethod> {
        let mut best: Option<(u32, ResolvedMethod)> = None;
        for candidate in candidates {
            let Some(score) = self.applicability(&candidate, args) else {
                continue;
            };
            if best.as_ref().map_or(true, |(top, _)| score > *top) {
                best = Some((score, candidate));
            }
        }
        best.map(|(_, method)| method)
    }

    fn applicability(&self, method: &ResolvedMethod, args: &[Option<ResolvedType>]) -> Option<u32> {
        let arity = method.params.len();
        if method.varargs {
            if args.len() + 1 < arity {
                return None;
            }
        } else if args.len() != arity {
            return None;
        }

        let mut score = 0;
        for (idx, arg) in args.iter().enumerate() {
            let in_varargs = method.varargs && idx + 1 >= arity;
            if !in_varargs {
                score += self.compat(arg.as_ref(), &method.params[idx])?;
                continue;
            }
            let last = &method.params[arity - 1];
            if args.len() == arity {
                if let Some(direct) = self.compat(arg.as_ref(), last) {
                    score += direct;
                    continue;
                }
            }
            score += self.compat(arg.as_ref(), last.component().unwrap_or(last))?;
        }
        Some(score)
    }

    /// How well an argument of type `arg` fits `param`: 3 exact, 2 subtype or
    /// widening, 1 plausible (boxing or unknown), `None` incompatible.
    fn compat(&self, arg: Option<&ResolvedType>, param: &ResolvedType) -> Option<u32> {
        let Some(arg) = arg else {
            return Some(1);
        };
        if arg == param {
            return Some(3);
        }
        match (arg, param) {
            (_, ResolvedType::TypeVariable(_) | ResolvedType::Wildcard(_)) => Some(1),
            (ResolvedType::TypeVariable(_), _) => Some(1),
            (ResolvedType::Ambiguous(_), ResolvedType::Primitive(_)) => None,
            (ResolvedType::Ambiguous(_), _) | (_, ResolvedType::Ambiguous(_)) => Some(1),
            (ResolvedType::Null, ResolvedType::Primitive(_)) => None,
            (ResolvedType::Null, _) => Some(2),
            (ResolvedType::Primitive(a), ResolvedType::Primitive(p)) => {
                widens(*a, *p).then_some(2)
            }
            (ResolvedType::Primitive(a), ResolvedType::Reference(p)) => {
                let boxes = p.qualified_name == boxed_name(*a)
                    || matches!(
                        p.qualified_name.as_str(),
                        "java.lang.Object"
                            | "java.lang.Number"
                            | "java.lang.Comparable"
                            | "java.io.Serializable"
                    );
                boxes.then_some(1)
            }
            (ResolvedType::Reference(a), ResolvedType::Primitive(p)) => unboxed_kind(&a.qualified_name)
                .filter(|kind| kind == p || widens(*kind, *p))
                .map(|_| 1),
            (ResolvedType::Reference(a), ResolvedType::Reference(p)) => self.reference_compat(a, p),
            (ResolvedType::Array(a), ResolvedType::Array(p)) => {
                if a.is_primitive() || p.is_primitive() {
                    (a == p).then_some(3)
                } else {
                    self.compat(Some(a), p).map(|score| score.min(2))
                }
            }
            (ResolvedType::Array(_), ResolvedType::Reference(p)) => matches!(
                p.qualified_name.as_str(),
                "java.lang.Object" | "java.lang.Cloneable" | "java.io.Serializable"
            )
            .then_some(1),
            _ => None,
        }
    }

    fn reference_compat(&self, arg: &ReferenceType, param: &ReferenceType) -> Option<u32> {
        if arg.qualified_name == param.qualified_name {
            return Some(2);
        }
        if param.qualified_name == "java.lang.Object" {
            return Some(1);
        }
        let arg_in_source = self.universe.contains_type(&arg.qualified_name);
        let param_in_source = self.universe.contains_type(&param.qualified_name);
        if arg_in_source {
            let hierarchy = self.hierarchy(&arg.qualified_name);
            if hierarchy.contains(&param.qualified_name) {
                return Some(2);
            }
            return hierarchy.is_open().then_some(1);
        }
        if param_in_source {
            // A type outside the sources cannot extend a source type.
            return None;
        }
        Some(1)
    }

    fn substitute_receiver(&self, owner: &ReferenceType, mut method: ResolvedMethod) -> ResolvedMethod {
        if owner.type_args.is_empty() || method.declaring_type != owner.qualified_name {
            return method;
        }
        let Some(info) = self.universe.type_info(&owner.qualified_name) else {
            return method;
        };
        let bindings: Vec<(String, ResolvedType)> = info
            .decl
            .type_params
            .iter()
            .map(|p| p.name.clone())
            .zip(owner.type_args.iter().cloned())
            .collect();
        method.return_type = method.return_type.map(|ty| ty.substitute(&bindings));
        method
    }

    fn declared_field(&self, qualified_name: &str, name: &str) -> Option<ResolvedField> {
        let info = self.universe.type_info(qualified_name)?;
        let decl = info.decl;
        let scope = self.scope_for_type(qualified_name)?;

        for member in &decl.members {
            let MemberDecl::Field(field) = member else {
                continue;
            };
            if let Some(declarator) = field.declarators.iter().find(|d| d.name == name) {
                let ty = TypeRef::with_dims(field.ty.clone(), declarator.dims);
                return Some(ResolvedField {
                    declaring_type: qualified_name.to_string(),
                    name: name.to_string(),
                    ty: self.resolve_type(&scope, &ty),
                    is_static: field.modifiers.is_static() || decl.is_interface(),
                });
            }
        }

        if decl.enum_constants.iter().any(|c| c.name == name) {
            return Some(ResolvedField {
                declaring_type: qualified_name.to_string(),
                name: name.to_string(),
                ty: Ok(ResolvedType::reference(qualified_name)),
                is_static: true,
            });
        }

        decl.record_components
            .iter()
            .find(|c| c.name == name)
            .map(|component| ResolvedField {
                declaring_type: qualified_name.to_string(),
                name: name.to_string(),
                ty: self.param_type(&scope, component),
                is_static: false,
            })
    }

    pub fn find_field(&self, owner: &str, name: &str) -> Resolution<ResolvedField> {
        if !self.universe.contains_type(owner) {
            return Err(Unresolved::MissingDeclaration {
                owner: owner.to_string(),
                name: name.to_string(),
            });
        }
        let hierarchy = self.hierarchy(owner);
        if let Some(field) = hierarchy
            .source
            .iter()
            .find_map(|ty| self.declared_field(ty, name))
        {
            return Ok(field);
        }
        // The implicit supertypes declare no accessible fields.
        Err(match hierarchy.external.first() {
            Some(external) => Unresolved::MissingDeclaration {
                owner: external.clone(),
                name: name.to_string(),
            },
            None => Unresolved::MemberNotFound {
                owner: owner.to_string(),
                name: name.to_string(),
            },
        })
    }

    fn field_in_anonymous(
        &self,
        scope: &Scope<'a>,
        class_name: &str,
        members: &[MemberDecl],
        name: &str,
    ) -> Option<ResolvedField> {
        members.iter().find_map(|member| {
            let MemberDecl::Field(field) = member else {
                return None;
            };
            let declarator = field.declarators.iter().find(|d| d.name == name)?;
            let ty = TypeRef::with_dims(field.ty.clone(), declarator.dims);
            Some(ResolvedField {
                declaring_type: class_name.to_string(),
                name: name.to_string(),
                ty: self.resolve_type(scope, &ty),
                is_static: field.modifiers.is_static(),
            })
        })
    }

    fn method_in_anonymous(
        &self,
        scope: &Scope<'a>,
        class_name: &str,
        members: &'a [MemberDecl],
        name: &str,
        args: &[Option<ResolvedType>],
    ) -> Option<ResolvedMethod> {
        let candidates = members.iter().filter_map(|member| {
            let MemberDecl::Method(method) = member else {
                return None;
            };
            if method.name != name {
                return None;
            }
            let mut scope = scope.clone();
            scope.push_type_params(&method.type_params);
            self.resolve_method_decl(&scope, class_name, method).ok()
        });
        self.most_specific(candidates, args)
    }

    // ---------------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------------

    fn arg_types(&self, scope: &Scope<'a>, args: &[Expr]) -> Vec<Option<ResolvedType>> {
        args.iter().map(|arg| self.type_of(scope, arg).ok()).collect()
    }

    pub fn resolve_method_call(
        &self,
        scope: &Scope<'a>,
        call: &MethodCallExpr,
    ) -> Resolution<ResolvedMethod> {
        let args = self.arg_types(scope, &call.args);
        match &call.receiver {
            None => self.resolve_unqualified_call(scope, &call.name, &args),
            Some(receiver) => match self.classify(scope, receiver)? {
                Receiver::Value(ty) | Receiver::Type(ty) => {
                    self.find_method_on(&ty, &call.name, &args)
                }
                Receiver::Package(package) => Err(Unresolved::NotAValue(package)),
            },
        }
    }

    fn find_method_on(
        &self,
        ty: &ResolvedType,
        name: &str,
        args: &[Option<ResolvedType>],
    ) -> Resolution<ResolvedMethod> {
        match ty {
            ResolvedType::Array(_) => Err(Unresolved::MissingDeclaration {
                owner: "java.lang.Object".to_string(),
                name: name.to_string(),
            }),
            _ => match ty.member_owner() {
                Some(ResolvedType::Reference(owner)) => self.find_method(&owner, name, args),
                _ => Err(Unresolved::Unsupported("method call on a non-reference type")),
            },
        }
    }

    fn resolve_unqualified_call(
        &self,
        scope: &Scope<'a>,
        name: &str,
        args: &[Option<ResolvedType>],
    ) -> Resolution<ResolvedMethod> {
        let mut missing = None;
        for class in scope.classes() {
            let result = match &class.kind {
                ClassKind::Named(_) => {
                    self.find_method(&ReferenceType::named(&class.name), name, args)
                }
                ClassKind::Anonymous {
                    members,
                    super_type,
                } => match self.method_in_anonymous(scope, &class.name, *members, name, args) {
                    Some(method) => Ok(method),
                    None => match super_type.as_ref().and_then(ResolvedType::member_owner) {
                        Some(ResolvedType::Reference(owner)) => {
                            self.find_method(&owner, name, args)
                        }
                        _ => Err(Unresolved::MemberNotFound {
                            owner: class.name.clone(),
                            name: name.to_string(),
                        }),
                    },
                },
            };
            match result {
                Ok(method) => return Ok(method),
                Err(err @ Unresolved::MissingDeclaration { .. }) => {
                    missing.get_or_insert(err);
                }
                Err(_) => {}
            }
        }

        let imports = &self.universe.unit(scope.unit()).imports;
        if let Some(import) = imports.static_single.iter().find(|i| i.member == name) {
            return self.find_method(&ReferenceType::named(&import.ty), name, args);
        }
        let mut external_star = None;
        for star in &imports.static_star {
            if self.universe.contains_type(&star.ty) {
                if let Ok(method) = self.find_method(&ReferenceType::named(&star.ty), name, args) {
                    return Ok(method);
                }
            } else if external_star.is_none() {
                external_star = Some(star.ty.clone());
            }
        }

        if let Some(err) = missing {
            return Err(err);
        }
        if let Some(owner) = external_star {
            return Err(Unresolved::MissingDeclaration {
                owner,
                name: name.to_string(),
            });
        }
        Err(Unresolved::MemberNotFound {
            owner: scope
                .current_class()
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            name: name.to_string(),
        })
    }

    /// The type `new` instantiates, honoring `outer.new Inner()`.
    pub fn created_type(&self, scope: &Scope<'a>, new: &NewExpr) -> Resolution<ResolvedType> {
        let Some(outer) = &new.outer else {
            return self.resolve_type(scope, &new.ty);
        };
        let outer_ty = self.type_of(scope, outer)?;
        let owner = outer_ty
            .qualified_name()
            .ok_or(Unresolved::Unsupported("qualified creation on a non-reference"))?;
        let simple = new
            .ty
            .qualified_name()
            .ok_or(Unresolved::Unsupported("qualified creation of a non-class type"))?;
        let qualified = self
            .nested_type(owner, &simple)
            .ok_or_else(|| Unresolved::UnknownType(format!("{owner}.{simple}")))?;
        Ok(ResolvedType::reference(qualified))
    }

    pub fn resolve_new(&self, scope: &Scope<'a>, new: &NewExpr) -> Resolution<ResolvedMethod> {
        match self.created_type(scope, new)? {
            ResolvedType::Reference(reference) => {
                let args = self.arg_types(scope, &new.args);
                self.find_constructor(&reference.qualified_name, &args)
            }
            ResolvedType::TypeVariable(var) => Err(Unresolved::TypeVariable(var.name)),
            _ => Err(Unresolved::Unsupported("instantiation of a non-class type")),
        }
    }

    pub fn resolve_explicit_ctor_call(
        &self,
        scope: &Scope<'a>,
        call: &ExplicitCtorCall,
    ) -> Resolution<ResolvedMethod> {
        let Some((class_name, _)) = scope.current_named_class() else {
            return Err(Unresolved::Unsupported("constructor call outside a class"));
        };
        let args = self.arg_types(scope, &call.args);
        match call.kind {
            CtorCallKind::This => self.find_constructor(class_name, &args),
            CtorCallKind::Super => match self.superclass(class_name)? {
                ResolvedType::Reference(superclass) => {
                    self.find_constructor(&superclass.qualified_name, &args)
                }
                _ => Err(Unresolved::Unsupported("superclass is not a class type")),
            },
        }
    }

    /// The constructor an enum constant invokes.
    pub fn resolve_enum_constant(
        &self,
        enum_name: &str,
        args: &[Expr],
    ) -> Resolution<ResolvedMethod> {
        let scope = self
            .scope_for_type(enum_name)
            .ok_or_else(|| Unresolved::UnknownType(enum_name.to_string()))?;
        let args = self.arg_types(&scope, args);
        self.find_constructor(enum_name, &args)
    }

    pub fn resolve_field_access(
        &self,
        scope: &Scope<'a>,
        access: &FieldAccessExpr,
    ) -> Resolution<ResolvedField> {
        match self.classify(scope, &access.receiver)? {
            Receiver::Value(ResolvedType::Array(_)) if access.name == "length" => {
                Err(Unresolved::Unsupported("array length"))
            }
            Receiver::Value(ty) => match ty.member_owner() {
                Some(ResolvedType::Reference(owner)) => {
                    self.find_field(&owner.qualified_name, &access.name)
                }
                _ => Err(Unresolved::Unsupported("field access on a non-reference type")),
            },
            Receiver::Type(ResolvedType::Reference(owner)) => {
                self.find_field(&owner.qualified_name, &access.name)
            }
            Receiver::Type(ResolvedType::TypeVariable(var)) => {
                Err(Unresolved::TypeVariable(var.name))
            }
            Receiver::Type(_) => Err(Unresolved::Unsupported("static access on a non-class type")),
            Receiver::Package(package) => {
                Err(Unresolved::NotAValue(format!("{package}.{}", access.name)))
            }
        }
    }

    /// Resolves a simple name used as a value: locals and parameters first,
    /// then fields of the enclosing classes from the innermost outwards, then
    /// statically imported fields.
    pub fn resolve_name(&self, scope: &Scope<'a>, name: &str) -> Resolution<ValueDecl> {
        let mut missing = None;
        for frame in scope.frames().rev() {
            let result = match frame {
                Frame::Block(block) => match block.locals.get(name) {
                    Some(ty) => return Ok(ValueDecl::Local(ty.clone())),
                    None => continue,
                },
                Frame::TypeParams(_) => continue,
                Frame::Class(class) => match &class.kind {
                    ClassKind::Named(_) => self.find_field(&class.name, name),
                    ClassKind::Anonymous {
                        members,
                        super_type,
                    } => match self.field_in_anonymous(scope, &class.name, members, name) {
                        Some(field) => Ok(field),
                        None => match super_type.as_ref().and_then(ResolvedType::member_owner) {
                            Some(ResolvedType::Reference(owner)) => {
                                self.find_field(&owner.qualified_name, name)
                            }
                            _ => continue,
                        },
                    },
                },
            };
            match result {
                Ok(field) => return Ok(ValueDecl::Field(field)),
                Err(err @ Unresolved::MissingDeclaration { .. }) => {
                    missing.get_or_insert(err);
                }
                Err(_) => {}
            }
        }

        let imports = &self.universe.unit(scope.unit()).imports;
        if let Some(import) = imports.static_single.iter().find(|i| i.member == name) {
            return self.find_field(&import.ty, name).map(ValueDecl::Field);
        }
        for star in &imports.static_star {
            if self.universe.contains_type(&star.ty) {
                if let Ok(field) = self.find_field(&star.ty, name) {
                    return Ok(ValueDecl::Field(field));
                }
            }
        }

        Err(missing.unwrap_or_else(|| Unresolved::NotAValue(name.to_string())))
    }

    /// Classifies an expression in receiver position as a value, a type, or
    /// a package prefix.
    pub fn classify(&self, scope: &Scope<'a>, expr: &Expr) -> Resolution<Receiver> {
        match expr {
            Expr::Name(name) => {
                let value_err = match self.resolve_name(scope, &name.name) {
                    Ok(value) => return Ok(Receiver::Value(value.ty()?)),
                    Err(err) => err,
                };
                if let Ok(ty) = self.lookup_type_name(scope, &name.name, 0) {
                    return Ok(Receiver::Type(ty));
                }
                let is_missing = matches!(value_err, Unresolved::MissingDeclaration { .. });
                if self.universe.is_package(&name.name) || !is_missing {
                    return Ok(Receiver::Package(name.name.clone()));
                }
                Err(value_err)
            }
            Expr::FieldAccess(access) => match self.classify(scope, &access.receiver)? {
                Receiver::Package(package) => {
                    let qualified = format!("{package}.{}", access.name);
                    if self.universe.contains_type(&qualified) {
                        Ok(Receiver::Type(ResolvedType::reference(qualified)))
                    } else if self.universe.is_package(&qualified) {
                        Ok(Receiver::Package(qualified))
                    } else if is_class_path(&qualified) {
                        Ok(Receiver::Type(ResolvedType::reference(qualified)))
                    } else {
                        Ok(Receiver::Package(qualified))
                    }
                }
                Receiver::Type(ResolvedType::Reference(owner)) => {
                    match self.find_field(&owner.qualified_name, &access.name) {
                        Ok(field) => Ok(Receiver::Value(field.ty?)),
                        Err(err) => {
                            let in_source = self.universe.contains_type(&owner.qualified_name);
                            let nested = (in_source || looks_like_type_name(&access.name))
                                .then(|| self.nested_type(&owner.qualified_name, &access.name))
                                .flatten();
                            match nested {
                                Some(nested) => Ok(Receiver::Type(ResolvedType::reference(nested))),
                                None => Err(err),
                            }
                        }
                    }
                }
                Receiver::Type(_) => Err(Unresolved::Unsupported("member of a non-class type")),
                Receiver::Value(_) => Ok(Receiver::Value(
                    self.resolve_field_access(scope, access)?.ty?,
                )),
            },
            Expr::Paren(paren) => self.classify(scope, &paren.expr),
            Expr::Type(ty) => Ok(Receiver::Type(self.resolve_type(scope, ty)?)),
            _ => Ok(Receiver::Value(self.type_of(scope, expr)?)),
        }
    }

    fn this_type(&self, scope: &Scope<'a>, qualifier: Option<&str>) -> Resolution<ResolvedType> {
        if let Some(qualifier) = qualifier {
            let simple = qualifier.rsplit('.').next().unwrap_or(qualifier);
            return scope
                .classes()
                .find(|class| class.name.rsplit('.').next() == Some(simple))
                .map(|class| ResolvedType::reference(class.name.clone()))
                .ok_or_else(|| Unresolved::UnknownType(qualifier.to_string()));
        }
        let class = scope
            .current_class()
            .ok_or(Unresolved::Unsupported("`this` outside a class"))?;
        match &class.kind {
            ClassKind::Named(decl) => Ok(ResolvedType::Reference(ReferenceType {
                qualified_name: class.name.clone(),
                type_args: decl
                    .type_params
                    .iter()
                    .map(|p| {
                        ResolvedType::TypeVariable(TypeVariable {
                            name: p.name.clone(),
                            bound: None,
                        })
                    })
                    .collect(),
            })),
            ClassKind::Anonymous { super_type, .. } => {
                Ok(super_type.clone().unwrap_or_else(ResolvedType::object))
            }
        }
    }

    fn super_of_current(&self, scope: &Scope<'a>, qualifier: Option<&str>) -> Resolution<ResolvedType> {
        if let Some(qualifier) = qualifier {
            // `Iface.super.m()` names the interface directly.
            return self.lookup_type_name(scope, qualifier, 0);
        }
        let class = scope
            .current_class()
            .ok_or(Unresolved::Unsupported("`super` outside a class"))?;
        match &class.kind {
            ClassKind::Named(_) => self.superclass(&class.name),
            ClassKind::Anonymous { super_type, .. } => {
                Ok(super_type.clone().unwrap_or_else(ResolvedType::object))
            }
        }
    }

    /// The superclass `super` denotes at this point of the traversal.
    pub fn super_type(&self, scope: &Scope<'a>) -> Resolution<ResolvedType> {
        self.super_of_current(scope, None)
    }

    /// Static type of an expression.
    pub fn type_of(&self, scope: &Scope<'a>, expr: &Expr) -> Resolution<ResolvedType> {
        match expr {
            Expr::Literal(literal) => Ok(match literal.kind {
                LiteralKind::Int => ResolvedType::Primitive(PrimitiveKind::Int),
                LiteralKind::Long => ResolvedType::Primitive(PrimitiveKind::Long),
                LiteralKind::Float => ResolvedType::Primitive(PrimitiveKind::Float),
                LiteralKind::Double => ResolvedType::Primitive(PrimitiveKind::Double),
                LiteralKind::Char => ResolvedType::Primitive(PrimitiveKind::Char),
                LiteralKind::Bool => ResolvedType::boolean(),
                LiteralKind::String | LiteralKind::TextBlock => ResolvedType::string(),
                LiteralKind::Null => ResolvedType::Null,
            }),
            Expr::Name(name) => self.resolve_name(scope, &name.name)?.ty(),
            Expr::FieldAccess(_) => match self.classify(scope, expr)? {
                Receiver::Value(ty) => Ok(ty),
                Receiver::Type(ty) => Err(Unresolved::NotAValue(ty.describe())),
                Receiver::Package(package) => Err(Unresolved::NotAValue(package)),
            },
            Expr::MethodCall(call) => self.resolve_method_call(scope, call)?.return_type,
            Expr::New(new) => self.created_type(scope, new),
            Expr::NewArray(array) => Ok(ResolvedType::array_of(
                self.resolve_type(scope, &array.elem_ty)?,
                array.dims,
            )),
            Expr::ArrayAccess(access) => self
                .type_of(scope, &access.array)?
                .component()
                .cloned()
                .ok_or(Unresolved::Unsupported("indexing a non-array")),
            Expr::Unary(unary) => {
                let operand = self.type_of(scope, &unary.operand);
                match unary.op {
                    UnaryOp::Not => Ok(ResolvedType::boolean()),
                    UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
                        operand
                    }
                    UnaryOp::Plus | UnaryOp::Minus | UnaryOp::BitNot => {
                        Ok(promote_unary(&operand?))
                    }
                }
            }
            Expr::Binary(binary) => {
                if binary.op.is_comparison() {
                    return Ok(ResolvedType::boolean());
                }
                let lhs = self.type_of(scope, &binary.lhs);
                let rhs = self.type_of(scope, &binary.rhs);
                binary_type(binary.op, lhs, rhs)
            }
            Expr::Assign(assign) => self.type_of(scope, &assign.target),
            Expr::Conditional(cond) => match self.type_of(scope, &cond.then_expr) {
                Ok(ResolvedType::Null) | Err(_) => self.type_of(scope, &cond.else_expr),
                ok => ok,
            },
            Expr::Cast(cast) => self.resolve_type(scope, &cast.ty),
            Expr::InstanceOf(_) => Ok(ResolvedType::boolean()),
            Expr::ClassLit(lit) => {
                let ty = match self.resolve_type(scope, &lit.ty)? {
                    ResolvedType::Primitive(kind) => ResolvedType::reference(boxed_name(kind)),
                    ResolvedType::Void => ResolvedType::reference("java.lang.Void"),
                    other => other,
                };
                Ok(ResolvedType::Reference(ReferenceType {
                    qualified_name: "java.lang.Class".to_string(),
                    type_args: vec![ty],
                }))
            }
            Expr::This(this) => self.this_type(scope, this.qualifier.as_deref()),
            Expr::Super(sup) => self.super_of_current(scope, sup.qualifier.as_deref()),
            Expr::Paren(paren) => self.type_of(scope, &paren.expr),
            Expr::Lambda(_) => Err(Unresolved::Unsupported("lambda expression")),
            Expr::MethodRef(_) => Err(Unresolved::Unsupported("method reference")),
            Expr::Switch(_) => Err(Unresolved::Unsupported("switch expression")),
            Expr::ArrayInit(_) => Err(Unresolved::Unsupported("array initializer")),
            Expr::Annotation(_) | Expr::Type(_) | Expr::Missing(_) => {
                Err(Unresolved::Unsupported("not an expression"))
            }
        }
    }

    /// Element type produced by iterating over a value of type `iterable`.
    pub fn iteration_type(&self, iterable: &ResolvedType) -> Resolution<ResolvedType> {
        match iterable {
            ResolvedType::Array(elem) => Ok((**elem).clone()),
            ResolvedType::Reference(reference) => match reference.type_args.first() {
                Some(ResolvedType::Wildcard(Some((BoundKind::Extends, bound)))) => {
                    Ok((**bound).clone())
                }
                Some(ResolvedType::Wildcard(_)) => Ok(ResolvedType::object()),
                Some(arg) => Ok(arg.clone()),
                None => Err(Unresolved::Unsupported("raw iterable")),
            },
            _ => Err(Unresolved::Unsupported("iteration over a non-iterable")),
        }
    }
}

fn implicit_supertype(kind: TypeKind) -> &'static str {
    match kind {
        TypeKind::Enum => "java.lang.Enum",
        TypeKind::Record => "java.lang.Record",
        TypeKind::Class | TypeKind::Interface | TypeKind::Annotation => "java.lang.Object",
    }
}

/// `Entry` in `Map.Entry` rather than `MAX_VALUE` in `Integer.MAX_VALUE`.
/// Only consulted for owners outside the sources.
fn looks_like_type_name(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase) && name.chars().any(char::is_lowercase)
}

fn widens(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    use PrimitiveKind::*;
    if from == to {
        return true;
    }
    matches!(
        (from, to),
        (Byte, Short | Int | Long | Float | Double)
            | (Short, Int | Long | Float | Double)
            | (Char, Int | Long | Float | Double)
            | (Int, Long | Float | Double)
            | (Long, Float | Double)
            | (Float, Double)
    )
}

fn numeric_kind(ty: &ResolvedType) -> Option<PrimitiveKind> {
    match ty {
        ResolvedType::Primitive(kind) => Some(*kind),
        ResolvedType::Reference(reference) => unboxed_kind(&reference.qualified_name),
        _ => None,
    }
}

fn promote_unary(ty: &ResolvedType) -> ResolvedType {
    match numeric_kind(ty) {
        Some(PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Char) => {
            ResolvedType::int()
        }
        Some(kind) => ResolvedType::Primitive(kind),
        None => ty.clone(),
    }
}

fn is_string(ty: &Resolution<ResolvedType>) -> bool {
    matches!(ty, Ok(ResolvedType::Reference(r)) if r.qualified_name == "java.lang.String")
}

fn binary_type(
    op: BinaryOp,
    lhs: Resolution<ResolvedType>,
    rhs: Resolution<ResolvedType>,
) -> Resolution<ResolvedType> {
    if op == BinaryOp::Add && (is_string(&lhs) || is_string(&rhs)) {
        return Ok(ResolvedType::string());
    }
    let lhs = lhs?;
    match op {
        BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => Ok(promote_unary(&lhs)),
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor
            if numeric_kind(&lhs) == Some(PrimitiveKind::Boolean) =>
        {
            Ok(ResolvedType::boolean())
        }
        _ => {
            let rhs = rhs?;
            let kinds = (numeric_kind(&lhs), numeric_kind(&rhs));
            let (Some(a), Some(b)) = kinds else {
                return Err(Unresolved::Unsupported("arithmetic on non-numeric operands"));
            };
            use PrimitiveKind::*;
            let kind = if a == Double || b == Double {
                Double
            } else if a == Float || b == Float {
                Float
            } else if a == Long || b == Long {
                Long
            } else {
                Int
            };
            Ok(ResolvedType::Primitive(kind))
        }
    }
}
