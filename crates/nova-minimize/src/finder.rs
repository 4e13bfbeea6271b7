//! Reachability from the target methods.
//!
//! [`TargetMethodFinder`] walks every compilation unit once. Declarations
//! whose signature matches a target switch the traversal into "inside a
//! target" mode; while that flag is set every method, constructor, field and
//! type the code refers to is recorded in the [`UsedSets`]. References that
//! cannot be resolved are never recorded as members, but the type they
//! belong to is, and references into code outside the sources are collected
//! as [`UnresolvedMember`]s.
//!
//! The scope chain threaded through the walk doubles as the qualified-name
//! accumulator: its class frames carry the qualified name of every enclosing
//! class.

use std::collections::BTreeSet;

use nova_resolve::{
    is_class_path, qualify, ClassKind, MemberSignature, Receiver, Resolution, ResolvedField,
    ResolvedMethod, ResolvedType, Resolver, Scope, Unresolved, ValueDecl,
};
use nova_syntax::ast::{
    Annotation, AnnotationArgs, Block, CaseLabel, CompilationUnit, ConstructorDecl, EnumConstant,
    Expr, FieldAccessExpr, FieldDecl, LambdaBody, LambdaExpr, LocalVarDecl, MemberDecl,
    MethodCallExpr, MethodDecl, MethodRefExpr, NewExpr, Param, Resource, Stmt, SwitchCase,
    TypeDecl, TypeKind, TypeRef, TypeRefKind,
};

use crate::target::TargetSignature;
use crate::used::{is_builtin, MemberKind, UnresolvedMember, UsedSets};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinderOutput {
    pub used: UsedSets,
    /// Targets that matched no declaration, as written.
    pub unfound: Vec<String>,
    pub unresolved: BTreeSet<UnresolvedMember>,
}

pub struct TargetMethodFinder<'r, 'u, 'a> {
    resolver: &'r Resolver<'u, 'a>,
    targets: &'r [TargetSignature],
    found: Vec<bool>,
    inside_target: bool,
    /// Methods of source interfaces named in some `implements` clause.
    interface_methods: Vec<ResolvedMethod>,
    visited_enums: BTreeSet<String>,
    used: UsedSets,
    unresolved: BTreeSet<UnresolvedMember>,
}

impl<'r, 'u, 'a> TargetMethodFinder<'r, 'u, 'a> {
    pub fn new(resolver: &'r Resolver<'u, 'a>, targets: &'r [TargetSignature]) -> Self {
        Self {
            resolver,
            targets,
            found: vec![false; targets.len()],
            inside_target: false,
            interface_methods: Vec::new(),
            visited_enums: BTreeSet::new(),
            used: UsedSets::default(),
            unresolved: BTreeSet::new(),
        }
    }

    pub fn run(mut self) -> FinderOutput {
        let resolver = self.resolver;
        self.collect_interface_methods();

        for (idx, info) in resolver.universe().units().iter().enumerate() {
            let unit: &'a CompilationUnit = info.unit;
            let mut scope = Scope::new(idx);
            for decl in &unit.types {
                let name = qualify(&info.package, &decl.name);
                self.visit_type_decl(&mut scope, name, decl);
            }
        }

        self.close_over_declarations();

        let unfound = self
            .targets
            .iter()
            .zip(&self.found)
            .filter(|(_, found)| !**found)
            .map(|(target, _)| target.as_str().to_string())
            .collect();
        tracing::debug!(
            target: "nova.minimize.finder",
            classes = self.used.classes.len(),
            methods = self.used.methods.len(),
            fields = self.used.fields.len(),
            unresolved = self.unresolved.len(),
            "reachability complete"
        );
        FinderOutput {
            used: self.used,
            unfound,
            unresolved: self.unresolved,
        }
    }

    fn collect_interface_methods(&mut self) {
        let resolver = self.resolver;
        let universe = resolver.universe();
        let mut seen = BTreeSet::new();
        for info in universe.types() {
            if info.decl.implements.is_empty() {
                continue;
            }
            let Some(scope) = resolver.scope_for_type(&info.qualified_name) else {
                continue;
            };
            for ty in &info.decl.implements {
                let Ok(ResolvedType::Reference(interface)) = resolver.resolve_type(&scope, ty)
                else {
                    continue;
                };
                if !universe.contains_type(&interface.qualified_name) {
                    continue;
                }
                for method in resolver.all_methods(&interface.qualified_name) {
                    if seen.insert(method.signature()) {
                        self.interface_methods.push(method);
                    }
                }
            }
        }
    }

    /// Keeps the shells of used source types compilable: their supertypes,
    /// type-parameter bounds and record component types, and the constructors
    /// their enum constants call.
    fn close_over_declarations(&mut self) {
        let resolver = self.resolver;
        let universe = resolver.universe();
        loop {
            let before = self.used_size();
            let classes: Vec<String> = self
                .used
                .classes
                .iter()
                .filter(|name| universe.contains_type(name))
                .map(str::to_string)
                .collect();

            for class in &classes {
                for ty in resolver.header_types(class) {
                    self.mark_type(&ty);
                }
                let (Some(info), Some(mut scope)) =
                    (universe.type_info(class), resolver.scope_for_type(class))
                else {
                    continue;
                };
                let decl: &'a TypeDecl = info.decl;
                for component in &decl.record_components {
                    if let Ok(ty) = resolver.resolve_type(&scope, &component.full_type()) {
                        self.mark_type(&ty);
                    }
                }
                if decl.kind == TypeKind::Enum && self.visited_enums.insert(class.clone()) {
                    let was_inside = std::mem::replace(&mut self.inside_target, true);
                    for constant in &decl.enum_constants {
                        self.visit_enum_constant(&mut scope, class, constant);
                    }
                    self.inside_target = was_inside;
                }
            }

            if self.used_size() == before {
                break;
            }
        }
    }

    fn used_size(&self) -> usize {
        self.used.targets.len()
            + self.used.methods.len()
            + self.used.fields.len()
            + self.used.classes.len()
    }

    // ---------------------------------------------------------------------
    // Declarations
    // ---------------------------------------------------------------------

    fn visit_type_decl(&mut self, scope: &mut Scope<'a>, name: String, decl: &'a TypeDecl) {
        let depth = scope.depth();
        scope.push_class(name.clone(), ClassKind::Named(decl));

        if self.inside_target {
            self.record_annotations(scope, &decl.modifiers.annotations);
            for ty in decl.supertypes() {
                self.record_type_ref(scope, ty);
            }
            for param in &decl.type_params {
                for bound in &param.bounds {
                    self.record_type_ref(scope, bound);
                }
            }
            for component in &decl.record_components {
                self.record_type_ref(scope, &component.full_type());
            }
        }

        for constant in &decl.enum_constants {
            self.visit_enum_constant(scope, &name, constant);
        }
        for member in &decl.members {
            self.visit_member(scope, &name, Some(decl), member);
        }
        scope.truncate(depth);
    }

    fn visit_enum_constant(
        &mut self,
        scope: &mut Scope<'a>,
        enum_name: &str,
        constant: &'a EnumConstant,
    ) {
        let args = constant.args.as_deref().unwrap_or(&[]);
        if self.inside_target {
            self.record_annotations(scope, &constant.annotations);
            match self.resolver.resolve_enum_constant(enum_name, args) {
                Ok(ctor) => self.record_method(&ctor),
                Err(err) => self.note_unresolved(&err, None, MemberKind::Constructor, &[], false),
            }
        }
        for arg in args {
            self.visit_expr(scope, arg);
        }
        if let Some(body) = &constant.body {
            let super_type = ResolvedType::reference(enum_name);
            self.visit_anonymous_body(scope, Some(super_type), &body.members);
        }
    }

    fn visit_anonymous_body(
        &mut self,
        scope: &mut Scope<'a>,
        super_type: Option<ResolvedType>,
        members: &'a [MemberDecl],
    ) {
        let name = format!(
            "{}$anonymous",
            scope.current_class().map_or("", |class| class.name.as_str())
        );
        let depth = scope.depth();
        scope.push_class(
            name.clone(),
            ClassKind::Anonymous {
                members,
                super_type,
            },
        );
        for member in members {
            self.visit_member(scope, &name, None, member);
        }
        scope.truncate(depth);
    }

    fn visit_member(
        &mut self,
        scope: &mut Scope<'a>,
        owner_name: &str,
        owner: Option<&'a TypeDecl>,
        member: &'a MemberDecl,
    ) {
        match member {
            MemberDecl::Field(field) => self.visit_field(scope, field),
            MemberDecl::Method(method) => self.visit_method(scope, owner_name, method),
            MemberDecl::Constructor(ctor) => {
                if let Some(owner) = owner {
                    self.visit_constructor(scope, owner_name, owner, ctor);
                }
            }
            MemberDecl::Initializer(init) => self.visit_block(scope, &init.body),
            MemberDecl::Type(nested) => {
                let name = format!("{owner_name}.{}", nested.name);
                self.visit_type_decl(scope, name, nested);
            }
        }
    }

    fn visit_field(&mut self, scope: &mut Scope<'a>, field: &'a FieldDecl) {
        if self.inside_target {
            self.record_annotations(scope, &field.modifiers.annotations);
            self.record_type_ref(scope, &field.ty);
        }
        for declarator in &field.declarators {
            if let Some(init) = &declarator.initializer {
                self.visit_expr(scope, init);
            }
        }
    }

    fn visit_method(&mut self, scope: &mut Scope<'a>, owner_name: &str, method: &'a MethodDecl) {
        let depth = scope.depth();
        scope.push_type_params(&method.type_params);

        let resolved = match self
            .resolver
            .resolve_method_decl(scope, owner_name, method)
            .and_then(require_return_type)
        {
            Ok(resolved) => resolved,
            Err(err) => {
                tracing::debug!(
                    target: "nova.minimize.finder",
                    owner = %owner_name,
                    method = %method.name,
                    error = %err,
                    "skipping unresolvable method"
                );
                scope.truncate(depth);
                return;
            }
        };

        let was_inside = self.inside_target;
        if was_inside {
            self.record_overridden(scope, &resolved);
        }
        if self.match_target(owner_name, &method.name, &written_types(&method.params), &resolved)
        {
            self.record_target(&resolved);
            self.inside_target = true;
        }

        if self.inside_target {
            self.record_annotations(scope, &method.modifiers.annotations);
            self.record_params(scope, &method.params);
            self.record_type_ref(scope, &method.return_ty);
            for ty in &method.throws {
                self.record_type_ref(scope, ty);
            }
        }
        if let Some(default) = &method.default_value {
            self.visit_expr(scope, default);
        }
        if let Some(body) = &method.body {
            scope.push_block();
            self.declare_params(scope, &method.params);
            self.visit_statements(scope, &body.statements);
        }

        self.inside_target = was_inside;
        scope.truncate(depth);
    }

    fn visit_constructor(
        &mut self,
        scope: &mut Scope<'a>,
        owner_name: &str,
        owner: &'a TypeDecl,
        ctor: &'a ConstructorDecl,
    ) {
        let depth = scope.depth();
        scope.push_type_params(&ctor.type_params);

        let resolved = match self
            .resolver
            .resolve_constructor_decl(scope, owner_name, owner, ctor)
        {
            Ok(resolved) => resolved,
            Err(err) => {
                tracing::debug!(
                    target: "nova.minimize.finder",
                    owner = %owner_name,
                    error = %err,
                    "skipping unresolvable constructor"
                );
                scope.truncate(depth);
                return;
            }
        };

        // A compact canonical constructor takes the record components.
        let params: &'a [Param] = if ctor.is_compact {
            &owner.record_components
        } else {
            &ctor.params
        };

        let was_inside = self.inside_target;
        if self.match_target(owner_name, &ctor.name, &written_types(params), &resolved) {
            self.record_target(&resolved);
            self.inside_target = true;
        }

        if self.inside_target {
            self.record_annotations(scope, &ctor.modifiers.annotations);
            self.record_params(scope, &ctor.params);
            for ty in &ctor.throws {
                self.record_type_ref(scope, ty);
            }
        }
        scope.push_block();
        self.declare_params(scope, params);
        self.visit_statements(scope, &ctor.body.statements);

        self.inside_target = was_inside;
        scope.truncate(depth);
    }

    fn match_target(
        &mut self,
        owner_name: &str,
        member: &str,
        written: &[String],
        resolved: &ResolvedMethod,
    ) -> bool {
        if self.targets.is_empty() {
            return false;
        }
        let signature = resolved.signature();
        let mut matched = false;
        for (target, found) in self.targets.iter().zip(self.found.iter_mut()) {
            if target.matches(owner_name, member, written, &signature) {
                *found = true;
                matched = true;
            }
        }
        if matched {
            tracing::debug!(
                target: "nova.minimize.finder",
                signature = %signature,
                "found target"
            );
        }
        matched
    }

    fn record_target(&mut self, resolved: &ResolvedMethod) {
        self.used.targets.insert(resolved.signature());
        self.mark_class(&resolved.declaring_type);
        if !resolved.is_constructor {
            self.match_interfaces(resolved);
        }
        if let Ok(ty) = &resolved.return_type {
            self.mark_type(ty);
        }
    }

    /// Members of an anonymous class keep the supertype method they override.
    fn record_overridden(&mut self, scope: &Scope<'a>, resolved: &ResolvedMethod) {
        let Some(class) = scope.current_class() else {
            return;
        };
        let ClassKind::Anonymous {
            super_type: Some(super_type),
            ..
        } = &class.kind
        else {
            return;
        };
        let Some(ResolvedType::Reference(owner)) = super_type.member_owner() else {
            return;
        };
        self.mark_class(&owner.qualified_name);
        match self
            .resolver
            .find_overridden(&owner, &resolved.name, resolved.params.len())
        {
            Ok(method) => self.record_method(&method),
            Err(err) => self.note_failure(&err),
        }
    }

    fn record_params(&mut self, scope: &Scope<'a>, params: &'a [Param]) {
        for param in params {
            self.record_annotations(scope, &param.modifiers.annotations);
            self.record_type_ref(scope, &param.full_type());
        }
    }

    fn declare_params(&mut self, scope: &mut Scope<'a>, params: &[Param]) {
        for param in params {
            let ty = self
                .resolver
                .resolve_type(scope, &param.full_type())
                .map(|ty| {
                    if param.is_varargs {
                        ResolvedType::array_of(ty, 1)
                    } else {
                        ty
                    }
                });
            scope.declare_local(param.name.clone(), ty);
        }
    }

    // ---------------------------------------------------------------------
    // Statements
    // ---------------------------------------------------------------------

    fn visit_block(&mut self, scope: &mut Scope<'a>, block: &'a Block) {
        let depth = scope.depth();
        scope.push_block();
        self.visit_statements(scope, &block.statements);
        scope.truncate(depth);
    }

    fn visit_statements(&mut self, scope: &mut Scope<'a>, statements: &'a [Stmt]) {
        for stmt in statements {
            self.visit_stmt(scope, stmt);
        }
    }

    fn visit_stmt(&mut self, scope: &mut Scope<'a>, stmt: &'a Stmt) {
        match stmt {
            Stmt::Block(block) => self.visit_block(scope, block),
            Stmt::LocalVar(local) => self.visit_local_var(scope, local),
            Stmt::LocalType(decl) => {
                let enclosing = scope
                    .current_named_class()
                    .map(|(name, _)| name.to_string())
                    .unwrap_or_default();
                let name = format!("{enclosing}.{}", decl.name);
                scope.declare_local_type(decl.name.clone(), name.clone());
                self.visit_type_decl(scope, name, decl);
            }
            Stmt::Expr(stmt) => self.visit_expr(scope, &stmt.expr),
            Stmt::If(stmt) => {
                self.visit_expr(scope, &stmt.cond);
                self.visit_stmt(scope, &stmt.then_branch);
                if let Some(else_branch) = &stmt.else_branch {
                    self.visit_stmt(scope, else_branch);
                }
            }
            Stmt::While(stmt) => {
                self.visit_expr(scope, &stmt.cond);
                self.visit_stmt(scope, &stmt.body);
            }
            Stmt::DoWhile(stmt) => {
                self.visit_stmt(scope, &stmt.body);
                self.visit_expr(scope, &stmt.cond);
            }
            Stmt::For(stmt) => {
                let depth = scope.depth();
                scope.push_block();
                self.visit_statements(scope, &stmt.init);
                if let Some(cond) = &stmt.cond {
                    self.visit_expr(scope, cond);
                }
                for update in &stmt.update {
                    self.visit_expr(scope, update);
                }
                self.visit_stmt(scope, &stmt.body);
                scope.truncate(depth);
            }
            Stmt::ForEach(stmt) => {
                let depth = scope.depth();
                scope.push_block();
                let is_var = matches!(stmt.ty.kind, TypeRefKind::Var);
                if self.inside_target {
                    self.record_annotations(scope, &stmt.modifiers.annotations);
                    if !is_var {
                        self.record_type_ref(scope, &stmt.ty);
                    }
                }
                self.visit_expr(scope, &stmt.iterable);
                let ty = if is_var {
                    self.resolver
                        .type_of(scope, &stmt.iterable)
                        .and_then(|ty| self.resolver.iteration_type(&ty))
                } else {
                    self.resolver.resolve_type(scope, &stmt.ty)
                };
                scope.declare_local(stmt.name.clone(), ty);
                self.visit_stmt(scope, &stmt.body);
                scope.truncate(depth);
            }
            Stmt::Return(stmt) => {
                if let Some(expr) = &stmt.expr {
                    self.visit_expr(scope, expr);
                }
            }
            Stmt::Throw(stmt) => self.visit_expr(scope, &stmt.expr),
            Stmt::Yield(stmt) => self.visit_expr(scope, &stmt.expr),
            Stmt::Break(_) | Stmt::Continue(_) | Stmt::Empty(_) => {}
            Stmt::Try(stmt) => {
                let depth = scope.depth();
                scope.push_block();
                for resource in &stmt.resources {
                    match resource {
                        Resource::Decl(local) => self.visit_local_var(scope, local),
                        Resource::Expr(expr) => self.visit_expr(scope, expr),
                    }
                }
                self.visit_block(scope, &stmt.body);
                scope.truncate(depth);

                for catch in &stmt.catches {
                    let depth = scope.depth();
                    scope.push_block();
                    self.visit_catch_param(scope, &catch.param);
                    self.visit_block(scope, &catch.body);
                    scope.truncate(depth);
                }
                if let Some(finally) = &stmt.finally {
                    self.visit_block(scope, finally);
                }
            }
            Stmt::Switch(stmt) => {
                self.visit_expr(scope, &stmt.selector);
                self.visit_cases(scope, &stmt.cases);
            }
            Stmt::Synchronized(stmt) => {
                self.visit_expr(scope, &stmt.lock);
                self.visit_block(scope, &stmt.body);
            }
            Stmt::Labeled(stmt) => self.visit_stmt(scope, &stmt.body),
            Stmt::Assert(stmt) => {
                self.visit_expr(scope, &stmt.cond);
                if let Some(message) = &stmt.message {
                    self.visit_expr(scope, message);
                }
            }
            Stmt::ExplicitCtorCall(call) => {
                if self.inside_target {
                    match self.resolver.resolve_explicit_ctor_call(scope, call) {
                        Ok(ctor) => self.record_method(&ctor),
                        Err(err) => {
                            let args = self.arg_descriptions(scope, &call.args);
                            self.note_unresolved(&err, None, MemberKind::Constructor, &args, false);
                        }
                    }
                }
                if let Some(qualifier) = &call.qualifier {
                    self.visit_expr(scope, qualifier);
                }
                for arg in &call.args {
                    self.visit_expr(scope, arg);
                }
            }
        }
    }

    fn visit_local_var(&mut self, scope: &mut Scope<'a>, local: &'a LocalVarDecl) {
        let is_var = matches!(local.ty.kind, TypeRefKind::Var);
        if self.inside_target {
            self.record_annotations(scope, &local.modifiers.annotations);
            if !is_var {
                self.record_type_ref(scope, &local.ty);
            }
        }
        for declarator in &local.declarators {
            if let Some(init) = &declarator.initializer {
                self.visit_expr(scope, init);
            }
            let ty = match (&declarator.initializer, is_var) {
                (Some(init), true) => self.resolver.type_of(scope, init),
                (None, true) => Err(Unresolved::Unsupported("`var` without an initializer")),
                (_, false) => self
                    .resolver
                    .resolve_type(scope, &TypeRef::with_dims(local.ty.clone(), declarator.dims)),
            };
            scope.declare_local(declarator.name.clone(), ty);
        }
    }

    fn visit_catch_param(&mut self, scope: &mut Scope<'a>, param: &'a Param) {
        let alternatives = match &param.ty.kind {
            TypeRefKind::Union(alternatives) => alternatives.as_slice(),
            _ => std::slice::from_ref(&param.ty),
        };
        if self.inside_target {
            self.record_annotations(scope, &param.modifiers.annotations);
            for ty in alternatives {
                self.record_type_ref(scope, ty);
            }
        }
        let ty = match alternatives.first() {
            Some(first) => self.resolver.resolve_type(scope, first),
            None => Err(Unresolved::Unsupported("empty catch type")),
        };
        scope.declare_local(param.name.clone(), ty);
    }

    fn visit_cases(&mut self, scope: &mut Scope<'a>, cases: &'a [SwitchCase]) {
        for case in cases {
            let depth = scope.depth();
            scope.push_block();
            for label in &case.labels {
                match label {
                    // Enum constants are named bare; only constant fields are
                    // worth recording.
                    CaseLabel::Expr(Expr::Name(name)) => {
                        if self.inside_target {
                            if let Ok(ValueDecl::Field(field)) =
                                self.resolver.resolve_name(scope, &name.name)
                            {
                                self.record_field(&field);
                            }
                        }
                    }
                    CaseLabel::Expr(expr) => self.visit_expr(scope, expr),
                    CaseLabel::Pattern { ty, name, .. } => {
                        if self.inside_target {
                            self.record_type_ref(scope, ty);
                        }
                        let resolved = self.resolver.resolve_type(scope, ty);
                        scope.declare_local(name.clone(), resolved);
                    }
                }
            }
            if let Some(guard) = &case.guard {
                self.visit_expr(scope, guard);
            }
            self.visit_statements(scope, &case.body);
            scope.truncate(depth);
        }
    }

    // ---------------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------------

    fn visit_expr(&mut self, scope: &mut Scope<'a>, expr: &'a Expr) {
        match expr {
            Expr::Name(name) => {
                if self.inside_target {
                    self.record_name(scope, expr, &name.name);
                }
            }
            Expr::Literal(_) | Expr::This(_) | Expr::Super(_) | Expr::Missing(_) => {}
            Expr::FieldAccess(access) => {
                if self.inside_target {
                    self.record_field_access(scope, expr, access);
                }
                self.visit_expr(scope, &access.receiver);
            }
            Expr::MethodCall(call) => {
                if self.inside_target {
                    self.record_call(scope, call);
                    for ty in &call.type_args {
                        self.record_type_ref(scope, ty);
                    }
                }
                if let Some(receiver) = &call.receiver {
                    self.visit_expr(scope, receiver);
                }
                for arg in &call.args {
                    self.visit_expr(scope, arg);
                }
            }
            Expr::New(new) => self.visit_new(scope, new),
            Expr::NewArray(array) => {
                if self.inside_target {
                    self.record_type_ref(scope, &array.elem_ty);
                }
                for dim in &array.dim_exprs {
                    self.visit_expr(scope, dim);
                }
                if let Some(init) = &array.init {
                    for element in &init.elements {
                        self.visit_expr(scope, element);
                    }
                }
            }
            Expr::ArrayInit(init) => {
                for element in &init.elements {
                    self.visit_expr(scope, element);
                }
            }
            Expr::ArrayAccess(access) => {
                self.visit_expr(scope, &access.array);
                self.visit_expr(scope, &access.index);
            }
            Expr::Unary(unary) => self.visit_expr(scope, &unary.operand),
            Expr::Binary(binary) => {
                self.visit_expr(scope, &binary.lhs);
                self.visit_expr(scope, &binary.rhs);
            }
            Expr::Assign(assign) => {
                self.visit_expr(scope, &assign.target);
                self.visit_expr(scope, &assign.value);
            }
            Expr::Conditional(cond) => {
                self.visit_expr(scope, &cond.cond);
                self.visit_expr(scope, &cond.then_expr);
                self.visit_expr(scope, &cond.else_expr);
            }
            Expr::Cast(cast) => {
                if self.inside_target {
                    self.record_type_ref(scope, &cast.ty);
                }
                self.visit_expr(scope, &cast.expr);
            }
            Expr::InstanceOf(instance_of) => {
                self.visit_expr(scope, &instance_of.expr);
                if self.inside_target {
                    self.record_type_ref(scope, &instance_of.ty);
                }
                if let Some(binding) = &instance_of.binding {
                    let ty = self.resolver.resolve_type(scope, &instance_of.ty);
                    scope.declare_local(binding.clone(), ty);
                }
            }
            Expr::Lambda(lambda) => self.visit_lambda(scope, lambda),
            Expr::MethodRef(method_ref) => {
                if self.inside_target {
                    self.record_method_ref(scope, method_ref);
                }
                self.visit_expr(scope, &method_ref.receiver);
            }
            Expr::ClassLit(lit) => {
                if self.inside_target {
                    self.record_type_ref(scope, &lit.ty);
                }
            }
            Expr::Switch(switch) => {
                self.visit_expr(scope, &switch.selector);
                self.visit_cases(scope, &switch.cases);
            }
            Expr::Paren(paren) => self.visit_expr(scope, &paren.expr),
            Expr::Annotation(annotation) => {
                if self.inside_target {
                    self.record_annotation(scope, annotation);
                }
            }
            Expr::Type(ty) => {
                if self.inside_target {
                    self.record_type_ref(scope, ty);
                }
            }
        }
    }

    fn visit_new(&mut self, scope: &mut Scope<'a>, new: &'a NewExpr) {
        let created = self.resolver.created_type(scope, new);
        if self.inside_target {
            match &created {
                Ok(ty) => self.mark_type(ty),
                Err(err) => self.note_failure(err),
            }
            match self.resolver.resolve_new(scope, new) {
                Ok(ctor) => self.record_method(&ctor),
                // An anonymous class may implement an interface, which has
                // no constructor to stand in for.
                Err(err) if new.body.is_some() && new.args.is_empty() => self.note_failure(&err),
                Err(err) => {
                    let args = self.arg_descriptions(scope, &new.args);
                    self.note_unresolved(&err, None, MemberKind::Constructor, &args, false);
                }
            }
        }

        if let Some(outer) = &new.outer {
            self.visit_expr(scope, outer);
        }
        for arg in &new.args {
            self.visit_expr(scope, arg);
        }
        if let Some(body) = &new.body {
            self.visit_anonymous_body(scope, created.ok(), &body.members);
        }
    }

    fn visit_lambda(&mut self, scope: &mut Scope<'a>, lambda: &'a LambdaExpr) {
        let depth = scope.depth();
        scope.push_block();
        for param in &lambda.params {
            let ty = match &param.ty {
                Some(ty) => {
                    if self.inside_target {
                        self.record_annotations(scope, &param.modifiers.annotations);
                        self.record_type_ref(scope, ty);
                    }
                    self.resolver.resolve_type(scope, ty)
                }
                None => Err(Unresolved::Unsupported("implicitly typed lambda parameter")),
            };
            scope.declare_local(param.name.clone(), ty);
        }
        match &lambda.body {
            LambdaBody::Expr(expr) => self.visit_expr(scope, expr),
            LambdaBody::Block(block) => self.visit_block(scope, block),
        }
        scope.truncate(depth);
    }

    // ---------------------------------------------------------------------
    // Recording
    // ---------------------------------------------------------------------

    /// A bare name: a local, a field (possibly the receiver of a call), or a
    /// type or package prefix.
    fn record_name(&mut self, scope: &Scope<'a>, expr: &Expr, name: &str) {
        match self.resolver.resolve_name(scope, name) {
            Ok(ValueDecl::Field(field)) => self.record_field(&field),
            Ok(ValueDecl::Local(_)) => {}
            Err(_) => match self.resolver.classify(scope, expr) {
                Ok(Receiver::Type(ty)) => self.mark_type(&ty),
                Ok(_) => {}
                Err(err) => self.note_unresolved(&err, Some(name), MemberKind::Field, &[], false),
            },
        }
    }

    fn record_field_access(&mut self, scope: &Scope<'a>, expr: &Expr, access: &FieldAccessExpr) {
        if let Expr::Super(_) = access.receiver.as_ref() {
            if let Ok(super_type) = self.resolver.super_type(scope) {
                self.mark_type(&super_type);
            }
        }

        let is_static = match self.resolver.classify(scope, &access.receiver) {
            Ok(Receiver::Package(_)) => {
                // `a.b.C` spelled out in an expression.
                if let Ok(Receiver::Type(ty)) = self.resolver.classify(scope, expr) {
                    self.mark_type(&ty);
                }
                return;
            }
            Ok(Receiver::Type(_)) => true,
            Ok(Receiver::Value(_)) => false,
            // Reported when the receiver itself is visited.
            Err(_) => return,
        };

        match self.resolver.resolve_field_access(scope, access) {
            Ok(field) => self.record_field(&field),
            Err(err) => match self.resolver.classify(scope, expr) {
                Ok(Receiver::Type(ty)) => self.mark_type(&ty),
                _ => self.note_unresolved(
                    &err,
                    Some(&access.name),
                    MemberKind::Field,
                    &[],
                    is_static,
                ),
            },
        }
    }

    fn record_call(&mut self, scope: &Scope<'a>, call: &MethodCallExpr) {
        match self.resolver.resolve_method_call(scope, call) {
            Ok(method) => self.record_method(&method),
            Err(err) => {
                let is_static = call.receiver.as_ref().is_some_and(|receiver| {
                    matches!(
                        self.resolver.classify(scope, receiver),
                        Ok(Receiver::Type(_))
                    )
                });
                let args = self.arg_descriptions(scope, &call.args);
                self.note_unresolved(&err, Some(&call.name), MemberKind::Method, &args, is_static);
            }
        }
    }

    /// `Type::name` keeps every source method of that name the type has.
    fn record_method_ref(&mut self, scope: &Scope<'a>, method_ref: &MethodRefExpr) {
        let owner = match self.resolver.classify(scope, &method_ref.receiver) {
            Ok(Receiver::Type(ty) | Receiver::Value(ty)) => ty,
            _ => return,
        };
        self.mark_type(&owner);
        if method_ref.name == "new" {
            return;
        }
        let Some(owner) = owner.qualified_name() else {
            return;
        };
        if !self.resolver.universe().contains_type(owner) {
            return;
        }
        for method in self.resolver.all_methods(owner) {
            if method.name == method_ref.name {
                self.record_method(&method);
            }
        }
    }

    fn record_annotations(&mut self, scope: &Scope<'a>, annotations: &[Annotation]) {
        for annotation in annotations {
            self.record_annotation(scope, annotation);
        }
    }

    fn record_annotation(&mut self, scope: &Scope<'a>, annotation: &Annotation) {
        let imports = &self.resolver.universe().unit(scope.unit()).imports;
        let annotation_type = if let Some(path) = imports.single_type(annotation.simple_name()) {
            Some(ResolvedType::reference(path))
        } else if annotation.name.contains('.') {
            is_class_path(&annotation.name).then(|| ResolvedType::reference(&annotation.name))
        } else {
            self.resolver
                .lookup_type_name(scope, &annotation.name, 0)
                .ok()
        };
        if let Some(ty) = &annotation_type {
            self.mark_type(ty);
        }

        let elements: Vec<&str> = match &annotation.args {
            AnnotationArgs::None => Vec::new(),
            AnnotationArgs::Single(value) => {
                self.record_annotation_value(scope, value);
                vec!["value"]
            }
            AnnotationArgs::Named(pairs) => {
                for pair in pairs {
                    self.record_annotation_value(scope, &pair.value);
                }
                pairs.iter().map(|pair| pair.name.as_str()).collect()
            }
        };
        if let Some(owner) = annotation_type.as_ref().and_then(ResolvedType::qualified_name) {
            self.record_annotation_elements(owner, &elements);
        }
    }

    /// Keeps the elements an annotation usage sets on a source annotation
    /// type.
    fn record_annotation_elements(&mut self, owner: &str, elements: &[&str]) {
        if elements.is_empty() || !self.resolver.universe().contains_type(owner) {
            return;
        }
        for method in self.resolver.all_methods(owner) {
            if method.params.is_empty() && elements.contains(&method.name.as_str()) {
                self.record_method(&method);
            }
        }
    }

    /// Annotation values are constant expressions: names, field accesses,
    /// class literals, nested annotations and arrays of those.
    fn record_annotation_value(&mut self, scope: &Scope<'a>, value: &Expr) {
        match value {
            Expr::Name(name) => self.record_name(scope, value, &name.name),
            Expr::FieldAccess(access) => self.record_field_access(scope, value, access),
            Expr::ClassLit(lit) => self.record_type_ref(scope, &lit.ty),
            Expr::Annotation(annotation) => self.record_annotation(scope, annotation),
            Expr::ArrayInit(init) => {
                for element in &init.elements {
                    self.record_annotation_value(scope, element);
                }
            }
            Expr::Binary(binary) => {
                self.record_annotation_value(scope, &binary.lhs);
                self.record_annotation_value(scope, &binary.rhs);
            }
            Expr::Paren(paren) => self.record_annotation_value(scope, &paren.expr),
            _ => {}
        }
    }

    fn record_type_ref(&mut self, scope: &Scope<'a>, ty: &TypeRef) {
        match &ty.kind {
            TypeRefKind::Primitive(_) | TypeRefKind::Void | TypeRefKind::Var => {}
            TypeRefKind::Union(parts) | TypeRefKind::Intersection(parts) => {
                for part in parts {
                    self.record_type_ref(scope, part);
                }
            }
            _ => match self.resolver.resolve_type(scope, ty) {
                Ok(resolved) => self.mark_type(&resolved),
                Err(err) => self.note_failure(&err),
            },
        }
    }

    fn record_method(&mut self, method: &ResolvedMethod) {
        if method.declaring_type.contains('$') {
            return;
        }
        if !method.has_resolved_return_type() {
            // The declaration itself is pruned; only its owner stays.
            self.mark_class(&method.declaring_type);
            return;
        }
        let is_new = self.used.methods.insert(method.signature());
        self.mark_method_types(method);
        if is_new && !method.is_constructor {
            self.match_interfaces(method);
        }
    }

    fn mark_method_types(&mut self, method: &ResolvedMethod) {
        self.mark_class(&method.declaring_type);
        if let Ok(ty) = &method.return_type {
            self.mark_type(ty);
        }
        for ty in method.params.iter().chain(&method.throws) {
            self.mark_type(ty);
        }
    }

    fn record_field(&mut self, field: &ResolvedField) {
        if field.declaring_type.contains('$') {
            return;
        }
        self.used.fields.insert(field.key());
        self.mark_class(&field.declaring_type);
        if let Ok(ty) = &field.ty {
            self.mark_type(ty);
        }
    }

    /// Interface methods with the same name, return type and arity as
    /// `method` are taken to be implemented by it.
    fn match_interfaces(&mut self, method: &ResolvedMethod) {
        let Ok(return_type) = &method.return_type else {
            return;
        };
        let described = return_type.describe();
        let signature = method.signature();
        let matches: Vec<ResolvedMethod> = self
            .interface_methods
            .iter()
            .filter(|candidate| {
                candidate.name == method.name
                    && candidate.params.len() == method.params.len()
                    && candidate
                        .return_type
                        .as_ref()
                        .is_ok_and(|ty| ty.describe() == described)
            })
            .cloned()
            .collect();
        for candidate in matches {
            let candidate_signature: MemberSignature = candidate.signature();
            if candidate_signature != signature && self.used.methods.insert(candidate_signature) {
                self.mark_method_types(&candidate);
            }
        }
    }

    fn mark_type(&mut self, ty: &ResolvedType) {
        match ty {
            ResolvedType::Reference(reference) => {
                self.mark_class(&reference.qualified_name);
                for arg in &reference.type_args {
                    if matches!(
                        arg,
                        ResolvedType::Reference(_)
                            | ResolvedType::Array(_)
                            | ResolvedType::Ambiguous(_)
                    ) {
                        self.mark_type(arg);
                    }
                }
            }
            ResolvedType::Array(elem) => self.mark_type(elem),
            ResolvedType::Ambiguous(ambiguous) => {
                tracing::debug!(
                    target: "nova.minimize.finder",
                    name = %ambiguous.name,
                    packages = ?ambiguous.packages,
                    "keeping every on-demand import that could supply a name"
                );
                self.used
                    .on_demand_packages
                    .extend(ambiguous.packages.iter().cloned());
            }
            ResolvedType::Primitive(_)
            | ResolvedType::TypeVariable(_)
            | ResolvedType::Wildcard(_)
            | ResolvedType::Void
            | ResolvedType::Null => {}
        }
    }

    /// Records a class together with every source class enclosing it.
    fn mark_class(&mut self, name: &str) {
        if name.is_empty() || name.contains('$') {
            return;
        }
        let universe = self.resolver.universe();
        self.used.classes.insert(name);
        let mut outer = universe.type_info(name).and_then(|info| info.outer.as_deref());
        while let Some(enclosing) = outer {
            self.used.classes.insert(enclosing);
            outer = universe
                .type_info(enclosing)
                .and_then(|info| info.outer.as_deref());
        }
    }

    /// Keeps the owner of a failed lookup, if the failure names one.
    fn note_failure(&mut self, err: &Unresolved) {
        match err.owner() {
            Some(owner) => self.mark_class(owner),
            None => tracing::trace!(target: "nova.minimize.finder", error = %err, "unresolved"),
        }
    }

    /// Like [`Self::note_failure`], and additionally records a member of an
    /// external type for the stub synthesizer. `expected` guards against
    /// failures that are really about a sub-expression.
    fn note_unresolved(
        &mut self,
        err: &Unresolved,
        expected: Option<&str>,
        kind: MemberKind,
        arg_types: &[Option<String>],
        is_static: bool,
    ) {
        self.note_failure(err);
        let Unresolved::MissingDeclaration { owner, name } = err else {
            tracing::debug!(target: "nova.minimize.finder", error = %err, "unresolved reference");
            return;
        };
        if expected.is_some_and(|expected| expected != name.as_str()) || is_builtin(owner) {
            return;
        }
        self.unresolved.insert(UnresolvedMember {
            owner: owner.clone(),
            name: name.clone(),
            kind,
            arg_types: arg_types.to_vec(),
            is_static,
        });
    }

    fn arg_descriptions(&self, scope: &Scope<'a>, args: &[Expr]) -> Vec<Option<String>> {
        args.iter()
            .map(|arg| {
                self.resolver
                    .type_of(scope, arg)
                    .ok()
                    .map(|ty| ty.describe())
            })
            .collect()
    }
}

/// A method declaration only counts as resolved when its return type does.
pub(crate) fn require_return_type(method: ResolvedMethod) -> Resolution<ResolvedMethod> {
    match &method.return_type {
        Err(err) if !method.has_resolved_return_type() => Err(err.clone()),
        _ => Ok(method),
    }
}

fn written_types(params: &[Param]) -> Vec<String> {
    params.iter().map(Param::written_type).collect()
}
