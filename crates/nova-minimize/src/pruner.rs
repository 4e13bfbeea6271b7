//! Cuts a compilation unit down to what the finder marked used.
//!
//! Pruning is expressed as byte-range edits over the original text, so every
//! kept declaration, and every target body in particular, is copied through
//! byte for byte. Pruning its own output again with the same sets changes
//! nothing.

use nova_resolve::{enclosing_prefix, qualify, FieldKey, Resolver, Scope};
use nova_syntax::ast::{
    ConstructorDecl, FieldDecl, ImportDecl, MemberDecl, MethodDecl, PrimitiveKind, TypeDecl,
    TypeRef, TypeRefKind, VarDeclarator,
};
use nova_syntax::{apply_text_edits, EditError, Span, TextEdit};

use crate::finder::require_return_type;
use crate::used::UsedSets;

/// Replacement body for used methods that are not targets.
pub const STUB_BODY: &str = "{ throw new Error(); }";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrunedFile {
    pub text: String,
    /// Whether a top-level type survived. Files without one are not written.
    pub has_types: bool,
}

/// Prunes unit `unit` of the resolver's universe; `text` is its source.
pub fn prune_unit(
    resolver: &Resolver<'_, '_>,
    unit: usize,
    text: &str,
    used: &UsedSets,
) -> Result<PrunedFile, EditError> {
    let info = resolver.universe().unit(unit);
    let compilation_unit = info.unit;
    let mut pruner = Pruner {
        resolver,
        used,
        text,
        edits: Vec::new(),
    };

    for import in &compilation_unit.imports {
        if !pruner.import_is_used(import) {
            pruner.delete(import.range);
        }
    }
    let mut has_types = false;
    for decl in &compilation_unit.types {
        has_types |= pruner.prune_type(&qualify(&info.package, &decl.name), decl);
    }

    tracing::debug!(
        target: "nova.minimize.pruner",
        unit,
        edits = pruner.edits.len(),
        has_types,
        "pruned compilation unit"
    );
    Ok(PrunedFile {
        text: apply_text_edits(text, &pruner.edits)?,
        has_types,
    })
}

struct Pruner<'p, 'u, 'a> {
    resolver: &'p Resolver<'u, 'a>,
    used: &'p UsedSets,
    text: &'p str,
    edits: Vec<TextEdit>,
}

impl<'a> Pruner<'_, '_, 'a> {
    fn import_is_used(&self, import: &ImportDecl) -> bool {
        let classes = &self.used.classes;
        match (import.is_static, import.is_star) {
            (false, false) => classes.contains(&import.path),
            (false, true) => {
                self.used.on_demand_packages.contains(&import.path)
                    || classes
                        .iter()
                        .any(|class| enclosing_prefix(class) == Some(import.path.as_str()))
            }
            (true, true) => classes.contains(&import.path),
            (true, false) => {
                let Some((owner, member)) = import.path.rsplit_once('.') else {
                    return false;
                };
                if !classes.contains(owner) {
                    return false;
                }
                // Members of source types are tracked individually; anything
                // else is only known through its owner.
                !self.resolver.universe().contains_type(owner)
                    || classes.contains(&import.path)
                    || self.used.fields.contains(&FieldKey::new(owner, member))
                    || self
                        .used
                        .targets
                        .iter()
                        .chain(&self.used.methods)
                        .any(|sig| sig.declaring_type == owner && sig.name == member)
            }
        }
    }

    /// Returns whether the type was kept.
    fn prune_type(&mut self, name: &str, decl: &'a TypeDecl) -> bool {
        if !self.used.classes.contains(name) {
            tracing::trace!(target: "nova.minimize.pruner", type_name = %name, "removing type");
            self.delete(decl.range);
            return false;
        }
        let Some(mut scope) = self.resolver.scope_for_type(name) else {
            return true;
        };

        for member in &decl.members {
            match member {
                MemberDecl::Type(nested) => {
                    self.prune_type(&format!("{name}.{}", nested.name), nested);
                }
                MemberDecl::Initializer(init) => self.delete(init.range),
                MemberDecl::Method(method) => self.prune_method(&mut scope, name, method),
                MemberDecl::Constructor(ctor) => {
                    self.prune_constructor(&mut scope, name, decl, ctor)
                }
                MemberDecl::Field(field) => self.prune_field(&scope, name, decl, field),
            }
        }
        true
    }

    fn prune_method(&mut self, scope: &mut Scope<'a>, owner: &str, method: &'a MethodDecl) {
        let depth = scope.depth();
        scope.push_type_params(&method.type_params);
        let resolved = self
            .resolver
            .resolve_method_decl(scope, owner, method)
            .and_then(require_return_type);
        scope.truncate(depth);

        let signature = match resolved {
            Ok(resolved) => resolved.signature(),
            Err(err) => {
                tracing::debug!(
                    target: "nova.minimize.pruner",
                    owner = %owner,
                    method = %method.name,
                    error = %err,
                    "removing unresolvable method"
                );
                self.delete(method.range);
                return;
            }
        };
        if self.used.targets.contains(&signature) {
            return;
        }
        if self.used.methods.contains(&signature) {
            if let Some(body) = &method.body {
                self.stub_body(body.range);
            }
            return;
        }
        self.delete(method.range);
    }

    fn prune_constructor(
        &mut self,
        scope: &mut Scope<'a>,
        owner: &str,
        owner_decl: &'a TypeDecl,
        ctor: &'a ConstructorDecl,
    ) {
        let depth = scope.depth();
        scope.push_type_params(&ctor.type_params);
        let resolved = self
            .resolver
            .resolve_constructor_decl(scope, owner, owner_decl, ctor);
        scope.truncate(depth);

        let signature = match resolved {
            Ok(resolved) => resolved.signature(),
            Err(err) => {
                tracing::debug!(
                    target: "nova.minimize.pruner",
                    owner = %owner,
                    error = %err,
                    "removing unresolvable constructor"
                );
                self.delete(ctor.range);
                return;
            }
        };
        if self.used.targets.contains(&signature) {
            return;
        }
        if self.used.methods.contains(&signature) {
            self.stub_body(ctor.body.range);
            return;
        }
        self.delete(ctor.range);
    }

    fn prune_field(
        &mut self,
        scope: &Scope<'a>,
        owner: &str,
        owner_decl: &TypeDecl,
        field: &FieldDecl,
    ) {
        if let Err(err) = self.resolver.resolve_type(scope, &field.ty) {
            tracing::debug!(
                target: "nova.minimize.pruner",
                owner = %owner,
                error = %err,
                "removing field of unresolvable type"
            );
            self.delete(field.range);
            return;
        }

        let kept: Vec<&VarDeclarator> = field
            .declarators
            .iter()
            .filter(|d| self.used.fields.contains(&FieldKey::new(owner, d.name.as_str())))
            .collect();
        let (Some(first), Some(last)) = (field.declarators.first(), field.declarators.last())
        else {
            return;
        };
        if kept.is_empty() {
            self.delete(field.range);
            return;
        }

        // Initializers go; fields that must be definitely assigned get a
        // default instead.
        let immutable = field.modifiers.is_final() || owner_decl.is_interface();
        let replacement = kept
            .iter()
            .map(|declarator| {
                let head = declarator_head(self.text, declarator);
                if immutable {
                    format!("{head} = {}", default_value(&field.ty, declarator.dims))
                } else {
                    head.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        let span = Span::new(first.range.start, last.range.end);
        if span.slice(self.text) != replacement {
            self.edits.push(TextEdit::new(span, replacement));
        }
    }

    fn stub_body(&mut self, body: Span) {
        if body.slice(self.text) != STUB_BODY {
            self.edits.push(TextEdit::new(body, STUB_BODY));
        }
    }

    fn delete(&mut self, range: Span) {
        self.edits
            .push(TextEdit::delete(removal_span(self.text, range)));
    }
}

/// A declarator without its initializer: the name plus any dims.
fn declarator_head<'t>(text: &'t str, declarator: &VarDeclarator) -> &'t str {
    match &declarator.initializer {
        Some(init) => text[declarator.range.start..init.range().start]
            .trim_end()
            .trim_end_matches('=')
            .trim_end(),
        None => declarator.range.slice(text),
    }
}

/// The Java default value of a field of type `ty` with `dims` extra array
/// dimensions after its name.
pub fn default_value(ty: &TypeRef, dims: usize) -> &'static str {
    if dims > 0 {
        return "null";
    }
    match &ty.kind {
        TypeRefKind::Primitive(kind) => match kind {
            PrimitiveKind::Boolean => "false",
            PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Int => "0",
            PrimitiveKind::Long => "0L",
            PrimitiveKind::Float => "0.0f",
            PrimitiveKind::Double => "0.0",
            PrimitiveKind::Char => "'\\u0000'",
        },
        _ => "null",
    }
}

/// Widens a declaration's range to whole lines when nothing else shares them,
/// taking along the comments directly above it.
pub(crate) fn removal_span(text: &str, range: Span) -> Span {
    let line_start = text[..range.start].rfind('\n').map_or(0, |idx| idx + 1);
    if !text[line_start..range.start].trim().is_empty() {
        return range;
    }
    let rest = &text[range.end..];
    let line_end = match rest.find('\n') {
        Some(idx) if rest[..idx].trim().is_empty() => range.end + idx + 1,
        None if rest.trim().is_empty() => text.len(),
        _ => return range,
    };

    let mut start = line_start;
    while start > 0 {
        let prev_end = start - 1;
        let prev_start = text[..prev_end].rfind('\n').map_or(0, |idx| idx + 1);
        let line = text[prev_start..prev_end].trim();
        if line.starts_with("//") {
            start = prev_start;
            continue;
        }
        if line.ends_with("*/") {
            if let Some(open) = text[..prev_end].rfind("/*") {
                let open_line = text[..open].rfind('\n').map_or(0, |idx| idx + 1);
                if text[open_line..open].trim().is_empty() {
                    start = open_line;
                    continue;
                }
            }
        }
        break;
    }
    Span::new(start, line_end)
}
