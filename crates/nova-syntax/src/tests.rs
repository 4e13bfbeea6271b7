use pretty_assertions::assert_eq;

use crate::ast::*;
use crate::lexer::{Lexer, TokenKind};
use crate::{apply_text_edits, parse, parse_expression, EditError, Span, TextEdit};

fn kinds(input: &str) -> Vec<(TokenKind, String)> {
    Lexer::new(input).map(|t| (t.kind, t.text)).collect()
}

fn parse_ok(text: &str) -> CompilationUnit {
    let parse = parse(text);
    assert!(parse.errors().is_empty(), "unexpected errors: {:?}", parse.errors());
    parse.into_compilation_unit()
}

fn expr_ok(text: &str) -> Expr {
    let (expr, errors) = parse_expression(text);
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    expr
}

fn first_type(unit: &CompilationUnit) -> &TypeDecl {
    &unit.types[0]
}

fn method<'a>(decl: &'a TypeDecl, name: &str) -> &'a MethodDecl {
    decl.members
        .iter()
        .find_map(|m| match m {
            MemberDecl::Method(m) if m.name == name => Some(m),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no method {name}"))
}

#[test]
fn lexer_splits_closing_angles_and_keeps_literals() {
    assert_eq!(
        kinds("a>>=b; 1L 2.5f 0x1F 'c' \"s\\\"\" ..."),
        vec![
            (TokenKind::Ident, "a".into()),
            (TokenKind::Gt, ">".into()),
            (TokenKind::Gt, ">".into()),
            (TokenKind::Eq, "=".into()),
            (TokenKind::Ident, "b".into()),
            (TokenKind::Semi, ";".into()),
            (TokenKind::LongLiteral, "1L".into()),
            (TokenKind::FloatLiteral, "2.5f".into()),
            (TokenKind::IntLiteral, "0x1F".into()),
            (TokenKind::CharLiteral, "'c'".into()),
            (TokenKind::StringLiteral, "\"s\\\"\"".into()),
            (TokenKind::Ellipsis, "...".into()),
        ]
    );
}

#[test]
fn lexer_skips_comments_and_reads_text_blocks() {
    let toks = kinds("/* a */ x // b\n \"\"\"\n  hi \"\n  \"\"\" -> ::");
    assert_eq!(
        toks.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
        vec![
            TokenKind::Ident,
            TokenKind::TextBlock,
            TokenKind::Arrow,
            TokenKind::ColonColon
        ]
    );
}

#[test]
fn lexer_number_followed_by_member_access_is_not_a_float() {
    assert_eq!(
        kinds("1.0 .5 3"),
        vec![
            (TokenKind::DoubleLiteral, "1.0".into()),
            (TokenKind::DoubleLiteral, ".5".into()),
            (TokenKind::IntLiteral, "3".into()),
        ]
    );
}

#[test]
fn parses_package_imports_and_type_headers() {
    let text = r#"
package com.example;

import java.util.List;
import java.util.*;
import static java.lang.Math.max;

public final class Foo<T extends Comparable<T>> extends Base implements Runnable, java.io.Serializable {
}
"#;
    let unit = parse_ok(text);
    assert_eq!(unit.package_name(), "com.example");
    assert_eq!(unit.imports.len(), 3);
    assert_eq!(unit.imports[0].path, "java.util.List");
    assert!(unit.imports[1].is_star);
    assert_eq!(unit.imports[1].path, "java.util");
    assert!(unit.imports[2].is_static);
    assert_eq!(unit.imports[2].type_path(), "java.lang.Math");

    let decl = first_type(&unit);
    assert_eq!(decl.kind, TypeKind::Class);
    assert_eq!(decl.name, "Foo");
    assert!(decl.modifiers.contains(Modifier::Public));
    assert!(decl.modifiers.is_final());
    assert_eq!(decl.type_params.len(), 1);
    assert_eq!(decl.type_params[0].bounds[0].to_string(), "Comparable<T>");
    assert_eq!(decl.extends[0].to_string(), "Base");
    assert_eq!(
        decl.implements.iter().map(|t| t.to_string()).collect::<Vec<_>>(),
        vec!["Runnable", "java.io.Serializable"]
    );
    assert_eq!(decl.range.slice(text).lines().next(), Some("public final class Foo<T extends Comparable<T>> extends Base implements Runnable, java.io.Serializable {"));
}

#[test]
fn parses_members_with_spans_matching_the_source() {
    let text = r#"class A {
    private int x = 1, y[];
    static { init(); }
    A(int v) { this(v, 0); }
    A(int v, int w) { super(); }
    @Override
    public <K> java.util.Map<K, String[]> make(final K key, String... rest) throws java.io.IOException, RuntimeException {
        return null;
    }
    abstract void bare();
    interface Inner { int CONST = 3; }
}"#;
    let unit = parse_ok(text);
    let decl = first_type(&unit);
    assert_eq!(decl.members.len(), 7);

    let MemberDecl::Field(field) = &decl.members[0] else {
        panic!("expected field");
    };
    assert_eq!(field.range.slice(text), "private int x = 1, y[];");
    assert_eq!(field.declarators.len(), 2);
    assert_eq!(field.declarators[1].dims, 1);
    assert!(field.declarators[1].initializer.is_none());

    let MemberDecl::Initializer(init) = &decl.members[1] else {
        panic!("expected initializer");
    };
    assert!(init.is_static);

    let MemberDecl::Constructor(ctor) = &decl.members[2] else {
        panic!("expected constructor");
    };
    assert_eq!(ctor.range.slice(text), "A(int v) { this(v, 0); }");
    assert!(matches!(
        &ctor.body.statements[0],
        Stmt::ExplicitCtorCall(ExplicitCtorCall { kind: CtorCallKind::This, args, .. }) if args.len() == 2
    ));

    let make = method(decl, "make");
    assert_eq!(make.modifiers.annotations[0].name, "Override");
    assert_eq!(make.type_params[0].name, "K");
    assert_eq!(make.return_ty.to_string(), "java.util.Map<K, String[]>");
    assert_eq!(make.params.len(), 2);
    assert!(make.params[0].modifiers.is_final());
    assert!(make.params[1].is_varargs);
    assert_eq!(make.params[1].written_type(), "String...");
    assert_eq!(make.throws.len(), 2);
    let body = make.body.as_ref().expect("body");
    assert_eq!(body.range.slice(text), "{\n        return null;\n    }");

    assert!(method(decl, "bare").body.is_none());
    let MemberDecl::Type(inner) = &decl.members[6] else {
        panic!("expected nested type");
    };
    assert!(inner.is_interface());
}

#[test]
fn parses_enums_and_records() {
    let text = r#"
enum Color {
    RED("r"), GREEN("g") { @Override public String toString() { return "G"; } },
    BLUE;
    private final String code;
    Color(String code) { this.code = code; }
}
record Point(int x, int y) implements Shape {
    Point { if (x < 0) throw new IllegalArgumentException(); }
    static Point origin() { return new Point(0, 0); }
}
"#;
    let unit = parse_ok(text);
    let color = &unit.types[0];
    assert_eq!(color.kind, TypeKind::Enum);
    assert_eq!(
        color.enum_constants.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        vec!["RED", "GREEN", "BLUE"]
    );
    assert!(color.enum_constants[1].body.is_some());
    assert!(color.enum_constants[2].args.is_none());
    assert_eq!(color.members.len(), 2);

    let point = &unit.types[1];
    assert_eq!(point.kind, TypeKind::Record);
    assert_eq!(point.record_components.len(), 2);
    let MemberDecl::Constructor(compact) = &point.members[0] else {
        panic!("expected compact constructor");
    };
    assert!(compact.is_compact);
    assert_eq!(point.implements[0].to_string(), "Shape");
}

#[test]
fn parses_statement_forms() {
    let text = r#"
class S {
    int run(java.util.List<String> items, Object o) throws Exception {
        final var count = 0;
        int[] arr = {1, 2};
        outer:
        for (int i = 0, j = 1; i < 10; i++, j--) {
            if (i > j) continue outer; else break;
        }
        for (String s : items) { count += s.length(); }
        while (true) { do { } while (false); }
        try (var r = open(); Other q = r.other()) {
            synchronized (this) { assert count >= 0 : "neg"; }
        } catch (IllegalStateException | IllegalArgumentException e) {
            throw e;
        } finally { }
        switch (count) {
            case 1:
            case 2: count++; break;
            default: count--;
        }
        int k = switch (o) {
            case String str when str.isEmpty() -> 0;
            case Integer n -> { yield n; }
            default -> throw new IllegalStateException();
        };
        class Local { }
        return k >>> 2;
    }
}
"#;
    let unit = parse_ok(text);
    let run = method(first_type(&unit), "run");
    let stmts = &run.body.as_ref().expect("body").statements;
    assert!(matches!(&stmts[0], Stmt::LocalVar(decl) if decl.ty.kind == TypeRefKind::Var && decl.modifiers.is_final()));
    assert!(matches!(&stmts[1], Stmt::LocalVar(decl) if decl.ty.to_string() == "int[]"));
    assert!(matches!(&stmts[2], Stmt::Labeled(l) if l.label == "outer" && matches!(*l.body, Stmt::For(_))));
    assert!(matches!(&stmts[3], Stmt::ForEach(f) if f.name == "s" && f.ty.to_string() == "String"));
    assert!(matches!(&stmts[4], Stmt::While(_)));
    let Stmt::Try(try_stmt) = &stmts[5] else {
        panic!("expected try");
    };
    assert_eq!(try_stmt.resources.len(), 2);
    assert!(matches!(
        &try_stmt.catches[0].param.ty.kind,
        TypeRefKind::Union(alts) if alts.len() == 2
    ));
    assert!(try_stmt.finally.is_some());
    let Stmt::Switch(switch) = &stmts[6] else {
        panic!("expected switch");
    };
    assert_eq!(switch.cases.len(), 3);
    assert!(switch.cases[2].is_default);
    assert_eq!(switch.cases[1].body.len(), 2);

    let Stmt::LocalVar(k) = &stmts[7] else {
        panic!("expected local var");
    };
    let Some(Expr::Switch(switch_expr)) = &k.declarators[0].initializer else {
        panic!("expected switch expression");
    };
    assert!(matches!(&switch_expr.cases[0].labels[0], CaseLabel::Pattern { name, .. } if name == "str"));
    assert!(switch_expr.cases[0].guard.is_some());
    assert!(switch_expr.cases.iter().all(|c| c.is_arrow));
    assert!(matches!(&stmts[8], Stmt::LocalType(decl) if decl.name == "Local"));
    assert!(matches!(
        &stmts[9],
        Stmt::Return(ReturnStmt { expr: Some(Expr::Binary(BinaryExpr { op: BinaryOp::UShr, .. })), .. })
    ));
}

#[test]
fn parses_generic_types_with_nested_closers() {
    let text = "class G { java.util.Map<String, java.util.List<java.util.Set<Integer>>> m; }";
    let unit = parse_ok(text);
    let MemberDecl::Field(field) = &first_type(&unit).members[0] else {
        panic!("expected field");
    };
    assert_eq!(
        field.ty.to_string(),
        "java.util.Map<String, java.util.List<java.util.Set<Integer>>>"
    );
    assert_eq!(field.ty.type_arguments().len(), 2);
}

#[test]
fn expressions_respect_precedence() {
    let Expr::Binary(add) = expr_ok("a + b * c") else {
        panic!("expected binary");
    };
    assert_eq!(add.op, BinaryOp::Add);
    assert!(matches!(*add.rhs, Expr::Binary(BinaryExpr { op: BinaryOp::Mul, .. })));

    let Expr::Binary(ge) = expr_ok("x >= y >> 1") else {
        panic!("expected binary");
    };
    assert_eq!(ge.op, BinaryOp::Ge);
    assert!(matches!(*ge.rhs, Expr::Binary(BinaryExpr { op: BinaryOp::Shr, .. })));

    let Expr::Assign(assign) = expr_ok("a >>= 2") else {
        panic!("expected assignment");
    };
    assert_eq!(assign.op, AssignOp::Shr);

    assert!(matches!(expr_ok("c ? a : b"), Expr::Conditional(_)));
}

#[test]
fn distinguishes_casts_from_parenthesized_expressions() {
    assert!(matches!(expr_ok("(String) o"), Expr::Cast(c) if c.ty.to_string() == "String"));
    assert!(matches!(expr_ok("(int) -x"), Expr::Cast(_)));
    assert!(matches!(expr_ok("(java.util.List<String>) (Object) o"), Expr::Cast(_)));
    assert!(matches!(expr_ok("(a) - b"), Expr::Binary(_)));
    assert!(matches!(expr_ok("(a + b)"), Expr::Paren(_)));
    assert!(matches!(expr_ok("(Runnable & java.io.Serializable) () -> {}"), Expr::Cast(c) if matches!(c.ty.kind, TypeRefKind::Intersection(_))));
}

#[test]
fn parses_calls_creation_and_lambdas() {
    let Expr::MethodCall(call) = expr_ok("java.util.Collections.<String>emptyList().size()") else {
        panic!("expected call");
    };
    assert_eq!(call.name, "size");
    let Some(receiver) = &call.receiver else {
        panic!("expected receiver");
    };
    assert!(matches!(&**receiver, Expr::MethodCall(inner) if inner.type_args.len() == 1 && inner.name == "emptyList"));

    let Expr::New(new) = expr_ok("new java.util.ArrayList<>(10) { }") else {
        panic!("expected new");
    };
    assert_eq!(new.ty.to_string(), "java.util.ArrayList<>");
    assert_eq!(new.args.len(), 1);
    assert!(new.body.is_some());

    assert!(matches!(expr_ok("new int[3][]"), Expr::NewArray(a) if a.dims == 2 && a.dim_exprs.len() == 1));
    assert!(matches!(expr_ok("new String[] { \"a\" }"), Expr::NewArray(a) if a.init.is_some()));

    assert!(matches!(expr_ok("x -> x + 1"), Expr::Lambda(l) if l.params.len() == 1));
    assert!(matches!(expr_ok("(String s, int n) -> { return; }"), Expr::Lambda(l) if l.params[0].ty.is_some()));
    assert!(matches!(expr_ok("String::valueOf"), Expr::MethodRef(r) if r.name == "valueOf"));
    assert!(matches!(expr_ok("int[]::new"), Expr::MethodRef(r) if r.name == "new"));
    assert!(matches!(expr_ok("String[].class"), Expr::ClassLit(c) if c.ty.to_string() == "String[]"));
    assert!(matches!(expr_ok("o instanceof String s && s.isEmpty()"), Expr::Binary(b) if matches!(&*b.lhs, Expr::InstanceOf(i) if i.binding.as_deref() == Some("s"))));
    assert!(matches!(expr_ok("Outer.this.x"), Expr::FieldAccess(f) if matches!(&*f.receiver, Expr::This(t) if t.qualifier.as_deref() == Some("Outer"))));
    assert!(matches!(expr_ok("outer.new Inner()"), Expr::New(n) if n.outer.is_some()));
}

#[test]
fn recovers_from_garbage_and_keeps_following_members() {
    let text = "class R { int a = ; void ok() { foo(; } int b; }";
    let parse = parse(text);
    assert!(!parse.errors().is_empty());
    let decl = &parse.compilation_unit().types[0];
    assert!(decl.members.iter().any(|m| matches!(m, MemberDecl::Field(f) if f.declarators[0].name == "b")));
}

#[test]
fn apply_multiple_edits_is_order_independent() {
    let text = "abcdef";
    let mut edits = vec![
        TextEdit::new(Span::new(2, 4), "XX"),
        TextEdit::insert(0, "!"),
        TextEdit::delete(Span::new(5, 6)),
    ];
    let out1 = apply_text_edits(text, &edits).unwrap();
    edits.reverse();
    let out2 = apply_text_edits(text, &edits).unwrap();
    assert_eq!(out1, out2);
    assert_eq!(out1, "!abXXe");
}

#[test]
fn detect_overlapping_edits() {
    let edits = vec![
        TextEdit::new(Span::new(1, 4), "X"),
        TextEdit::new(Span::new(3, 5), "Y"),
    ];
    assert!(matches!(
        apply_text_edits("abcdef", &edits),
        Err(EditError::OverlappingEdits { .. })
    ));
    assert!(matches!(
        apply_text_edits("abc", &[TextEdit::delete(Span::new(1, 9))]),
        Err(EditError::RangeOutOfBounds { .. })
    ));
}
