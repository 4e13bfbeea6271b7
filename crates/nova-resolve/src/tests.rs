use pretty_assertions::assert_eq;

use nova_syntax::ast::{CompilationUnit, Expr, MemberDecl, TypeRef};
use nova_syntax::{parse, parse_expression};

use crate::{
    is_class_path, is_java_lang_name, simple_name, AmbiguousType, MemberSignature, Receiver,
    ResolvedType, Resolver, Scope, SourceUniverse, Unresolved, ValueDecl,
};

fn units(sources: &[&str]) -> Vec<CompilationUnit> {
    sources
        .iter()
        .map(|text| {
            let parse = parse(text);
            assert!(parse.errors().is_empty(), "unexpected errors: {:?}", parse.errors());
            parse.into_compilation_unit()
        })
        .collect()
}

fn expr(text: &str) -> Expr {
    let (expr, errors) = parse_expression(text);
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    expr
}

fn call_signature(resolver: &Resolver<'_, '_>, scope: &Scope<'_>, text: &str) -> String {
    let Expr::MethodCall(call) = expr(text) else {
        panic!("not a method call: {text}");
    };
    resolver
        .resolve_method_call(scope, &call)
        .unwrap_or_else(|err| panic!("{text}: {err}"))
        .signature()
        .to_string()
}

fn method_signatures(resolver: &Resolver<'_, '_>, ty: &str, name: &str) -> Vec<String> {
    resolver
        .all_methods(ty)
        .into_iter()
        .filter(|m| m.name == name)
        .map(|m| m.signature().to_string())
        .collect()
}

fn local_type(resolver: &Resolver<'_, '_>, scope: &Scope<'_>, text: &str) -> ResolvedType {
    resolver
        .resolve_type(scope, &type_ref(text))
        .unwrap_or_else(|err| panic!("{text}: {err}"))
}

fn type_ref(text: &str) -> TypeRef {
    let parsed = units(&[&format!("class Holder {{ {text} field; }}")]);
    match &parsed[0].types[0].members[0] {
        MemberDecl::Field(field) => field.ty.clone(),
        other => panic!("unexpected member {other:?}"),
    }
}

#[test]
fn method_signatures_use_qualified_parameter_types() {
    let units = units(&[r#"
        package p;
        import q.Helper;
        import java.util.*;
        class A<T> {
            class Inner {}
            void m(String s, Inner i, Helper h, List<String> l, T t, int[] xs) {}
            void v(int first, String... rest) {}
        }
    "#]);
    let universe = SourceUniverse::new(&units);
    let resolver = Resolver::new(&universe);

    assert_eq!(
        method_signatures(&resolver, "p.A", "m"),
        vec![
            "p.A.m(java.lang.String, p.A.Inner, q.Helper, java.util.List<java.lang.String>, T, int[])"
                .to_string()
        ]
    );
    assert_eq!(
        method_signatures(&resolver, "p.A", "v"),
        vec!["p.A.v(int, java.lang.String...)".to_string()]
    );
}

#[test]
fn overloads_pick_the_most_specific_candidate() {
    let units = units(&[r#"
        package p;
        class B {
            void f(int x) {}
            void f(String s) {}
            void f(Object o) {}
            void g(long x) {}
            void h(String... parts) {}
        }
    "#]);
    let universe = SourceUniverse::new(&units);
    let resolver = Resolver::new(&universe);
    let mut scope = resolver.scope_for_type("p.B").expect("type is indexed");
    scope.push_block();

    assert_eq!(call_signature(&resolver, &scope, "f(1)"), "p.B.f(int)");
    assert_eq!(call_signature(&resolver, &scope, "f(\"s\")"), "p.B.f(java.lang.String)");
    assert_eq!(
        call_signature(&resolver, &scope, "f(new B())"),
        "p.B.f(java.lang.Object)"
    );
    assert_eq!(call_signature(&resolver, &scope, "g(1)"), "p.B.g(long)");
    assert_eq!(call_signature(&resolver, &scope, "h()"), "p.B.h(java.lang.String...)");
    assert_eq!(
        call_signature(&resolver, &scope, "h(\"a\", \"b\")"),
        "p.B.h(java.lang.String...)"
    );
}

#[test]
fn members_of_external_types_report_the_missing_owner() {
    let units = units(&[r#"
        package p;
        import java.util.List;
        class C extends ext.Base {
            List<String> items;
        }
    "#]);
    let universe = SourceUniverse::new(&units);
    let resolver = Resolver::new(&universe);
    let mut scope = resolver.scope_for_type("p.C").expect("type is indexed");
    scope.push_block();

    let Expr::MethodCall(size) = expr("items.size()") else {
        unreachable!()
    };
    assert_eq!(
        resolver.resolve_method_call(&scope, &size),
        Err(Unresolved::MissingDeclaration {
            owner: "java.util.List".into(),
            name: "size".into(),
        })
    );

    let Expr::MethodCall(helper) = expr("helper()") else {
        unreachable!()
    };
    assert_eq!(
        resolver.resolve_method_call(&scope, &helper),
        Err(Unresolved::MissingDeclaration {
            owner: "ext.Base".into(),
            name: "helper".into(),
        })
    );
}

#[test]
fn fully_qualified_receivers_classify_as_packages_then_types() {
    let units = units(&[r#"
        package p;
        class D {}
    "#]);
    let universe = SourceUniverse::new(&units);
    let resolver = Resolver::new(&universe);
    let scope = resolver.scope_for_type("p.D").expect("type is indexed");

    assert_eq!(
        resolver.classify(&scope, &expr("java.util")),
        Ok(Receiver::Package("java.util".into()))
    );
    assert_eq!(
        resolver.classify(&scope, &expr("java.util.Collections")),
        Ok(Receiver::Type(ResolvedType::reference("java.util.Collections")))
    );

    let Expr::MethodCall(call) = expr("java.util.Collections.emptyList()") else {
        unreachable!()
    };
    assert_eq!(
        resolver.resolve_method_call(&scope, &call),
        Err(Unresolved::MissingDeclaration {
            owner: "java.util.Collections".into(),
            name: "emptyList".into(),
        })
    );
}

#[test]
fn fields_resolve_through_the_source_hierarchy() {
    let units = units(&[
        r#"
        package p;
        class Base {
            int count;
            static String NAME;
            static class Node {}
        }
    "#,
        r#"
        package p;
        class Sub extends Base {
            Node head;
        }
    "#,
    ]);
    let universe = SourceUniverse::new(&units);
    let resolver = Resolver::new(&universe);
    let mut scope = resolver.scope_for_type("p.Sub").expect("type is indexed");
    scope.push_block();

    let Ok(ValueDecl::Field(count)) = resolver.resolve_name(&scope, "count") else {
        panic!("count is a field");
    };
    assert_eq!(count.key().to_string(), "p.Base#count");
    assert_eq!(count.ty, Ok(ResolvedType::int()));

    let Ok(ValueDecl::Field(head)) = resolver.resolve_name(&scope, "head") else {
        panic!("head is a field");
    };
    assert_eq!(head.ty, Ok(ResolvedType::reference("p.Base.Node")));

    assert_eq!(
        resolver.type_of(&scope, &expr("Base.NAME")),
        Ok(ResolvedType::string())
    );
    let Expr::MethodCall(length) = expr("Base.NAME.length()") else {
        unreachable!()
    };
    assert_eq!(
        resolver.resolve_method_call(&scope, &length),
        Err(Unresolved::MissingDeclaration {
            owner: "java.lang.String".into(),
            name: "length".into(),
        })
    );
}

#[test]
fn locals_shadow_fields() {
    let units = units(&[r#"
        package p;
        class E {
            String value;
        }
    "#]);
    let universe = SourceUniverse::new(&units);
    let resolver = Resolver::new(&universe);
    let mut scope = resolver.scope_for_type("p.E").expect("type is indexed");
    scope.push_block();
    scope.declare_local("value", Ok(ResolvedType::int()));

    assert_eq!(
        resolver.resolve_name(&scope, "value"),
        Ok(ValueDecl::Local(Ok(ResolvedType::int())))
    );
}

#[test]
fn generic_receivers_substitute_return_types() {
    let units = units(&[
        r#"
        package p;
        class Box<T> {
            T get() { return null; }
        }
    "#,
        r#"
        package p;
        class Use {}
    "#,
    ]);
    let universe = SourceUniverse::new(&units);
    let resolver = Resolver::new(&universe);
    let mut scope = resolver.scope_for_type("p.Use").expect("type is indexed");
    scope.push_block();
    let boxed = local_type(&resolver, &scope, "Box<String>");
    scope.declare_local("b", Ok(boxed));

    assert_eq!(
        resolver.type_of(&scope, &expr("b.get()")),
        Ok(ResolvedType::string())
    );
    assert_eq!(call_signature(&resolver, &scope, "b.get()"), "p.Box.get()");
}

#[test]
fn records_and_enums_have_implicit_members() {
    let units = units(&[r#"
        package p;
        record Point(int x, int y) {}
        enum Color { RED, GREEN }
        class Plain {}
        class F {}
    "#]);
    let universe = SourceUniverse::new(&units);
    let resolver = Resolver::new(&universe);
    let mut scope = resolver.scope_for_type("p.F").expect("type is indexed");
    scope.push_block();
    scope.declare_local("pt", Ok(ResolvedType::reference("p.Point")));

    assert_eq!(call_signature(&resolver, &scope, "pt.x()"), "p.Point.x()");
    assert_eq!(call_signature(&resolver, &scope, "Color.values()"), "p.Color.values()");
    assert_eq!(
        resolver.type_of(&scope, &expr("Color.RED")),
        Ok(ResolvedType::reference("p.Color"))
    );

    let Expr::New(point) = expr("new Point(1, 2)") else {
        unreachable!()
    };
    assert_eq!(
        resolver
            .resolve_new(&scope, &point)
            .map(|ctor| ctor.signature().to_string()),
        Ok("p.Point.Point(int, int)".to_string())
    );

    let Expr::New(plain) = expr("new Plain()") else {
        unreachable!()
    };
    assert_eq!(
        resolver
            .resolve_new(&scope, &plain)
            .map(|ctor| ctor.signature().to_string()),
        Ok("p.Plain.Plain()".to_string())
    );
}

#[test]
fn java_lang_names_resolve_without_imports() {
    let units = units(&[r#"
        package p;
        class G {}
    "#]);
    let universe = SourceUniverse::new(&units);
    let resolver = Resolver::new(&universe);
    let scope = resolver.scope_for_type("p.G").expect("type is indexed");

    assert_eq!(
        local_type(&resolver, &scope, "Integer"),
        ResolvedType::reference("java.lang.Integer")
    );
    assert_eq!(
        local_type(&resolver, &scope, "Thread.State"),
        ResolvedType::reference("java.lang.Thread.State")
    );
    assert!(is_java_lang_name("StringBuilder"));
    assert!(!is_java_lang_name("List"));
}

#[test]
fn same_package_types_win_over_java_lang() {
    let units = units(&[
        r#"
        package p;
        class String {}
    "#,
        r#"
        package p;
        class H {}
    "#,
    ]);
    let universe = SourceUniverse::new(&units);
    let resolver = Resolver::new(&universe);
    let scope = resolver.scope_for_type("p.H").expect("type is indexed");

    assert_eq!(
        local_type(&resolver, &scope, "String"),
        ResolvedType::reference("p.String")
    );
}

#[test]
fn binary_expressions_follow_numeric_promotion() {
    let units = units(&[r#"
        package p;
        class N {}
    "#]);
    let universe = SourceUniverse::new(&units);
    let resolver = Resolver::new(&universe);
    let scope = resolver.scope_for_type("p.N").expect("type is indexed");

    let ty = |text: &str| resolver.type_of(&scope, &expr(text)).map(|t| t.to_string());
    assert_eq!(ty("1 + 2L"), Ok("long".to_string()));
    assert_eq!(ty("1 + 2.0f"), Ok("float".to_string()));
    assert_eq!(ty("\"a\" + 1"), Ok("java.lang.String".to_string()));
    assert_eq!(ty("1 < 2"), Ok("boolean".to_string()));
    assert_eq!(ty("'a' + 'b'"), Ok("int".to_string()));
    assert_eq!(ty("int.class"), Ok("java.lang.Class<java.lang.Integer>".to_string()));
}

#[test]
fn signature_helpers() {
    assert!(is_class_path("java.util.List"));
    assert!(is_class_path("a.b.C.D"));
    assert!(!is_class_path("List"));
    assert!(!is_class_path("java.util"));
    assert!(!is_class_path("java.util. List"));

    assert_eq!(simple_name("java.util.Map<K, V>"), "Map");
    assert_eq!(simple_name("java.lang.String..."), "String");
    assert_eq!(simple_name("int[]"), "int");

    let sig = MemberSignature::new("p.A", "m", vec!["int".into(), "java.lang.String".into()]);
    assert_eq!(sig.to_string(), "p.A.m(int, java.lang.String)");
    assert_eq!(sig.arity(), 2);
}

#[test]
fn nested_source_types_resolve_whatever_their_case() {
    let units = units(&[
        r#"
        package p;
        class D {
            static class DB { static int k() { return 1; } }
            static class N { static int k() { return 2; } }
        }
    "#,
        r#"
        package p;
        class C {}
    "#,
    ]);
    let universe = SourceUniverse::new(&units);
    let resolver = Resolver::new(&universe);
    let mut scope = resolver.scope_for_type("p.C").expect("type is indexed");
    scope.push_block();

    assert_eq!(call_signature(&resolver, &scope, "D.DB.k()"), "p.D.DB.k()");
    assert_eq!(call_signature(&resolver, &scope, "D.N.k()"), "p.D.N.k()");
    let Expr::MethodCall(missing) = expr("D.NOPE.k()") else {
        unreachable!()
    };
    assert!(resolver.resolve_method_call(&scope, &missing).is_err());
}

#[test]
fn names_several_external_on_demand_imports_could_supply_are_ambiguous() {
    let units = units(&[r#"
        package p;
        import java.util.*;
        import java.io.*;
        class C {}
    "#]);
    let universe = SourceUniverse::new(&units);
    let resolver = Resolver::new(&universe);
    let scope = resolver.scope_for_type("p.C").expect("type is indexed");

    assert_eq!(
        resolver.lookup_type_name(&scope, "File", 0),
        Ok(ResolvedType::Ambiguous(AmbiguousType {
            name: "File".to_string(),
            packages: vec!["java.util".to_string(), "java.io".to_string()],
        }))
    );
    assert_eq!(
        resolver.lookup_type_name(&scope, "String", 0),
        Ok(ResolvedType::string())
    );

    assert!(matches!(
        local_type(&resolver, &scope, "File"),
        ResolvedType::Ambiguous(ref ambiguous) if ambiguous.name == "File"
    ));
}

#[test]
fn a_single_external_on_demand_import_supplies_the_name() {
    let units = units(&[r#"
        package p;
        import java.io.*;
        class C {}
    "#]);
    let universe = SourceUniverse::new(&units);
    let resolver = Resolver::new(&universe);
    let scope = resolver.scope_for_type("p.C").expect("type is indexed");

    assert_eq!(
        resolver.lookup_type_name(&scope, "File", 0),
        Ok(ResolvedType::reference("java.io.File"))
    );
}
