use pretty_assertions::assert_eq;

use nova_resolve::{FieldKey, MemberSignature, Resolver, SourceUniverse};
use nova_syntax::{parse, Parse};

use crate::{prune_unit, FinderOutput, MemberKind, TargetMethodFinder, TargetSignature};

struct Minimized {
    output: FinderOutput,
    files: Vec<String>,
    kept: Vec<bool>,
}

fn minimize_sources(sources: &[&str], targets: &[&str]) -> Minimized {
    let parses: Vec<Parse> = sources
        .iter()
        .map(|text| {
            let parse = parse(text);
            assert!(parse.errors().is_empty(), "unexpected errors: {:?}", parse.errors());
            parse
        })
        .collect();
    let universe = SourceUniverse::new(parses.iter().map(Parse::compilation_unit));
    let resolver = Resolver::new(&universe);
    let targets: Vec<TargetSignature> = targets
        .iter()
        .map(|target| TargetSignature::parse(target).unwrap())
        .collect();
    let output = TargetMethodFinder::new(&resolver, &targets).run();

    let mut files = Vec::new();
    let mut kept = Vec::new();
    for (idx, text) in sources.iter().enumerate() {
        let pruned = prune_unit(&resolver, idx, text, &output.used).unwrap();
        files.push(pruned.text);
        kept.push(pruned.has_types);
    }
    Minimized {
        output,
        files,
        kept,
    }
}

fn signature(ty: &str, name: &str, params: &[&str]) -> MemberSignature {
    MemberSignature::new(ty, name, params.iter().map(|p| p.to_string()).collect())
}

const SIMPLE: &str = r#"package com.example;

import java.util.List;
import java.util.Map;

public class Simple {
    private int count = 3;
    private String unused = "x";

    public int target(int x) {
        return helper(x) + count;
    }

    private int helper(int y) {
        return y * 2;
    }

    public void other() {
        System.out.println("hi");
    }
}
"#;

#[test]
fn keeps_target_verbatim_and_stubs_what_it_calls() {
    let result = minimize_sources(&[SIMPLE], &["com.example.Simple#target(int)"]);

    assert!(result.output.unfound.is_empty());
    assert_eq!(
        result.output.used.targets.iter().collect::<Vec<_>>(),
        vec![&signature("com.example.Simple", "target", &["int"])]
    );
    assert!(result
        .output
        .used
        .methods
        .contains(&signature("com.example.Simple", "helper", &["int"])));
    assert!(result
        .output
        .used
        .fields
        .contains(&FieldKey::new("com.example.Simple", "count")));

    assert_eq!(
        result.files[0],
        r#"package com.example;


public class Simple {
    private int count;

    public int target(int x) {
        return helper(x) + count;
    }

    private int helper(int y) { throw new Error(); }

}
"#
    );
    assert_eq!(result.kept, vec![true]);
}

#[test]
fn pruning_the_output_again_changes_nothing() {
    let first = minimize_sources(&[SIMPLE], &["com.example.Simple#target(int)"]);
    let second = minimize_sources(&[&first.files[0]], &["com.example.Simple#target(int)"]);

    assert_eq!(second.files[0], first.files[0]);
    assert_eq!(second.output.used, first.output.used);
}

#[test]
fn target_parameters_match_written_or_qualified_types() {
    let source = r#"package p;
public class Greeter {
    public String greet(String name, int... times) { return name; }
}
"#;
    let written = minimize_sources(&[source], &["p.Greeter#greet(String, int[])"]);
    let qualified = minimize_sources(&[source], &["p.Greeter#greet(java.lang.String,int...)"]);

    assert!(written.output.unfound.is_empty());
    assert!(qualified.output.unfound.is_empty());
    assert_eq!(written.output.used.targets, qualified.output.used.targets);
}

#[test]
fn unmatched_targets_are_reported_as_written() {
    let result = minimize_sources(
        &[SIMPLE],
        &["com.example.Simple#target(int)", "com.example.Simple#missing()"],
    );

    assert_eq!(result.output.unfound, vec!["com.example.Simple#missing()".to_string()]);
}

#[test]
fn final_fields_keep_a_default_value() {
    let source = r#"package p;
public class Settings {
    private final int a = 1, b = 2;
    private static final String NAME = "n";
    final long unused = 5L;
    private final double[] weights = {1.0};

    int target() {
        return a + NAME.length() + weights.length;
    }
}
"#;
    let result = minimize_sources(&[source], &["p.Settings#target()"]);
    let text = &result.files[0];

    assert!(text.contains("    private final int a = 0;\n"), "{text}");
    assert!(text.contains("    private static final String NAME = null;\n"), "{text}");
    assert!(text.contains("    private final double[] weights = null;\n"), "{text}");
    assert!(!text.contains("unused"), "{text}");
    assert!(!text.contains(" b "), "{text}");
}

#[test]
fn imports_follow_used_classes() {
    let helper = r#"package com.ex.util;

public class Helper {
    public static int compute() {
        return 42;
    }

    public static void unused() {
    }
}
"#;
    let main = r#"package com.ex.app;

import com.ex.util.Helper;
import java.util.ArrayList;
import java.util.List;
import java.util.Map;

public class Main {
    public int run() {
        List<String> xs = new ArrayList<>();
        return Helper.compute();
    }
}
"#;
    let result = minimize_sources(&[helper, main], &["com.ex.app.Main#run()"]);

    assert_eq!(
        result.files[0],
        r#"package com.ex.util;

public class Helper {
    public static int compute() { throw new Error(); }

}
"#
    );
    let main_out = &result.files[1];
    assert!(main_out.contains("import com.ex.util.Helper;\n"));
    assert!(main_out.contains("import java.util.ArrayList;\n"));
    assert!(main_out.contains("import java.util.List;\n"));
    assert!(!main_out.contains("java.util.Map"));

    assert!(result.output.unresolved.iter().any(|member| {
        member.owner == "java.util.ArrayList" && member.kind == MemberKind::Constructor
    }));
}

#[test]
fn static_imports_are_kept_per_member() {
    let consts = r#"package p;
public class Consts {
    public static final int LIMIT = 10;
    public static final int OTHER = 20;
}
"#;
    let user = r#"package p;

import static java.lang.Math.max;
import static p.Consts.LIMIT;
import static p.Consts.OTHER;

public class UsesConsts {
    int target() {
        return max(LIMIT, 1);
    }
}
"#;
    let result = minimize_sources(&[consts, user], &["p.UsesConsts#target()"]);

    assert!(result.files[0].contains("public static final int LIMIT = 0;"));
    assert!(!result.files[0].contains("OTHER"));
    assert!(result.files[1].contains("import static java.lang.Math.max;\n"));
    assert!(result.files[1].contains("import static p.Consts.LIMIT;\n"));
    assert!(!result.files[1].contains("p.Consts.OTHER"));
}

#[test]
fn unused_types_and_nested_types_are_removed() {
    let outer = r#"package p;
public class Outer {
    static class Used {
        int v;
        int w;
    }

    static class Unused {
    }

    static {
        System.out.println("init");
    }

    int target() {
        return new Used().v;
    }
}
"#;
    let other = r#"package p;
public class Other {
    void nothing() {}
}
"#;
    let result = minimize_sources(&[outer, other], &["p.Outer#target()"]);

    assert_eq!(
        result.files[0],
        r#"package p;
public class Outer {
    static class Used {
        int v;
    }



    int target() {
        return new Used().v;
    }
}
"#
    );
    assert!(result.output.used.classes.contains("p.Outer.Used"));
    assert!(!result.output.used.classes.contains("p.Outer.Unused"));
    assert_eq!(result.kept, vec![true, false]);
    assert_eq!(result.files[1], "package p;\n");
}

#[test]
fn enum_constants_keep_the_constructor_they_call() {
    let source = r#"package p;
public enum Color {
    RED(1), GREEN(2);

    private final int code;

    Color(int code) {
        this.code = code;
    }

    public int code() {
        return code;
    }

    public static Color parse(String s) {
        return RED;
    }
}
"#;
    let result = minimize_sources(&[source], &["p.Color#code()"]);
    let text = &result.files[0];

    assert!(result
        .output
        .used
        .methods
        .contains(&signature("p.Color", "Color", &["int"])));
    assert!(text.contains("    RED(1), GREEN(2);\n"), "{text}");
    assert!(text.contains("    private final int code = 0;\n"), "{text}");
    assert!(text.contains("    Color(int code) { throw new Error(); }\n"), "{text}");
    assert!(text.contains("        return code;\n"), "{text}");
    assert!(!text.contains("parse"), "{text}");
}

#[test]
fn implemented_interface_methods_are_kept() {
    let shape = r#"package p;
public interface Shape {
    double area();
    String name();
}
"#;
    let square = r#"package p;
public class Square implements Shape {
    private double side;

    public double area() {
        return side * side;
    }

    public String name() {
        return "square";
    }

    public static double total(Square s) {
        return s.area();
    }
}
"#;
    let result = minimize_sources(&[shape, square], &["p.Square#total(Square)"]);

    assert!(result.output.used.methods.contains(&signature("p.Shape", "area", &[])));
    assert_eq!(
        result.files[0],
        "package p;\npublic interface Shape {\n    double area();\n}\n"
    );
    let text = &result.files[1];
    assert!(text.contains("public class Square implements Shape {"), "{text}");
    assert!(text.contains("public double area() { throw new Error(); }"), "{text}");
    assert!(!text.contains("name()"), "{text}");
    assert!(!text.contains("side"), "{text}");
}

#[test]
fn anonymous_classes_keep_the_method_they_override() {
    let task = r#"package p;
public abstract class Task {
    public abstract void run();

    public void unrelated() {
    }
}
"#;
    let runner = r#"package p;
public class Runner {
    void target() {
        Task t = new Task() {
            public void run() {
            }
        };
    }
}
"#;
    let result = minimize_sources(&[task, runner], &["p.Runner#target()"]);

    assert!(result.output.used.methods.contains(&signature("p.Task", "run", &[])));
    assert_eq!(
        result.files[0],
        "package p;\npublic abstract class Task {\n    public abstract void run();\n\n}\n"
    );
    assert_eq!(result.files[1], runner);
}

#[test]
fn members_of_external_types_are_collected() {
    let source = r#"package p;

import org.lib.Widget;

public class UsesLib {
    void target(Widget w) {
        w.render(3);
        Widget.create();
    }
}
"#;
    let result = minimize_sources(&[source], &["p.UsesLib#target(org.lib.Widget)"]);

    let unresolved: Vec<_> = result
        .output
        .unresolved
        .iter()
        .map(|member| (member.owner.as_str(), member.name.as_str(), member.is_static))
        .collect();
    assert_eq!(
        unresolved,
        vec![("org.lib.Widget", "create", true), ("org.lib.Widget", "render", false)]
    );
    let render = result
        .output
        .unresolved
        .iter()
        .find(|member| member.name == "render")
        .unwrap();
    assert_eq!(render.kind, MemberKind::Method);
    assert_eq!(render.arg_types, vec![Some("int".to_string())]);

    assert!(result.output.used.classes.contains("org.lib.Widget"));
    assert!(result.files[0].contains("import org.lib.Widget;\n"));
    assert_eq!(result.files[0], source);
}

#[test]
fn all_caps_nested_types_are_kept_when_called_through() {
    let holder = r#"package a.b;
public class D {
    static class DB {
        static int k() {
            return 1;
        }
    }

    static class URL {
        static int x() {
            return 2;
        }
    }

    static class Unused {
    }
}
"#;
    let caller = r#"package a.b;
public class C {
    int foo() {
        return D.DB.k() + D.URL.x();
    }
}
"#;
    let result = minimize_sources(&[holder, caller], &["a.b.C#foo()"]);

    for (class, method) in [("a.b.D.DB", "k"), ("a.b.D.URL", "x")] {
        assert!(result.output.used.classes.contains(class), "{class}");
        assert!(
            result.output.used.methods.contains(&signature(class, method, &[])),
            "{class}.{method}"
        );
    }
    let text = &result.files[0];
    assert!(text.contains("        static int k() { throw new Error(); }\n"), "{text}");
    assert!(text.contains("        static int x() { throw new Error(); }\n"), "{text}");
    assert!(!text.contains("Unused"), "{text}");
}

#[test]
fn a_target_with_an_unresolvable_return_type_is_not_found() {
    let source = r#"package a.b;
public class C {
    public Missing foo() {
        return null;
    }
}
"#;
    let result = minimize_sources(&[source], &["a.b.C#foo()"]);

    assert_eq!(result.output.unfound, vec!["a.b.C#foo()".to_string()]);
    assert!(result.output.used.targets.is_empty());
}

#[test]
fn called_methods_with_an_unresolvable_return_type_are_removed() {
    let source = r#"package a.b;
public class C {
    void target() {
        bar();
    }

    Missing bar() {
        return null;
    }
}
"#;
    let result = minimize_sources(&[source], &["a.b.C#target()"]);

    assert!(result.output.used.methods.is_empty());
    assert_eq!(
        result.files[0],
        "package a.b;\npublic class C {\n    void target() {\n        bar();\n    }\n\n}\n"
    );
}

#[test]
fn names_from_several_external_on_demand_imports_keep_every_candidate() {
    let source = r#"package a.b;

import java.util.*;
import java.io.*;
import java.util.Map;

public class C {
    void foo(File f) {
    }
}
"#;
    let result = minimize_sources(&[source], &["a.b.C#foo(File)"]);

    assert!(result.output.unfound.is_empty());
    assert_eq!(
        result.output.used.on_demand_packages.iter().collect::<Vec<_>>(),
        vec!["java.io", "java.util"]
    );
    assert!(!result.output.used.classes.iter().any(|class| class.ends_with(".File")));
    let text = &result.files[0];
    assert!(text.contains("import java.util.*;\n"), "{text}");
    assert!(text.contains("import java.io.*;\n"), "{text}");
    assert!(!text.contains("java.util.Map"), "{text}");
}

#[test]
fn final_fields_of_every_primitive_type_get_its_zero_value() {
    let cases = [
        ("boolean", "true", "false"),
        ("byte", "(byte) 1", "0"),
        ("short", "(short) 2", "0"),
        ("char", "'c'", "'\\u0000'"),
        ("int", "3", "0"),
        ("long", "4L", "0L"),
        ("float", "1.5f", "0.0f"),
        ("double", "2.5", "0.0"),
        ("String", "\"s\"", "null"),
    ];
    for (ty, init, default) in cases {
        let source = format!(
            "package p;\npublic class Holder {{\n    private final {ty} value = {init};\n    {ty} plain = {init};\n\n    void target() {{\n        {ty} a = value;\n        {ty} b = plain;\n    }}\n}}\n"
        );
        let result = minimize_sources(&[&source], &["p.Holder#target()"]);
        let text = &result.files[0];

        assert!(
            text.contains(&format!("    private final {ty} value = {default};\n")),
            "{ty}: {text}"
        );
        assert!(text.contains(&format!("    {ty} plain;\n")), "{ty}: {text}");
    }
}

#[test]
fn every_alternative_of_a_multi_catch_is_kept() {
    let first = "package p;\npublic class FirstException extends RuntimeException {\n}\n";
    let second = "package p;\npublic class SecondException extends RuntimeException {\n}\n";
    let unused = "package p;\npublic class UnusedException extends RuntimeException {\n}\n";
    let user = r#"package p;
public class Handler {
    void target() {
        try {
            Integer.parseInt("1");
        } catch (FirstException | SecondException e) {
            e.printStackTrace();
        }
    }
}
"#;
    let result = minimize_sources(&[first, second, unused, user], &["p.Handler#target()"]);

    let cases = [
        ("p.FirstException", true),
        ("p.SecondException", true),
        ("p.UnusedException", false),
    ];
    for (class, used) in cases {
        assert_eq!(result.output.used.classes.contains(class), used, "{class}");
    }
    assert_eq!(result.kept, vec![true, true, false, true]);
    assert_eq!(result.files[3], user);
}

#[test]
fn annotations_are_matched_through_imports() {
    let tag = r#"package p.ann;
public @interface Tag {
    String value();

    int weight() default 1;
}
"#;
    let main = r#"package p;

import p.ann.Tag;
import org.lib.Marker;
import org.lib.Unused;

public class Main {
    @Marker
    @Tag("x")
    void target() {
    }

    @Unused
    void other() {
    }
}
"#;
    let result = minimize_sources(&[tag, main], &["p.Main#target()"]);

    let cases = [
        ("p.ann.Tag", "import p.ann.Tag;\n", true),
        ("org.lib.Marker", "import org.lib.Marker;\n", true),
        ("org.lib.Unused", "import org.lib.Unused;\n", false),
    ];
    for (class, import, used) in cases {
        assert_eq!(result.output.used.classes.contains(class), used, "{class}");
        assert_eq!(result.files[1].contains(import), used, "{import}");
    }
    assert!(result.output.used.methods.contains(&signature("p.ann.Tag", "value", &[])));
    assert_eq!(
        result.files[0],
        "package p.ann;\npublic @interface Tag {\n    String value();\n\n}\n"
    );
}

#[test]
fn calls_through_a_field_keep_the_field_and_stub_the_callee() {
    let callee = r#"package a.b;
public class D {
    void bar() {
        System.out.println("bar");
    }

    void baz() {
    }
}
"#;
    for body in ["d.bar();", "this.d.bar();"] {
        let caller = format!(
            "package a.b;\npublic class C {{\n    private D d = new D();\n\n    void foo() {{\n        {body}\n    }}\n}}\n"
        );
        let result = minimize_sources(&[callee, &caller], &["a.b.C#foo()"]);

        assert!(
            result.output.used.fields.contains(&FieldKey::new("a.b.C", "d")),
            "{body}"
        );
        assert!(
            result.output.used.methods.contains(&signature("a.b.D", "bar", &[])),
            "{body}"
        );
        assert_eq!(
            result.files[0],
            "package a.b;\npublic class D {\n    void bar() { throw new Error(); }\n\n}\n",
            "{body}"
        );
        assert_eq!(
            result.files[1],
            format!(
                "package a.b;\npublic class C {{\n    private D d;\n\n    void foo() {{\n        {body}\n    }}\n}}\n"
            ),
            "{body}"
        );
    }
}
