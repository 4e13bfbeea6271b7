use std::fs;
use std::path::{Path, PathBuf};

use nova_minimize::{
    minimize, minimize_with, MinimizeConfig, MinimizeError, SourceFile, StubRequest,
    StubSynthesizer, TypeCorrections,
};
use pretty_assertions::assert_eq;

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn config(root: &Path, output: &Path, targets: &[&str]) -> MinimizeConfig {
    let mut config = MinimizeConfig::new(
        root.to_path_buf(),
        output.to_path_buf(),
        targets.iter().map(|t| t.to_string()).collect::<Vec<String>>(),
    );
    config.checker.enabled = false;
    config
}

const SERVICE: &str = r#"package com.ex;

import com.ex.model.Item;

public class Service {
    public int total(Item item) {
        return item.price() * 2;
    }

    public void log() {
    }
}
"#;

const ITEM: &str = r#"package com.ex.model;

public class Item {
    private int price;

    public int price() {
        return price;
    }

    public String label() {
        return "item";
    }
}
"#;

const UNRELATED: &str = r#"package com.ex.other;

public class Unrelated {
}
"#;

#[test]
fn writes_pruned_sources_under_the_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let out = dir.path().join("out");
    write(&src, "com/ex/Service.java", SERVICE);
    write(&src, "com/ex/model/Item.java", ITEM);
    write(&src, "com/ex/other/Unrelated.java", UNRELATED);

    let report = minimize(&config(&src, &out, &["com.ex.Service#total(Item)"])).unwrap();

    assert_eq!(
        fs::read_to_string(out.join("com/ex/Service.java")).unwrap(),
        r#"package com.ex;

import com.ex.model.Item;

public class Service {
    public int total(Item item) {
        return item.price() * 2;
    }

}
"#
    );
    assert_eq!(
        fs::read_to_string(out.join("com/ex/model/Item.java")).unwrap(),
        r#"package com.ex.model;

public class Item {

    public int price() { throw new Error(); }

}
"#
    );
    assert!(!out.join("com/ex/other/Unrelated.java").exists());

    assert_eq!(
        report.kept_files().collect::<Vec<_>>(),
        vec![Path::new("com/ex/Service.java"), Path::new("com/ex/model/Item.java")]
    );
    assert_eq!(report.targets, vec!["com.ex.Service.total(com.ex.model.Item)".to_string()]);
    assert_eq!(report.used_methods, vec!["com.ex.model.Item.price()".to_string()]);
    assert!(report.used_classes.contains(&"com.ex.model.Item".to_string()));
    assert_eq!(report.parse_errors, 0);
    assert_eq!(report.stub_rounds, 0);
    assert!(report.type_corrections.is_empty());

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["files"][2]["path"], "com/ex/other/Unrelated.java");
    assert_eq!(json["files"][2]["kept"], false);
}

#[test]
fn unfound_targets_fail_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    write(&src, "com/ex/Service.java", SERVICE);
    write(&src, "com/ex/model/Item.java", ITEM);

    let err = minimize(&config(
        &src,
        &dir.path().join("out"),
        &["com.ex.Service#total(Item)", "com.ex.Service#nope(int)"],
    ))
    .unwrap_err();

    match err {
        MinimizeError::UnfoundTargets(targets) => {
            assert_eq!(targets, vec!["com.ex.Service#nope(int)".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!dir.path().join("out").exists());
}

#[test]
fn malformed_targets_are_rejected_before_reading_sources() {
    let dir = tempfile::tempdir().unwrap();
    let err = minimize(&config(
        &dir.path().join("does-not-exist"),
        &dir.path().join("out"),
        &["com.ex.Service.total(Item)"],
    ))
    .unwrap_err();

    assert!(matches!(err, MinimizeError::InvalidTarget { .. }), "{err}");
}

#[test]
fn an_output_directory_inside_the_root_is_not_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "com/ex/Service.java", SERVICE);
    write(root, "com/ex/model/Item.java", ITEM);
    // Left over from an earlier run; reading it would declare the types twice.
    write(root, "minimized/com/ex/Service.java", SERVICE);

    let report = minimize(&config(root, &root.join("minimized"), &["com.ex.Service#total(Item)"]))
        .unwrap();

    assert_eq!(report.files.len(), 2);
}

#[test]
fn output_left_by_an_earlier_run_is_removed() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let out = dir.path().join("out");
    write(&src, "com/ex/Service.java", SERVICE);
    write(&src, "com/ex/model/Item.java", ITEM);
    write(&src, "com/ex/other/Unrelated.java", UNRELATED);
    write(&out, "com/ex/other/Unrelated.java", UNRELATED);
    write(&out, "old/Gone.java", "package old;\nclass Gone {}\n");
    write(&out, "NOTES.txt", "kept");

    minimize(&config(&src, &out, &["com.ex.Service#total(Item)"])).unwrap();

    assert!(out.join("com/ex/Service.java").exists());
    assert!(out.join("com/ex/model/Item.java").exists());
    assert!(!out.join("com/ex/other/Unrelated.java").exists());
    assert!(!out.join("old/Gone.java").exists());
    assert_eq!(fs::read_to_string(out.join("NOTES.txt")).unwrap(), "kept");
    assert!(src.join("com/ex/other/Unrelated.java").exists());
}

#[test]
fn an_output_directory_enclosing_the_sources_is_not_cleared() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("src");
    write(&root, "com/ex/Service.java", SERVICE);
    write(&root, "com/ex/model/Item.java", ITEM);
    write(dir.path(), "other/Keep.java", "package other;\nclass Keep {}\n");

    minimize(&config(&root, dir.path(), &["com.ex.Service#total(Item)"])).unwrap();

    assert!(dir.path().join("other/Keep.java").exists());
    assert!(root.join("com/ex/model/Item.java").exists());
}

/// Declares `org.lib.Widget` the first time it is asked, then nothing.
#[derive(Default)]
struct WidgetStubs {
    requests: Vec<Vec<String>>,
    corrections: Vec<TypeCorrections>,
}

impl StubSynthesizer for WidgetStubs {
    fn synthesize(&mut self, request: &StubRequest<'_>) -> Vec<SourceFile> {
        self.requests.push(request.missing_classes.to_vec());
        if self.requests.len() > 1 {
            return Vec::new();
        }
        vec![SourceFile::new(
            PathBuf::from("org/lib/Widget.java"),
            "package org.lib;\n\npublic class Widget {\n    public void render(int x) {\n        throw new Error();\n    }\n\n    public void unused() {\n        throw new Error();\n    }\n}\n",
        )]
    }

    fn apply_type_corrections(&mut self, corrections: &TypeCorrections) -> Vec<SourceFile> {
        self.corrections.push(corrections.clone());
        Vec::new()
    }
}

#[test]
fn synthesized_files_join_the_next_round() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let out = dir.path().join("out");
    write(
        &src,
        "p/UsesLib.java",
        "package p;\n\nimport org.lib.Widget;\n\npublic class UsesLib {\n    void target(Widget w) {\n        w.render(3);\n    }\n}\n",
    );

    let mut stubs = WidgetStubs::default();
    let report = minimize_with(&config(&src, &out, &["p.UsesLib#target(Widget)"]), &mut stubs)
        .unwrap();

    assert_eq!(
        stubs.requests,
        vec![vec!["org.lib.Widget".to_string()], Vec::<String>::new()]
    );
    assert_eq!(report.stub_rounds, 1);
    assert!(report.unresolved.is_empty());
    assert!(report.missing_classes.is_empty());
    assert_eq!(
        fs::read_to_string(out.join("org/lib/Widget.java")).unwrap(),
        "package org.lib;\n\npublic class Widget {\n    public void render(int x) { throw new Error(); }\n\n}\n"
    );
    assert!(stubs.corrections.is_empty());
}
