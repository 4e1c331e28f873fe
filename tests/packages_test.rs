//! Whole-run behavior over on-disk trees: package ordering, verbose output,
//! load-error handling, workspace resolution, idempotence.

use narrower::analysis::Linter;
use narrower::errors::Error;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_file(dir: &Path, rel: &str, contents: &str) {
    let full = dir.join(rel);
    fs::create_dir_all(full.parent().expect("file has a parent")).expect("mkdir");
    fs::write(full, contents).expect("write fixture");
}

const CLOSER_USER: &str = "package %NAME%

import \"io\"

func Use(f io.ReadCloser) {
	f.Close()
}
";

fn closer_user(pkg: &str) -> String {
    CLOSER_USER.replace("%NAME%", pkg)
}

fn collect(linter: &Linter) -> Vec<(String, Vec<String>)> {
    let mut out = Vec::new();
    linter
        .check(|path, warns| {
            out.push((
                path.to_string(),
                warns.iter().map(|w| w.to_string()).collect(),
            ));
            Ok(())
        })
        .expect("collect never fails");
    out
}

#[test]
fn packages_are_analyzed_in_lexicographic_order() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path();
    write_file(root, "a/a.go", &closer_user("a"));
    write_file(root, "b/b.go", &closer_user("b"));

    // Arguments out of order; analysis order is sorted.
    let args = vec![
        format!("{}/b", root.display()),
        format!("{}/a", root.display()),
    ];
    let linter = Linter::from_args(&args).expect("load");
    assert!(linter.load_errors().is_empty());

    let got = collect(&linter);
    assert_eq!(got.len(), 2);
    assert!(got[0].0.ends_with("/a"));
    assert!(got[1].0.ends_with("/b"));
    for (_, warns) in &got {
        assert_eq!(warns.len(), 1);
        assert!(warns[0].ends_with("f can be io.Closer"));
    }
}

#[test]
fn broken_packages_are_reported_and_skipped() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path();
    write_file(root, "good/g.go", &closer_user("good"));
    write_file(root, "bad/b.go", "package bad\n\nfunc Broken() {\n\tmissing()\n}\n");

    let args = vec![
        format!("{}/bad", root.display()),
        format!("{}/good", root.display()),
    ];
    let linter = Linter::from_args(&args).expect("argument errors only");
    assert_eq!(linter.load_errors().len(), 1);
    match &linter.load_errors()[0] {
        Error::Load { message, .. } => assert!(message.contains("undefined: missing")),
        other => panic!("unexpected error {other}"),
    }

    let got = collect(&linter);
    assert_eq!(got.len(), 1);
    assert!(got[0].0.ends_with("/good"));
    assert_eq!(got[0].1.len(), 1);
}

#[test]
fn runs_are_idempotent() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path();
    write_file(root, "a/a.go", &closer_user("a"));
    write_file(root, "a/extra.go", "package a\n\nfunc helper() {\n}\n");

    let args = vec![format!("{}/a", root.display())];
    let first = collect(&Linter::from_args(&args).expect("load"));
    let second = collect(&Linter::from_args(&args).expect("load"));
    assert_eq!(first, second);
}

#[test]
fn test_files_and_hidden_files_are_not_loaded() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path();
    write_file(root, "a/a.go", &closer_user("a"));
    // Would fail to parse or clash if picked up.
    write_file(root, "a/a_test.go", "this is not a source file\n");
    write_file(root, "a/_draft.go", "neither is this\n");
    write_file(root, "a/.hidden.go", "nor this\n");

    let args = vec![format!("{}/a", root.display())];
    let linter = Linter::from_args(&args).expect("load");
    assert!(linter.load_errors().is_empty());
    assert_eq!(collect(&linter)[0].1.len(), 1);
}

#[test]
fn workspace_recursion_and_missing_workspace() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path();
    write_file(root, "src/demo/d.go", &closer_user("demo"));
    write_file(root, "src/demo/sub/s.go", &closer_user("sub"));
    write_file(root, "src/demo/testdata/t.go", "not even parseable\n");

    std::env::set_var("GOPATH", root);
    let linter = Linter::from_args(&["demo/...".to_string()]).expect("load");
    assert!(linter.load_errors().is_empty());
    let got = collect(&linter);
    let paths: Vec<&str> = got.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(paths, ["demo", "demo/sub"]);
    for (_, warns) in &got {
        assert_eq!(warns.len(), 1);
    }

    std::env::remove_var("GOPATH");
    let err = Linter::from_args(&["demo/...".to_string()]).expect_err("must fail");
    assert!(matches!(err, Error::MissingWorkspace(_)));
    let err = Linter::from_args(&["demo".to_string()]).expect_err("must fail");
    assert!(matches!(err, Error::MissingWorkspace(_)));
}

#[test]
fn explicit_files_form_one_package() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path();
    write_file(
        root,
        "one.go",
        "package adhoc\n\nimport \"io\"\n\nfunc First(f io.ReadCloser) {\n\tf.Close()\n}\n",
    );
    write_file(
        root,
        "two.go",
        "package adhoc\n\nimport \"io\"\n\nfunc Second(g io.ReadCloser) {\n\tg.Close()\n}\n",
    );

    let args = vec![
        format!("{}/one.go", root.display()),
        format!("{}/two.go", root.display()),
    ];
    let linter = Linter::from_args(&args).expect("load");
    let got = collect(&linter);
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].0, "adhoc");
    let names: Vec<String> = got[0]
        .1
        .iter()
        .map(|w| w.rsplit(": ").next().unwrap_or_default().to_string())
        .collect();
    assert_eq!(
        names,
        ["f can be io.Closer".to_string(), "g can be io.Closer".to_string()]
    );
}

#[test]
fn verbose_output_prefixes_package_paths() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path();
    write_file(root, "a/a.go", &closer_user("a"));

    let args = vec![format!("{}/a", root.display())];
    let mut buf = Vec::new();
    narrower::check_args_output(&args, &mut buf, true).expect("run");
    let text = String::from_utf8(buf).expect("utf8");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(format!("{}/a", root.display()).as_str()));
    assert!(lines
        .next()
        .is_some_and(|l| l.ends_with("f can be io.Closer")));
}
