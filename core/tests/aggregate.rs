use maid_core::{
    AppError, Config, ConfigResolver, GlobalScope, IncludedKind, LoadedConfig, MarkdownWriter,
    ScanReport, Scanner, aggregate, get_builtin_ignore_patterns,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::tempdir;

fn write_file(root: &Path, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn included_paths(report: &ScanReport) -> Vec<&Path> {
    report.included.iter().map(|f| f.path.as_path()).collect()
}

fn empty_scope() -> GlobalScope {
    GlobalScope::new(Vec::new(), None, Vec::new()).unwrap()
}

fn try_run(
    paths: &[PathBuf],
    scope: &GlobalScope,
    exclude: Option<&Path>,
) -> Result<(ScanReport, String), AppError> {
    let mut resolver = ConfigResolver::with_search_dirs(Vec::new());
    let mut writer = MarkdownWriter::new(Vec::new(), "<memory>", "maid test");
    let report = aggregate(paths, scope, &mut resolver, &mut writer, exclude)?;
    Ok((report, String::from_utf8(writer.into_inner()).unwrap()))
}

fn run(paths: &[PathBuf], scope: &GlobalScope) -> (ScanReport, String) {
    try_run(paths, scope, None).unwrap()
}

#[test]
fn local_patterns_do_not_leak_into_siblings() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_file(root, "a/maid.json", r#"{"patterns": ["*.txt"]}"#);
    let hidden = write_file(root, "a/x.txt", "a");
    let nested = write_file(root, "a/deeper/y.txt", "a");
    let visible = write_file(root, "b/x.txt", "b");

    let (report, _) = run(&[root.to_path_buf()], &empty_scope());
    assert!(!report.is_included(&hidden));
    assert!(!report.is_included(&nested));
    assert!(report.is_included(&visible));
}

#[test]
fn local_rules_do_not_leak_into_siblings() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_file(
        root,
        "a/maid.json",
        r#"{"rules": [{"pattern": "*.rs", "start": "^\\s*//", "delete": "::line::"}]}"#,
    );
    let source = "  // comment\nfn x() {}\n";
    let stripped = write_file(root, "a/m.rs", source);
    let untouched = write_file(root, "b/m.rs", source);

    let (report, doc) = run(&[root.to_path_buf()], &empty_scope());
    let kind_of = |path: &Path| {
        report
            .included
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.kind.clone())
            .unwrap()
    };
    assert_eq!(
        kind_of(&stripped),
        IncludedKind::Text {
            lines: 1,
            removed: 1,
            rules: vec!["*.rs".to_string()]
        }
    );
    assert_eq!(
        kind_of(&untouched),
        IncludedKind::Text {
            lines: 2,
            removed: 0,
            rules: Vec::new()
        }
    );
    assert_eq!(doc.matches("  // comment").count(), 1);
}

#[test]
fn directory_only_pattern_prunes_at_any_depth() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_file(root, "maid.json", r#"{"patterns": ["build/"]}"#);
    let deep = write_file(root, "src/build/out/app.o", "obj");
    let top = write_file(root, "build/x.txt", "x");
    let plain_file = write_file(root, "docs/build", "a file named build");

    let (report, _) = run(&[root.to_path_buf()], &empty_scope());
    assert!(!report.is_included(&deep));
    assert!(!report.is_included(&top));
    assert!(report.is_included(&plain_file));
    assert!(report.skipped.contains(&root.join("build")));
}

#[test]
fn negation_reincludes_a_file() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_file(root, "maid.json", r#"{"patterns": ["*.log", "!keep.log"]}"#);
    let dropped = write_file(root, "logs/run.log", "x");
    let kept = write_file(root, "logs/keep.log", "y");

    let (report, _) = run(&[root.to_path_buf()], &empty_scope());
    assert!(!report.is_included(&dropped));
    assert!(report.is_included(&kept));
}

#[test]
fn child_config_can_reinclude_what_the_parent_ignored() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_file(root, "maid.json", r#"{"patterns": ["*.txt"]}"#);
    write_file(root, "notes/maid.json", r#"{"patterns": ["!todo.txt"]}"#);
    let todo = write_file(root, "notes/todo.txt", "t");
    let other = write_file(root, "notes/other.txt", "o");
    let outside = write_file(root, "todo.txt", "t");

    let (report, _) = run(&[root.to_path_buf()], &empty_scope());
    assert!(report.is_included(&todo));
    assert!(!report.is_included(&other));
    assert!(!report.is_included(&outside));
}

#[test]
fn style_block_is_removed_from_output() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_file(
        root,
        "maid.json",
        r#"{"rules": [{"pattern": "*.html", "name": "styles", "start": "<style>", "delete": "</style>"}]}"#,
    );
    let page = write_file(root, "page.html", "a\n<style>\nx\ny\n</style>\nb\n");

    let (report, doc) = run(&[root.to_path_buf()], &empty_scope());
    assert!(doc.contains(&format!("## FILE: `{}`\n\n```html\na\nb\n```\n", page.display())));
    let file = report.included.iter().find(|f| f.path == page).unwrap();
    assert_eq!(
        file.kind,
        IncludedKind::Text {
            lines: 2,
            removed: 4,
            rules: vec!["styles".to_string()]
        }
    );
}

#[test]
fn binary_files_get_a_marker_and_bypass_rules() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_file(
        root,
        "maid.json",
        r#"{"rules": [{"pattern": "*", "start": ".", "delete": "::line::"}]}"#,
    );
    let blob = write_file(root, "data.dat", [0x00u8, 0x01, 0x02, 0x03]);

    let (report, doc) = run(&[root.to_path_buf()], &empty_scope());
    let file = report.included.iter().find(|f| f.path == blob).unwrap();
    assert_eq!(file.kind, IncludedKind::Binary { size: 4 });
    assert!(doc.contains(&format!(
        "## FILE: `{}` - Type: Unknown - Size: 4 bytes\n",
        blob.display()
    )));
}

#[test]
fn malformed_local_config_aborts_the_run() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_file(root, "ok.txt", "fine");
    write_file(root, "sub/.maid.json", "{ \"patterns\": [ ");

    let result = try_run(&[root.to_path_buf()], &empty_scope(), None);
    match result {
        Err(AppError::ConfigParse { path, .. }) => {
            assert_eq!(path, root.join("sub").join(".maid.json"))
        }
        other => panic!("expected a parse error, got {:?}", other.map(|(r, _)| r)),
    }
}

#[test]
fn bad_regex_in_local_rule_names_the_rule() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_file(
        root,
        "maid.json",
        r#"{"rules": [{"pattern": "*.c", "name": "broken", "start": "(", "delete": "::empty::"}]}"#,
    );

    let err = try_run(&[root.to_path_buf()], &empty_scope(), None).unwrap_err();
    assert!(matches!(err, AppError::RuleCompile { ref rule, .. } if rule == "broken"));
}

#[test]
fn output_document_is_never_aggregated() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let output = write_file(root, "_content.md", "previous run");
    let source = write_file(root, "main.py", "print('hi')\n");

    let (report, doc) = try_run(&[root.to_path_buf()], &empty_scope(), Some(&output)).unwrap();
    assert!(report.is_included(&source));
    assert!(!report.is_included(&output));
    assert!(!doc.contains("previous run"));
}

#[test]
fn files_come_before_subdirectories_in_name_order() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let nested = write_file(root, "a/inner.txt", "1");
    let b = write_file(root, "b.txt", "2");
    let z = write_file(root, "z.txt", "3");

    let (report, doc) = run(&[root.to_path_buf()], &empty_scope());
    assert_eq!(
        included_paths(&report),
        vec![b.as_path(), z.as_path(), nested.as_path()]
    );
    assert!(doc.starts_with("# Content\n\nThis file was generated by maid test\n\n"));
}

#[test]
fn global_patterns_are_anchored_at_each_root() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    let global = Rc::new(LoadedConfig {
        path: PathBuf::from("/nowhere/maid.json"),
        config: Config {
            patterns: vec!["/top.txt".to_string()],
            rules: Vec::new(),
        },
    });
    let scope = GlobalScope::new(Vec::new(), Some(global), Vec::new()).unwrap();

    let mut expected_hidden = Vec::new();
    let mut expected_visible = Vec::new();
    for root in [first.path(), second.path()] {
        expected_hidden.push(write_file(root, "top.txt", "t"));
        expected_visible.push(write_file(root, "sub/top.txt", "s"));
    }

    let (report, _) = run(
        &[first.path().to_path_buf(), second.path().to_path_buf()],
        &scope,
    );
    for path in &expected_hidden {
        assert!(!report.is_included(path), "{}", path.display());
    }
    for path in &expected_visible {
        assert!(report.is_included(path), "{}", path.display());
    }
}

#[test]
fn file_arguments_are_filtered_by_global_patterns() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let secret = write_file(root, "api.secret", "k");
    let notes = write_file(root, "notes.txt", "n");
    let scope = GlobalScope::new(Vec::new(), None, vec!["*.secret".to_string()]).unwrap();

    let (report, doc) = run(&[secret.clone(), notes.clone()], &scope);
    assert_eq!(included_paths(&report), vec![notes.as_path()]);
    assert_eq!(report.skipped, vec![secret]);
    assert!(doc.contains("```text\nn\n```"));
}

#[test]
fn missing_paths_are_skipped() {
    let dir = tempdir().unwrap();
    let (report, _) = run(&[dir.path().join("absent")], &empty_scope());
    assert!(report.included.is_empty());
    assert!(report.errors.is_empty());
}

#[test]
fn builtin_ignores_hide_vcs_and_config_files() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_file(root, ".git/HEAD", "ref: refs/heads/main");
    write_file(root, "maid.json", "{}");
    write_file(root, "pkg/node_modules/left-pad/index.js", "module.exports = 1;");
    let kept = write_file(root, "pkg/index.js", "require('left-pad');");
    let scope = GlobalScope::new(
        get_builtin_ignore_patterns().patterns.clone(),
        None,
        Vec::new(),
    )
    .unwrap();

    let (report, _) = run(&[root.to_path_buf()], &scope);
    assert_eq!(included_paths(&report), vec![kept.as_path()]);
}

#[test]
fn each_local_config_is_parsed_once_per_run() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_file(root, "maid.json", r#"{"patterns": ["*.tmp"]}"#);
    write_file(root, "a/maid.json", "{}");
    write_file(root, "a/f.txt", "f");

    let mut resolver = ConfigResolver::with_search_dirs(Vec::new());
    let mut writer = MarkdownWriter::new(Vec::new(), "<memory>", "maid test");
    let paths = [root.to_path_buf(), root.to_path_buf()];
    aggregate(&paths, &empty_scope(), &mut resolver, &mut writer, None).unwrap();
    assert_eq!(resolver.parsed_count(), 2);
}

#[test]
fn negated_directory_name_does_not_bring_back_its_files() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_file(root, "maid.json", r#"{"patterns": ["*.log", "!logs"]}"#);
    let run_log = write_file(root, "logs/run.log", "x");
    let notes = write_file(root, "logs/notes.txt", "n");

    let (report, doc) = run(&[root.to_path_buf()], &empty_scope());
    assert!(!report.is_included(&run_log));
    assert!(report.is_included(&notes));
    assert!(!doc.contains(&format!("`{}`", run_log.display())));
}

#[test]
fn unreadable_file_is_reported_and_the_scan_continues() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let vanished = root.join("vanished.txt");
    let present = write_file(root, "present.txt", "still here");
    let context = empty_scope().context_for(root).unwrap();

    let mut resolver = ConfigResolver::with_search_dirs(Vec::new());
    let mut writer = MarkdownWriter::new(Vec::new(), "<memory>", "maid test");
    let report = {
        let mut scanner = Scanner::new(&mut resolver, &mut writer);
        scanner.scan_file(&vanished, &context).unwrap();
        scanner.scan_file(&present, &context).unwrap();
        scanner.into_report()
    };

    assert_eq!(included_paths(&report), vec![present.as_path()]);
    assert!(matches!(
        report.errors.as_slice(),
        [AppError::FileRead { path, .. }] if path == &vanished
    ));
    let doc = String::from_utf8(writer.into_inner()).unwrap();
    assert!(doc.contains("still here"));
}

#[cfg(unix)]
#[test]
fn unreadable_file_in_walk_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let root = dir.path();
    let locked = write_file(root, "a_locked.txt", "secret");
    let open = write_file(root, "b_open.txt", "open");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read(&locked).is_ok() {
        // Running with privileges that bypass file modes.
        return;
    }

    let (report, doc) = run(&[root.to_path_buf()], &empty_scope());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(included_paths(&report), vec![open.as_path()]);
    assert!(matches!(
        report.errors.as_slice(),
        [AppError::FileRead { path, .. }] if path == &locked
    ));
    assert!(!doc.contains("secret"));
}

#[test]
fn unreadable_local_config_is_treated_as_absent() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_file(root, "maid.json", r#"{"patterns": ["*.tmp"]}"#);
    write_file(root, "sub/maid.json", [0xffu8, 0xfe, b'{', b'}']);
    let kept = write_file(root, "sub/a.txt", "a");
    let scratch = write_file(root, "sub/x.tmp", "t");

    let (report, _) = try_run(&[root.to_path_buf()], &empty_scope(), None).unwrap();
    assert!(report.is_included(&kept));
    assert!(!report.is_included(&scratch));
}
