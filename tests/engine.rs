//! End-to-end runs over scratch trees, driven through `Options` the way the
//! command line drives them.

use far::config::{Options, Target};
use far::report::{Recorder, Summary};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sample");

/// Scratch dir holding a copy of every sample fixture.
fn sample_tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for entry in fs::read_dir(FIXTURES).unwrap() {
        let entry = entry.unwrap();
        fs::copy(entry.path(), dir.path().join(entry.file_name())).unwrap();
    }
    dir
}

fn options(root: &Path, find: &str, replace: &str, targets: &[Target]) -> Options {
    Options {
        base_dir: root.to_path_buf(),
        find_regex: find.to_string(),
        replace_value: replace.to_string(),
        targets: targets.to_vec(),
        ..Options::default()
    }
}

fn run(options: &Options) -> (Summary, Recorder) {
    let mut rec = Recorder::default();
    let config = options.resolve(&mut rec).unwrap();
    let summary = far::run(&config, &mut rec).unwrap();
    (summary, rec)
}

/// Sorted listing of every entry below `root`, directories marked with `/`.
fn listing(root: &Path) -> String {
    WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| {
            let entry = entry.unwrap();
            let rel = entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            if entry.file_type().is_dir() {
                format!("{}/", rel)
            } else {
                rel
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

fn nested_dirs(root: &Path) -> PathBuf {
    let top = root.join("test-top-directory");
    fs::create_dir_all(top.join("test-sub-directory")).unwrap();
    top
}

#[test]
fn replaces_word_in_note() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("note.txt"), "hello asdf world\n").unwrap();

    run(&options(dir.path(), "asdf", "XYZ", &[Target::FileContents]));

    assert_eq!(read(dir.path(), "note.txt"), "hello XYZ world\n");
}

#[test]
fn file_contents_replace_all() {
    let dir = sample_tree();
    let (summary, _) = run(&options(
        dir.path(),
        "asdf",
        "value successfully replaced",
        &[Target::FileContents],
    ));

    for file in ["test-file.txt", "test-file.xml", "test-file.yml"] {
        let contents = read(dir.path(), file);
        assert!(contents.contains("value successfully replaced"), "{file}");
        assert!(!contents.contains("asdf"), "{file}");
    }
    assert_eq!(summary.files_rewritten, 3);
}

#[test]
fn file_contents_empty_replacement() {
    let dir = sample_tree();
    run(&options(dir.path(), "asdf", "", &[Target::FileContents]));

    assert_eq!(read(dir.path(), "test-file.yml"), "key: \nnested:\n  value: \n");
    assert!(!read(dir.path(), "test-file.txt").contains("asdf"));
}

#[test]
fn file_contents_replace_first_touches_one_line() {
    let dir = sample_tree();
    let mut opts = options(dir.path(), "asdf", "X", &[Target::FileContents]);
    opts.replace_all = false;
    run(&opts);

    assert_eq!(
        read(dir.path(), "test-file.txt"),
        "This is a test file.\nX\nIt has asdf in the middle of a line.\nLast line mentions asdf too.\n"
    );
    assert_eq!(read(dir.path(), "test-file.yml"), "key: X\nnested:\n  value: asdf\n");
}

#[test]
fn whole_document_pattern_spans_lines() {
    let dir = sample_tree();
    let mut opts = options(
        dir.path(),
        r"[\r|\n|\r\n]*asdf[\r|\n|\r\n]*",
        "",
        &[Target::FileContents],
    );
    opts.file_masks = vec!["test-file.txt".to_string()];
    opts.line_based = false;
    let (summary, _) = run(&opts);

    assert_eq!(
        read(dir.path(), "test-file.txt"),
        "This is a test file.It has  in the middle of a line.\nLast line mentions  too.\n"
    );
    assert_eq!(summary.files_rewritten, 1);
    assert!(read(dir.path(), "test-file.xml").contains("asdf"));
}

#[test]
fn whole_document_multi_line_anchors() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("list.txt"), "keep\ndrop\nkeep\n").unwrap();
    let mut opts = options(dir.path(), r"^drop\n", "", &[Target::FileContents]);
    opts.line_based = false;
    run(&opts);

    assert_eq!(read(dir.path(), "list.txt"), "keep\nkeep\n");
}

#[test]
fn no_match_leaves_files_untouched_in_both_modes() {
    let dir = sample_tree();
    let file = dir.path().join("test-file.txt");
    let before = fs::metadata(&file).unwrap().modified().unwrap();

    for line_based in [true, false] {
        let mut opts = options(dir.path(), "zzz-not-there", "X", &[Target::FileContents]);
        opts.line_based = line_based;
        let (summary, _) = run(&opts);
        assert_eq!(summary.files_rewritten, 0);
    }

    assert_eq!(fs::metadata(&file).unwrap().modified().unwrap(), before);
    insta::assert_snapshot!(listing(dir.path()), @r"
    test-file.txt
    test-file.xml
    test-file.yml
    ");
}

#[test]
fn latin1_contents_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("non-utf");
    fs::write(&file, b"test \xe0\xe1\xe2\xe3\xe4\xe5\xe6\xe7\xe8\xe9\xea\xeb\xec\xed\xee\xef\ntest\n").unwrap();

    let mut opts = options(
        dir.path(),
        "\u{ec}\u{ed}\u{ee}\u{ef}",
        "value successfully replaced",
        &[Target::FileContents],
    );
    opts.encoding = Some("ISO-8859-1".to_string());
    run(&opts);
    assert_eq!(
        fs::read(&file).unwrap(),
        b"test \xe0\xe1\xe2\xe3\xe4\xe5\xe6\xe7\xe8\xe9\xea\xebvalue successfully replaced\ntest\n"
    );

    let mut opts = options(dir.path(), "test", "\u{e7}\u{e5}\u{e6}", &[Target::FileContents]);
    opts.encoding = Some("ISO-8859-1".to_string());
    opts.replace_all = false;
    run(&opts);
    assert_eq!(
        fs::read(&file).unwrap(),
        b"\xe7\xe5\xe6 \xe0\xe1\xe2\xe3\xe4\xe5\xe6\xe7\xe8\xe9\xea\xebvalue successfully replaced\ntest\n"
    );
}

#[test]
fn invalid_encoding_warns_and_uses_utf8() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("note.txt"), "caf\u{e9} asdf\n").unwrap();

    let mut opts = options(dir.path(), "asdf", "ok", &[Target::FileContents]);
    opts.encoding = Some("not-a-charset".to_string());
    let (_, rec) = run(&opts);

    assert_eq!(
        rec.warnings,
        vec!["Invalid encoding value not-a-charset. Using default charset."]
    );
    assert_eq!(read(dir.path(), "note.txt"), "caf\u{e9} ok\n");
}

#[test]
fn directory_names_top_level_only() {
    let dir = tempfile::tempdir().unwrap();
    nested_dirs(dir.path());

    run(&options(dir.path(), "-", "_", &[Target::DirectoryNames]));

    insta::assert_snapshot!(listing(dir.path()), @r"
    test_top_directory/
    test_top_directory/test-sub-directory/
    ");
}

#[test]
fn directory_names_recursive_replace_first() {
    let dir = tempfile::tempdir().unwrap();
    nested_dirs(dir.path());

    let mut opts = options(dir.path(), "-", "_", &[Target::DirectoryNames]);
    opts.recursive = true;
    opts.replace_all = false;
    run(&opts);

    insta::assert_snapshot!(listing(dir.path()), @r"
    test_top-directory/
    test_top-directory/test_sub-directory/
    ");
}

#[test]
fn directory_exclusion_skips_rename_not_descent() {
    let dir = tempfile::tempdir().unwrap();
    nested_dirs(dir.path());

    let mut opts = options(dir.path(), "-", "_", &[Target::DirectoryNames]);
    opts.recursive = true;
    opts.exclusions = vec!["-top-".to_string()];
    let (summary, rec) = run(&opts);

    insta::assert_snapshot!(listing(dir.path()), @r"
    test-top-directory/
    test-top-directory/test_sub_directory/
    ");
    assert_eq!(summary.directories_renamed, 1);
    assert!(rec.infos.contains(&"Renaming test-sub-directory to test_sub_directory".to_string()));
}

#[test]
fn filenames_non_recursive() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("test-directory")).unwrap();
    fs::write(dir.path().join("some_file_name"), "").unwrap();
    fs::write(dir.path().join("test-directory/some_file_name"), "").unwrap();

    run(&options(dir.path(), "_", "-", &[Target::Filenames]));

    insta::assert_snapshot!(listing(dir.path()), @r"
    some-file-name
    test-directory/
    test-directory/some_file_name
    ");
}

#[test]
fn filenames_recursive_replace_first() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("test-directory")).unwrap();
    fs::write(dir.path().join("some_file_name"), "").unwrap();
    fs::write(dir.path().join("test-directory/some_file_name"), "").unwrap();

    let mut opts = options(dir.path(), "_", "-", &[Target::Filenames]);
    opts.recursive = true;
    opts.replace_all = false;
    run(&opts);

    insta::assert_snapshot!(listing(dir.path()), @r"
    some-file_name
    test-directory/
    test-directory/some-file_name
    ");
}

#[test]
fn rename_then_descend_reaches_children() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("test-dir")).unwrap();
    fs::write(dir.path().join("test-dir/inner.txt"), "left-right\n").unwrap();

    let mut opts = options(
        dir.path(),
        "-",
        "_",
        &[Target::DirectoryNames, Target::FileContents],
    );
    opts.recursive = true;
    let (summary, _) = run(&opts);

    insta::assert_snapshot!(listing(dir.path()), @r"
    test_dir/
    test_dir/inner.txt
    ");
    assert_eq!(read(dir.path(), "test_dir/inner.txt"), "left_right\n");
    assert_eq!(summary.entries_visited, 2);
}

#[test]
fn all_targets_in_deep_tree() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("a-1/b-2/c-3")).unwrap();
    fs::write(dir.path().join("a-1/b-2/c-3/deep-file.txt"), "x-y\n").unwrap();
    fs::write(dir.path().join("a-1/top-file.txt"), "p-q\n").unwrap();

    let mut opts = options(dir.path(), "-", "_", &Target::ALL);
    opts.recursive = true;
    let (summary, rec) = run(&opts);

    insta::assert_snapshot!(listing(dir.path()), @r"
    a_1/
    a_1/b_2/
    a_1/b_2/c_3/
    a_1/b_2/c_3/deep_file.txt
    a_1/top_file.txt
    ");
    assert_eq!(read(dir.path(), "a_1/b_2/c_3/deep_file.txt"), "x_y\n");
    assert_eq!(read(dir.path(), "a_1/top_file.txt"), "p_q\n");
    assert_eq!(
        summary,
        Summary {
            entries_visited: 5,
            directories_renamed: 3,
            files_renamed: 2,
            files_rewritten: 2,
            files_undecodable: 0,
        }
    );
    let renames: Vec<_> = rec
        .infos
        .iter()
        .filter(|l| l.starts_with("Renaming"))
        .collect();
    assert_eq!(
        renames,
        vec![
            "Renaming a-1 to a_1",
            "Renaming b-2 to b_2",
            "Renaming c-3 to c_3",
            "Renaming deep-file.txt to deep_file.txt",
            "Renaming top-file.txt to top_file.txt",
        ]
    );
}

#[test]
fn file_masks_filter_files_only() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("folder.xml")).unwrap();
    for name in ["report.xml", "report.yml", "report.xmlx"] {
        fs::write(dir.path().join(name), "asdf\n").unwrap();
    }

    let mut opts = options(dir.path(), "asdf", "done", &[Target::FileContents]);
    opts.file_masks = vec![".xml".to_string(), ".yml".to_string()];
    let (summary, _) = run(&opts);

    assert_eq!(read(dir.path(), "report.xml"), "done\n");
    assert_eq!(read(dir.path(), "report.yml"), "done\n");
    assert_eq!(read(dir.path(), "report.xmlx"), "asdf\n");
    assert_eq!(summary.files_rewritten, 2);
}

#[test]
fn dangling_group_reference_is_rejected_before_running() {
    let dir = sample_tree();
    let mut rec = Recorder::default();
    let err = options(dir.path(), "asdf", "$1", &[Target::FileContents])
        .resolve(&mut rec)
        .unwrap_err();

    assert!(err.to_string().contains("capture group '1'"));
    assert!(read(dir.path(), "test-file.txt").contains("asdf"));
}

#[test]
fn escaped_dollar_writes_literal_reference() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("price.txt"), "cost: asdf\n").unwrap();

    run(&options(dir.path(), "asdf", "$$1", &[Target::FileContents]));

    assert_eq!(read(dir.path(), "price.txt"), "cost: $1\n");
}

#[test]
fn capture_groups_feed_renames() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("v1-report.txt"), "").unwrap();

    run(&options(
        dir.path(),
        r"^v(\d+)-(\w+)",
        "${2}_v$1",
        &[Target::Filenames],
    ));

    insta::assert_snapshot!(listing(dir.path()), @"report_v1.txt");
}
