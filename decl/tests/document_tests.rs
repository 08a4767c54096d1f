use std::fs;

use cmdline_core::{ErrorMode, GroupConstraint, ParseError};
use cmdline_decl::{Document, DocumentError};
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const COMPILER_YAML: &str = r#"
config:
  error_mode: accumulate
options:
  - name: v|verbose
    kind: bool
    formatting: grouping
    occurrence: zero_or_more
  - name: c
    kind: bool
    formatting: grouping
  - name: o|output
    arg_name: file
    arg: required
    formatting: grouping
  - name: I
    arg_name: dir
    multiple: true
    formatting: prefix
    default: [/usr/include]
  - name: std
    values: { c99: 99, c11: 11 }
    arg: required
  - name: ""
    arg_name: level
    values: { O0: 0, O1: 1, O2: 2 }
    arg: disallowed
    default: 0
  - name: W
    multiple: true
    arg: required
    comma_separated: true
    formatting: may_prefix
  - name: files
    multiple: true
    formatting: positional
    occurrence: one_or_more
groups:
  - name: stage
    constraint: zero_or_one
    members: [c, output]
"#;

fn compiler() -> Document {
    Document::from_yaml_str(COMPILER_YAML).unwrap()
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[test]
fn test_load_yaml_and_json_files() {
    let dir = tempfile::tempdir().unwrap();

    let yaml = dir.path().join("compiler.yaml");
    fs::write(&yaml, COMPILER_YAML).unwrap();
    let from_yaml = Document::load(&yaml).unwrap();
    assert_eq!(from_yaml, compiler());

    let json = dir.path().join("compiler.json");
    fs::write(&json, serde_json::to_string_pretty(&from_yaml).unwrap()).unwrap();
    let from_json = Document::load(&json).unwrap();
    assert_eq!(from_json, from_yaml);
    assert_eq!(from_json.groups[0].constraint, GroupConstraint::ZeroOrOne);
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Document::load(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, DocumentError::IoError(_)));
}

#[test]
fn test_malformed_documents() {
    assert!(matches!(
        Document::from_str_detect("{\"options\": 3}"),
        Err(DocumentError::JsonError(_))
    ));
    assert!(matches!(
        Document::from_str_detect("options:\n  - kind: decimal\n"),
        Err(DocumentError::YamlError(_))
    ));
}

#[test]
fn test_config_section() {
    let doc = Document::from_yaml_str(
        "config:\n  error_mode: stop_on_first\n  max_response_files: 3\n",
    )
    .unwrap();
    assert_eq!(doc.config.error_mode, ErrorMode::StopOnFirst);
    assert_eq!(doc.config.max_response_files, 3);
    assert!(doc.config.response_files);
    assert!(doc.options.is_empty());
}

// ---------------------------------------------------------------------------
// Parsing through a document
// ---------------------------------------------------------------------------

#[test]
fn test_compiler_command_line() {
    let mut decl = compiler().build().unwrap();
    let report = decl.parse([
        "-vvc", "-Isrc", "--std", "c11", "-O2", "-Wall,extra", "-W", "error", "main.c", "util.c",
    ]);
    assert!(report.success, "{:?}", report.errors);

    let options = &report.options;
    assert_eq!(options["v"].count, 2);
    assert_eq!(options["c"].value, json!(true));
    assert_eq!(options["I"].value, json!(["/usr/include", "src"]));
    assert_eq!(options["std"].value, json!(11));
    assert_eq!(options["level"].value, json!(2));
    assert_eq!(options["W"].value, json!(["all", "extra", "error"]));
    assert_eq!(options["W"].count, 3);
    assert_eq!(options["files"].value, json!(["main.c", "util.c"]));
    assert_eq!(options["o"].count, 0);
}

#[test]
fn test_compiler_errors_accumulate() {
    let mut decl = compiler().build().unwrap();
    let report = decl.parse(["-c", "-o", "a.out", "--std=c89", "-q"]);

    assert!(!report.success);
    let kinds: Vec<&str> = report
        .errors
        .iter()
        .map(|e| match e {
            ParseError::InvalidArgument { .. } => "invalid",
            ParseError::UnknownOption { .. } => "unknown",
            ParseError::GroupConstraintViolated { .. } => "group",
            ParseError::MissingRequiredOption { .. } => "missing",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, ["invalid", "unknown", "group", "missing"]);
}

#[test]
fn test_nameless_default_survives_without_occurrence() {
    let mut decl = compiler().build().unwrap();
    let report = decl.parse(["x.c"]);
    assert!(report.success);
    assert_eq!(report.options["level"].value, json!(0));
    assert_eq!(report.options["level"].count, 0);
}

#[test]
fn test_response_file_through_document() {
    let dir = tempfile::tempdir().unwrap();
    let rsp = dir.path().join("args.rsp");
    fs::write(&rsp, "-Iinclude\n'my file.c'\n").unwrap();

    let mut decl = compiler().build().unwrap();
    let report = decl.expand_and_parse([format!("@{}", rsp.display()), "-v".to_string()]);
    assert!(report.success, "{:?}", report.errors);
    assert_eq!(report.options["files"].value, json!(["my file.c"]));
    assert_eq!(report.options["I"].value, json!(["/usr/include", "include"]));
    assert_eq!(report.options["v"].count, 1);
}

#[test]
fn test_ignore_unknowns_from_config() {
    let doc = Document::from_yaml_str(
        "config:\n  ignore_unknowns: true\noptions:\n  - name: keep\n    kind: bool\n",
    )
    .unwrap();
    let mut decl = doc.build().unwrap();

    let report = decl.parse(["--keep", "--drop", "stray"]);
    assert!(report.success);
    assert_eq!(report.unknowns, ["--drop", "stray"]);
}

#[test]
fn test_hidden_and_consume_after_flags() {
    let doc = Document::from_yaml_str(
        r#"
options:
  - name: debug
    kind: bool
    hidden: true
  - name: command
    formatting: positional
    consume_after: true
  - name: args
    multiple: true
    formatting: positional
"#,
    )
    .unwrap();
    let mut decl = doc.build().unwrap();
    assert!(decl.cmd().find("debug").unwrap().is_hidden());

    let report = decl.parse(["--debug", "exec", "--debug", "-x"]);
    assert!(report.success);
    assert_eq!(report.options["debug"].count, 1);
    assert_eq!(report.options["command"].value, json!("exec"));
    assert_eq!(report.options["args"].value, json!(["--debug", "-x"]));
}

// ---------------------------------------------------------------------------
// Report names
// ---------------------------------------------------------------------------

fn duplicate_name(yaml: &str) -> String {
    match Document::from_yaml_str(yaml).unwrap().build() {
        Err(DocumentError::DuplicateName { name }) => name,
        other => panic!("expected DuplicateName, got {other:?}"),
    }
}

#[test]
fn test_positional_named_like_option_is_rejected() {
    let name = duplicate_name(
        r#"
options:
  - name: files
    arg: required
  - name: files
    multiple: true
    formatting: positional
"#,
    );
    assert_eq!(name, "files");
}

#[test]
fn test_positional_named_like_secondary_alias_is_rejected() {
    let name = duplicate_name(
        r#"
options:
  - name: f|files
    arg: required
  - name: files
    formatting: positional
"#,
    );
    assert_eq!(name, "files");
}

#[test]
fn test_nameless_options_need_distinct_labels() {
    let name = duplicate_name(
        r#"
options:
  - name: ""
    values: { O0: 0, O1: 1 }
  - name: ""
    values: { g0: 0, g1: 1 }
"#,
    );
    assert_eq!(name, "arg");

    let doc = Document::from_yaml_str(
        r#"
options:
  - name: ""
    arg_name: opt
    values: { O0: 0, O1: 1 }
  - name: ""
    arg_name: debug
    values: { g0: 0, g1: 1 }
"#,
    )
    .unwrap();
    let mut decl = doc.build().unwrap();
    let report = decl.parse(["-O1", "-g0"]);
    assert!(report.success, "{:?}", report.errors);
    assert_eq!(report.options.len(), 2);
    assert_eq!(report.options["opt"].value, json!(1));
    assert_eq!(report.options["debug"].value, json!(0));
}
