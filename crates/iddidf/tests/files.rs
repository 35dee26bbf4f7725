//! Path-based reading and writing.

use std::fs;
use std::sync::Arc;

use iddidf::{
    parse_document_file, parse_schema_file, validate_document, AccessProblem, Error, FieldFlag,
    SchemaCache,
};
use tempfile::TempDir;

const DICTIONARY: &str = r"!IDD_Version 9.4.0
!IDD_BUILD 998c4b761e
\group Simulation Parameters

Version,
      \unique-object
      \format singleLine
  A1 ; \field Version Identifier

\group Thermal Zones

Zone,
  A1 , \field Name
       \required-field
  N1 ; \field Multiplier
       \units dimensionless
       \minimum 1
";

const DOCUMENT: &str = "
Version,9.4;

! The only zone
Zone,
  Core,                    !- Name
  2;                       !- Multiplier
";

fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_parse_files_and_validate() {
    let dir = TempDir::new().unwrap();
    let idd = write(&dir, "Energy+.idd", DICTIONARY);
    let idf = write(&dir, "in.idf", DOCUMENT);

    let schema = parse_schema_file(&idd, None).unwrap();
    assert_eq!(schema.descriptor, idd.to_string_lossy());
    assert_eq!(schema.groups.len(), 2);

    let mut doc = parse_document_file(&idf).unwrap();
    assert_eq!(doc.descriptor, idf.to_string_lossy());
    assert_eq!(doc.version, "9.4");
    assert!(validate_document(&mut doc, &schema).is_empty());
}

#[test]
fn test_write_then_reread() {
    let dir = TempDir::new().unwrap();
    let idd = write(&dir, "Energy+.idd", DICTIONARY);
    let idf = write(&dir, "in.idf", DOCUMENT);
    let schema = parse_schema_file(&idd, None).unwrap();
    let doc = parse_document_file(&idf).unwrap();

    let out = dir.path().join("out.idf");
    doc.write_to_path(&out, Some(&schema)).unwrap();
    let written = fs::read_to_string(&out).unwrap();
    assert!(written.contains("Version,9.4;"));
    assert!(written.contains("! The only zone"));
    assert!(written.contains("!- Multiplier {dimensionless}"));

    let reread = parse_document_file(&out).unwrap();
    assert_eq!(reread.entries, doc.entries);
}

#[test]
fn test_write_to_missing_directory() {
    let dir = TempDir::new().unwrap();
    let idf = write(&dir, "in.idf", DOCUMENT);
    let doc = parse_document_file(&idf).unwrap();

    let err = doc
        .write_to_path(dir.path().join("no/such/dir/out.idf"), None)
        .unwrap_err();
    match err {
        Error::Access(e) => assert_eq!(e.problem, AccessProblem::CannotWriteFile),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_and_unreadable_files() {
    let dir = TempDir::new().unwrap();
    match parse_schema_file(dir.path().join("absent.idd"), None) {
        Err(Error::Access(e)) => assert_eq!(e.problem, AccessProblem::CannotFindFile),
        other => panic!("unexpected result: {other:?}"),
    }
    // a directory exists but cannot be read as text
    match parse_document_file(dir.path()) {
        Err(Error::Access(e)) => assert_eq!(e.problem, AccessProblem::CannotReadFile),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_cache_shared_between_files() {
    let dir = TempDir::new().unwrap();
    let first = write(&dir, "a.idd", DICTIONARY);
    let second = write(&dir, "b.idd", &DICTIONARY.replace("Zone,", "Space,"));
    let cache = SchemaCache::new();

    let a = parse_schema_file(&first, Some(&cache)).unwrap();
    let b = parse_schema_file(&second, Some(&cache)).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(b.lookup("Space").record_type().is_none());
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_latin1_dictionary_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("latin1.idd");
    let mut bytes = DICTIONARY.as_bytes().to_vec();
    bytes.extend_from_slice(b"       \\note degrees \xB0C\n");
    fs::write(&path, bytes).unwrap();

    let schema = parse_schema_file(&path, None).unwrap();
    let zone = schema.lookup("Zone").record_type().unwrap();
    assert_eq!(zone.fields[1].first_value(FieldFlag::Note), Some("degrees \u{FFFD}C"));
}
