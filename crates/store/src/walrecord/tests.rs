use super::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn validate_add_key_rejects_space() {
    assert_eq!(validate_add_key(b"has space"), Err(GrammarError::KeyHasSpace));
}

#[test]
fn validate_add_key_rejects_delimiter() {
    assert_eq!(validate_add_key(b"k == x"), Err(GrammarError::KeyHasDelimiter));
}

#[test]
fn validate_add_key_rejects_newline() {
    assert_eq!(validate_add_key(b"k\nx"), Err(GrammarError::KeyHasNewline));
}

#[test]
fn validate_add_key_rejects_empty() {
    assert_eq!(validate_add_key(b""), Err(GrammarError::EmptyKey));
}

#[test]
fn validate_add_key_accepts_plain_key() {
    assert!(validate_add_key(b"alpha").is_ok());
}

#[test]
fn validate_remove_key_allows_spaces() {
    assert!(validate_remove_key(b"has space").is_ok());
}

#[test]
fn append_add_then_remove_produces_spec_grammar() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.log");
    let lock = Mutex::new(());

    append_add(&path, &lock, b"x", b"hello world").unwrap();
    append_remove(&path, &lock, b"x").unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let mut lines = contents.lines();
    assert_eq!(lines.next().unwrap(), "Add == x hello world");
    assert_eq!(lines.next().unwrap(), "Remove == x");
    assert!(lines.next().is_none());
}

#[test]
fn append_adds_writes_one_line_per_pair_in_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.log");
    let lock = Mutex::new(());

    let pairs = vec![
        (b"a".to_vec(), b"1".to_vec()),
        (b"b".to_vec(), b"2".to_vec()),
        (b"c".to_vec(), b"3".to_vec()),
    ];
    append_adds(&path, &lock, &pairs).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines, vec!["Add == a 1", "Add == b 2", "Add == c 3"]);
}
