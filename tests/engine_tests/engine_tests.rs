//! Tests for Engine
//!
//! These tests verify:
//! - Every entry operation (cp, show, ls, mkdir, rmdir, rm, merge, export)
//! - Replace-on-copy semantics
//! - Error kinds for missing, duplicate and mistyped entries
//! - Persistence across reopen
//! - Failed operations leave the store untouched
//! - Depth and host-source configuration

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use plusfs::host::MemoryHost;
use plusfs::{
    Command, CompactionPolicy, Config, Engine, EntryKind, Location, LogicalPath, Output, PfsError,
};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn config_for(dir: &Path) -> Config {
    Config::builder()
        .store_path(dir.join("private.pfs"))
        .compaction(CompactionPolicy::Never)
        .build()
}

fn setup_engine() -> (TempDir, Engine, Arc<MemoryHost>) {
    let temp_dir = TempDir::new().unwrap();
    let (engine, host) = open_with(config_for(temp_dir.path()));
    (temp_dir, engine, host)
}

fn open_with(config: Config) -> (Engine, Arc<MemoryHost>) {
    let host = Arc::new(MemoryHost::new());
    let engine = Engine::with_host(config, Box::new(host.clone())).unwrap();
    (engine, host)
}

fn path(raw: &str) -> LogicalPath {
    LogicalPath::parse(raw).unwrap()
}

fn sup(raw: &str) -> Location {
    Location::Supplemental(path(raw))
}

fn host(raw: &str) -> Location {
    Location::Host(PathBuf::from(raw))
}

/// Seed a host file and copy it into the store
fn put(engine: &mut Engine, host_files: &MemoryHost, dst: &str, bytes: &[u8]) {
    let src = format!("/host/{}", dst.replace('/', "_"));
    host_files.insert(src.as_str(), bytes);
    engine.cp(&host(&src), &sup(dst)).unwrap();
}

fn names(engine: &Engine, dir: &str) -> Vec<String> {
    engine
        .ls(&path(dir))
        .unwrap()
        .into_iter()
        .map(|row| row.name)
        .collect()
}

// =============================================================================
// Copy Tests
// =============================================================================

#[test]
fn test_cp_from_host_then_show() {
    let (_temp, mut engine, host_files) = setup_engine();

    put(&mut engine, &host_files, "note", b"hello world");

    assert_eq!(engine.show(&path("note")).unwrap(), b"hello world".to_vec());
}

#[test]
fn test_cp_within_store() {
    let (_temp, mut engine, host_files) = setup_engine();
    put(&mut engine, &host_files, "a", b"payload");

    engine.cp(&sup("a"), &sup("b")).unwrap();

    assert_eq!(engine.show(&path("a")).unwrap(), b"payload".to_vec());
    assert_eq!(engine.show(&path("b")).unwrap(), b"payload".to_vec());
}

#[test]
fn test_cp_empty_file() {
    let (_temp, mut engine, host_files) = setup_engine();

    put(&mut engine, &host_files, "empty", b"");

    assert!(engine.show(&path("empty")).unwrap().is_empty());
    assert_eq!(engine.ls(&path("empty")).unwrap()[0].size, 0);
}

#[test]
fn test_cp_replaces_existing_file() {
    let (_temp, mut engine, host_files) = setup_engine();
    put(&mut engine, &host_files, "a", b"old");

    put(&mut engine, &host_files, "a", b"newer");

    assert_eq!(engine.show(&path("a")).unwrap(), b"newer".to_vec());
    assert_eq!(names(&engine, "/"), vec!["a"]);

    let usage = engine.usage();
    assert_eq!(usage.active_entries, 1);
    assert_eq!(usage.tombstones, 1);
    assert_eq!(usage.garbage_bytes(), 3);
}

#[test]
fn test_cp_missing_source() {
    let (_temp, mut engine, _host_files) = setup_engine();

    let from_store = engine.cp(&sup("nope"), &sup("x"));
    let from_host = engine.cp(&host("/host/nope"), &sup("x"));

    assert!(matches!(from_store, Err(PfsError::NotFound(_))));
    assert!(matches!(from_host, Err(PfsError::NotFound(_))));
    assert!(engine.catalog().is_empty());
}

#[test]
fn test_cp_directory_source_is_not_found() {
    let (_temp, mut engine, _host_files) = setup_engine();
    engine.mkdir(&path("docs")).unwrap();

    let result = engine.cp(&sup("docs"), &sup("x"));

    assert!(matches!(result, Err(PfsError::NotFound(_))));
}

#[test]
fn test_cp_invalid_destinations() {
    let (_temp, mut engine, host_files) = setup_engine();
    put(&mut engine, &host_files, "a", b"x");

    let to_host = engine.cp(&sup("a"), &host("/host/out"));
    let to_root = engine.cp(&sup("a"), &Location::Supplemental(LogicalPath::root()));

    assert!(matches!(to_host, Err(PfsError::InvalidDestination(_))));
    assert!(matches!(to_root, Err(PfsError::InvalidDestination(_))));
}

#[test]
fn test_cp_onto_directory_fails() {
    let (_temp, mut engine, host_files) = setup_engine();
    engine.mkdir(&path("docs")).unwrap();
    host_files.insert("/host/f", "x");

    let result = engine.cp(&host("/host/f"), &sup("docs"));

    assert!(matches!(result, Err(PfsError::NotAFile(_))));
    assert!(engine.ls(&path("docs")).unwrap().is_empty());
}

#[test]
fn test_cp_parent_rules() {
    let (_temp, mut engine, host_files) = setup_engine();
    put(&mut engine, &host_files, "file", b"x");

    let missing_parent = engine.cp(&sup("file"), &sup("nodir/a"));
    let file_parent = engine.cp(&sup("file"), &sup("file/a"));

    assert!(matches!(missing_parent, Err(PfsError::NotFound(_))));
    assert!(matches!(file_parent, Err(PfsError::NotADirectory(_))));
}

#[test]
fn test_cp_into_nested_directory() {
    let (_temp, mut engine, host_files) = setup_engine();
    engine.mkdir(&path("a")).unwrap();
    engine.mkdir(&path("a/b")).unwrap();

    put(&mut engine, &host_files, "a/b/c.txt", b"deep");

    assert_eq!(engine.show(&path("/a/b/c.txt")).unwrap(), b"deep".to_vec());
    assert_eq!(names(&engine, "a"), vec!["b"]);
}

// =============================================================================
// Show/Ls Tests
// =============================================================================

#[test]
fn test_show_errors() {
    let (_temp, mut engine, _host_files) = setup_engine();
    engine.mkdir(&path("docs")).unwrap();

    assert!(matches!(engine.show(&path("missing")), Err(PfsError::NotFound(_))));
    assert!(matches!(engine.show(&path("docs")), Err(PfsError::NotAFile(_))));
    assert!(matches!(
        engine.show(&LogicalPath::root()),
        Err(PfsError::NotAFile(_))
    ));
}

#[test]
fn test_ls_root_in_creation_order() {
    let (_temp, mut engine, host_files) = setup_engine();
    put(&mut engine, &host_files, "zeta", b"1");
    engine.mkdir(&path("alpha")).unwrap();
    put(&mut engine, &host_files, "mid", b"22");

    let rows = engine.ls(&LogicalPath::root()).unwrap();

    let listed: Vec<(&str, EntryKind, u32)> = rows
        .iter()
        .map(|row| (row.name.as_str(), row.kind, row.size))
        .collect();
    assert_eq!(
        listed,
        vec![
            ("zeta", EntryKind::File, 1),
            ("alpha", EntryKind::Directory, 0),
            ("mid", EntryKind::File, 2),
        ]
    );
    assert!(rows.iter().all(|row| row.timestamp > 0));
}

#[test]
fn test_ls_file_returns_single_row() {
    let (_temp, mut engine, host_files) = setup_engine();
    put(&mut engine, &host_files, "note", b"abc");

    let rows = engine.ls(&path("note")).unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "note");
    assert_eq!(rows[0].size, 3);
}

#[test]
fn test_ls_missing_is_not_found() {
    let (_temp, engine, _host_files) = setup_engine();

    assert!(matches!(engine.ls(&path("nope")), Err(PfsError::NotFound(_))));
}

#[test]
fn test_ls_empty_store_root() {
    let (_temp, engine, _host_files) = setup_engine();

    assert!(engine.ls(&LogicalPath::root()).unwrap().is_empty());
}

// =============================================================================
// Directory Tests
// =============================================================================

#[test]
fn test_mkdir_then_ls() {
    let (_temp, mut engine, _host_files) = setup_engine();

    engine.mkdir(&path("docs")).unwrap();

    let rows = engine.ls(&LogicalPath::root()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, EntryKind::Directory);
    assert!(engine.ls(&path("docs")).unwrap().is_empty());
}

#[test]
fn test_mkdir_already_exists() {
    let (_temp, mut engine, host_files) = setup_engine();
    engine.mkdir(&path("docs")).unwrap();
    put(&mut engine, &host_files, "file", b"x");

    assert!(matches!(engine.mkdir(&path("docs")), Err(PfsError::AlreadyExists(_))));
    assert!(matches!(engine.mkdir(&path("file")), Err(PfsError::AlreadyExists(_))));
    assert!(matches!(
        engine.mkdir(&LogicalPath::root()),
        Err(PfsError::AlreadyExists(_))
    ));
}

#[test]
fn test_mkdir_missing_parent() {
    let (_temp, mut engine, _host_files) = setup_engine();

    let result = engine.mkdir(&path("a/b"));

    assert!(matches!(result, Err(PfsError::NotFound(_))));
}

#[test]
fn test_rmdir_requires_empty() {
    let (_temp, mut engine, host_files) = setup_engine();
    engine.mkdir(&path("docs")).unwrap();
    put(&mut engine, &host_files, "docs/a", b"x");

    assert!(matches!(engine.rmdir(&path("docs")), Err(PfsError::NotEmpty(_))));

    engine.rm(&path("docs/a")).unwrap();
    engine.rmdir(&path("docs")).unwrap();

    assert!(engine.ls(&LogicalPath::root()).unwrap().is_empty());
}

#[test]
fn test_rmdir_errors() {
    let (_temp, mut engine, host_files) = setup_engine();
    put(&mut engine, &host_files, "file", b"x");

    assert!(matches!(engine.rmdir(&path("missing")), Err(PfsError::NotFound(_))));
    assert!(matches!(engine.rmdir(&path("file")), Err(PfsError::NotFound(_))));
    assert!(matches!(
        engine.rmdir(&LogicalPath::root()),
        Err(PfsError::InvalidPath(_))
    ));
}

#[test]
fn test_recreate_directory_after_rmdir() {
    let (_temp, mut engine, _host_files) = setup_engine();
    engine.mkdir(&path("docs")).unwrap();
    engine.rmdir(&path("docs")).unwrap();

    engine.mkdir(&path("docs")).unwrap();

    assert_eq!(names(&engine, "/"), vec!["docs"]);
}

// =============================================================================
// Remove Tests
// =============================================================================

#[test]
fn test_rm_twice() {
    let (_temp, mut engine, host_files) = setup_engine();
    put(&mut engine, &host_files, "a", b"abc");

    engine.rm(&path("a")).unwrap();
    let second = engine.rm(&path("a"));

    assert!(matches!(second, Err(PfsError::NotFound(_))));
    assert!(matches!(engine.show(&path("a")), Err(PfsError::NotFound(_))));
}

#[test]
fn test_rm_directory_is_not_found() {
    let (_temp, mut engine, _host_files) = setup_engine();
    engine.mkdir(&path("docs")).unwrap();

    let result = engine.rm(&path("docs"));

    assert!(matches!(result, Err(PfsError::NotFound(_))));
    assert_eq!(names(&engine, "/"), vec!["docs"]);
}

#[test]
fn test_rm_leaves_siblings() {
    let (_temp, mut engine, host_files) = setup_engine();
    put(&mut engine, &host_files, "a", b"AAA");
    put(&mut engine, &host_files, "b", b"BBB");
    put(&mut engine, &host_files, "c", b"CCC");

    engine.rm(&path("b")).unwrap();

    assert_eq!(names(&engine, "/"), vec!["a", "c"]);
    assert_eq!(engine.show(&path("c")).unwrap(), b"CCC".to_vec());
}

// =============================================================================
// Merge Tests
// =============================================================================

#[test]
fn test_merge_concatenates() {
    let (_temp, mut engine, host_files) = setup_engine();
    put(&mut engine, &host_files, "x", b"AB");
    host_files.insert("/host/y", "CD");

    engine.merge(&sup("x"), &host("/host/y"), &sup("z")).unwrap();

    assert_eq!(engine.show(&path("z")).unwrap(), b"ABCD".to_vec());
}

#[test]
fn test_merge_onto_one_of_its_sources() {
    let (_temp, mut engine, host_files) = setup_engine();
    put(&mut engine, &host_files, "x", b"AB");
    put(&mut engine, &host_files, "y", b"CD");

    engine.merge(&sup("x"), &sup("y"), &sup("x")).unwrap();

    assert_eq!(engine.show(&path("x")).unwrap(), b"ABCD".to_vec());
    assert_eq!(names(&engine, "/"), vec!["y", "x"]);
}

#[test]
fn test_merge_missing_source_writes_nothing() {
    let (_temp, mut engine, host_files) = setup_engine();
    put(&mut engine, &host_files, "x", b"AB");
    let before = fs::read(engine.store_path()).unwrap();

    let result = engine.merge(&sup("x"), &sup("missing"), &sup("z"));

    assert!(matches!(result, Err(PfsError::NotFound(_))));
    assert!(matches!(engine.show(&path("z")), Err(PfsError::NotFound(_))));
    assert_eq!(fs::read(engine.store_path()).unwrap(), before);
}

#[test]
fn test_merge_invalid_destination() {
    let (_temp, mut engine, host_files) = setup_engine();
    put(&mut engine, &host_files, "x", b"AB");

    let result = engine.merge(&sup("x"), &sup("x"), &host("/host/out"));

    assert!(matches!(result, Err(PfsError::InvalidDestination(_))));
}

// =============================================================================
// Export Tests
// =============================================================================

#[test]
fn test_export_to_host() {
    let (_temp, mut engine, host_files) = setup_engine();
    put(&mut engine, &host_files, "note", b"exported");

    engine.export(&path("note"), Path::new("/host/out.txt")).unwrap();

    assert_eq!(
        host_files.get(Path::new("/host/out.txt")),
        Some(b"exported".to_vec())
    );
}

#[test]
fn test_export_directory_is_not_found() {
    let (_temp, mut engine, host_files) = setup_engine();
    engine.mkdir(&path("docs")).unwrap();

    let result = engine.export(&path("docs"), Path::new("/host/out"));

    assert!(matches!(result, Err(PfsError::NotFound(_))));
    assert!(host_files.get(Path::new("/host/out")).is_none());
}

// =============================================================================
// Execute Tests
// =============================================================================

#[test]
fn test_execute_routes_commands() {
    let (_temp, mut engine, host_files) = setup_engine();
    host_files.insert("/host/a", "abc");

    let done = engine
        .execute(Command::Cp {
            src: host("/host/a"),
            dst: sup("a"),
        })
        .unwrap();
    let shown = engine.execute(Command::Show { path: path("a") }).unwrap();
    let usage = engine.execute(Command::Stat).unwrap();

    assert_eq!(done, Output::Done);
    assert_eq!(shown, Output::Content(b"abc".to_vec()));
    match usage {
        Output::Usage(usage) => assert_eq!(usage.live_bytes, 3),
        other => panic!("expected usage, got {:?}", other),
    }
}

#[test]
fn test_execute_propagates_errors() {
    let (_temp, mut engine, _host_files) = setup_engine();

    let result = engine.execute(Command::Rm { path: path("ghost") });

    assert!(matches!(result, Err(PfsError::NotFound(_))));
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_state_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let (mut engine, host_files) = open_with(config_for(temp_dir.path()));
        engine.mkdir(&path("docs")).unwrap();
        put(&mut engine, &host_files, "docs/a", b"first");
        put(&mut engine, &host_files, "b", b"second");
        engine.rm(&path("b")).unwrap();
    }

    let (engine, _host_files) = open_with(config_for(temp_dir.path()));

    assert_eq!(engine.show(&path("docs/a")).unwrap(), b"first".to_vec());
    assert!(matches!(engine.show(&path("b")), Err(PfsError::NotFound(_))));
    assert_eq!(names(&engine, "/"), vec!["docs"]);
}

#[test]
fn test_failed_operation_leaves_file_unchanged() {
    let (_temp, mut engine, host_files) = setup_engine();
    engine.mkdir(&path("docs")).unwrap();
    put(&mut engine, &host_files, "docs/a", b"x");
    let before = fs::read(engine.store_path()).unwrap();

    assert!(engine.rmdir(&path("docs")).is_err());
    assert!(engine.mkdir(&path("docs")).is_err());
    assert!(engine.rm(&path("nope")).is_err());
    assert!(engine.cp(&sup("nope"), &sup("y")).is_err());

    assert_eq!(fs::read(engine.store_path()).unwrap(), before);
}

#[test]
fn test_overlong_name_rejected_before_append() {
    let (_temp, mut engine, host_files) = setup_engine();
    host_files.insert("/host/f", vec![7u8; 100]);
    let before = fs::read(engine.store_path()).unwrap();

    // Built with join, so parse-time checks are bypassed
    let long = Location::Supplemental(LogicalPath::root().join(&"n".repeat(70_000)));
    let copied = engine.cp(&host("/host/f"), &long);
    let merged = engine.merge(&host("/host/f"), &host("/host/f"), &long);
    let made = engine.mkdir(&LogicalPath::root().join(&"n".repeat(70_000)));

    for result in [copied, merged, made] {
        match result {
            Err(e @ PfsError::InvalidPath(_)) => assert_eq!(e.exit_code(), 4),
            other => panic!("expected InvalidPath, got {:?}", other),
        }
    }
    assert_eq!(fs::read(engine.store_path()).unwrap(), before);
    assert!(engine.catalog().is_empty());
}

#[test]
fn test_overlong_token_rejected_at_parse() {
    let token = format!("+{}", "n".repeat(70_000));

    assert!(matches!(
        Location::resolve(&token),
        Err(PfsError::InvalidPath(_))
    ));
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_flat_namespace() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .store_path(temp_dir.path().join("flat.pfs"))
        .max_depth(Some(1))
        .build();
    let (mut engine, host_files) = open_with(config);
    engine.mkdir(&path("docs")).unwrap();
    host_files.insert("/host/f", "x");

    let nested_dir = engine.mkdir(&path("docs/sub"));
    let nested_file = engine.cp(&host("/host/f"), &sup("docs/f"));

    assert!(matches!(nested_dir, Err(PfsError::InvalidPath(_))));
    assert!(matches!(nested_file, Err(PfsError::InvalidPath(_))));
    engine.cp(&host("/host/f"), &sup("f")).unwrap();
}

#[test]
fn test_host_sources_disabled() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .store_path(temp_dir.path().join("private.pfs"))
        .allow_host_sources(false)
        .build();
    let (mut engine, host_files) = open_with(config);
    host_files.insert("/host/f", "x");

    let result = engine.cp(&host("/host/f"), &sup("f"));

    assert!(matches!(result, Err(PfsError::InvalidSource(_))));
    assert!(engine.catalog().is_empty());
}
