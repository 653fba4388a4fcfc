/*!
 * Unit tests for file system utilities
 */

use decktrans::file_utils::FileManager;
use std::fs;
use std::path::PathBuf;

use crate::common;

#[test]
fn test_generateOutputPath_shouldAppendLanguageSuffix() {
    let path = FileManager::generate_output_path("/decks/quarterly.pptx", "/out", "ja");
    assert_eq!(path, PathBuf::from("/out/quarterly_ja.pptx"));
}

#[test]
fn test_generateOutputPath_shouldDefaultExtension() {
    let path = FileManager::generate_output_path("/decks/quarterly", "/out", "fr");
    assert_eq!(path, PathBuf::from("/out/quarterly_fr.pptx"));
}

#[test]
fn test_ensureDir_shouldCreateNestedDirectories() {
    let temp = common::create_temp_dir().unwrap();
    let nested = temp.path().join("a/b/c");

    FileManager::ensure_dir(&nested).unwrap();
    assert!(FileManager::dir_exists(&nested));

    // Idempotent on existing directories
    FileManager::ensure_dir(&nested).unwrap();
}

#[test]
fn test_findFiles_shouldFindPptxRecursively() {
    let temp = common::create_temp_dir().unwrap();
    let sub = temp.path().join("nested");
    fs::create_dir(&sub).unwrap();

    common::write_pptx(temp.path(), "b.pptx", &[]);
    common::write_pptx(&sub, "a.pptx", &[]);
    common::create_test_file(temp.path(), "notes.txt", "ignore me").unwrap();

    let found = FileManager::find_files(temp.path(), "pptx").unwrap();

    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|p| p.extension().unwrap() == "pptx"));
    // Results are sorted for deterministic processing order
    assert!(found.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_findFiles_shouldMatchExtensionCaseInsensitively() {
    let temp = common::create_temp_dir().unwrap();
    common::write_pptx(temp.path(), "UPPER.PPTX", &[]);

    let found = FileManager::find_files(temp.path(), ".pptx").unwrap();
    assert_eq!(found.len(), 1);
}

#[test]
fn test_isPptxFile_shouldAcceptExtension() {
    let temp = common::create_temp_dir().unwrap();
    let path = common::write_pptx(temp.path(), "deck.pptx", &[]);

    assert!(FileManager::is_pptx_file(&path));
}

#[test]
fn test_isPptxFile_shouldRejectWrongExtension() {
    let temp = common::create_temp_dir().unwrap();
    let path = common::create_test_file(temp.path(), "deck.docx", "not a deck").unwrap();

    assert!(!FileManager::is_pptx_file(&path));
    assert!(!FileManager::is_pptx_file(temp.path()));
}

#[test]
fn test_isPptxFile_shouldSniffZipMagicWithoutExtension() {
    let temp = common::create_temp_dir().unwrap();

    let zip_path = temp.path().join("extensionless");
    fs::write(&zip_path, common::build_pptx(&[])).unwrap();
    assert!(FileManager::is_pptx_file(&zip_path));

    let text_path = temp.path().join("plain");
    fs::write(&text_path, "just text").unwrap();
    assert!(!FileManager::is_pptx_file(&text_path));
}

#[test]
fn test_writeToFile_shouldCreateParentDirectories() {
    let temp = common::create_temp_dir().unwrap();
    let path = temp.path().join("deep/dir/file.txt");

    FileManager::write_to_file(&path, "content").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "content");
}

#[test]
fn test_appendToLogFile_shouldTimestampEntries() {
    let temp = common::create_temp_dir().unwrap();
    let path = temp.path().join("issues.log");

    FileManager::append_to_log_file(&path, "first entry").unwrap();
    FileManager::append_to_log_file(&path, "second entry").unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();

    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with('['));
    assert!(lines[0].ends_with("first entry"));
    assert!(lines[1].ends_with("second entry"));
}
