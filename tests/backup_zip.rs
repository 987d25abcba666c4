#[path = "../src/backup.rs"]
mod backup;

use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

#[test]
fn zip_export_and_import_roundtrip() {
    let workspace = temp_dir("schoold-backup-src");
    let workspace2 = temp_dir("schoold-backup-dst");
    let out_dir = temp_dir("schoold-backup-out");

    let bytes = b"sqlite-test-payload";
    std::fs::write(workspace.join("school.sqlite3"), bytes).expect("write source db");

    let bundle_path = out_dir.join("nested").join("workspace.backup.zip");
    let export = backup::export_workspace_bundle(&workspace, &bundle_path).expect("export bundle");
    assert_eq!(export.bundle_format, backup::BUNDLE_FORMAT_V1);
    assert_eq!(export.entry_count, 3);
    assert_eq!(export.db_sha256.len(), 64);

    let f = File::open(&bundle_path).expect("open bundle");
    let mut archive = zip::ZipArchive::new(f).expect("open zip archive");
    let mut manifest = String::new();
    archive
        .by_name("manifest.json")
        .expect("manifest entry")
        .read_to_string(&mut manifest)
        .expect("read manifest");
    let manifest: serde_json::Value = serde_json::from_str(&manifest).expect("manifest json");
    assert_eq!(manifest["format"].as_str(), Some(backup::BUNDLE_FORMAT_V1));
    assert_eq!(manifest["dbSha256"].as_str(), Some(export.db_sha256.as_str()));
    archive
        .by_name("db/school.sqlite3")
        .expect("database entry in bundle");

    let import = backup::import_workspace_bundle(&bundle_path, &workspace2).expect("import bundle");
    assert_eq!(import.bundle_format_detected, backup::BUNDLE_FORMAT_V1);
    assert!(import.checksum_verified);

    let restored = std::fs::read(workspace2.join("school.sqlite3")).expect("read restored db");
    assert_eq!(restored, bytes);
    assert!(!workspace2.join("school.sqlite3.importing").exists());

    let _ = std::fs::remove_dir_all(workspace);
    let _ = std::fs::remove_dir_all(workspace2);
    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn export_without_database_fails() {
    let workspace = temp_dir("schoold-backup-empty");
    let err = backup::export_workspace_bundle(&workspace, &workspace.join("out.zip"))
        .expect_err("export should fail without a database");
    assert!(err.to_string().contains("workspace database not found"));
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn tampered_bundle_is_rejected() {
    let out_dir = temp_dir("schoold-backup-tampered");
    let workspace = temp_dir("schoold-backup-tampered-dst");
    std::fs::write(workspace.join("school.sqlite3"), b"original").expect("write existing db");

    let bundle_path = out_dir.join("tampered.zip");
    {
        let f = File::create(&bundle_path).expect("create bundle");
        let mut zip = zip::ZipWriter::new(f);
        let opts = zip::write::FileOptions::default();
        zip.start_file("manifest.json", opts).expect("start manifest");
        let manifest = serde_json::json!({
            "format": backup::BUNDLE_FORMAT_V1,
            "version": 1,
            "dbSha256": "00".repeat(32),
        });
        zip.write_all(manifest.to_string().as_bytes()).expect("write manifest");
        zip.start_file("db/school.sqlite3", opts).expect("start db");
        zip.write_all(b"replacement").expect("write db");
        zip.finish().expect("finish zip");
    }

    let err = backup::import_workspace_bundle(&bundle_path, &workspace)
        .expect_err("checksum mismatch should fail");
    assert!(err.to_string().contains("checksum mismatch"));

    let kept = std::fs::read(workspace.join("school.sqlite3")).expect("read existing db");
    assert_eq!(kept, b"original");

    let _ = std::fs::remove_dir_all(out_dir);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn unknown_bundle_format_is_rejected() {
    let out_dir = temp_dir("schoold-backup-format");
    let workspace = temp_dir("schoold-backup-format-dst");

    let bundle_path = out_dir.join("other.zip");
    {
        let f = File::create(&bundle_path).expect("create bundle");
        let mut zip = zip::ZipWriter::new(f);
        zip.start_file("manifest.json", zip::write::FileOptions::default())
            .expect("start manifest");
        zip.write_all(br#"{"format":"someone-elses-format"}"#)
            .expect("write manifest");
        zip.finish().expect("finish zip");
    }

    let err = backup::import_workspace_bundle(&bundle_path, &workspace)
        .expect_err("unknown format should fail");
    assert!(err.to_string().contains("unsupported bundle format"));

    let _ = std::fs::remove_dir_all(out_dir);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn raw_sqlite_import_is_supported() {
    let out_dir = temp_dir("schoold-backup-raw");
    let workspace = temp_dir("schoold-backup-raw-dst");

    let raw_file = out_dir.join("copy.sqlite3");
    let bytes = b"raw-sqlite-copy";
    std::fs::write(&raw_file, bytes).expect("write raw sqlite file");

    let import = backup::import_workspace_bundle(&raw_file, &workspace).expect("import raw sqlite");
    assert_eq!(import.bundle_format_detected, backup::RAW_SQLITE_FORMAT);
    assert!(!import.checksum_verified);

    let restored = std::fs::read(workspace.join("school.sqlite3")).expect("read restored sqlite");
    assert_eq!(restored, bytes);

    let _ = std::fs::remove_dir_all(out_dir);
    let _ = std::fs::remove_dir_all(workspace);
}
