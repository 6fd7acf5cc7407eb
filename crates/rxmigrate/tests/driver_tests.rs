//! End-to-end runs of the batch driver over temporary directories

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use rxmigrate::{process_file, run, DriverConfig, DriverError, FileStatus};
use rxmigrate_core::Transformer;

const LEGACY: &str = r#"import { of } from "rxjs";
export const value = of(1).toPromise();
"#;

const MIGRATED: &str = r#"import { of, lastValueFrom } from "rxjs";
export const value = lastValueFrom(of(1));
"#;

const PLAIN: &str = "export const answer = 42;\n";

fn write(root: &Path, name: &str, text: &str) -> PathBuf {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn rewrites_files_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let legacy = write(dir.path(), "src/legacy.ts", LEGACY);
    let plain = write(dir.path(), "src/plain.ts", PLAIN);

    let report = run(&DriverConfig::new(), &[dir.path().to_path_buf()]).unwrap();

    assert!(report.passed());
    assert_eq!(report.files, 2);
    assert_eq!(report.ok, 1);
    assert_eq!(report.unmodified, 1);
    assert_eq!(report.sites_rewritten, 1);
    assert_eq!(fs::read_to_string(legacy).unwrap(), MIGRATED);
    assert_eq!(fs::read_to_string(plain).unwrap(), PLAIN);
}

#[test]
fn dry_run_leaves_files_alone() {
    let dir = tempfile::tempdir().unwrap();
    let legacy = write(dir.path(), "legacy.ts", LEGACY);

    let config = DriverConfig::new().with_dry_run(true).with_print(true);
    let report = run(&config, &[dir.path().to_path_buf()]).unwrap();

    assert_eq!(report.ok, 1);
    assert!(report.dry_run);
    assert_eq!(fs::read_to_string(&legacy).unwrap(), LEGACY);
    assert_eq!(report.printed, vec![(legacy, MIGRATED.to_string())]);
}

#[test]
fn syntax_errors_are_counted_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let broken = write(dir.path(), "broken.ts", "const = ;\n");
    write(dir.path(), "legacy.ts", LEGACY);

    let report = run(&DriverConfig::new().with_jobs(2), &[dir.path().to_path_buf()]).unwrap();

    assert!(!report.passed());
    assert_eq!(report.ok, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].path, broken);
    assert!(report.errors[0].message.contains("syntax error"));
    assert!(!report.errors[0].message.starts_with("internal error"));
    assert_eq!(fs::read_to_string(broken).unwrap(), "const = ;\n");
}

#[test]
fn excluded_directories_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let vendored = write(dir.path(), "node_modules/lib/index.ts", LEGACY);
    write(dir.path(), "app.ts", PLAIN);

    let report = run(&DriverConfig::new(), &[dir.path().to_path_buf()]).unwrap();

    assert_eq!(report.files, 1);
    assert_eq!(fs::read_to_string(vendored).unwrap(), LEGACY);
}

#[test]
fn missing_input_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let err = run(&DriverConfig::new(), &[dir.path().join("nowhere")]).unwrap_err();
    assert!(matches!(err, DriverError::MissingInput(_)));
}

#[test]
fn invalid_config_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = DriverConfig::new().with_jobs(0);
    let err = run(&config, &[dir.path().to_path_buf()]).unwrap_err();
    assert!(matches!(err, DriverError::Config(_)));
}

#[test]
fn config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "rxmigrate.toml",
        "extensions = [\"ts\"]\ndry_run = true\njobs = 1\n",
    );
    let config = DriverConfig::load(&path).unwrap();
    assert!(config.dry_run);
    assert_eq!(config.jobs, Some(1));
    assert_eq!(config.extensions, vec!["ts".to_string()]);
}

#[test]
fn process_file_reports_unreadable_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut transformer = Transformer::new();
    let result = process_file(
        &mut transformer,
        &dir.path().join("gone.ts"),
        &DriverConfig::new(),
    );
    assert!(matches!(result.status, FileStatus::Failed(ref m) if m.starts_with("read failed")));
}
