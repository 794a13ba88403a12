use std::{collections::HashSet, fs};

use stem_splitter_server::{ServiceError, Workspace};
use tempfile::tempdir;

#[test]
fn create_job_makes_fresh_empty_directories() {
    let tmp = tempdir().unwrap();
    let ws = Workspace::new(tmp.path().join("up"), tmp.path().join("out"));

    let job = ws.create_job().unwrap();
    assert!(job.upload_dir.is_dir());
    assert!(job.output_dir.is_dir());
    assert_eq!(fs::read_dir(&job.upload_dir).unwrap().count(), 0);
    assert_eq!(fs::read_dir(&job.output_dir).unwrap().count(), 0);
    assert!(job.upload_dir.starts_with(ws.upload_root()));
    assert!(job.output_dir.ends_with(job.id.to_string()));
}

#[test]
fn job_ids_are_not_reused() {
    let tmp = tempdir().unwrap();
    let ws = Workspace::new(tmp.path().join("up"), tmp.path().join("out"));

    let ids: HashSet<String> = (0..64)
        .map(|_| ws.create_job().unwrap().id.to_string())
        .collect();
    assert_eq!(ids.len(), 64);
}

#[test]
fn cleanup_removes_nested_content_and_is_idempotent() {
    let tmp = tempdir().unwrap();
    let ws = Workspace::new(tmp.path().join("up"), tmp.path().join("out"));
    let job = ws.create_job().unwrap();

    let nested = job.output_dir.join("htdemucs").join("song");
    fs::create_dir_all(&nested).unwrap();
    fs::write(nested.join("vocals.wav"), b"x").unwrap();
    fs::write(job.upload_dir.join("song.wav"), b"x").unwrap();

    ws.cleanup(job.id).unwrap();
    assert!(!job.upload_dir.exists());
    assert!(!job.output_dir.exists());

    ws.cleanup(job.id).unwrap();
}

#[test]
fn cleanup_leaves_other_jobs_alone() {
    let tmp = tempdir().unwrap();
    let ws = Workspace::new(tmp.path().join("up"), tmp.path().join("out"));
    let a = ws.create_job().unwrap();
    let b = ws.create_job().unwrap();

    ws.cleanup(a.id).unwrap();
    assert!(b.upload_dir.is_dir());
    assert!(b.output_dir.is_dir());
}

#[cfg(unix)]
#[test]
fn cleanup_failure_is_reported() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = tempdir().unwrap();
    let ws = Workspace::new(tmp.path().join("up"), tmp.path().join("out"));
    let job = ws.create_job().unwrap();
    fs::write(job.output_dir.join("locked.wav"), b"x").unwrap();

    // Removing entries needs write permission on the directory itself.
    fs::set_permissions(&job.output_dir, fs::Permissions::from_mode(0o500)).unwrap();
    let result = ws.cleanup(job.id);
    fs::set_permissions(&job.output_dir, fs::Permissions::from_mode(0o755)).unwrap();

    // Running as root bypasses permission bits.
    if job.output_dir.exists() {
        assert!(matches!(result, Err(ServiceError::Cleanup { .. })));
    }
}

#[test]
fn failed_create_job_leaves_no_upload_directory() {
    let tmp = tempdir().unwrap();
    let out_root = tmp.path().join("out");
    // A regular file where the output root should be.
    fs::write(&out_root, b"x").unwrap();
    let ws = Workspace::new(tmp.path().join("up"), out_root);

    assert!(ws.create_job().is_err());
    assert_eq!(fs::read_dir(ws.upload_root()).unwrap().count(), 0);
}
