//! End-to-end monitoring tests against a real filesystem watcher
//!
//! Each test synchronizes on the service's change counter instead of
//! sleeping for a fixed time.

mod common;

use std::path::PathBuf;

use common::{wait_for_changes, TestRepo};
use workspace_monitor::{write_expected, MonitorError, MonitoringService};

fn started(repo: &TestRepo) -> MonitoringService {
    let service = MonitoringService::default();
    service
        .start_monitoring(repo.path())
        .expect("Failed to start monitoring");
    service
}

#[test]
fn test_no_activity_no_reload() {
    let repo = TestRepo::new();
    let service = started(&repo);
    service.set_known_file_paths(Vec::<PathBuf>::new()).unwrap();

    assert!(!service.assess_if_reload_necessary());
}

#[test]
fn test_unmonitored_file_change() {
    let repo = TestRepo::new();
    repo.add_file("test.txt", "before");
    let service = started(&repo);
    service.set_known_file_paths(Vec::<PathBuf>::new()).unwrap();

    let baseline = service.change_count();
    repo.add_file("test.txt", "after");
    assert!(wait_for_changes(&service, baseline), "watcher saw no change");

    assert!(!service.assess_if_reload_necessary());
}

#[test]
fn test_change_before_known_set_forces_reload() {
    let repo = TestRepo::new();
    let service = started(&repo);

    repo.add_file("test.txt", "written during load");
    assert!(wait_for_changes(&service, 0), "watcher saw no change");

    service.set_known_file_paths([repo.file("test.txt")]).unwrap();
    assert!(service.assess_if_reload_necessary());
}

#[test]
fn test_unexpected_change_to_known_file() {
    let repo = TestRepo::new();
    repo.add_file("test.txt", "before");
    let service = started(&repo);
    service.set_known_file_paths([repo.file("test.txt")]).unwrap();

    let baseline = service.change_count();
    repo.add_file("test.txt", "after");
    assert!(wait_for_changes(&service, baseline), "watcher saw no change");

    assert!(service.assess_if_reload_necessary());
    // Sticky until a new session is started
    assert!(service.assess_if_reload_necessary());
}

#[test]
fn test_expected_change_matches() {
    let repo = TestRepo::new();
    repo.add_file("test.txt", "before");
    let service = started(&repo);
    service.set_known_file_paths([repo.file("test.txt")]).unwrap();
    service.register_expected_change(repo.file("test.txt"), "X");

    let baseline = service.change_count();
    repo.add_file("test.txt", "X");
    assert!(wait_for_changes(&service, baseline), "watcher saw no change");

    assert!(!service.assess_if_reload_necessary());
}

#[test]
fn test_expected_change_mismatch() {
    let repo = TestRepo::new();
    repo.add_file("test.txt", "before");
    let service = started(&repo);
    service.set_known_file_paths([repo.file("test.txt")]).unwrap();
    service.register_expected_change(repo.file("test.txt"), "X");

    let baseline = service.change_count();
    repo.add_file("test.txt", "Y");
    assert!(wait_for_changes(&service, baseline), "watcher saw no change");

    assert!(service.assess_if_reload_necessary());
}

#[test]
fn test_write_expected_helper() {
    let repo = TestRepo::new();
    repo.add_file("App.csproj", "<Project />");
    let service = started(&repo);
    service.set_known_file_paths([repo.file("App.csproj")]).unwrap();

    let baseline = service.change_count();
    write_expected(&service, &repo.file("App.csproj"), "<Project Sdk=\"x\" />").unwrap();
    assert!(wait_for_changes(&service, baseline), "watcher saw no change");

    assert!(!service.assess_if_reload_necessary());
}

#[test]
fn test_deleted_known_file() {
    let repo = TestRepo::new();
    repo.add_file("test.txt", "content");
    let service = started(&repo);
    service.set_known_file_paths([repo.file("test.txt")]).unwrap();

    let baseline = service.change_count();
    repo.remove_file("test.txt");
    assert!(wait_for_changes(&service, baseline), "watcher saw no change");

    assert!(service.assess_if_reload_necessary());
}

#[test]
fn test_deleted_directory_with_known_file() {
    let repo = TestRepo::new();
    repo.add_file("bar/test.txt", "content");
    let service = started(&repo);
    service.set_known_file_paths([repo.file("bar/test.txt")]).unwrap();

    let baseline = service.change_count();
    repo.remove_dir("bar");
    assert!(wait_for_changes(&service, baseline), "watcher saw no change");

    assert!(service.assess_if_reload_necessary());
}

#[test]
fn test_renamed_directory_with_known_file() {
    let repo = TestRepo::new();
    repo.add_file("bar/test.txt", "content");
    let service = started(&repo);
    service.set_known_file_paths([repo.file("bar/test.txt")]).unwrap();

    let baseline = service.change_count();
    repo.rename("bar", "baz");
    assert!(wait_for_changes(&service, baseline), "watcher saw no change");

    assert!(service.assess_if_reload_necessary());
}

#[test]
fn test_directory_renamed_during_load_forces_reload() {
    let repo = TestRepo::new();
    repo.add_file("bar/test.txt", "content");
    let service = started(&repo);
    let known = vec![repo.file("bar/test.txt")];

    repo.rename("bar", "baz");
    assert!(wait_for_changes(&service, 0), "watcher saw no change");

    service.set_known_file_paths(&known).unwrap();
    assert!(service.assess_if_reload_necessary());
}

#[test]
fn test_ignored_directories_never_affect_verdict() {
    let repo = TestRepo::new();
    repo.add_file("obj/generated.cs", "a")
        .add_file("bin/app.dll", "a")
        .add_file(".git/HEAD", "a");
    let service = started(&repo);
    service
        .set_known_file_paths([
            repo.file("obj/generated.cs"),
            repo.file("bin/app.dll"),
            repo.file(".git/HEAD"),
        ])
        .unwrap();

    let baseline = service.change_count();
    repo.add_file("obj/generated.cs", "b")
        .add_file("obj/new.cs", "b")
        .remove_file("bin/app.dll")
        .add_file(".git/HEAD", "b");
    // Sentinel outside the ignored directories marks the end of the burst
    repo.add_file("sentinel.txt", "done");
    assert!(wait_for_changes(&service, baseline), "watcher saw no change");

    assert!(!service.assess_if_reload_necessary());
}

#[test]
fn test_no_session_requires_reload() {
    let service = MonitoringService::default();
    assert!(service.assess_if_reload_necessary());
}

#[test]
fn test_stop_monitoring_requires_reload() {
    let repo = TestRepo::new();
    let service = started(&repo);
    service.set_known_file_paths(Vec::<PathBuf>::new()).unwrap();
    assert!(!service.assess_if_reload_necessary());

    service.stop_monitoring();
    assert!(service.assess_if_reload_necessary());
}

#[test]
fn test_second_known_set_fails() {
    let repo = TestRepo::new();
    let service = started(&repo);
    service.set_known_file_paths([repo.file("a.txt")]).unwrap();

    let err = service.set_known_file_paths([repo.file("b.txt")]);
    assert!(matches!(err, Err(MonitorError::KnownFilesAlreadySet { .. })));
}

#[test]
fn test_restart_after_reload_tracks_again() {
    let repo = TestRepo::new();
    repo.add_file("test.txt", "v1");
    let service = started(&repo);
    service.set_known_file_paths([repo.file("test.txt")]).unwrap();

    let baseline = service.change_count();
    repo.add_file("test.txt", "v2");
    assert!(wait_for_changes(&service, baseline), "watcher saw no change");
    assert!(service.assess_if_reload_necessary());

    // Owner reloads and starts over with a fresh session
    service.start_monitoring(repo.path()).unwrap();
    service.set_known_file_paths([repo.file("test.txt")]).unwrap();
    assert_eq!(service.change_count(), 0);
    assert!(!service.assess_if_reload_necessary());
}
