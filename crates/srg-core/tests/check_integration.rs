//! Refresh checks against a real filesystem tree.
//!
//! Exercises the library end to end: pids cgroup files on disk, the per-snap
//! lock, and the busy report.

#![cfg(target_os = "linux")]

use srg_common::{ProcessId, SnapInfo};
use srg_core::check::{CheckError, CheckPolicy, RefreshChecker};
use srg_core::collect::pids::PidsCgroup;
use srg_core::lock::LockDir;
use srg_core::test_log;
use std::sync::mpsc;
use std::time::{Duration, Instant};

mod support;
use support::fixture::SnapdTree;

fn checker(tree: &SnapdTree) -> RefreshChecker<PidsCgroup> {
    RefreshChecker::new(PidsCgroup::new(tree.pids_dir()), LockDir::new(tree.lock_dir()))
}

fn load(tree: &SnapdTree) -> SnapInfo {
    SnapInfo::load(&tree.write_snap_info()).expect("load snap info")
}

#[test]
fn policy_matrix() {
    // (running tag, soft busy, hard busy)
    let cases = [
        ("snap.pkg.app", true, true),
        ("snap.pkg.svc", false, true),
        ("snap.pkg.keeper", false, false),
        ("snap.pkg.hook.configure", true, true),
    ];

    for (tag, soft_busy, hard_busy) in cases {
        let tree = SnapdTree::new();
        tree.run(tag, &[4242]);
        let info = load(&tree);
        let checker = checker(&tree);

        let soft = checker.check(&info, CheckPolicy::Soft);
        let hard = checker.check(&info, CheckPolicy::Hard);
        test_log!(
            INFO,
            "policy matrix case",
            tag = tag,
            soft_busy = soft.is_err(),
            hard_busy = hard.is_err()
        );
        assert_eq!(soft.is_err(), soft_busy, "soft check for {tag}");
        assert_eq!(hard.is_err(), hard_busy, "hard check for {tag}");
    }
}

#[test]
fn pids_from_several_tags_are_merged() {
    let tree = SnapdTree::new();
    tree.run("snap.pkg.app", &[30, 10]);
    tree.run("snap.pkg.svc", &[20, 10]);
    let info = load(&tree);

    let err = checker(&tree).hard_check(&info).unwrap_err();
    let busy = err.busy().expect("busy report");
    assert_eq!(busy.busy_apps(), &["app".to_string(), "svc".to_string()]);
    assert_eq!(
        busy.pids(),
        &[ProcessId(10), ProcessId(20), ProcessId(30)]
    );
    assert_eq!(err.to_string(), r#"snap "pkg" has running apps (app, svc)"#);
}

#[test]
fn check_waits_for_snap_lock() {
    let tree = SnapdTree::new();
    let info = load(&tree);
    let locks = LockDir::new(tree.lock_dir());
    let held = locks.lock("pkg").expect("hold snap lock");

    let checker = checker(&tree);
    let (tx, rx) = mpsc::channel();
    let worker = std::thread::spawn(move || {
        let start = Instant::now();
        let result = checker.soft_check(&info);
        tx.send((result.is_ok(), start.elapsed())).unwrap();
    });

    // The check cannot finish while the lock is held.
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    drop(held);

    let (clear, waited) = rx.recv_timeout(Duration::from_secs(5)).expect("check finished");
    worker.join().unwrap();
    test_log!(INFO, "check waited for lock", waited_ms = waited.as_millis() as u64);
    assert!(clear);
    assert!(waited >= Duration::from_millis(150));
}

#[test]
fn unreadable_cgroup_releases_lock() {
    let tree = SnapdTree::new();
    let info = load(&tree);
    std::fs::create_dir_all(tree.pids_dir().join("snap.pkg.app").join("cgroup.procs")).unwrap();

    let err = checker(&tree).soft_check(&info).unwrap_err();
    assert!(matches!(err, CheckError::Census(_)), "{err}");
    assert!(LockDir::new(tree.lock_dir()).try_lock("pkg").is_ok());
}
