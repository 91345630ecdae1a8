use bookbridge_core::{init_logging, logging_status};

// Kept as the only test in this binary: logging state is process-global.
#[test]
fn init_logging_is_idempotent_and_rejects_conflicts() {
    let dir = tempfile::tempdir().unwrap();
    let dir_str = dir.path().to_str().unwrap().to_string();

    init_logging("info", &dir_str).unwrap();
    init_logging("info", &dir_str).unwrap();

    let level_err = init_logging("debug", &dir_str).unwrap_err();
    assert!(level_err.contains("refusing to switch"));

    let other_dir = tempfile::tempdir().unwrap();
    let dir_err = init_logging("info", other_dir.path().to_str().unwrap()).unwrap_err();
    assert!(dir_err.contains("refusing to switch"));

    let (level, active_dir) = logging_status().unwrap();
    assert_eq!(level, "info");
    assert_eq!(active_dir, dir.path());
}
