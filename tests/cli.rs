use std::fs;
use std::path::Path;

use assert_cmd::Command;
use pomodoro::config::{CONFIG_ENV, ConfigStore, Configuration, Rgb};
use pomodoro::logging::LOG_ENV;
use tempfile::TempDir;

fn pomodoro(config_path: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pomodoro").unwrap();
    cmd.env(CONFIG_ENV, config_path).env(LOG_ENV, "off");
    cmd
}

#[test]
fn config_rewrite_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pomodoro").join("pomodoro_config.txt");

    let first = pomodoro(&path)
        .args(["config", "work=10"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&first.get_output().stdout).to_string();
    assert!(stdout.contains("Pomodoro configuration saved"));

    // A bare `config` re-saves whatever the new process loaded.
    pomodoro(&path).arg("config").assert().success();

    let loaded = ConfigStore::new(&path).load();
    assert_eq!(loaded.work_minutes, 10);
    assert_eq!(loaded.break_minutes, Configuration::default().break_minutes);
}

#[test]
fn invalid_setting_is_reported_and_others_saved() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pomodoro_config.txt");

    let assert = pomodoro(&path)
        .args(["config", "workcolor=(300,0,0)", "sessions=3", "breakcolor=(1,2,3)"])
        .assert()
        .success();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("workcolor channel 300 is outside 0-255"));

    let loaded = ConfigStore::new(&path).load();
    assert_eq!(loaded.work_color, Configuration::default().work_color);
    assert_eq!(loaded.break_color, Rgb::new(1, 2, 3));
    assert_eq!(loaded.sessions, 3);
}

#[test]
fn transient_overrides_before_config_are_saved_too() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pomodoro_config.txt");

    pomodoro(&path)
        .args(["40-8", "n=2", "config"])
        .assert()
        .success();

    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.contains("work=40\n"));
    assert!(contents.contains("break=8\n"));
    assert!(contents.contains("sessions=2\n"));
}

#[test]
fn legacy_file_is_migrated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pomodoro_config.txt");
    fs::write(&path, "1 2 3 4 5 6 7 8 9\n").unwrap();

    pomodoro(&path).arg("config").assert().success();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "work=7\nbreak=8\nsessions=9\nworkcolor=(1,2,3)\nbreakcolor=(4,5,6)\n"
    );
}

#[test]
fn default_run_keeps_no_session_log() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pomodoro_config.txt");

    Command::cargo_bin("pomodoro")
        .unwrap()
        .env(CONFIG_ENV, &path)
        .env_remove(LOG_ENV)
        .args(["config", "work=3"])
        .assert()
        .success();

    let log = fs::read_to_string(dir.path().join("pomodoro.log")).unwrap_or_default();
    assert!(!log.contains("INFO"), "unexpected log contents: {log}");
    assert!(!log.contains("saved configuration"));
}

#[cfg(unix)]
#[test]
fn sigterm_restores_terminal_and_exits_with_signal_status() {
    use std::io::Read;
    use std::process::{Command as StdCommand, Stdio};

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pomodoro_config.txt");
    let mut child = StdCommand::new(env!("CARGO_BIN_EXE_pomodoro"))
        .arg("1-1")
        .env(CONFIG_ENV, &path)
        .env(LOG_ENV, "off")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    // The signal watcher is armed before the first frame is drawn.
    let mut stdout = child.stdout.take().unwrap();
    let mut screen = Vec::new();
    let mut chunk = [0u8; 256];
    while !String::from_utf8_lossy(&screen).contains("Session 1") {
        let read = stdout.read(&mut chunk).unwrap();
        assert!(read > 0, "timer exited before drawing");
        screen.extend_from_slice(&chunk[..read]);
    }

    let pid = libc::pid_t::try_from(child.id()).unwrap();
    assert_eq!(unsafe { libc::kill(pid, libc::SIGTERM) }, 0);
    stdout.read_to_end(&mut screen).unwrap();
    let status = child.wait().unwrap();

    assert_eq!(status.code(), Some(128 + libc::SIGTERM));
    assert!(String::from_utf8_lossy(&screen).contains("\x1b[0m\n"));
}
