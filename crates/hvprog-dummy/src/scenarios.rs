//! Console sessions against the simulated target

use std::fmt;

use hvprog_core::chip::{lookup, FuseLockSnapshot};
use hvprog_core::error::Error;
use hvprog_core::session::{Session, SessionMode};

use crate::{DummyAvr, DummyConfig, TargetState};

fn session(config: DummyConfig) -> Session<DummyAvr> {
    Session::new(DummyAvr::new(config)).with_color(false)
}

fn device(signature: u32) -> DummyConfig {
    DummyConfig::for_device(lookup(signature).unwrap())
}

/// Run one line and split the response into (status, message) pairs
fn run(session: &mut Session<DummyAvr>, line: &str) -> Vec<(String, String)> {
    let mut out = String::new();
    session.execute(line, &mut out).unwrap();
    out.lines()
        .map(|line| {
            let (status, message) = line.split_once('\t').unwrap();
            (status.trim_end().to_string(), message.to_string())
        })
        .collect()
}

fn pair(status: &str, message: &str) -> (String, String) {
    (status.to_string(), message.to_string())
}

/// Output channel that refuses every write
struct Full;

impl fmt::Write for Full {
    fn write_str(&mut self, _s: &str) -> fmt::Result {
        Err(fmt::Error)
    }
}

#[test]
fn test_enter_recognized_device() {
    let mut s = session(device(0x1E9514));
    assert_eq!(
        run(&mut s, "enter"),
        vec![
            pair("signature", "1E9514"),
            pair("device", "ATmega328"),
            pair("ok", "Entered programming mode for device"),
        ]
    );
    assert_eq!(s.mode(), SessionMode::Programming);
    assert_eq!(s.current_target().unwrap().name, "ATmega328");
    assert_eq!(s.master().state(), TargetState::Programming);
    assert!(s.master().violations().is_empty());
}

#[test]
fn test_enter_unknown_from_idle() {
    let mut s = session(DummyConfig::default().with_signature(0xFFFFFF));
    assert_eq!(
        run(&mut s, "enter"),
        vec![
            pair("signature", "FFFFFF"),
            pair("error", "Device not recognized, power down"),
        ]
    );
    assert_eq!(s.mode(), SessionMode::Idle);
    assert!(s.current_target().is_none());
    assert!(s.master().is_released());
}

#[test]
fn test_enter_unknown_from_running() {
    let mut s = session(DummyConfig::default().with_signature(0x1E0000));
    run(&mut s, "run");
    assert_eq!(
        run(&mut s, "enter"),
        vec![
            pair("signature", "1E0000"),
            pair("error", "Device not recognized, back to running mode"),
        ]
    );
    assert_eq!(s.mode(), SessionMode::Running);
    assert_eq!(s.master().state(), TargetState::Running);
}

#[test]
fn test_enter_twice() {
    let mut s = session(DummyConfig::default());
    run(&mut s, "enter");
    let reads = s.master().bus_reads();
    assert_eq!(
        run(&mut s, "enter"),
        vec![pair("error", "Already in programming mode")]
    );
    assert_eq!(s.mode(), SessionMode::Programming);
    assert_eq!(s.master().bus_reads(), reads);
}

#[test]
fn test_enter_with_failing_output() {
    let mut s = session(device(0x1E9514));
    assert_eq!(s.execute("enter", &mut Full), Err(Error::Output));
    assert_eq!(s.mode(), SessionMode::Programming);
    assert_eq!(s.current_target().unwrap().name, "ATmega328");
    assert_eq!(s.master().state(), TargetState::Programming);

    // The session still knows the target is at 12V and can leave cleanly
    assert_eq!(
        run(&mut s, "exit"),
        vec![pair("ok", "Programming mode left, power down")]
    );
    assert!(s.master().is_released());
}

#[test]
fn test_unknown_device_with_failing_output() {
    let mut s = session(DummyConfig::default().with_signature(0xFFFFFF));
    assert_eq!(s.execute("enter", &mut Full), Err(Error::Output));
    assert_eq!(s.mode(), SessionMode::Idle);
    assert!(s.master().is_released());
}

#[test]
fn test_exit_and_run_transitions() {
    let mut s = session(DummyConfig::default());

    assert_eq!(
        run(&mut s, "exit"),
        vec![pair("error", "Not in programming or running mode")]
    );
    assert_eq!(s.mode(), SessionMode::Idle);

    assert_eq!(run(&mut s, "run"), vec![pair("ok", "Running")]);
    assert_eq!(s.master().state(), TargetState::Running);

    run(&mut s, "enter");
    assert_eq!(
        run(&mut s, "run"),
        vec![pair("ok", "Programming mode left, running")]
    );
    assert_eq!(s.mode(), SessionMode::Running);
    assert!(s.current_target().is_none());
    assert_eq!(s.master().state(), TargetState::Running);

    run(&mut s, "enter");
    assert_eq!(
        run(&mut s, "exit"),
        vec![pair("ok", "Programming mode left, power down")]
    );
    assert_eq!(s.mode(), SessionMode::Idle);
    assert!(s.current_target().is_none());
    assert!(s.master().is_released());
    assert!(s.master().violations().is_empty());
}

#[test]
fn test_fuse_while_idle_touches_nothing() {
    let mut s = session(DummyConfig::default());
    for line in ["fuse", "fuse reset", "fuse nonsense"] {
        assert_eq!(
            run(&mut s, line),
            vec![pair("error", "Not in programming mode")]
        );
    }
    assert_eq!(s.master().bus_reads(), 0);
    assert_eq!(s.master().writes(), 0);
}

#[test]
fn test_fuse_at_defaults() {
    let mut s = session(device(0x1E9514));
    run(&mut s, "enter");

    let lines = run(&mut s, "fuse");
    let statuses: Vec<&str> = lines.iter().map(|(status, _)| status.as_str()).collect();
    assert_eq!(statuses, ["low", "high", "extended", "lock", "ok"]);
    assert!(lines[0].1.starts_with("62\t01100010\tCKSEL0    = 0"));
    assert_eq!(
        lines[4].1,
        "All fuse/lock bits are equal to factory defaults"
    );
}

#[test]
fn test_fuse_reports_differences() {
    let config = device(0x1E9514).with_fuses(FuseLockSnapshot::new(0xE2, 0xD9, 0xFF, 0xFF));
    let mut s = session(config);
    run(&mut s, "enter");

    let lines = run(&mut s, "fuse");
    assert!(lines[0].1.starts_with("E2\t11100010"));
    assert_eq!(
        lines.last().unwrap(),
        &pair(
            "warning",
            "Found differences to factory defaults, use 'fuse reset' to restore"
        )
    );
    assert_eq!(s.master().writes(), 0);
}

#[test]
fn test_fuse_reset_at_defaults_writes_nothing() {
    let mut s = session(device(0x1E950F));
    run(&mut s, "enter");

    let lines = run(&mut s, "fuse reset");
    assert_eq!(
        lines.last().unwrap(),
        &pair("ok", "All fuse/lock bits are equal to factory defaults")
    );
    assert_eq!(s.master().writes(), 0);
    assert!(!lines.iter().any(|(status, _)| status == "status"));
}

#[test]
fn test_fuse_reset_restores_defaults() {
    let config = device(0x1E950F).with_fuses(FuseLockSnapshot::new(0xFF, 0xDE, 0xFD, 0xFF));
    let mut s = session(config);
    run(&mut s, "enter");

    let lines = run(&mut s, "fuse reset");
    let progress: Vec<&str> = lines
        .iter()
        .filter(|(status, _)| status == "status")
        .map(|(_, message)| message.as_str())
        .collect();
    assert_eq!(
        progress,
        [
            "Programming low fuse bits",
            "Programming high fuse bits",
            "Programming extended fuse bits",
        ]
    );
    assert_eq!(
        lines.last().unwrap(),
        &pair("ok", "All fuse/lock bits are equal to factory defaults")
    );
    // Pre-reset comparison stays silent about the differences
    assert!(!lines.iter().any(|(status, _)| status == "warning"));
    assert_eq!(s.master().writes(), 3);
    assert_eq!(
        s.master().fuses(),
        FuseLockSnapshot::new(0x62, 0xD9, 0xFF, 0xFF)
    );
}

#[test]
fn test_fuse_reset_without_extended_byte() {
    let config = device(0x1E9307).with_fuses(FuseLockSnapshot::new(0xE4, 0xC9, 0xFF, 0xFF));
    let mut s = session(config);
    run(&mut s, "enter");

    let lines = run(&mut s, "fuse reset");
    assert!(!lines.iter().any(|(status, _)| status == "extended"));
    assert_eq!(s.master().writes(), 2);
    assert_eq!(s.master().fuses().low(), 0xE1);
    assert_eq!(s.master().fuses().high(), 0xD9);
}

#[test]
fn test_fuse_reset_failure_reported() {
    // Lock bits cannot be restored by programming fuses
    let config = device(0x1E950F).with_fuses(FuseLockSnapshot::new(0x62, 0xD9, 0xFF, 0xFC));
    let mut s = session(config);
    run(&mut s, "enter");

    let lines = run(&mut s, "fuse reset");
    assert_eq!(
        lines.last().unwrap(),
        &pair("error", "Found differences to factory defaults, reset failed")
    );
    assert_eq!(s.mode(), SessionMode::Programming);
}

#[test]
fn test_fuse_reset_unsupported_device() {
    // ATmega88 record shadows ATmega88A and has no defaults
    let config = DummyConfig::default()
        .with_signature(0x1E930A)
        .with_fuses(FuseLockSnapshot::new(0x62, 0xDF, 0xF9, 0xFF));
    let mut s = session(config);
    let entered = run(&mut s, "enter");
    assert_eq!(entered[1], pair("device", "ATmega88"));

    let lines = run(&mut s, "fuse reset");
    assert_eq!(
        lines,
        vec![
            pair("low", "62\t01100010"),
            pair("high", "DF\t11011111"),
            pair("extended", "F9\t11111001"),
            pair("lock", "FF\t11111111"),
            pair(
                "warning",
                "Database record incomplete for this device, cannot compare to factory defaults"
            ),
        ]
    );
    assert_eq!(s.master().writes(), 0);
}

#[test]
fn test_fuse_low_placeholder() {
    let mut s = session(DummyConfig::default());
    run(&mut s, "enter");
    assert_eq!(
        run(&mut s, "fuse low"),
        vec![
            pair("status", "Programming low fuse bits"),
            pair("ok", "Done"),
        ]
    );
    assert_eq!(s.master().fuses().low(), 0xE0);
}

#[test]
fn test_fuse_unimplemented_arguments() {
    let mut s = session(DummyConfig::default());
    run(&mut s, "enter");
    for which in ["high", "extended", "lock"] {
        assert_eq!(
            run(&mut s, &format!("fuse {} 0x00", which)),
            vec![pair(
                "warning",
                &format!("Programming {} fuse bits is not implemented", which)
            )]
        );
    }
    assert_eq!(s.master().writes(), 0);
}

#[test]
fn test_fuse_invalid_argument() {
    let mut s = session(DummyConfig::default());
    run(&mut s, "enter");
    assert_eq!(
        run(&mut s, "fuse erase"),
        vec![pair(
            "error",
            "Invalid argument 'erase'; expected 'low', 'high', 'extended', 'lock' or 'reset'"
        )]
    );
    assert_eq!(s.mode(), SessionMode::Programming);
}

#[test]
fn test_hanging_target_keeps_programming_mode() {
    let config = device(0x1E950F)
        .with_fuses(FuseLockSnapshot::new(0xFF, 0xD9, 0xFF, 0xFF))
        .with_hang(true)
        .with_poll_limit(1000);
    let mut s = session(config);
    run(&mut s, "enter");

    let lines = run(&mut s, "fuse reset");
    assert_eq!(
        lines.last().unwrap(),
        &pair("error", "Target not responding (RDY/BSY stuck)")
    );
    assert_eq!(s.mode(), SessionMode::Programming);
    assert!(s.current_target().is_some());

    assert_eq!(
        run(&mut s, "exit"),
        vec![pair("ok", "Programming mode left, power down")]
    );
    assert!(s.master().is_released());
}

#[test]
fn test_colored_output() {
    let config = device(0x1E9514).with_fuses(FuseLockSnapshot::new(0x62, 0xD9, 0xFF, 0xFE));
    let mut s = Session::new(DummyAvr::new(config));
    run(&mut s, "enter");

    let mut out = String::new();
    s.execute("fuse", &mut out).unwrap();
    assert!(out.contains("\x1b[31m"));
    assert!(out.contains("\x1b[32m"));
    assert!(out.contains("lock      \t\x1b[0mF\x1b[31mE\x1b[0m\t"));
}

#[test]
fn test_unknown_command_and_blank_lines() {
    let mut s = session(DummyConfig::default());
    assert!(run(&mut s, "").is_empty());
    assert_eq!(
        run(&mut s, "read flash"),
        vec![pair("error", "Unrecognized command 'read'")]
    );
    assert_eq!(
        run(&mut s, "exit now"),
        vec![pair("error", "Command does not accept arguments")]
    );
    assert_eq!(s.mode(), SessionMode::Idle);
    assert_eq!(s.master().bus_reads(), 0);
}
