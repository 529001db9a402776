use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tally_core::Snapshot;
use tally_core::context::{AppConfig, AppConfigExt};
use tally_core::hotkeys::{HotkeyBackend, KeyCombo};
use tracing::{info, warn};

use crate::CliContext;
use crate::console::print_frame;
use crate::context::{Hotkeys, ReplayTask};

fn read_snapshots(path: &Path) -> Result<Vec<Snapshot>, String> {
    let file = File::open(path).map_err(|e| format!("cannot open {}: {e}", path.display()))?;
    let mut snapshots = Vec::new();
    for (n, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| e.to_string())?;
        if line.trim().is_empty() {
            continue;
        }
        let snapshot = serde_json::from_str(&line).map_err(|e| format!("line {}: {e}", n + 1))?;
        snapshots.push(snapshot);
    }
    Ok(snapshots)
}

/// Stream a file of JSON snapshots (one per line) from a background thread.
pub fn replay(path: &str, interval_ms: u64, ctx: &mut CliContext) -> Result<(), String> {
    let snapshots = read_snapshots(Path::new(path))?;
    ctx.stop_replay();

    let stop = Arc::new(AtomicBool::new(false));
    let thread_stop = Arc::clone(&stop);
    let service = ctx.service.clone();
    let session = ctx.session.clone();
    let count = snapshots.len();

    let thread = thread::Builder::new()
        .name("replay".to_string())
        .spawn(move || {
            for mut snapshot in snapshots {
                if thread_stop.load(Ordering::SeqCst) {
                    return;
                }
                session.apply(&mut snapshot);
                if let Err(e) = service.push_snapshot(snapshot) {
                    warn!(error = %e, "Replay stopped");
                    return;
                }
                thread::sleep(Duration::from_millis(interval_ms));
            }
            info!("Replay finished");
        })
        .map_err(|e| e.to_string())?;

    ctx.replay = Some(ReplayTask { stop, thread });
    println!("replaying {count} snapshots from {path}");
    Ok(())
}

/// Push a single tick: the last snapshot in the file.
pub fn tick(path: &str, ctx: &CliContext) -> Result<(), String> {
    let mut snapshot = read_snapshots(Path::new(path))?
        .pop()
        .ok_or_else(|| format!("{path} contains no snapshots"))?;
    ctx.session.apply(&mut snapshot);
    ctx.service.push_snapshot(snapshot).map_err(|e| e.to_string())
}

fn hotkeys(ctx: &CliContext) -> Result<&Hotkeys, String> {
    ctx.hotkeys
        .as_ref()
        .ok_or_else(|| "global hotkeys are disabled".to_string())
}

/// Simulate a key-down on the keyboard hook.
pub fn press(keys: &str, ctx: &CliContext) -> Result<(), String> {
    let combo = keys.parse::<KeyCombo>().map_err(|e| e.to_string())?;
    let hotkeys = hotkeys(ctx)?;
    if hotkeys.backend.lookup(&combo).is_none() {
        println!("{combo} is not bound");
        return Ok(());
    }
    if !hotkeys.hook.key_down(combo) {
        return Err("keyboard hook is not running".to_string());
    }
    Ok(())
}

pub fn focus(game: bool, meter: bool, ctx: &CliContext) -> Result<(), String> {
    ctx.service.set_focus(game, meter).map_err(|e| e.to_string())
}

/// Select an encounter by list index or boss name.
pub fn select(boss: &str, ctx: &CliContext) -> Result<(), String> {
    let index = match boss.parse::<usize>() {
        Ok(index) => index,
        Err(_) => {
            let frame = ctx.service.latest_frame();
            frame
                .encounters
                .entries()
                .iter()
                .skip(1)
                .position(|e| e.label().eq_ignore_ascii_case(boss))
                .map(|i| i + 1)
                .ok_or_else(|| format!("no encounter named {boss}"))?
        }
    };
    ctx.service.select_encounter(index).map_err(|e| e.to_string())
}

pub fn reset(ctx: &CliContext) -> Result<(), String> {
    ctx.service.reset_session().map_err(|e| e.to_string())
}

pub fn timed(ctx: &CliContext) -> Result<(), String> {
    ctx.service.toggle_timed().map_err(|e| e.to_string())
}

pub fn idle(ctx: &CliContext) -> Result<(), String> {
    ctx.service.toggle_invisible_when_idle().map_err(|e| e.to_string())
}

pub fn pin(ctx: &CliContext) -> Result<(), String> {
    ctx.service.toggle_always_visible().map_err(|e| e.to_string())
}

pub fn connect(server: &str, ctx: &CliContext) -> Result<(), String> {
    ctx.service.connected(server).map_err(|e| e.to_string())
}

pub fn status(ctx: &CliContext) {
    print_frame(&ctx.service.latest_frame());
}

pub fn bindings(ctx: &CliContext) -> Result<(), String> {
    let bound = hotkeys(ctx)?.dispatcher.bound_combos();
    if bound.is_empty() {
        println!("no hotkeys registered");
    }
    for (group, combo) in bound {
        println!("{group:<12} {combo}");
    }
    Ok(())
}

/// Reload the config file and register every hotkey group again.
pub fn rebind(ctx: &mut CliContext) -> Result<(), String> {
    ctx.config = AppConfig::load();
    let failures = hotkeys(ctx)?.dispatcher.rebind(&ctx.config.hotkeys);
    for (group, e) in &failures {
        println!("warning: {group} hotkeys disabled: {e}");
    }
    if failures.is_empty() {
        println!("hotkeys registered");
    }
    Ok(())
}

pub fn exit() {
    let mut stdout = std::io::stdout();
    let _ = write!(stdout, "quitting...");
    let _ = stdout.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_snapshots_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        std::fs::write(
            &path,
            "{\"first_hit\":1,\"last_hit\":2}\n\n{\"first_hit\":3,\"last_hit\":9,\"timed\":true}\n",
        )
        .unwrap();

        let snapshots = read_snapshots(&path).unwrap();
        assert_eq!(snapshots.len(), 2);
        assert!(snapshots[1].timed);
        assert_eq!(snapshots[1].window().duration_secs(), 6);
    }

    #[test]
    fn test_read_snapshots_reports_bad_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.jsonl");
        std::fs::write(&path, "{}\nnot json\n").unwrap();

        let err = read_snapshots(&path).unwrap_err();
        assert!(err.starts_with("line 2:"));
    }
}
