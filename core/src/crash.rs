//! Crash reporting
//!
//! A panic anywhere in the process is fatal. The hook writes a diagnostic
//! bundle to `error.log`, optionally posts it to a remote endpoint, tells the
//! user, and exits.

use std::backtrace::Backtrace;
use std::fs::OpenOptions;
use std::io::{self, BufRead, IsTerminal, Write};
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use tracing::error;

pub const ERROR_LOG: &str = "error.log";

#[derive(Debug, Clone, Default)]
pub struct CrashOptions {
    /// Directory for `error.log`; nothing is written when unset
    pub log_dir: Option<PathBuf>,
    /// Endpoint for remote reports; only set when the user opted in
    pub report_url: Option<String>,
    pub version: String,
    /// Wait for Enter on an interactive terminal before exiting
    pub wait_for_ack: bool,
}

/// Install the process-wide panic hook.
pub fn install(options: CrashOptions) {
    std::panic::set_hook(Box::new(move |info| {
        let text = bundle(
            &panic_message(info),
            info.location().map(|l| l.to_string()).as_deref(),
            &Backtrace::force_capture().to_string(),
            &options.version,
            &Utc::now().to_rfc3339(),
        );
        // The tracing file writer is non-blocking and is not flushed by
        // `exit`; stderr and error.log are written synchronously.
        error!(crash = %text, "Fatal error");

        let written = options
            .log_dir
            .as_deref()
            .and_then(|dir| write_bundle(dir, &text).ok());

        if let Some(url) = options.report_url.clone() {
            send_report(url, text.clone());
        }

        notify_user(&text, written.as_deref(), options.wait_for_ack);
        std::process::exit(1);
    }));
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Format the diagnostic bundle.
pub fn bundle(message: &str, location: Option<&str>, backtrace: &str, version: &str, timestamp: &str) -> String {
    format!(
        "##### CRASH (version={version}) {timestamp} #####\n{message}\nat {}\n{backtrace}\n",
        location.unwrap_or("<unknown>")
    )
}

/// Append `text` to `error.log` in `dir`, creating both if needed.
pub fn write_bundle(dir: &Path, text: &str) -> io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(ERROR_LOG);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    file.write_all(text.as_bytes())?;
    Ok(path)
}

/// Best-effort POST of the bundle. Every failure is ignored.
///
/// Runs on its own thread since the blocking client must not be used from
/// inside an async runtime.
fn send_report(url: String, text: String) {
    let sender = thread::spawn(move || {
        let Ok(client) = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(8))
            .build()
        else {
            return;
        };
        let _ = client.post(url).form(&[("error", text)]).send();
    });
    let _ = sender.join();
}

fn write_notice(out: &mut impl Write, text: &str, log_path: Option<&Path>) -> io::Result<()> {
    writeln!(out, "\n{text}")?;
    writeln!(out, "A fatal error occurred and the meter has to close.")?;
    if let Some(path) = log_path {
        writeln!(out, "Details were written to {}", path.display())?;
    }
    out.flush()
}

fn notify_user(text: &str, log_path: Option<&Path>, wait_for_ack: bool) {
    let mut stderr = io::stderr().lock();
    let _ = write_notice(&mut stderr, text, log_path);
    if wait_for_ack && io::stdin().is_terminal() {
        let _ = writeln!(stderr, "Press Enter to exit.");
        let _ = stderr.flush();
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
    }
}
