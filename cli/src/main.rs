use std::io::Write;

use clap::{Parser, Subcommand};
use tally_cli::{CliContext, commands, logging, readline};
use tally_core::context::{AppConfig, AppConfigExt, app_dir};
use tally_core::crash::{self, CrashOptions};

#[tokio::main]
async fn main() -> Result<(), String> {
    let _log_guard = logging::init();

    let config = AppConfig::load();
    crash::install(CrashOptions {
        log_dir: app_dir(),
        report_url: config
            .window
            .crash_report_url
            .clone()
            .filter(|_| config.window.remote_crash_reports),
        version: env!("CARGO_PKG_VERSION").to_string(),
        wait_for_ack: true,
    });

    let mut ctx = CliContext::start(config)?;

    loop {
        let line = readline()?;
        if line.is_empty() {
            // EOF
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &mut ctx) {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                writeln!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    ctx.shutdown().await;
    Ok(())
}

#[derive(Parser)]
#[command(version, about = "tally")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream snapshots from a JSON-lines file
    Replay {
        #[arg(short, long)]
        path: String,
        #[arg(short, long, default_value_t = 1000)]
        interval_ms: u64,
    },
    /// Push the last snapshot of a JSON-lines file
    Tick {
        #[arg(short, long)]
        path: String,
    },
    /// Simulate a key-down, e.g. `press --keys Ctrl+Alt+V`
    Press {
        #[arg(short, long)]
        keys: String,
    },
    Focus {
        #[arg(long)]
        game: bool,
        #[arg(long)]
        meter: bool,
    },
    /// Select an encounter by index or boss name
    Select {
        #[arg(short, long)]
        boss: String,
    },
    Reset,
    Timed,
    /// Toggle invisible-when-idle
    Idle,
    /// Toggle always-visible
    Pin,
    Connect {
        #[arg(short, long)]
        server: String,
    },
    Status,
    Bindings,
    /// Reload hotkeys from the config file
    Rebind,
    Exit,
}

fn respond(line: &str, ctx: &mut CliContext) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "tally".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match &cli.command {
        Some(Commands::Replay { path, interval_ms }) => commands::replay(path, *interval_ms, ctx)?,
        Some(Commands::Tick { path }) => commands::tick(path, ctx)?,
        Some(Commands::Press { keys }) => commands::press(keys, ctx)?,
        Some(Commands::Focus { game, meter }) => commands::focus(*game, *meter, ctx)?,
        Some(Commands::Select { boss }) => commands::select(boss, ctx)?,
        Some(Commands::Reset) => commands::reset(ctx)?,
        Some(Commands::Timed) => commands::timed(ctx)?,
        Some(Commands::Idle) => commands::idle(ctx)?,
        Some(Commands::Pin) => commands::pin(ctx)?,
        Some(Commands::Connect { server }) => commands::connect(server, ctx)?,
        Some(Commands::Status) => commands::status(ctx),
        Some(Commands::Bindings) => commands::bindings(ctx)?,
        Some(Commands::Rebind) => commands::rebind(ctx)?,
        Some(Commands::Exit) => {
            commands::exit();
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}
