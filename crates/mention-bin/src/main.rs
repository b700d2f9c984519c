//! mention-demo entrypoint.
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Once;

use anyhow::{Context, Result};
use clap::Parser;
use core_config::load_from;
use mention_demo::Demo;
use mention_demo::script::parse_line;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

const LOG_FILE: &str = "mention-demo.log";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "mention-demo", version, about = "Drive the mention core from a script")]
struct Args {
    /// Script to run. Commands are read from stdin when omitted.
    pub script: Option<PathBuf>,
    /// Optional configuration file path (overrides discovery of `mentions.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Stop at the first failing command instead of reporting and continuing.
    #[arg(long)]
    pub strict: bool,
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let log_path = log_dir.join(LOG_FILE);
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }
    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .try_init()
        .ok()
        .map(|_| guard)
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn main() -> Result<()> {
    let _log_guard = configure_logging();
    install_panic_hook();

    let args = Args::parse();
    let config = load_from(args.config.clone())?;
    let script_str = args.script.as_ref().map(|p| p.display().to_string());
    info!(
        target: "runtime.startup",
        script = script_str.as_deref(),
        config_override = args.config.is_some(),
        "startup"
    );

    let reader: Box<dyn BufRead> = match &args.script {
        Some(path) => Box::new(BufReader::new(
            std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(std::io::stdin().lock()),
    };

    let mut demo = Demo::new(&config)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let outcome = parse_line(&line).and_then(|cmd| match cmd {
            Some(cmd) => demo.execute(&cmd, &mut out),
            None => Ok(()),
        });
        if let Err(err) = outcome {
            let lineno = n + 1;
            if args.strict {
                error!(target: "runtime", lineno, error = %err, "command_failed");
                return Err(err.context(format!("line {lineno}")));
            }
            warn!(target: "runtime", lineno, error = %err, "command_failed");
            writeln!(out, "error (line {lineno}): {err:#}")?;
        }
    }
    info!(target: "runtime", mentions = demo.session().registry().spans().len(), "shutdown");
    Ok(())
}
