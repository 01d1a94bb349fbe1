//! handsome-daemon - registry service host.
//!
//! CHANGELOG:
//! - 10/19/2026 - Initial implementation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use handsome_registry::config::DaemonConfig;
use handsome_registry::daemon::server::DaemonServer;
use handsome_registry::DaemonClient;
use std::path::Path;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "handsome-daemon")]
#[command(version, about = "Extension-to-program registry daemon")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon
    Start {
        /// Socket path (default: $HANDSOME_SOCKET or ~/.handsome/daemon.sock)
        #[arg(long)]
        socket: Option<String>,

        /// Database path (default: $HANDSOME_DB or ~/.handsome/extensions.db)
        #[arg(long)]
        db: Option<String>,

        /// Run in foreground (don't daemonize)
        #[arg(long)]
        foreground: bool,
    },

    /// Stop the daemon
    Stop {
        /// Socket path
        #[arg(long)]
        socket: Option<String>,
    },

    /// Check daemon status
    Status {
        /// Socket path
        #[arg(long)]
        socket: Option<String>,
    },
}

fn main() -> Result<()> {
    handsome_registry::logging::init(tracing::Level::INFO);

    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            socket,
            db,
            foreground,
        } => cmd_start(DaemonConfig::resolve(socket.as_deref(), db.as_deref()), foreground),
        Commands::Stop { socket } => cmd_stop(DaemonConfig::resolve(socket.as_deref(), None)),
        Commands::Status { socket } => cmd_status(DaemonConfig::resolve(socket.as_deref(), None)),
    }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}

fn cmd_start(config: DaemonConfig, foreground: bool) -> Result<()> {
    create_parent(&config.socket_path)?;
    create_parent(&config.db_path)?;

    if foreground {
        info!("starting in foreground");
        return DaemonServer::new(&config).serve();
    }

    use daemonize::Daemonize;

    // The daemon chdirs to /tmp, so relative paths must be pinned first.
    let config = DaemonConfig::with_paths(
        std::path::absolute(&config.socket_path)?,
        std::path::absolute(&config.db_path)?,
    );

    let log_path = config.log_path();
    let log = std::fs::File::create(&log_path)
        .with_context(|| format!("Failed to create {}", log_path.display()))?;

    let daemonize = Daemonize::new()
        .pid_file(config.pid_path())
        .working_directory("/tmp")
        .stderr(log);

    match daemonize.start() {
        Ok(_) => DaemonServer::new(&config).serve(),
        Err(e) => {
            error!(error = %e, "failed to daemonize");
            std::process::exit(1);
        }
    }
}

fn cmd_stop(config: DaemonConfig) -> Result<()> {
    let pid_file = config.pid_path();

    let pid_str = std::fs::read_to_string(&pid_file)
        .with_context(|| format!("No pid file at {}", pid_file.display()))?;
    let pid: i32 = pid_str.trim().parse().context("Malformed pid file")?;

    // SAFETY: kill(2) with a plain pid and signal number has no memory effects.
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc != 0 {
        error!(pid, error = %std::io::Error::last_os_error(), "kill failed");
    }

    let _ = std::fs::remove_file(&pid_file);
    let _ = std::fs::remove_file(&config.socket_path);

    println!("Daemon stopped (pid {})", pid);

    Ok(())
}

fn cmd_status(config: DaemonConfig) -> Result<()> {
    let client = DaemonClient::new(&config.socket_path, 2.0)?;

    match client.health() {
        Ok(health) => {
            println!("Daemon running at {}", config.socket_path.display());
            println!("{}", serde_json::to_string_pretty(&health)?);
            Ok(())
        }
        Err(e) => {
            println!("Daemon not running ({})", e);
            std::process::exit(1);
        }
    }
}
