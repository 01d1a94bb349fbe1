//! handsome-client - command-line front end for the registry daemon.
//!
//! CHANGELOG:
//! - 10/19/2026 - Validate --timeout at parse time
//! - 10/19/2026 - Initial implementation

use clap::{Parser, Subcommand};
use handsome_registry::client::{self, ClientError, DaemonClient};
use handsome_registry::config;
use handsome_registry::daemon::protocol::Request;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "handsome-client")]
#[command(version, about = "Register and look up programs by file extension")]
struct Cli {
    /// Socket path (default: $HANDSOME_SOCKET or ~/.handsome/daemon.sock)
    #[arg(long, global = true)]
    socket: Option<String>,

    /// Request timeout (seconds, above zero)
    #[arg(long, global = true, default_value = "5.0", value_parser = parse_timeout)]
    timeout: f64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a program for an extension
    Add {
        /// Program path
        path: String,
        /// Extension, exactly as lookups will use it (e.g. "txt")
        extension: String,
    },

    /// Remove every registration of a program
    Delete {
        /// Program path
        path: String,
    },

    /// List programs registered for a file's extension
    Variants {
        /// File name; the extension is the text after the last '.'
        file: String,
    },

    /// Open a file with a registered program
    Open {
        /// File to open
        file: String,

        /// Which of the registered programs to use
        #[arg(long, default_value_t = 0)]
        index: usize,
    },

    /// Send a raw call
    Call {
        /// Method name (Add, Delete, Variants, Health)
        method: String,

        /// JSON parameters (as string)
        #[arg(long)]
        params: Option<String>,
    },
}

fn main() -> ExitCode {
    handsome_registry::logging::init(tracing::Level::WARN);

    let cli = Cli::parse();
    let client = match DaemonClient::new(config::client_socket_path(cli.socket.as_deref()), cli.timeout) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{}", e.to_json());
            return ExitCode::from(1);
        }
    };

    let result = match cli.command {
        Command::Add { path, extension } => {
            client.add_program(&path, &extension).map(|s| serde_json::json!(s))
        }
        Command::Delete { path } => client.delete_program(&path).map(|s| serde_json::json!(s)),
        Command::Variants { file } => client.select_program(&file).map(|p| serde_json::json!(p)),
        Command::Open { file, index } => open(&client, &file, index),
        Command::Call { method, params } => call(&client, method, params.as_deref()),
    };

    match result {
        Ok(value) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| "null".to_string())
            );
            ExitCode::from(0)
        }
        Err(e) => {
            eprintln!("{}", e.to_json());
            ExitCode::from(1)
        }
    }
}

fn parse_timeout(raw: &str) -> Result<f64, String> {
    let secs: f64 = raw.parse().map_err(|e| format!("{}", e))?;
    client::timeout_from_secs(secs).map_err(|e| e.to_string())?;
    Ok(secs)
}

fn open(client: &DaemonClient, file: &str, index: usize) -> Result<serde_json::Value, ClientError> {
    let programs = client.select_program(file)?;
    let program = programs.get(index).ok_or_else(|| ClientError::Remote {
        code: "NOT_FOUND".to_string(),
        message: format!(
            "no program #{} registered for {:?} ({} found)",
            index,
            file,
            programs.len()
        ),
        status: None,
    })?;

    let child = client::run(program, file)?;
    Ok(serde_json::json!({ "program": program, "pid": child.id() }))
}

fn call(
    client: &DaemonClient,
    method: String,
    params: Option<&str>,
) -> Result<serde_json::Value, ClientError> {
    let params = match params {
        Some(p) => serde_json::from_str(p).map_err(ClientError::ParseError)?,
        None => serde_json::json!({}),
    };
    client.call_ok(&Request::new(method, params))
}
