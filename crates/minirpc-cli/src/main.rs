//! # minirpc CLI Entry Point
//!
//! Main binary for the minirpc framework. Provides a command-line interface
//! for serving the demo arithmetic functions and for resolving and calling
//! functions on any minirpc server.
//!
//! ## Usage
//!
//! ```bash
//! # Start a server on the default port (3000, or $MINIRPC_PORT)
//! minirpc serve
//!
//! # Start a server on a specific address and port
//! minirpc serve -b 127.0.0.1 -p 4000
//!
//! # Resolve a function id
//! minirpc find ::1 3000 add2
//!
//! # Call a function (outputs raw JSON)
//! minirpc call ::1 3000 add2 --data1 5 --data2 03
//! ```

use std::net::IpAddr;

use anyhow::Result;
use argh::FromArgs;
use minirpc_client::MinirpcClient;
use minirpc_common::RpcPayload;
use minirpc_server::{Server, ServerConfig, DEFAULT_PORT};

/// Environment variable consulted for the serve port when `-p` is absent.
const PORT_ENV_VAR: &str = "MINIRPC_PORT";

/// Main CLI structure parsed from command-line arguments.
#[derive(FromArgs)]
/// minirpc - minimal RPC framework
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

/// Available CLI subcommands.
///
/// - **Serve**: Start a server exposing the demo functions
/// - **Find**: Resolve a function name to its id
/// - **Call**: Make a single RPC call (unix-friendly JSON output)
#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Serve(ServeArgs),
    Find(FindArgs),
    Call(CallArgs),
}

/// Arguments for starting a minirpc server.
///
/// # Example
///
/// ```bash
/// minirpc serve -b :: -p 3000 --max-payload 1048576
/// ```
#[derive(FromArgs)]
#[argh(subcommand, name = "serve")]
/// start a minirpc server with the demo arithmetic functions
struct ServeArgs {
    /// port to listen on
    ///
    /// Falls back to the MINIRPC_PORT environment variable, then to 3000.
    #[argh(option, short = 'p')]
    port: Option<u32>,

    /// address to bind
    ///
    /// Defaults to "::", which accepts IPv4 peers too on dual-stack hosts.
    #[argh(option, short = 'b', default = "\"::\".into()")]
    bind: String,

    /// largest call payload accepted, in bytes
    #[argh(option, long = "max-payload")]
    max_payload: Option<usize>,
}

/// Arguments for resolving a function.
#[derive(FromArgs)]
#[argh(subcommand, name = "find")]
/// resolve a function name to its id
struct FindArgs {
    /// server host name or address
    #[argh(positional)]
    host: String,

    /// server port
    #[argh(positional)]
    port: u32,

    /// function name
    #[argh(positional)]
    name: String,
}

/// Arguments for calling a function.
///
/// # Examples
///
/// ```bash
/// # add2(5, 3)
/// minirpc call ::1 3000 add2 --data1 5 --data2 03
///
/// # Pipe output to jq
/// minirpc call ::1 3000 add2 --data1 5 --data2 03 | jq '.data1'
/// ```
#[derive(FromArgs)]
#[argh(subcommand, name = "call")]
/// call a function and print the result as JSON
struct CallArgs {
    /// server host name or address
    #[argh(positional)]
    host: String,

    /// server port
    #[argh(positional)]
    port: u32,

    /// function name
    #[argh(positional)]
    name: String,

    /// integer argument (data1)
    #[argh(option, short = 'd', default = "0")]
    data1: i64,

    /// byte argument (data2) as hex, e.g. "03" or "deadbeef"
    #[argh(option)]
    data2: Option<String>,
}

/// Picks the serve port: CLI flag, then environment, then the default.
fn resolve_port(flag: Option<u32>, env_value: Option<String>) -> Result<u32> {
    if let Some(port) = flag {
        return Ok(port);
    }

    match env_value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {} '{}': {}", PORT_ENV_VAR, value, e)),
        None => Ok(DEFAULT_PORT as u32),
    }
}

/// Builds the call payload from the `call` arguments.
fn build_payload(data1: i64, data2: Option<&str>) -> Result<RpcPayload> {
    let payload = RpcPayload::new(data1);
    match data2 {
        None => Ok(payload),
        Some(hex_str) => {
            let bytes = hex::decode(hex_str)
                .map_err(|e| anyhow::anyhow!("Invalid data2 hex '{}': {}", hex_str, e))?;
            if bytes.is_empty() {
                return Err(anyhow::anyhow!("data2 must contain at least one byte"));
            }
            Ok(payload.with_data2(bytes))
        }
    }
}

fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // Initialize tracing only for serve
    // find/call keep stdout clean for unix tool usage (piping to jq, etc.)
    if matches!(cli.command, Commands::Serve(_)) {
        // Set default log level to INFO, but allow RUST_LOG env var to override
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    match cli.command {
        Commands::Serve(args) => run_serve(args),
        Commands::Find(args) => run_find(args),
        Commands::Call(args) => run_call(args),
    }
}

/// Executes the `serve` subcommand. Runs until Ctrl-C.
fn run_serve(args: ServeArgs) -> Result<()> {
    let port = resolve_port(args.port, std::env::var(PORT_ENV_VAR).ok())?;
    let bind: IpAddr = args
        .bind
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address {}: {}", args.bind, e))?;

    let mut config = ServerConfig::new(port)?.with_bind(bind);
    if let Some(max) = args.max_payload {
        config = config.with_max_payload_len(max);
    }

    tracing::info!("Starting minirpc server");
    tracing::info!("Binding to: {}", config.socket_addr());

    let mut server = Server::bind(config)?;
    minirpc_cli::arith::register_demo_service(&mut server)?;

    server.serve_with_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    })?;

    Ok(())
}

/// Executes the `find` subcommand, printing the id.
fn run_find(args: FindArgs) -> Result<()> {
    let mut client = MinirpcClient::connect(&args.host, args.port)?;
    let handle = client.find(&args.name)?;
    client.close();

    println!("{}", handle.fid());
    Ok(())
}

/// Executes the `call` subcommand.
///
/// This function:
/// 1. Builds the payload from `--data1` / `--data2`
/// 2. Connects and resolves the function name
/// 3. Makes the RPC call
/// 4. Outputs the raw JSON result to stdout
///
/// No tracing/logging is initialized for this command to keep output clean
/// for unix tool usage (piping to jq, etc.).
fn run_call(args: CallArgs) -> Result<()> {
    let payload = build_payload(args.data1, args.data2.as_deref())?;

    let mut client = MinirpcClient::connect(&args.host, args.port)?;
    let handle = client.find(&args.name)?;
    let result = client.call(&handle, &payload)?;
    client.close();

    // Output raw JSON to stdout
    println!("{}", serde_json::to_string(&result)?);

    Ok(())
}
