use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use qlite_client::{CommandKind, QliteClient};
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(Debug, Parser)]
#[command(
    name = "qlite-cli",
    version,
    about = "Small async CLI for calling a Qubic Lite ql-node"
)]
struct Cli {
    /// URL of the ql-node API.
    #[arg(long, env = "QLITE_NODE_URL")]
    node_url: Option<String>,

    /// Abort requests that take longer than this many seconds.
    #[arg(long, value_name = "SECONDS")]
    timeout_secs: Option<u64>,

    /// Emit compact JSON instead of pretty-printed output.
    #[arg(long)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List ql-node commands and their parameters.
    Commands {
        /// Filter commands by substring match on the command name.
        #[arg(long)]
        filter: Option<String>,
    },
    /// Call a ql-node command by name.
    Call(CallArgs),
}

#[derive(Debug, Args)]
struct CallArgs {
    /// Command name (for example: `node_info`, `qubic_read`).
    command: String,

    /// Parameter in form key=value. Repeat as needed.
    #[arg(long = "param", value_name = "KEY=VALUE")]
    param: Vec<String>,

    /// JSON object with all parameters.
    #[arg(long, conflicts_with = "params_file")]
    params_json: Option<String>,

    /// Path to a file containing a JSON object with all parameters.
    #[arg(long, value_name = "PATH", conflicts_with = "params_json")]
    params_file: Option<PathBuf>,
}

/// Entry point for the async CLI.
///
/// Parses command-line arguments, builds the client, dispatches subcommands,
/// and prints JSON output.
#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    // `commands` only reads the static catalog.
    if let Command::Commands { filter } = &cli.command {
        print_commands(filter.as_deref());
        return Ok(());
    }

    let Some(node_url) = &cli.node_url else {
        bail!("no ql-node URL given: pass --node-url or set QLITE_NODE_URL");
    };

    let mut client = QliteClient::new(node_url)
        .with_context(|| format!("failed to create client for ql-node '{node_url}'"))?;

    if let Some(seconds) = cli.timeout_secs {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(seconds))
            .build()
            .context("failed to build HTTP client")?;
        client = client.with_http_client(http);
    }

    let output = match &cli.command {
        Command::Commands { .. } => unreachable!("handled above"),
        Command::Call(args) => call_command(&client, args)
            .await
            .with_context(|| format!("command failed: '{}'", args.command))?,
    };

    print_json(&output, cli.compact).context("failed to print JSON output")?;
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Prints the command catalog, one command per line followed by its parameters.
fn print_commands(filter: Option<&str>) {
    let filter = filter.map(str::to_ascii_lowercase);

    let commands: Vec<_> = CommandKind::ALL
        .into_iter()
        .filter(|kind| filter.as_ref().is_none_or(|needle| kind.name().contains(needle)))
        .collect();

    let name_width = commands
        .iter()
        .flat_map(|kind| kind.params())
        .map(|spec| spec.name.len())
        .max()
        .unwrap_or(0);

    for kind in commands {
        println!("{kind}");
        for spec in kind.params() {
            let default = spec
                .default
                .map(|default| format!(", default {default}"))
                .unwrap_or_default();
            println!(
                "    {:<name_width$}  {} (wire: \"{}\"{default})",
                spec.name, spec.rule, spec.wire_name
            );
        }
    }
}

/// Calls a ql-node command with parameters collected from the CLI.
async fn call_command(client: &QliteClient, args: &CallArgs) -> Result<Value> {
    let mut params = parse_params_input(args).context("failed to parse parameter input")?;
    for (key, value) in parse_pairs(&args.param).context("failed to parse --param arguments")? {
        params.insert(key, value);
    }

    let response = client
        .call(&args.command, &params)
        .await
        .with_context(|| format!("ql-node command '{}' returned an error", args.command))?;
    Ok(response.into_value())
}

/// Parses repeated `key=value` arguments.
///
/// Values that start with `{` or `[` are parsed as JSON so objects and
/// arrays can be passed inline; everything else stays a string.
fn parse_pairs(values: &[String]) -> Result<Vec<(String, Value)>> {
    let mut pairs = Vec::with_capacity(values.len());
    for item in values {
        let Some((key, raw)) = item.split_once('=') else {
            bail!("invalid --param value '{item}': expected key=value");
        };
        if key.is_empty() {
            bail!("invalid --param value '{item}': empty key");
        }
        let value = if raw.starts_with('{') || raw.starts_with('[') {
            serde_json::from_str(raw)
                .with_context(|| format!("failed to parse JSON in --param '{key}'"))?
        } else {
            Value::from(raw)
        };
        pairs.push((key.to_owned(), value));
    }
    Ok(pairs)
}

/// Parses an optional JSON parameter object from inline text or a file path.
fn parse_params_input(args: &CallArgs) -> Result<Map<String, Value>> {
    let raw = match (&args.params_json, &args.params_file) {
        (Some(raw), None) => raw.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("failed to read --params-file '{}'", path.display()))?,
        (None, None) => return Ok(Map::new()),
        (Some(_), Some(_)) => bail!("use only one of --params-json or --params-file"),
    };

    match serde_json::from_str(&raw).context("failed to parse parameter JSON")? {
        Value::Object(params) => Ok(params),
        _ => bail!("parameters must be a JSON object"),
    }
}

/// Prints a JSON value either compact or pretty-formatted.
fn print_json(value: &Value, compact: bool) -> Result<()> {
    if compact {
        println!(
            "{}",
            serde_json::to_string(value).context("Failed to render JSON")?
        );
    } else {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("Failed to render JSON")?
        );
    }
    Ok(())
}
