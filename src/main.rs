use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use mcp_gateways::config::{find_config_file, load_config, save_config, to_toml, Config};
use mcp_gateways::mcp::{tools_for, Domain, McpServer, ToolRegistry};
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// MCP Gateways - MCP tool servers for weather, IP, search, wiki, UFC and registry APIs
#[derive(Parser, Debug)]
#[command(name = "mcp-gateways")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MCP tool servers over public web APIs", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the MCP server of one domain
    Serve {
        /// Which tool server to run
        #[arg(value_enum)]
        domain: Domain,

        /// Host to bind to for HTTP mode
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port for HTTP mode (defaults to the domain's own port)
        #[arg(long, short)]
        port: Option<u16>,

        /// Run in stdio mode (for MCP clients like Claude Desktop)
        #[arg(long)]
        stdio: bool,
    },

    /// List the tools of a domain
    Tools {
        #[arg(value_enum)]
        domain: Domain,
    },

    /// Call one tool and print its result
    Call {
        #[arg(value_enum)]
        domain: Domain,

        /// Tool name, e.g. get_today_weather
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(long, short, default_value = "{}")]
        args: String,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Also write it to this file
        #[arg(long)]
        write: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(cli: &Cli) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mcp_gateways={}", level)));

    // stdout carries the stdio transport, so logs always go to stderr
    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let path = cli.config.clone().or_else(find_config_file);
    if let Some(path) = &path {
        tracing::info!("Using config file: {}", path.display());
    }
    load_config(path.as_deref()).context("could not load configuration")
}

fn print_tools(domain: Domain, tools: &ToolRegistry) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Tool").add_attribute(Attribute::Bold),
            Cell::new("Description").add_attribute(Attribute::Bold),
            Cell::new("Parameters").add_attribute(Attribute::Bold),
        ]);

    for tool in tools.all() {
        let params = tool.input_schema["properties"]
            .as_object()
            .map(|props| props.keys().cloned().collect::<Vec<_>>().join(", "))
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(&tool.name),
            Cell::new(&tool.description),
            Cell::new(params),
        ]);
    }

    println!("{} ({} tools)", domain.server_name(), tools.len());
    println!("{table}");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    match &cli.command {
        Commands::Serve {
            domain,
            host,
            port,
            stdio,
        } => {
            let config = resolve_config(&cli)?;
            let tools = tools_for(*domain, &config)
                .with_context(|| format!("cannot start the {} server", domain))?;
            let server = McpServer::new(tools, domain.server_name())?;

            if *stdio {
                server.run().await?;
            } else {
                let addr = format!("{}:{}", host, port.unwrap_or(domain.default_port()));
                let (_bound, handle) = server.run_http(&addr).await?;
                handle
                    .await
                    .map_err(|e| anyhow::anyhow!("Server task failed: {}", e))?;
            }
        }

        Commands::Tools { domain } => {
            let config = resolve_config(&cli)?;
            let tools = tools_for(*domain, &config)?;
            print_tools(*domain, &tools);
        }

        Commands::Call { domain, tool, args } => {
            let config = resolve_config(&cli)?;
            let tools = tools_for(*domain, &config)?;
            let args: Value = serde_json::from_str(args).context("--args must be JSON")?;

            match tools.execute(tool, args).await? {
                Value::String(text) => println!("{}", text),
                other => println!("{}", serde_json::to_string_pretty(&other)?),
            }
        }

        Commands::Config { write } => {
            let config = resolve_config(&cli)?;
            print!("{}", to_toml(&config)?);
            if let Some(path) = write {
                save_config(&config, path)?;
                tracing::info!("Configuration written to {}", path.display());
            }
        }

        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(*shell, &mut command, "mcp-gateways", &mut std::io::stdout());
        }
    }

    Ok(())
}
