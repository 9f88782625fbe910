mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "nxtgen",
    about = "Simulated DevOps dashboard: replay troubleshooting, auto-fix, and pipeline recovery sequences",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .nxtgen/ or .git/)
    #[arg(long, global = true, env = "NXTGEN_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List workflows, security findings, pipeline steps, or MCP servers
    List {
        /// workflows | findings | steps | servers | tool-tests
        kind: String,
    },

    /// Replay the troubleshooting sequence for a workflow
    Troubleshoot {
        /// Workflow id
        id: String,
    },

    /// Replay the auto-fix sequence for a security finding
    Fix {
        /// Finding id
        id: String,
    },

    /// Replay the troubleshooting sequence for a pipeline step
    Step {
        /// Step name, e.g. kubernetes
        name: String,
    },

    /// Connect an MCP server
    Connect {
        /// Server id, e.g. github
        id: String,
    },

    /// Replay a test invocation of an MCP server's tool
    TestTool {
        /// Server id, e.g. supabase
        server: String,
        /// Tool name, e.g. list_tables
        tool: String,
    },

    /// Run a security scan and show the new findings
    Scan,

    /// Play the self-healing incident from the landing-page terminal
    Demo,

    /// Start the HTTP API server
    Serve {
        /// Port to listen on (default: server.port from config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show, validate, or create the project config
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::List { kind } => cmd::list::run(&root, &kind, cli.json),
        Commands::Troubleshoot { id } => cmd::run::troubleshoot(&root, &id, cli.json),
        Commands::Fix { id } => cmd::run::fix(&root, &id, cli.json),
        Commands::Step { name } => cmd::run::step(&root, &name, cli.json),
        Commands::Connect { id } => cmd::run::connect(&root, &id, cli.json),
        Commands::TestTool { server, tool } => {
            cmd::run::test_tool(&root, &server, &tool, cli.json)
        }
        Commands::Scan => cmd::scan::run(&root, cli.json),
        Commands::Demo => cmd::demo::run(&root, cli.json),
        Commands::Serve { port } => cmd::serve::run(&root, port),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
