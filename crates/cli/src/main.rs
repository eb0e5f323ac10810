mod commands;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "pigeon-site")]
#[command(version, about = "Localized site and blog for Pigeon Map", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Initialize a new site directory
    Init {
        /// Path to create the site in
        path: PathBuf,

        /// Site name
        #[arg(long)]
        name: Option<String>,

        /// Public origin, e.g. https://pigeon-map.digging.pl
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Validate site.toml and content
    Validate {
        /// Path to site directory
        path: PathBuf,
    },

    /// Serve the site locally
    Serve {
        /// Path to site directory
        path: PathBuf,

        /// Port to serve on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Reload pages in the browser when files change
        #[arg(long)]
        watch: bool,
    },

    /// Export the site as static files
    Build {
        /// Path to site directory
        path: PathBuf,

        /// Output directory for generated site
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// `RUST_LOG` filter, `info` by default; logs go to stderr
fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Init {
            path,
            name,
            base_url,
        } => commands::init::run(path, name, base_url).await,
        Command::Validate { path } => commands::validate::run(path).await,
        Command::Serve { path, port, watch } => commands::serve::run(path, port, watch).await,
        Command::Build { path, output } => commands::build::run(path, output).await,
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "pigeon-site", &mut io::stdout());
            Ok(())
        }
    }
}
