use anyhow::Result;
use clap::{Parser, Subcommand};
use symfetch::commands::{classify_command, resolve_command, show_config_command};
use tracing_subscriber::EnvFilter;

/// Resolve missing debug symbols for published .NET modules.
///
/// This CLI is a thin wrapper around `symfetch-core` (exposed in code as
/// `symfetch_core`). All substantive logic lives in the library.
#[derive(Parser, Debug)]
#[command(
    name = "symfetch",
    version,
    about = "Resolve missing debug symbols via dotnet-symbol",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify every module under a directory and download missing symbols.
    ///
    /// Modules with a sibling `.pdb` or an embedded portable PDB are skipped; the rest
    /// are passed to `dotnet tool run dotnet-symbol` in a single invocation.
    Resolve {
        /// Publish directory to scan. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        dir: String,

        /// Cache directory for downloaded symbols. Overrides SYMFETCH_CACHE_DIRECTORY.
        #[arg(long)]
        cache_dir: Option<String>,

        /// Optional settings file (json, yaml or yml).
        #[arg(long)]
        config: Option<String>,

        /// Maximum time the downloader may run, in seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Classify modules only; never contacts a symbol server.
    Classify {
        /// Directory to scan. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        dir: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show the settings a resolve run would use.
    ShowConfig {
        /// Publish directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        dir: String,

        #[arg(long)]
        cache_dir: Option<String>,

        #[arg(long)]
        config: Option<String>,

        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("symfetch=info,symfetch_core=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("symfetch: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Resolve { dir, cache_dir, config, timeout_secs, json } => {
            resolve_command(&dir, cache_dir, config.as_deref(), timeout_secs, json)?;
        }
        Command::Classify { dir, json } => {
            classify_command(&dir, json)?;
        }
        Command::ShowConfig { dir, cache_dir, config, timeout_secs, json } => {
            show_config_command(&dir, cache_dir, config.as_deref(), timeout_secs, json)?;
        }
    }

    Ok(())
}
