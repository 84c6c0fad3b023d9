use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "lifelog", version, about = "Lifelog CLI")]
struct Cli {
    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Print machine-readable JSON on stdout
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync sources into the destination store
    Sync(commands::sync::SyncArgs),
    /// Write weekly or monthly recaps
    Recap {
        #[command(subcommand)]
        action: commands::recap::RecapAction,
    },
    /// Week arithmetic
    Week {
        #[command(subcommand)]
        action: commands::week::WeekAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Inspect the source registry
    Registry {
        #[command(subcommand)]
        action: commands::registry::RegistryAction,
    },
    /// Store or remove API tokens
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = if verbose > 0 {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let json = cli.json;
    let result = match cli.command {
        Commands::Sync(args) => commands::sync::run(args, json).await,
        Commands::Recap { action } => commands::recap::run(action, json).await,
        Commands::Week { action } => commands::week::run(action, json),
        Commands::Config { action } => commands::config::run(action, json),
        Commands::Registry { action } => commands::registry::run(action, json),
        Commands::Auth { action } => commands::auth::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
