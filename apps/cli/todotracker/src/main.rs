use todotracker::commands::{self, serve::ServeArgs};
use todotracker::context::AppContext;
use todotracker::error::TodotrackerError;
use todotracker::logger::{FILE_ONLY_TARGET, LogLevels, initialize as LoggerInitialize};
use todotracker::output::Format;

use registry_core::RegistryPaths;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{debug, error, info};

#[derive(Parser)]
#[command(
    name = "todotracker",
    version,
    about = "Registry and dashboard for TodoTracker project servers"
)]
struct Cli {
    /// Log debug output to stderr and the log file
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start (or reuse) the server for a project
    Serve(ServeArgs),
    /// Run the dashboard listing every running project server
    Dashboard,
    /// List running project servers
    List {
        /// Output format
        #[arg(long, value_enum, default_value = "pretty")]
        format: Format,
    },
    /// Remove registry entries whose process has exited
    Cleanup,
}

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    match run(cli, dotenv.is_ok()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(target: FILE_ONLY_TARGET, "{e}");
            eprintln!("{}", e.report_line());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, loaded_dotenv: bool) -> Result<(), TodotrackerError> {
    let paths = RegistryPaths::detect()?;
    AppContext::prepare_home(&paths)?;
    LoggerInitialize(&paths.home, LogLevels::from_verbose(cli.verbose))?;

    info!("todotracker {} starting", env!("CARGO_PKG_VERSION"));
    if loaded_dotenv {
        debug!("Loaded environment from .env");
    }

    let ctx = AppContext::load(paths)?;

    match cli.command {
        Commands::Serve(args) => commands::serve::run(&ctx, args).await,
        Commands::Dashboard => commands::dashboard::run(&ctx).await,
        Commands::List { format } => commands::list::run(&ctx, format).await,
        Commands::Cleanup => commands::cleanup::run(&ctx),
    }
}
