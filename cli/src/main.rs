use clap::{Parser, Subcommand};

mod commands;
mod util;

#[derive(Parser)]
#[command(
    name = "trialguard",
    version,
    about = "TrialGuard CLI: send usage events, inspect decisions and tune tenant policies"
)]
struct Cli {
    /// API base URL
    #[arg(long, env = "TRIALGUARD_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// Print compact JSON instead of pretty-printed output
    #[arg(long, global = true)]
    raw: bool,

    /// Log requests and responses to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API health
    Health,
    /// Submit usage events
    Event {
        #[command(subcommand)]
        command: commands::event::EventCommands,
    },
    /// Inspect trial users
    Users {
        #[command(subcommand)]
        command: commands::users::UserCommands,
    },
    /// Inspect and update tenant policies
    Tenants {
        #[command(subcommand)]
        command: commands::tenants::TenantCommands,
    },
    /// Show shared resource load
    Resources,
    /// Show aggregate admission statistics
    Stats,
    /// Send a burst of synthetic trial traffic
    Simulate(commands::simulate::SimulateArgs),
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "trialguard=debug".into()),
            )
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }

    let api_url = cli.api_url.as_str();
    let code = match cli.command {
        Commands::Health => commands::health::run(api_url, cli.raw).await,
        Commands::Event { command } => commands::event::run(api_url, cli.raw, command).await,
        Commands::Users { command } => commands::users::run(api_url, cli.raw, command).await,
        Commands::Tenants { command } => commands::tenants::run(api_url, cli.raw, command).await,
        Commands::Resources => commands::resources::run(api_url, cli.raw).await,
        Commands::Stats => commands::stats::run(api_url, cli.raw).await,
        Commands::Simulate(args) => commands::simulate::run(api_url, args).await,
    };

    std::process::exit(code);
}
