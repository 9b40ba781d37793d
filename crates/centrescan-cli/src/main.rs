mod commands;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "centrescan-cli")]
#[command(about = "Centrescan location directory command line interface")]
struct Cli {
    /// Emit raw JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve a free-text location name to a canonical record
    Resolve {
        /// Location name to resolve
        name: String,
    },
    /// List competing locations within a radius of a location
    Nearby {
        /// Location name or UUID
        target: String,

        /// Search radius in kilometres
        #[arg(long, default_value_t = 10.0)]
        radius_km: f64,

        /// Only include locations with at least this many stores
        #[arg(long)]
        min_stores: Option<u32>,

        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Analyse tenant-category gaps against the surrounding neighbourhood
    Gaps {
        /// Location name or UUID
        target: String,

        /// Neighbourhood radius in kilometres
        #[arg(long, default_value_t = 10.0)]
        radius_km: f64,

        /// Attach example competitor locations to each recommendation
        #[arg(long)]
        detailed: bool,
    },
    /// Run a batch duplicate scan over the corpus
    Dedupe {
        /// Restrict the scan to postcodes starting with this prefix
        #[arg(long)]
        postcode_prefix: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let ctx = commands::Context::connect(cli.json).await?;

    match cli.command {
        Commands::Resolve { name } => commands::resolve(&ctx, &name),
        Commands::Nearby {
            target,
            radius_km,
            min_stores,
            limit,
        } => commands::nearby(&ctx, &target, radius_km, min_stores, limit),
        Commands::Gaps {
            target,
            radius_km,
            detailed,
        } => commands::gaps(&ctx, &target, radius_km, detailed),
        Commands::Dedupe { postcode_prefix } => {
            commands::dedupe(&ctx, postcode_prefix.as_deref()).await
        }
    }
}
