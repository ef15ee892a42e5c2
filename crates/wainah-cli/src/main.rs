mod resolve;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wainah_core::PolicyOverrides;

#[derive(Debug, Parser)]
#[command(name = "wainah")]
#[command(about = "Resolve product photos and queries into ranked storefront matches")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve a product photo
    Image {
        /// Image file (JPEG, PNG, WebP, ...)
        path: PathBuf,
        /// Treat the file as base64 text, optionally a `data:` URL
        #[arg(long)]
        base64: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Resolve a typed product query
    Text {
        /// Query words, joined with spaces
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Ranking overrides and output format shared by every subcommand.
#[derive(Debug, Args)]
struct OutputArgs {
    /// Shopper country (ISO 3166 alpha-2); defaults to `WAINAH_DEFAULT_COUNTRY`
    #[arg(long)]
    country: Option<String>,
    /// Minimum similarity for the first ranking stage, in [0, 1]
    #[arg(long, value_parser = parse_similarity)]
    min_similarity: Option<f64>,
    /// Allow storefronts outside the trusted list in the first stage
    #[arg(long)]
    include_untrusted: bool,
    /// Print the resolution as JSON
    #[arg(long)]
    json: bool,
}

impl OutputArgs {
    fn overrides(&self) -> PolicyOverrides {
        PolicyOverrides {
            user_country: self.country.clone(),
            min_similarity: self.min_similarity,
            only_trusted: self.include_untrusted.then_some(false),
        }
    }
}

fn parse_similarity(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .parse()
        .map_err(|e| format!("not a number: {e}"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is outside [0, 1]"))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = wainah_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(?config, "configuration loaded");

    let resolver = wainah_resolver::Resolver::from_config(&config)?;

    match cli.command {
        Commands::Image {
            path,
            base64,
            output,
        } => {
            let resolution =
                resolve::run_image(&resolver, &path, base64, &output.overrides()).await?;
            resolve::print_resolution(&resolution, output.json)?;
        }
        Commands::Text { query, output } => {
            let resolution =
                resolve::run_text(&resolver, &query.join(" "), &output.overrides()).await?;
            resolve::print_resolution(&resolution, output.json)?;
        }
    }

    Ok(())
}
