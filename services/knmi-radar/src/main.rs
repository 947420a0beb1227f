//! KNMI radar nowcast tool.
//!
//! Downloads the newest precipitation nowcast container from the KNMI open
//! data platform and answers point queries or exports layers of a local
//! container.

mod api;
mod commands;
mod config;
mod download;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use api::{OpenDataClient, SortDirection};
use config::ArchiveConfig;

#[derive(Parser, Debug)]
#[command(name = "knmi-radar")]
#[command(about = "KNMI radar precipitation nowcasts: download, query and export")]
struct Args {
    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Archive configuration file (YAML)
    #[arg(long, env = "KNMI_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download the newest nowcast container
    Download {
        /// API key for the open data platform
        #[arg(long, env = "KNMI_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Target directory (default: download_dir from the config)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Only download when the newest file was created after this ISO 8601 time
        #[arg(long)]
        after: Option<String>,
    },

    /// List files in the archive by creation time
    Files {
        /// API key for the open data platform
        #[arg(long, env = "KNMI_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Number of files to list
        #[arg(long, default_value = "10")]
        limit: u32,

        /// Oldest first instead of newest first
        #[arg(long)]
        ascending: bool,
    },

    /// List the layers of a container
    Layers {
        file: PathBuf,
    },

    /// Precipitation at a longitude/latitude
    Value {
        file: PathBuf,
        #[arg(long)]
        layer: String,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Print the raw stored value instead of mm/h
        #[arg(long)]
        raw: bool,
    },

    /// Precipitation at a grid cell
    Cell {
        file: PathBuf,
        #[arg(long)]
        layer: String,
        #[arg(long, allow_hyphen_values = true)]
        row: i64,
        #[arg(long, allow_hyphen_values = true)]
        col: i64,
        /// Print the raw stored value instead of mm/h
        #[arg(long)]
        raw: bool,
    },

    /// Export a layer as a WGS84 GeoTIFF
    Export {
        file: PathBuf,
        #[arg(long)]
        layer: String,
        #[arg(long)]
        output: PathBuf,
    },
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.json_logs)?;

    match args.command {
        Command::Download {
            api_key,
            output_dir,
            after,
        } => {
            let config = ArchiveConfig::load_or_default(args.config.as_deref())?;
            let dir = output_dir.unwrap_or_else(|| config.download_dir.clone());
            let after = after
                .as_deref()
                .map(radar_common::parse_iso8601)
                .transpose()
                .context("Invalid --after timestamp")?;

            info!(dataset = %config.dataset, version = %config.version, "Checking archive");
            let client = OpenDataClient::new(config, api_key)?;

            match download::download_latest_file(&client, &dir, after).await? {
                Some(path) => println!("{}", path.display()),
                None => info!("No newer file available"),
            }
        }
        Command::Files {
            api_key,
            limit,
            ascending,
        } => {
            let config = ArchiveConfig::load_or_default(args.config.as_deref())?;
            let client = OpenDataClient::new(config, api_key)?;
            let sorting = if ascending {
                SortDirection::Asc
            } else {
                SortDirection::Desc
            };
            let listing = client.list_latest(limit, "created", sorting).await?;

            for file in listing.files {
                println!(
                    "{}\t{}\t{}\t{}",
                    file.filename,
                    file.created,
                    file.last_modified.unwrap_or_default(),
                    file.size.map(|s| s.to_string()).unwrap_or_default()
                );
            }
        }
        Command::Layers { file } => commands::layers(&file)?,
        Command::Value {
            file,
            layer,
            lng,
            lat,
            raw,
        } => commands::value(&file, &layer, lng, lat, raw)?,
        Command::Cell {
            file,
            layer,
            row,
            col,
            raw,
        } => commands::cell(&file, &layer, row, col, raw)?,
        Command::Export {
            file,
            layer,
            output,
        } => commands::export(&file, &layer, &output)?,
    }

    Ok(())
}
