use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use morphosource::config::{find_config_file, get_config, load_config_file, ConfigFile};
use morphosource::models::{
    DownloadConfig, Media, MediaSearch, ObjectSearch, PhysicalObject, SearchResults,
    DEFAULT_USE_CATEGORY, DEFAULT_USE_STATEMENT,
};
use morphosource::MorphoSource;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// MorphoSource - Search and download 3D media of specimens and artifacts
#[derive(Parser, Debug)]
#[command(name = "morphosource")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search and download media from the MorphoSource API", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v, -vv, -vvv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Plain)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// One tab-separated line per record
    Plain,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search media
    SearchMedia {
        /// Free-text query
        query: Option<String>,

        /// Media type facet, e.g. "Mesh"
        #[arg(long)]
        media_type: Option<String>,

        /// Publication status facet, e.g. "Open Download"
        #[arg(long)]
        visibility: Option<String>,

        /// Keyword facet
        #[arg(long)]
        tag: Option<String>,

        /// Physical object type facet
        #[arg(long)]
        object_type: Option<String>,

        /// Results per page
        #[arg(long)]
        per_page: Option<u32>,

        /// Fetch only this page
        #[arg(long)]
        page: Option<u32>,
    },

    /// Search physical objects
    SearchObjects {
        /// Free-text query
        query: Option<String>,

        /// "Biological Specimen" or "Cultural Heritage Object"
        #[arg(long)]
        object_type: Option<String>,

        /// GBIF taxonomy facet
        #[arg(long)]
        taxonomy: Option<String>,

        /// Media type facet
        #[arg(long)]
        media_type: Option<String>,

        /// Media keyword facet
        #[arg(long)]
        tag: Option<String>,

        /// Results per page
        #[arg(long)]
        per_page: Option<u32>,

        /// Fetch only this page
        #[arg(long)]
        page: Option<u32>,
    },

    /// Fetch a media record by id
    GetMedia { id: String },

    /// Fetch a physical object by id
    GetObject { id: String },

    /// List media of a physical object
    ObjectMedia {
        object_id: String,

        /// Only media that can be downloaded without a request
        #[arg(long)]
        open_only: bool,
    },

    /// Download the bundle of a media record
    Download {
        media_id: String,

        /// Destination file (default: <media_id>.zip)
        #[arg(long, short)]
        path: Option<PathBuf>,

        /// API key (default: MORPHOSOURCE_API_KEY or the config file)
        #[arg(long)]
        api_key: Option<String>,

        /// How the data will be used
        #[arg(long, default_value = DEFAULT_USE_STATEMENT)]
        use_statement: String,

        /// Use category, may be repeated
        #[arg(long = "category")]
        categories: Vec<String>,

        /// Free-text use category, instead of --category
        #[arg(long)]
        other_category: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from file if specified or found in default locations
    let config_path = cli.config.clone().or_else(find_config_file);
    let file_config = match &config_path {
        Some(path) => load_config_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => ConfigFile::default(),
    };

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => file_config
            .logging
            .level
            .clone()
            .unwrap_or_else(|| "warn".to_string()),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("morphosource={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    let config = file_config.apply(get_config());
    let client = MorphoSource::with_config(config)?;

    match cli.command {
        Commands::SearchMedia {
            query,
            media_type,
            visibility,
            tag,
            object_type,
            per_page,
            page,
        } => {
            let search = MediaSearch {
                query,
                media_type,
                visibility,
                media_tag: tag,
                object_type,
                per_page,
                page,
            };
            let results = client.search_media(&search).await?;
            output_results(&results, cli.output, media_line)?;
        }

        Commands::SearchObjects {
            query,
            object_type,
            taxonomy,
            media_type,
            tag,
            per_page,
            page,
        } => {
            let search = ObjectSearch {
                query,
                object_type,
                taxonomy,
                media_type,
                media_tag: tag,
                per_page,
                page,
            };
            let results = client.search_objects(&search).await?;
            output_results(&results, cli.output, object_line)?;
        }

        Commands::GetMedia { id } => {
            let media = client.get_media(&id).await?;
            output_records(std::slice::from_ref(&media), cli.output, media_line)?;
        }

        Commands::GetObject { id } => {
            let object = client.get_object(&id).await?;
            output_records(std::slice::from_ref(&object), cli.output, object_line)?;
        }

        Commands::ObjectMedia {
            object_id,
            open_only,
        } => {
            let media = client.media_for_object(&object_id, open_only).await?;
            output_records(&media, cli.output, media_line)?;
        }

        Commands::Download {
            media_id,
            path,
            api_key,
            use_statement,
            categories,
            other_category,
        } => {
            let api_key = api_key
                .or_else(|| client.config().api_key.clone())
                .context("An API key is required to download; pass --api-key or set MORPHOSOURCE_API_KEY")?;

            let categories = if categories.is_empty() && other_category.is_none() {
                vec![DEFAULT_USE_CATEGORY.to_string()]
            } else {
                categories
            };
            let download_config =
                DownloadConfig::new(api_key, use_statement, categories, other_category)?;

            let path = path.unwrap_or_else(|| PathBuf::from(format!("{}.zip", media_id)));
            let bytes = client
                .download_media_bundle(&media_id, &path, &download_config)
                .await?;
            eprintln!("Downloaded {} bytes to {}", bytes, path.display());
        }
    }

    Ok(())
}

fn media_line(media: &Media) -> String {
    [
        media.id.as_deref(),
        media.title.as_deref(),
        media.media_type.as_deref(),
        media.visibility.as_deref(),
    ]
    .iter()
    .map(|field| field.unwrap_or("-"))
    .collect::<Vec<_>>()
    .join("\t")
}

fn object_line(object: &PhysicalObject) -> String {
    [
        object.id(),
        object.object_type(),
        object.title(),
        object.taxonomy(),
    ]
    .iter()
    .map(|field| field.unwrap_or("-"))
    .collect::<Vec<_>>()
    .join("\t")
}

fn output_results<T: Serialize>(
    results: &SearchResults<T>,
    format: OutputFormat,
    line: fn(&T) -> String,
) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(results)?),
        OutputFormat::Plain => {
            for item in &results.items {
                println!("{}", line(item));
            }
            if let Some(total) = results.total_count() {
                eprintln!("{} of {} results", results.len(), total);
            }
        }
    }
    Ok(())
}

fn output_records<T: Serialize>(
    records: &[T],
    format: OutputFormat,
    line: fn(&T) -> String,
) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(records)?),
        OutputFormat::Plain => {
            for record in records {
                println!("{}", line(record));
            }
        }
    }
    Ok(())
}
