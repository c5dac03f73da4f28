use anyhow::{Context, Result};
use bucket_client::{BucketError, BucketProvider, BucketSpec, ClientConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "bucket-client")]
#[command(about = "Fetch and list objects in S3 compatible buckets", long_about = None)]
struct Cli {
    /// Endpoint host, with an optional port
    #[arg(short, long, env = "BUCKET_ENDPOINT")]
    endpoint: String,

    /// Bucket region
    #[arg(long, env = "BUCKET_REGION", default_value = "")]
    region: String,

    /// Connect over plain HTTP
    #[arg(long, env = "BUCKET_INSECURE", default_value = "false")]
    insecure: bool,

    /// Storage provider (generic, aws, gcp, azure)
    #[arg(long, env = "BUCKET_PROVIDER", default_value = "generic")]
    provider: String,

    /// Access key
    #[arg(long, env = "BUCKET_ACCESS_KEY")]
    access_key: Option<String>,

    /// Secret key
    #[arg(long, env = "BUCKET_SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    /// PEM file with additional CA certificates
    #[arg(long, env = "BUCKET_CA_FILE")]
    ca_file: Option<PathBuf>,

    /// Proxy for all requests
    #[arg(long, env = "BUCKET_PROXY_URL")]
    proxy_url: Option<String>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download an object and print its etag
    Fetch {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
        /// Destination file
        dest: PathBuf,
    },

    /// List objects with their etags
    List {
        /// Bucket name
        bucket: String,
        /// Only list keys starting with this prefix
        #[arg(short, long, default_value = "")]
        prefix: String,
        /// Stop after this many objects
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

/// Ends a listing early without it counting as a failure
#[derive(Debug, thiserror::Error)]
enum ListStop {
    #[error("listing limit reached")]
    Limit,

    #[error(transparent)]
    Bucket(#[from] BucketError),
}

impl Cli {
    fn to_client_config(&self) -> Result<ClientConfig> {
        let provider: BucketProvider = self.provider.parse()?;
        let spec = BucketSpec::new(self.endpoint.clone())
            .with_region(self.region.clone())
            .with_insecure(self.insecure)
            .with_provider(provider);

        let mut config = ClientConfig::new(spec)
            .with_credentials(self.access_key.clone(), self.secret_key.clone());
        if let Some(ca_file) = &self.ca_file {
            config = config.with_ca_file(ca_file)?;
        }
        if let Some(proxy_url) = &self.proxy_url {
            config = config.with_proxy_url(proxy_url)?;
        }

        Ok(config)
    }

    fn init_logging(&self) -> Result<()> {
        let level = match self.log_level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => "info",
        };
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .context("Failed to initialize logging")?;

        Ok(())
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.to_client_config()?;
    let client = config
        .build_client()
        .await
        .context("Failed to create bucket client")?;

    match cli.command {
        Commands::Fetch { bucket, key, dest } => {
            let result = client.fget_object(&bucket, &key, &dest).await;
            match result {
                Ok(etag) => {
                    info!(%bucket, %key, dest = %dest.display(), "object fetched");
                    println!("{}", etag);
                }
                Err(err) if client.object_is_not_found(&err) => {
                    anyhow::bail!("object '{}' not found in bucket '{}'", key, bucket);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Commands::List {
            bucket,
            prefix,
            limit,
        } => {
            let mut count = 0usize;
            let result = client
                .visit_objects(&bucket, &prefix, |key, etag| {
                    if limit.is_some_and(|limit| count >= limit) {
                        return Err(ListStop::Limit);
                    }
                    println!("{}\t{}", key, etag);
                    count += 1;
                    Ok(())
                })
                .await;

            match result {
                Ok(()) | Err(ListStop::Limit) => info!(%bucket, count, "listed objects"),
                Err(ListStop::Bucket(err)) => return Err(err.into()),
            }
        }
    }

    client.close().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.init_logging()?;

    run(cli).await
}
