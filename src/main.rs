//! `blog-pipeline` command line entry point
//!
//! Intended to be invoked by an external timer. Exit codes are listed in
//! [`blog_pipeline::exit_code`].

use blog_pipeline::config::{ObjectStoreBackend, RecordStoreBackend};
use blog_pipeline::content::{ContentGenerator, WorkflowClient};
use blog_pipeline::images::{ImageGenerator, TaskImageClient};
use blog_pipeline::records::{DynamoRecordStore, RecordStore, SqliteRecordStore};
use blog_pipeline::storage::{FsObjectStore, ObjectStore, S3ObjectStore};
use blog_pipeline::{
    BatchPlan, Config, Error, Pipeline, Result, RunLock, Shutdown, batch_exit_code, run_batch,
};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Generate blog posts with images and publish them to the record store
#[derive(Debug, Parser)]
#[command(name = "blog-pipeline", version, about)]
struct Args {
    /// Topic seed passed to the content workflow (the workflow chooses when omitted)
    #[arg(long)]
    topic: Option<String>,

    /// Number of posts to generate sequentially in this invocation
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    count: u32,

    /// Images per post (overrides IMAGE_COUNT)
    #[arg(long)]
    images: Option<u32>,

    /// JSON configuration file; environment variables override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also append logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    if let Err(e) = init_tracing(args.verbose, args.log_file.as_deref()) {
        eprintln!("failed to initialise logging: {e}");
    }

    // The lock is owned by `run` and released before exiting
    let code = match run(args).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, code = e.error_code(), "blog-pipeline aborted");
            e.exit_code()
        }
    };
    std::process::exit(code);
}

async fn run(args: Args) -> Result<i32> {
    // Registered before anything else so no signal is missed
    let mut shutdown = Shutdown::listen();

    let mut config = Config::load(args.config.as_deref(), |key| std::env::var(key).ok())?;
    if let Some(images) = args.images {
        config.images.count = images;
        config.validate()?;
    }

    let _lock = RunLock::acquire(&config.lock.path, config.lock.stale_after)?;
    let pipeline = build_pipeline(&config).await?;

    let plan = BatchPlan {
        topic: args.topic,
        count: args.count,
        image_count: config.images.count,
    };
    let results = run_batch(&pipeline, &plan, &config.batch, &mut shutdown).await?;

    Ok(batch_exit_code(results.iter().map(|r| r.status)))
}

async fn build_pipeline(config: &Config) -> Result<Pipeline> {
    let content: Arc<dyn ContentGenerator> = Arc::new(WorkflowClient::new(&config.content)?);
    let images: Arc<dyn ImageGenerator> = Arc::new(TaskImageClient::new(&config.images)?);

    let objects: Arc<dyn ObjectStore> = match config.object_store.backend {
        ObjectStoreBackend::S3 => Arc::new(S3ObjectStore::new(&config.object_store.s3).await?),
        ObjectStoreBackend::Fs => Arc::new(FsObjectStore::new(&config.object_store.fs)),
    };

    let records: Arc<dyn RecordStore> = match config.record_store.backend {
        RecordStoreBackend::Dynamodb => {
            Arc::new(DynamoRecordStore::new(&config.record_store.dynamodb).await)
        }
        RecordStoreBackend::Sqlite => {
            Arc::new(SqliteRecordStore::open(&config.record_store.sqlite.path).await?)
        }
    };

    tracing::info!(
        object_store = objects.name(),
        record_store = records.name(),
        images_per_post = config.images.count,
        "backends ready"
    );
    Ok(Pipeline::new(content, images, objects, records, config))
}

fn init_tracing(verbose: bool, log_file: Option<&Path>) -> std::result::Result<(), Error> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("blog_pipeline=debug,info")
            } else {
                EnvFilter::try_new("blog_pipeline=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Arc::new(file))
                    .compact(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_line_number(false)
                .with_file(false)
                .compact(),
        )
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Config {
            message: format!("tracing already initialised: {e}"),
            key: None,
        })
}
