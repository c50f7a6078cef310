//! # blog-pipeline
//!
//! Scheduled blog generation: one invocation produces one (or a batch of)
//! blog records from an LLM content service, an image service, an object
//! store and a record store.
//!
//! ## Run outcome
//!
//! - **success**: the record was written with every requested image
//! - **partial**: the record was written with fewer images than requested
//! - **failed**: no record was written (content failure or persist exhaustion)
//!
//! Image failures never abort a run. Only the record write is retried.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use blog_pipeline::{Config, GenerationRequest, Pipeline};
//! use blog_pipeline::content::WorkflowClient;
//! use blog_pipeline::images::TaskImageClient;
//! use blog_pipeline::records::SqliteRecordStore;
//! use blog_pipeline::storage::FsObjectStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!
//!     let pipeline = Pipeline::new(
//!         Arc::new(WorkflowClient::new(&config.content)?),
//!         Arc::new(TaskImageClient::new(&config.images)?),
//!         Arc::new(FsObjectStore::new(&config.object_store.fs)),
//!         Arc::new(SqliteRecordStore::open(&config.record_store.sqlite.path).await?),
//!         &config,
//!     );
//!
//!     let request = GenerationRequest::new(Some("sleep hygiene".into()), config.images.count);
//!     let result = pipeline.run(&request).await;
//!     println!("{}: {:?}", result.status, result.record_id);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Local markdown archive
pub mod archive;
/// Sequential batches of runs
pub mod batch;
/// Configuration types
pub mod config;
/// LLM content service clients
pub mod content;
/// Error types
pub mod error;
/// Image service clients
pub mod images;
/// Single-instance run lock
pub mod lock;
/// Run orchestration
pub mod pipeline;
/// Record store backends
pub mod records;
/// Retry logic with exponential backoff
pub mod retry;
/// Termination signal handling
pub mod shutdown;
/// Object store backends
pub mod storage;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use batch::{BatchPlan, batch_exit_code, run_batch};
pub use config::Config;
pub use error::{Error, Result, exit_code};
pub use lock::RunLock;
pub use pipeline::Pipeline;
pub use shutdown::{Shutdown, run_until_signal};
pub use types::{
    Article, BlogRecord, GenerationRequest, RecordStatus, RunId, RunResult, RunState, RunStatus,
    Stage,
};
