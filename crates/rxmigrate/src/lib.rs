//! Batch driver for the toPromise migration
//!
//! Resolves input paths to TypeScript files, runs
//! [`rxmigrate_core::Transformer`] over them in parallel, writes changed
//! files back (unless dry run), and summarizes the run in a [`RunReport`].
//!
//! ```no_run
//! use std::path::PathBuf;
//! use rxmigrate::{run, DriverConfig};
//!
//! let config = DriverConfig::new().with_dry_run(true);
//! let report = run(&config, &[PathBuf::from("src")])?;
//! println!("{}", report.generate_text());
//! # Ok::<(), rxmigrate::DriverError>(())
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod discover;
pub mod driver;
pub mod error;
pub mod report;

pub use config::DriverConfig;
pub use discover::collect_inputs;
pub use driver::{process_file, run};
pub use error::{ConfigError, DriverError, DriverResult};
pub use report::{FileFailure, FileResult, FileStatus, RunReport};
