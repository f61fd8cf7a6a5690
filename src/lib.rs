pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::LocalStorage;

pub use crate::app::datasets::{AllResolutions, UniqueResolutions};
pub use crate::core::{client::PassiveTotalClient, etl::EtlEngine, pipeline::ResolutionPipeline};
pub use crate::utils::error::{EtlError, Result};
