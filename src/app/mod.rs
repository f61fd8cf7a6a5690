pub mod datasets;
#[cfg(feature = "cli")]
pub mod runner;
